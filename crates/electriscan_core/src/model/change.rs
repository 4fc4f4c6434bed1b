//! Change notifications emitted by domain entities and converters.
//!
//! # Responsibility
//! - Describe every mutation as one explicit `ChangeEvent`.
//! - Deliver events to subscribed listeners without holding any lock while a
//!   listener runs.
//!
//! # Invariants
//! - `source` names the entity the change is about: the edited entity for
//!   `FieldEdit`, the child for the three child kinds.
//! - An entity has at most one converter binding. `bind` replaces it, so
//!   converting the same entity again never doubles its patches.
//! - Plain subscribers are only ever added. `clear` detaches an entity that
//!   left its owner.

use crate::model::device::Device;
use crate::model::household::Household;
use crate::model::room::Room;
use crate::model::solar_panel::SolarPanel;
use crate::schema::Document;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// Entity type a change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Household,
    Room,
    SolarPanel,
    Device,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Household => "household",
            Self::Room => "room",
            Self::SolarPanel => "solar_panel",
            Self::Device => "device",
        }
    }
}

/// Fixed vocabulary of changes understood by the converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Scalar fields of the source entity were edited.
    FieldEdit,
    /// A child entity was inserted into its owner.
    ChildAdded,
    /// A child entity was removed from its owner.
    ChildRemoved,
    /// A child's document was patched and is carried in the payload.
    ChildFieldChanged,
}

/// Data carried by a change event.
#[derive(Debug, Clone, Copy)]
pub enum ChangePayload<'a> {
    Household(&'a Household),
    Room(&'a Room),
    SolarPanel(&'a SolarPanel),
    Device(&'a Device),
    /// Freshly patched document of the source entity.
    Document(&'a Document),
    /// No payload; used for removals.
    Removed,
}

/// One mutation notification.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    pub source: EntityKind,
    pub id: u32,
    pub kind: ChangeKind,
    pub payload: ChangePayload<'a>,
}

impl<'a> ChangeEvent<'a> {
    pub fn field_edit(source: EntityKind, id: u32, payload: ChangePayload<'a>) -> Self {
        Self {
            source,
            id,
            kind: ChangeKind::FieldEdit,
            payload,
        }
    }

    pub fn child_added(source: EntityKind, id: u32, payload: ChangePayload<'a>) -> Self {
        Self {
            source,
            id,
            kind: ChangeKind::ChildAdded,
            payload,
        }
    }

    pub fn child_removed(source: EntityKind, id: u32) -> Self {
        Self {
            source,
            id,
            kind: ChangeKind::ChildRemoved,
            payload: ChangePayload::Removed,
        }
    }

    pub fn child_field_changed(source: EntityKind, id: u32, document: &'a Document) -> Self {
        Self {
            source,
            id,
            kind: ChangeKind::ChildFieldChanged,
            payload: ChangePayload::Document(document),
        }
    }
}

/// Callback invoked for every emitted change.
pub type Listener = Arc<dyn Fn(&ChangeEvent<'_>) + Send + Sync>;

/// Wraps a closure into a `Listener`.
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&ChangeEvent<'_>) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Listener list owned by one entity or converter.
///
/// The `binding` slot holds the converter that mirrors the entity into a
/// document. It runs before the plain subscribers.
#[derive(Default)]
pub struct Notifier {
    binding: Mutex<Option<Listener>>,
    listeners: Mutex<Vec<Listener>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `listener` as the converter binding, replacing any previous one.
    pub fn bind(&self, listener: Listener) {
        *self.binding.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    pub fn subscribe(&self, listener: Listener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Delivers `event` to every listener registered at call time.
    pub fn emit(&self, event: &ChangeEvent<'_>) {
        // Copy out so listeners may subscribe on other notifiers re-entrantly.
        let binding = self
            .binding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in binding.into_iter().chain(listeners) {
            listener(event);
        }
    }

    pub fn clear(&self) {
        *self.binding.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn listener_count(&self) -> usize {
        let bound = self
            .binding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        usize::from(bound)
            + self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
    }
}

impl Debug for Notifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
