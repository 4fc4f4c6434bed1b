//! Cached document shared by a converter and its listener closures.

use crate::model::change::{ChangeEvent, EntityKind, Listener, Notifier};
use crate::schema::{as_document, Document, FieldType, SchemaError};
use log::warn;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One entity's document plus the notifier its converter emits on.
///
/// The document mutex is a leaf lock: nothing else is acquired while it is
/// held, and listeners run only after it is released.
#[derive(Debug, Default)]
pub(crate) struct DocumentCache {
    document: Mutex<Document>,
    entity_id: AtomicU32,
    revision: AtomicU64,
    notifier: Notifier,
}

impl DocumentCache {
    fn lock(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a freshly built document without counting it as a change.
    pub(crate) fn replace(&self, entity_id: u32, document: Document) {
        let mut guard = self.lock();
        *guard = document;
        self.entity_id.store(entity_id, Ordering::SeqCst);
    }

    /// Applies `edit` under the lock and returns a copy of the result.
    pub(crate) fn patch<F>(&self, edit: F) -> Document
    where
        F: FnOnce(&mut Document),
    {
        let mut guard = self.lock();
        edit(&mut guard);
        self.revision.fetch_add(1, Ordering::SeqCst);
        guard.clone()
    }

    /// Applies `edit` without bumping the revision.
    pub(crate) fn patch_silently<F>(&self, edit: F)
    where
        F: FnOnce(&mut Document),
    {
        edit(&mut self.lock());
    }

    pub(crate) fn snapshot(&self) -> Document {
        self.lock().clone()
    }

    /// Document and the revision it corresponds to, read atomically.
    pub(crate) fn snapshot_with_revision(&self) -> (Document, u64) {
        let guard = self.lock();
        (guard.clone(), self.revision.load(Ordering::SeqCst))
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub(crate) fn entity_id(&self) -> u32 {
        self.entity_id.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    /// Announces the patched document to the parent converter.
    pub(crate) fn emit_upward(&self, source: EntityKind, document: &Document) {
        self.notifier.emit(&ChangeEvent::child_field_changed(
            source,
            self.entity_id(),
            document,
        ));
    }
}

/// Elements of a nested array field. A missing field reads as empty.
pub(crate) fn nested_array<'a>(
    doc: &'a Document,
    entity: EntityKind,
    field: &'static str,
) -> Result<&'a [Value], SchemaError> {
    match doc.get(field) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(SchemaError::InvalidType {
            entity,
            field,
            expected: FieldType::Array,
        }),
    }
}

/// Runs `build` on every element of a nested array, wrapping failures with
/// the element's position.
pub(crate) fn build_nested<'a, T, F>(
    doc: &'a Document,
    entity: EntityKind,
    field: &'static str,
    child: EntityKind,
    mut build: F,
) -> Result<Vec<T>, SchemaError>
where
    F: FnMut(&'a Document) -> Result<T, SchemaError>,
{
    nested_array(doc, entity, field)?
        .iter()
        .enumerate()
        .map(|(index, value)| {
            as_document(value, child)
                .and_then(&mut build)
                .map_err(|source| SchemaError::Nested {
                    entity,
                    field,
                    index,
                    source: Box::new(source),
                })
        })
        .collect()
}

/// Rejects the first id in `ids` that repeats an earlier one.
///
/// `ids` follow the element order of the nested array `field`, so the error
/// points at the repeated element.
pub(crate) fn ensure_unique_ids<I>(
    entity: EntityKind,
    field: &'static str,
    child: EntityKind,
    id_field: &'static str,
    ids: I,
) -> Result<(), SchemaError>
where
    I: IntoIterator<Item = u32>,
{
    let mut seen = BTreeSet::new();
    for (index, id) in ids.into_iter().enumerate() {
        if !seen.insert(id) {
            return Err(SchemaError::Nested {
                entity,
                field,
                index,
                source: Box::new(SchemaError::DuplicateId {
                    entity: child,
                    field: id_field,
                    id,
                }),
            });
        }
    }
    Ok(())
}

/// Runs `edit` on the array stored under `field`, creating it when absent.
fn with_array<F>(doc: &mut Document, field: &'static str, edit: F)
where
    F: FnOnce(&mut Vec<Value>),
{
    if let Some(Value::Array(items)) = doc.get_mut(field) {
        edit(items);
        return;
    }
    let mut items = Vec::new();
    edit(&mut items);
    doc.insert(field.to_string(), Value::Array(items));
}

fn position_of(items: &[Value], id_field: &'static str, id: u32) -> Option<usize> {
    items
        .iter()
        .position(|item| item.get(id_field).and_then(Value::as_u64) == Some(u64::from(id)))
}

pub(crate) fn append_entry(doc: &mut Document, field: &'static str, child: Document) {
    with_array(doc, field, |items| items.push(Value::Object(child)));
}

pub(crate) fn remove_entry(doc: &mut Document, field: &'static str, id_field: &'static str, id: u32) {
    with_array(doc, field, |items| match position_of(items, id_field, id) {
        Some(index) => {
            items.remove(index);
        }
        None => warn!(
            "event=child_remove module=convert status=skip field={} id={}",
            field, id
        ),
    });
}

pub(crate) fn replace_entry(
    doc: &mut Document,
    field: &'static str,
    id_field: &'static str,
    id: u32,
    child: &Document,
) {
    with_array(doc, field, |items| match position_of(items, id_field, id) {
        Some(index) => items[index] = Value::Object(child.clone()),
        None => warn!(
            "event=child_replace module=convert status=skip field={} id={}",
            field, id
        ),
    });
}
