//! Household converter: root of the propagation chain and save target.
//!
//! # Responsibility
//! - Build a `Household` with its rooms, devices and solar panels.
//! - Keep the whole household document current so the persistence layer can
//!   write it without walking the model.
//! - Validate stored documents without building entities.
//!
//! # Invariants
//! - Room ids and solar panel ids are unique within one document.
//! - `rooms` and `solarPanels` hold exactly one entry per child the model
//!   owns, however often the household is converted.
//! - Control fields (`id`, `delete`) stay in the cached document across
//!   `to_document`.
//!
//! # See also
//! - crate::convert::room
//! - crate::service::persistence

use crate::convert::cache::{
    append_entry, build_nested, ensure_unique_ids, remove_entry, replace_entry, DocumentCache,
};
use crate::convert::room::RoomConverter;
use crate::convert::solar_panel::SolarPanelConverter;
use crate::model::change::{listener, ChangeEvent, ChangeKind, ChangePayload, EntityKind, Listener};
use crate::model::device::Device;
use crate::model::household::Household;
use crate::model::room::Room;
use crate::model::solar_panel::SolarPanel;
use crate::schema::{
    read_text, read_u32, validate, write_fields, Document, SchemaError, DELETE_FIELD,
    DEVICES_FIELD, DEVICE_ID, HOUSEHOLD_NAME, ID_FIELD, NUMBER_OF_RESIDENTS, POSTAL_CODE, ROOMS_FIELD,
    ROOM_ID, SOLAR_PANELS_FIELD, SOLAR_PANEL_ID,
};
use log::debug;
use serde_json::Value;
use std::sync::Arc;

const KIND: EntityKind = EntityKind::Household;

/// Keeps a whole household document in sync with its `Household`.
///
/// This converter's document is the save target of the persistence layer.
/// Its revision counter grows with every patch, so callers can tell whether
/// a snapshot they wrote is still current.
///
/// Rooms and panels are matched by `ROOM_ID` and `SOLAR_PANEL_ID` when a
/// child reports a patched document. Clones share the cached document.
#[derive(Debug, Clone, Default)]
pub struct HouseholdConverter {
    cache: Arc<DocumentCache>,
}

impl HouseholdConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) {
        self.cache.subscribe(listener);
    }

    /// Builds the household with every room, device and solar panel.
    ///
    /// Control fields (`id`, `delete`) are kept in the cached document.
    pub fn from_document(&self, doc: &Document) -> Result<Household, SchemaError> {
        validate::<Household>(doc)?;
        let name = read_text(doc, KIND, HOUSEHOLD_NAME)?;
        let residents = read_u32(doc, KIND, NUMBER_OF_RESIDENTS)?;
        let postal_code = read_u32(doc, KIND, POSTAL_CODE)?;

        let rooms = build_nested(doc, KIND, ROOMS_FIELD, EntityKind::Room, |child| {
            let converter = RoomConverter::new();
            converter.subscribe(self.listener());
            converter.from_document(child)
        })?;
        let panels = build_nested(
            doc,
            KIND,
            SOLAR_PANELS_FIELD,
            EntityKind::SolarPanel,
            |child| {
                let converter = SolarPanelConverter::new();
                converter.subscribe(self.listener());
                converter.from_document(child)
            },
        )?;
        ensure_unique_ids(
            KIND,
            ROOMS_FIELD,
            EntityKind::Room,
            ROOM_ID,
            rooms.iter().map(Room::id),
        )?;
        ensure_unique_ids(
            KIND,
            SOLAR_PANELS_FIELD,
            EntityKind::SolarPanel,
            SOLAR_PANEL_ID,
            panels.iter().map(SolarPanel::id),
        )?;

        let mut stored = doc.clone();
        for field in [ROOMS_FIELD, SOLAR_PANELS_FIELD] {
            stored
                .entry(field.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
        }
        self.cache.replace(0, stored);

        let household = Household::with_children(
            name,
            postal_code,
            residents,
            rooms.into_iter().map(|room| (room.id(), room)).collect(),
            panels.into_iter().map(|panel| (panel.id(), panel)).collect(),
        );
        household.bind(self.listener());
        Ok(household)
    }

    /// Fresh document for `household` and all of its children.
    ///
    /// The returned document carries no control fields; the cached document
    /// keeps the ones it already had.
    pub fn to_document(&self, household: &Household) -> Document {
        let mut doc = Document::new();
        write_fields(household, &mut doc);
        let rooms = household
            .all_rooms()
            .into_iter()
            .map(|room| Value::Object(self.room_document(room)))
            .collect();
        let panels = household
            .all_solar_panels()
            .into_iter()
            .map(|panel| Value::Object(self.panel_document(panel)))
            .collect();
        doc.insert(ROOMS_FIELD.to_string(), Value::Array(rooms));
        doc.insert(SOLAR_PANELS_FIELD.to_string(), Value::Array(panels));

        let previous = self.cache.snapshot();
        let mut stored = doc.clone();
        for field in [ID_FIELD, DELETE_FIELD] {
            if let Some(value) = previous.get(field) {
                stored.insert(field.to_string(), value.clone());
            }
        }
        self.cache.replace(0, stored);
        household.bind(self.listener());
        doc
    }

    pub fn apply_change(&self, event: &ChangeEvent<'_>) {
        let patched = match (event.kind, event.source, event.payload) {
            (ChangeKind::FieldEdit, EntityKind::Household, ChangePayload::Household(household)) => {
                self.cache.patch(|doc| write_fields(household, doc))
            }
            (ChangeKind::ChildAdded, EntityKind::Room, ChangePayload::Room(room)) => {
                let child = self.room_document(room);
                self.cache.patch(|doc| append_entry(doc, ROOMS_FIELD, child))
            }
            (ChangeKind::ChildAdded, EntityKind::SolarPanel, ChangePayload::SolarPanel(panel)) => {
                let child = self.panel_document(panel);
                self.cache
                    .patch(|doc| append_entry(doc, SOLAR_PANELS_FIELD, child))
            }
            (ChangeKind::ChildRemoved, EntityKind::Room, _) => self
                .cache
                .patch(|doc| remove_entry(doc, ROOMS_FIELD, ROOM_ID, event.id)),
            (ChangeKind::ChildRemoved, EntityKind::SolarPanel, _) => self.cache.patch(|doc| {
                remove_entry(doc, SOLAR_PANELS_FIELD, SOLAR_PANEL_ID, event.id)
            }),
            (ChangeKind::ChildFieldChanged, EntityKind::Room, ChangePayload::Document(child)) => {
                self.cache
                    .patch(|doc| replace_entry(doc, ROOMS_FIELD, ROOM_ID, event.id, child))
            }
            (
                ChangeKind::ChildFieldChanged,
                EntityKind::SolarPanel,
                ChangePayload::Document(child),
            ) => self.cache.patch(|doc| {
                replace_entry(doc, SOLAR_PANELS_FIELD, SOLAR_PANEL_ID, event.id, child)
            }),
            _ => {
                debug!(
                    "event=change_ignored module=convert status=skip converter=household kind={:?} source={}",
                    event.kind,
                    event.source.as_str()
                );
                return;
            }
        };
        self.cache.emit_upward(KIND, &patched);
    }

    pub fn document(&self) -> Document {
        self.cache.snapshot()
    }

    /// Number of patches applied since the document was installed.
    pub fn revision(&self) -> u64 {
        self.cache.revision()
    }

    /// Document and its revision, read under one lock.
    pub fn snapshot_with_revision(&self) -> (Document, u64) {
        self.cache.snapshot_with_revision()
    }

    /// Mirrors the catalog id already written to disk; not a user change.
    pub fn set_catalog_id(&self, id: u32) {
        self.cache.patch_silently(|doc| {
            doc.insert(ID_FIELD.to_string(), Value::from(id));
        });
    }

    /// Sets the tombstone flag on the cached document.
    pub fn mark_deleted(&self) {
        self.cache.patch(|doc| {
            doc.insert(DELETE_FIELD.to_string(), Value::Bool(true));
        });
    }

    fn room_document(&self, room: &Room) -> Document {
        let converter = RoomConverter::new();
        converter.subscribe(self.listener());
        converter.to_document(room)
    }

    fn panel_document(&self, panel: &SolarPanel) -> Document {
        let converter = SolarPanelConverter::new();
        converter.subscribe(self.listener());
        converter.to_document(panel)
    }

    fn listener(&self) -> Listener {
        let converter = self.clone();
        listener(move |event| converter.apply_change(event))
    }
}

/// Validates a household document and every nested document without
/// building entities.
pub fn validate_household_document(doc: &Document) -> Result<(), SchemaError> {
    validate::<Household>(doc)?;
    let room_ids = build_nested(doc, KIND, ROOMS_FIELD, EntityKind::Room, |room| {
        validate::<Room>(room)?;
        let device_ids =
            build_nested(room, EntityKind::Room, DEVICES_FIELD, EntityKind::Device, |device| {
                validate::<Device>(device)?;
                read_u32(device, EntityKind::Device, DEVICE_ID)
            })?;
        ensure_unique_ids(
            EntityKind::Room,
            DEVICES_FIELD,
            EntityKind::Device,
            DEVICE_ID,
            device_ids,
        )?;
        read_u32(room, EntityKind::Room, ROOM_ID)
    })?;
    ensure_unique_ids(KIND, ROOMS_FIELD, EntityKind::Room, ROOM_ID, room_ids)?;

    let panel_ids = build_nested(doc, KIND, SOLAR_PANELS_FIELD, EntityKind::SolarPanel, |panel| {
        validate::<SolarPanel>(panel)?;
        read_u32(panel, EntityKind::SolarPanel, SOLAR_PANEL_ID)
    })?;
    ensure_unique_ids(
        KIND,
        SOLAR_PANELS_FIELD,
        EntityKind::SolarPanel,
        SOLAR_PANEL_ID,
        panel_ids,
    )
}

/// Document written for a newly created household.
pub fn default_household_document(catalog_id: u32) -> Document {
    let household = Household::default();
    let mut doc = Document::new();
    write_fields(&household, &mut doc);
    doc.insert(ROOMS_FIELD.to_string(), Value::Array(Vec::new()));
    doc.insert(SOLAR_PANELS_FIELD.to_string(), Value::Array(Vec::new()));
    doc.insert(ID_FIELD.to_string(), Value::from(catalog_id));
    doc
}
