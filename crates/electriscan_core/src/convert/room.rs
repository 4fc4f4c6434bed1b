//! Room converter with its nested `devices` array.
//!
//! # Responsibility
//! - Build a `Room` and all its devices from one entry of `rooms`.
//! - Append, remove and replace device entries as the room's membership and
//!   its devices change, then report the patched room upward.
//!
//! # Invariants
//! - Device ids inside one room document are unique. A repeated id fails
//!   the whole room.
//! - The `devices` array holds exactly one entry per device the room owns.
//!
//! # See also
//! - crate::convert::device
//! - crate::convert::household

use crate::convert::cache::{
    append_entry, build_nested, ensure_unique_ids, remove_entry, replace_entry, DocumentCache,
};
use crate::convert::device::DeviceConverter;
use crate::model::change::{listener, ChangeEvent, ChangeKind, ChangePayload, EntityKind, Listener};
use crate::model::device::Device;
use crate::model::room::{Room, RoomType};
use crate::schema::{
    read_enum, read_f64, read_text, read_u32, validate, write_fields, Document, SchemaError,
    DEVICES_FIELD, DEVICE_ID, ROOM_ID, ROOM_NAME, ROOM_SIZE, ROOM_TYPE,
};
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const KIND: EntityKind = EntityKind::Room;

/// Keeps one room document, including its `devices` array, in sync with its
/// `Room`.
///
/// Each device gets its own `DeviceConverter` subscribed to this one. A
/// device edit therefore reaches the room document as a `ChildFieldChanged`
/// replacing the device's entry by `DEVICE_ID`.
#[derive(Debug, Clone, Default)]
pub struct RoomConverter {
    cache: Arc<DocumentCache>,
}

impl RoomConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) {
        self.cache.subscribe(listener);
    }

    /// Builds a room and all its devices.
    ///
    /// # Errors
    /// - Missing or mistyped room fields.
    /// - `devices` present but not an array.
    /// - Any malformed device document, reported as `SchemaError::Nested`.
    /// - Two devices with the same id, reported as `SchemaError::Nested`
    ///   around `SchemaError::DuplicateId`.
    pub fn from_document(&self, doc: &Document) -> Result<Room, SchemaError> {
        validate::<Room>(doc)?;
        let id = read_u32(doc, KIND, ROOM_ID)?;
        let name = read_text(doc, KIND, ROOM_NAME)?;
        let room_type = read_enum(doc, KIND, ROOM_TYPE, RoomType::parse, RoomType::Dummy)?;
        let size = read_f64(doc, KIND, ROOM_SIZE)?;

        let loaded = build_nested(doc, KIND, DEVICES_FIELD, EntityKind::Device, |child| {
            let converter = DeviceConverter::new(id);
            converter.subscribe(self.listener());
            converter.from_document(child)
        })?;
        ensure_unique_ids(
            KIND,
            DEVICES_FIELD,
            EntityKind::Device,
            DEVICE_ID,
            loaded.iter().map(Device::id),
        )?;
        let devices: BTreeMap<u32, Device> = loaded
            .into_iter()
            .map(|device| (device.id(), device))
            .collect();

        let mut stored = doc.clone();
        stored
            .entry(DEVICES_FIELD.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        self.cache.replace(id, stored);

        let room = Room::with_devices(id, name, room_type, size, devices);
        room.bind(self.listener());
        Ok(room)
    }

    /// Fresh document for `room` and its current devices.
    pub fn to_document(&self, room: &Room) -> Document {
        let mut doc = Document::new();
        write_fields(room, &mut doc);
        let devices = room
            .all_devices()
            .into_iter()
            .map(|device| Value::Object(self.device_document(device)))
            .collect();
        doc.insert(DEVICES_FIELD.to_string(), Value::Array(devices));

        self.cache.replace(room.id(), doc.clone());
        room.bind(self.listener());
        doc
    }

    pub fn apply_change(&self, event: &ChangeEvent<'_>) {
        let patched = match (event.kind, event.source, event.payload) {
            (ChangeKind::FieldEdit, EntityKind::Room, ChangePayload::Room(room)) => {
                self.cache.patch(|doc| write_fields(room, doc))
            }
            (ChangeKind::ChildAdded, EntityKind::Device, ChangePayload::Device(device)) => {
                let child = self.device_document(device);
                self.cache
                    .patch(|doc| append_entry(doc, DEVICES_FIELD, child))
            }
            (ChangeKind::ChildRemoved, EntityKind::Device, _) => self
                .cache
                .patch(|doc| remove_entry(doc, DEVICES_FIELD, DEVICE_ID, event.id)),
            (ChangeKind::ChildFieldChanged, EntityKind::Device, ChangePayload::Document(child)) => {
                self.cache
                    .patch(|doc| replace_entry(doc, DEVICES_FIELD, DEVICE_ID, event.id, child))
            }
            _ => {
                debug!(
                    "event=change_ignored module=convert status=skip converter=room kind={:?} source={}",
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

    /// Converts `device` through a child converter wired to this room.
    fn device_document(&self, device: &Device) -> Document {
        let converter = DeviceConverter::new(device.owner_id());
        converter.subscribe(self.listener());
        converter.to_document(device)
    }

    fn listener(&self) -> Listener {
        let converter = self.clone();
        listener(move |event| converter.apply_change(event))
    }
}
