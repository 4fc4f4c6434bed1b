//! Room domain model.
//!
//! # Responsibility
//! - Own the devices placed in one room.
//! - Announce edits and device membership changes to listeners.
//!
//! # Invariants
//! - Device ids are unique within a room and always `>= 1`.
//! - Every device in `devices` has `owner_id == self.id`.
//! - A removed device is detached from every listener.

use crate::model::change::{ChangeEvent, ChangePayload, EntityKind, Listener, Notifier};
use crate::model::device::{Device, DeviceRecord};
use crate::model::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Room type. Unknown values fall back to `Dummy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    LivingRoom,
    Kitchen,
    Bathroom,
    Bedroom,
    DiningRoom,
    Office,
    LaundryRoom,
    Garage,
    Basement,
    Attic,
    GuestRoom,
    Gym,
    Foyer,
    Entryway,
    Dummy,
}

impl RoomType {
    pub const ALL: [RoomType; 15] = [
        Self::LivingRoom,
        Self::Kitchen,
        Self::Bathroom,
        Self::Bedroom,
        Self::DiningRoom,
        Self::Office,
        Self::LaundryRoom,
        Self::Garage,
        Self::Basement,
        Self::Attic,
        Self::GuestRoom,
        Self::Gym,
        Self::Foyer,
        Self::Entryway,
        Self::Dummy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LivingRoom => "LIVING_ROOM",
            Self::Kitchen => "KITCHEN",
            Self::Bathroom => "BATHROOM",
            Self::Bedroom => "BEDROOM",
            Self::DiningRoom => "DINING_ROOM",
            Self::Office => "OFFICE",
            Self::LaundryRoom => "LAUNDRY_ROOM",
            Self::Garage => "GARAGE",
            Self::Basement => "BASEMENT",
            Self::Attic => "ATTIC",
            Self::GuestRoom => "GUEST_ROOM",
            Self::Gym => "GYM",
            Self::Foyer => "FOYER",
            Self::Entryway => "ENTRYWAY",
            Self::Dummy => "DUMMY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LivingRoom => "Wohnzimmer",
            Self::Kitchen => "Küche",
            Self::Bathroom => "Badezimmer",
            Self::Bedroom => "Schlafzimmer",
            Self::DiningRoom => "Esszimmer",
            Self::Office => "Büro",
            Self::LaundryRoom => "Waschküche",
            Self::Garage => "Garage",
            Self::Basement => "Keller",
            Self::Attic => "Dachboden",
            Self::GuestRoom => "Gästezimmer",
            Self::Gym => "Fitnessraum",
            Self::Foyer => "Foyer",
            Self::Entryway => "Eingangsbereich",
            Self::Dummy => "Dummy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|room_type| room_type.as_str() == value || room_type.label() == value)
    }
}

/// Input value object supplied by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomRecord<'a> {
    pub room_type: RoomType,
    pub name: &'a str,
    /// Floor area in square meters.
    pub size: f64,
}

#[derive(Debug)]
pub struct Room {
    id: u32,
    name: String,
    room_type: RoomType,
    size: f64,
    devices: BTreeMap<u32, Device>,
    notifier: Notifier,
}

impl Room {
    pub fn new(id: u32, name: impl Into<String>, room_type: RoomType, size: f64) -> Self {
        Self {
            id,
            name: name.into(),
            room_type,
            size,
            devices: BTreeMap::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn from_record(id: u32, record: &RoomRecord<'_>) -> Self {
        Self::new(id, record.name, record.room_type, record.size)
    }

    /// Builds a room around already-constructed devices without emitting
    /// events. Used while loading a document.
    pub(crate) fn with_devices(
        id: u32,
        name: impl Into<String>,
        room_type: RoomType,
        size: f64,
        devices: BTreeMap<u32, Device>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            room_type,
            size,
            devices,
            notifier: Notifier::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn edit(&mut self, record: &RoomRecord<'_>) {
        self.name = record.name.to_string();
        self.room_type = record.room_type;
        self.size = record.size;
        self.notifier.emit(&ChangeEvent::field_edit(
            EntityKind::Room,
            self.id,
            ChangePayload::Room(self),
        ));
    }

    /// Inserts `device` and announces it.
    ///
    /// # Errors
    /// - `OwnerMismatch` when the device was built for another room.
    /// - `IdInUse` when the device id is already taken.
    pub fn add_device(&mut self, device: Device) -> Result<(), DomainError> {
        if device.owner_id() != self.id {
            return Err(DomainError::OwnerMismatch {
                room_id: self.id,
                owner_id: device.owner_id(),
            });
        }
        let device_id = device.id();
        if self.devices.contains_key(&device_id) {
            return Err(DomainError::IdInUse {
                kind: EntityKind::Device,
                id: device_id,
            });
        }
        self.devices.insert(device_id, device);
        if let Some(device) = self.devices.get(&device_id) {
            self.notifier.emit(&ChangeEvent::child_added(
                EntityKind::Device,
                device_id,
                ChangePayload::Device(device),
            ));
        }
        Ok(())
    }

    /// Creates a device under the next free id and returns that id.
    pub fn add_device_from_record(&mut self, record: &DeviceRecord<'_>) -> Result<u32, DomainError> {
        let device_id = self.free_device_id();
        let device = Device::from_record(device_id, self.id, record)?;
        self.add_device(device)?;
        Ok(device_id)
    }

    pub fn remove_device(&mut self, device_id: u32) -> Result<Device, DomainError> {
        let device = self
            .devices
            .remove(&device_id)
            .ok_or(DomainError::DeviceNotFound {
                room_id: self.id,
                device_id,
            })?;
        device.detach();
        self.notifier
            .emit(&ChangeEvent::child_removed(EntityKind::Device, device_id));
        Ok(device)
    }

    pub fn device(&self, device_id: u32) -> Option<&Device> {
        self.devices.get(&device_id)
    }

    pub fn device_mut(&mut self, device_id: u32) -> Option<&mut Device> {
        self.devices.get_mut(&device_id)
    }

    /// Smallest unused device id, starting at 1.
    pub fn free_device_id(&self) -> u32 {
        free_id(&self.devices)
    }

    /// Devices in ascending id order.
    pub fn all_devices(&self) -> Vec<&Device> {
        self.devices.values().collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        self.devices
            .values()
            .map(Device::yearly_consumption_watt_seconds)
            .fold(0, u64::saturating_add)
    }

    pub fn to_record(&self) -> RoomRecord<'_> {
        RoomRecord {
            room_type: self.room_type,
            name: &self.name,
            size: self.size,
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    /// Wires the converter that mirrors this entity, replacing an earlier one.
    pub(crate) fn bind(&self, listener: Listener) {
        self.notifier.bind(listener);
    }

    /// Detaches this room and every device it owns.
    pub(crate) fn detach(&self) {
        self.notifier.clear();
        for device in self.devices.values() {
            device.detach();
        }
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.room_type == other.room_type
            && self.size == other.size
            && self.devices == other.devices
    }
}

/// Smallest key `>= 1` missing from `map`.
pub(crate) fn free_id<V>(map: &BTreeMap<u32, V>) -> u32 {
    let mut candidate = 1;
    while map.contains_key(&candidate) {
        candidate += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::{Room, RoomType};
    use crate::model::change::listener;
    use crate::model::device::{Device, DeviceCategory, ElectricConsumption};
    use crate::model::error::DomainError;
    use crate::model::units::{EnergyUnit, TimeUnit};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn lamp(id: u32, owner_id: u32) -> Device {
        Device::wired(
            id,
            owner_id,
            "Lamp",
            DeviceCategory::Lighting,
            ElectricConsumption {
                power_watt_seconds: 60,
                yearly_usage_seconds: 3_600,
                usage_unit: TimeUnit::Hour,
                usage_per_unit: TimeUnit::Day,
                energy_unit: EnergyUnit::WattSecond,
            },
        )
    }

    #[test]
    fn free_device_id_fills_gaps() {
        let mut room = Room::new(1, "Office", RoomType::Office, 12.0);
        room.add_device(lamp(1, 1)).unwrap();
        room.add_device(lamp(3, 1)).unwrap();
        assert_eq!(room.free_device_id(), 2);
        room.add_device(lamp(2, 1)).unwrap();
        assert_eq!(room.free_device_id(), 4);
    }

    #[test]
    fn add_device_rejects_foreign_owner_and_duplicate_id() {
        let mut room = Room::new(2, "Kitchen", RoomType::Kitchen, 9.5);
        assert_eq!(
            room.add_device(lamp(1, 7)),
            Err(DomainError::OwnerMismatch {
                room_id: 2,
                owner_id: 7
            })
        );
        room.add_device(lamp(1, 2)).unwrap();
        assert!(matches!(
            room.add_device(lamp(1, 2)),
            Err(DomainError::IdInUse { id: 1, .. })
        ));
    }

    #[test]
    fn remove_device_detaches_listeners() {
        let mut room = Room::new(1, "Office", RoomType::Office, 12.0);
        room.add_device(lamp(1, 1)).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        room.device(1)
            .unwrap()
            .subscribe(listener(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        let removed = room.remove_device(1).unwrap();
        assert_eq!(removed.listener_count(), 0);
        assert_eq!(room.device_count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn room_type_parses_wire_name_and_label() {
        assert_eq!(RoomType::parse("LIVING_ROOM"), Some(RoomType::LivingRoom));
        assert_eq!(RoomType::parse("Wohnzimmer"), Some(RoomType::LivingRoom));
        assert_eq!(RoomType::parse("Ballroom"), None);
    }
}
