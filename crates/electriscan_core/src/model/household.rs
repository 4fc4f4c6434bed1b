//! Household aggregate root.
//!
//! # Responsibility
//! - Own rooms and solar panels of one household document.
//! - Hand out free ids for new children.
//!
//! # Invariants
//! - Room and solar panel ids are unique and `>= 1`.
//! - Household field edits are reported with id `0`; a household has no id
//!   of its own inside its document.
//! - Removed children are detached from every listener before the removal
//!   event is emitted.

use crate::model::change::{ChangeEvent, ChangePayload, EntityKind, Listener, Notifier};
use crate::model::device::Device;
use crate::model::error::DomainError;
use crate::model::room::{free_id, Room, RoomRecord};
use crate::model::solar_panel::{SolarPanel, SolarRecord};
use std::collections::BTreeMap;

pub const DEFAULT_HOUSEHOLD_NAME: &str = "Default Household";
pub const DEFAULT_POSTAL_CODE: u32 = 1000;
pub const DEFAULT_RESIDENTS: u32 = 1;

/// Input value object supplied by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseholdRecord<'a> {
    pub name: &'a str,
    pub postal_code: u32,
    pub residents: u32,
}

impl Default for HouseholdRecord<'static> {
    fn default() -> Self {
        Self {
            name: DEFAULT_HOUSEHOLD_NAME,
            postal_code: DEFAULT_POSTAL_CODE,
            residents: DEFAULT_RESIDENTS,
        }
    }
}

#[derive(Debug)]
pub struct Household {
    name: String,
    postal_code: u32,
    residents: u32,
    rooms: BTreeMap<u32, Room>,
    solar_panels: BTreeMap<u32, SolarPanel>,
    notifier: Notifier,
}

impl Household {
    pub fn new(name: impl Into<String>, postal_code: u32, residents: u32) -> Self {
        Self::with_children(name, postal_code, residents, BTreeMap::new(), BTreeMap::new())
    }

    pub fn from_record(record: &HouseholdRecord<'_>) -> Self {
        Self::new(record.name, record.postal_code, record.residents)
    }

    /// Builds a household around loaded children without emitting events.
    pub(crate) fn with_children(
        name: impl Into<String>,
        postal_code: u32,
        residents: u32,
        rooms: BTreeMap<u32, Room>,
        solar_panels: BTreeMap<u32, SolarPanel>,
    ) -> Self {
        Self {
            name: name.into(),
            postal_code,
            residents,
            rooms,
            solar_panels,
            notifier: Notifier::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn postal_code(&self) -> u32 {
        self.postal_code
    }

    pub fn residents(&self) -> u32 {
        self.residents
    }

    pub fn edit(&mut self, record: &HouseholdRecord<'_>) {
        self.name = record.name.to_string();
        self.postal_code = record.postal_code;
        self.residents = record.residents;
        self.notifier.emit(&ChangeEvent::field_edit(
            EntityKind::Household,
            0,
            ChangePayload::Household(self),
        ));
    }

    pub fn to_record(&self) -> HouseholdRecord<'_> {
        HouseholdRecord {
            name: &self.name,
            postal_code: self.postal_code,
            residents: self.residents,
        }
    }

    pub fn add_room(&mut self, room: Room) -> Result<(), DomainError> {
        let room_id = room.id();
        if self.rooms.contains_key(&room_id) {
            return Err(DomainError::IdInUse {
                kind: EntityKind::Room,
                id: room_id,
            });
        }
        self.rooms.insert(room_id, room);
        if let Some(room) = self.rooms.get(&room_id) {
            self.notifier.emit(&ChangeEvent::child_added(
                EntityKind::Room,
                room_id,
                ChangePayload::Room(room),
            ));
        }
        Ok(())
    }

    /// Creates an empty room under the next free id and returns that id.
    pub fn add_room_from_record(&mut self, record: &RoomRecord<'_>) -> Result<u32, DomainError> {
        let room_id = self.free_room_id();
        self.add_room(Room::from_record(room_id, record))?;
        Ok(room_id)
    }

    pub fn remove_room(&mut self, room_id: u32) -> Result<Room, DomainError> {
        let room = self
            .rooms
            .remove(&room_id)
            .ok_or(DomainError::RoomNotFound(room_id))?;
        room.detach();
        self.notifier
            .emit(&ChangeEvent::child_removed(EntityKind::Room, room_id));
        Ok(room)
    }

    pub fn room(&self, room_id: u32) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_mut(&mut self, room_id: u32) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    pub fn add_solar_panel(&mut self, panel: SolarPanel) -> Result<(), DomainError> {
        let panel_id = panel.id();
        if self.solar_panels.contains_key(&panel_id) {
            return Err(DomainError::IdInUse {
                kind: EntityKind::SolarPanel,
                id: panel_id,
            });
        }
        self.solar_panels.insert(panel_id, panel);
        if let Some(panel) = self.solar_panels.get(&panel_id) {
            self.notifier.emit(&ChangeEvent::child_added(
                EntityKind::SolarPanel,
                panel_id,
                ChangePayload::SolarPanel(panel),
            ));
        }
        Ok(())
    }

    pub fn add_solar_panel_from_record(
        &mut self,
        record: &SolarRecord<'_>,
    ) -> Result<u32, DomainError> {
        let panel_id = self.free_solar_panel_id();
        self.add_solar_panel(SolarPanel::from_record(panel_id, record))?;
        Ok(panel_id)
    }

    pub fn remove_solar_panel(&mut self, panel_id: u32) -> Result<SolarPanel, DomainError> {
        let panel = self
            .solar_panels
            .remove(&panel_id)
            .ok_or(DomainError::SolarPanelNotFound(panel_id))?;
        panel.detach();
        self.notifier
            .emit(&ChangeEvent::child_removed(EntityKind::SolarPanel, panel_id));
        Ok(panel)
    }

    pub fn solar_panel(&self, panel_id: u32) -> Option<&SolarPanel> {
        self.solar_panels.get(&panel_id)
    }

    pub fn solar_panel_mut(&mut self, panel_id: u32) -> Option<&mut SolarPanel> {
        self.solar_panels.get_mut(&panel_id)
    }

    pub fn free_room_id(&self) -> u32 {
        free_id(&self.rooms)
    }

    pub fn free_solar_panel_id(&self) -> u32 {
        free_id(&self.solar_panels)
    }

    pub fn all_rooms(&self) -> Vec<&Room> {
        self.rooms.values().collect()
    }

    pub fn all_solar_panels(&self) -> Vec<&SolarPanel> {
        self.solar_panels.values().collect()
    }

    /// Every device of every room, ordered by room id then device id.
    pub fn all_devices(&self) -> Vec<&Device> {
        self.rooms
            .values()
            .flat_map(|room| room.all_devices())
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn solar_panel_count(&self) -> usize {
        self.solar_panels.len()
    }

    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        self.rooms
            .values()
            .map(Room::yearly_consumption_watt_seconds)
            .fold(0, u64::saturating_add)
    }

    pub fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    /// Wires the converter that mirrors this entity, replacing an earlier one.
    pub(crate) fn bind(&self, listener: Listener) {
        self.notifier.bind(listener);
    }
}

impl Default for Household {
    fn default() -> Self {
        Self::from_record(&HouseholdRecord::default())
    }
}

impl PartialEq for Household {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.postal_code == other.postal_code
            && self.residents == other.residents
            && self.rooms == other.rooms
            && self.solar_panels == other.solar_panels
    }
}
