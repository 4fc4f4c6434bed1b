//! Solar panel domain model.

use crate::model::change::{ChangeEvent, ChangePayload, EntityKind, Listener, Notifier};
use serde::{Deserialize, Serialize};

/// Compass orientation of a panel. Unknown values fall back to `SouthWest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    North,
    East,
    South,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::East => "EAST",
            Self::South => "SOUTH",
            Self::West => "WEST",
            Self::NorthEast => "NORTH_EAST",
            Self::NorthWest => "NORTH_WEST",
            Self::SouthEast => "SOUTH_EAST",
            Self::SouthWest => "SOUTH_WEST",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::North => "Norden",
            Self::East => "Osten",
            Self::South => "Süden",
            Self::West => "Westen",
            Self::NorthEast => "Nordosten",
            Self::NorthWest => "Nordwesten",
            Self::SouthEast => "Südosten",
            Self::SouthWest => "Südwesten",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|orientation| orientation.as_str() == value || orientation.label() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarRecord<'a> {
    pub name: &'a str,
    /// Panel area in square meters.
    pub area: f64,
    pub orientation: Orientation,
}

#[derive(Debug)]
pub struct SolarPanel {
    id: u32,
    name: String,
    area: f64,
    orientation: Orientation,
    notifier: Notifier,
}

impl SolarPanel {
    pub fn new(id: u32, name: impl Into<String>, area: f64, orientation: Orientation) -> Self {
        Self {
            id,
            name: name.into(),
            area,
            orientation,
            notifier: Notifier::new(),
        }
    }

    pub fn from_record(id: u32, record: &SolarRecord<'_>) -> Self {
        Self::new(id, record.name, record.area, record.orientation)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn edit(&mut self, record: &SolarRecord<'_>) {
        self.name = record.name.to_string();
        self.area = record.area;
        self.orientation = record.orientation;
        self.notifier.emit(&ChangeEvent::field_edit(
            EntityKind::SolarPanel,
            self.id,
            ChangePayload::SolarPanel(self),
        ));
    }

    pub fn to_record(&self) -> SolarRecord<'_> {
        SolarRecord {
            name: &self.name,
            area: self.area,
            orientation: self.orientation,
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        self.notifier.subscribe(listener);
    }

    /// Wires the converter that mirrors this entity, replacing an earlier one.
    pub(crate) fn bind(&self, listener: Listener) {
        self.notifier.bind(listener);
    }

    pub(crate) fn detach(&self) {
        self.notifier.clear();
    }
}

impl PartialEq for SolarPanel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.area == other.area
            && self.orientation == other.orientation
    }
}
