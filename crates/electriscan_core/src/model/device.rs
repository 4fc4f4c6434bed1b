//! Device domain model.
//!
//! # Responsibility
//! - Hold the state of one electrical consumer inside a room.
//! - Enforce the wired/electric and mobile/battery pairing.
//!
//! # Invariants
//! - `kind` never changes after construction.
//! - `consumption.kind() == kind` at all times.
//! - Every edit emits exactly one `FieldEdit` event.

use crate::model::change::{ChangeEvent, ChangePayload, EntityKind, Listener, Notifier};
use crate::model::error::DomainError;
use crate::model::units::{EnergyUnit, TimeUnit};
use serde::{Deserialize, Serialize};

/// Wired devices draw from the grid, mobile devices are charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Wired,
    Mobile,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wired => "wired",
            Self::Mobile => "mobile",
        }
    }

    pub(crate) fn consumption_name(self) -> &'static str {
        match self {
            Self::Wired => "electric",
            Self::Mobile => "battery",
        }
    }
}

/// Device category. Unknown values fall back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceCategory {
    Entertainment,
    Communication,
    Kitchen,
    Cleaning,
    Office,
    Fitness,
    Photography,
    Security,
    Lighting,
    Other,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 10] = [
        Self::Entertainment,
        Self::Communication,
        Self::Kitchen,
        Self::Cleaning,
        Self::Office,
        Self::Fitness,
        Self::Photography,
        Self::Security,
        Self::Lighting,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entertainment => "ENTERTAINMENT",
            Self::Communication => "COMMUNICATION",
            Self::Kitchen => "KITCHEN",
            Self::Cleaning => "CLEANING",
            Self::Office => "OFFICE",
            Self::Fitness => "FITNESS",
            Self::Photography => "PHOTOGRAPHY",
            Self::Security => "SECURITY",
            Self::Lighting => "LIGHTING",
            Self::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Entertainment => "Unterhaltung",
            Self::Communication => "Kommunikation",
            Self::Kitchen => "Küche",
            Self::Cleaning => "Reinigung",
            Self::Office => "Büro",
            Self::Fitness => "Fitness",
            Self::Photography => "Fotografie",
            Self::Security => "Sicherheit",
            Self::Lighting => "Beleuchtung",
            Self::Other => "Sonstiges",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value || category.label() == value)
    }
}

/// Grid consumption of a wired device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectricConsumption {
    /// Power draw, stored in watt-seconds per second of use.
    pub power_watt_seconds: u64,
    pub yearly_usage_seconds: u64,
    /// Unit the usage was entered in.
    pub usage_unit: TimeUnit,
    /// Period the usage refers to ("per day", "per week", ...).
    pub usage_per_unit: TimeUnit,
    /// Unit the power draw was entered in.
    pub energy_unit: EnergyUnit,
}

impl ElectricConsumption {
    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        self.power_watt_seconds.saturating_mul(self.yearly_usage_seconds) / TimeUnit::Hour.factor()
    }
}

/// Charging consumption of a mobile device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryConsumption {
    pub charging_cycles_per_year: u64,
    pub capacity_watt_seconds: u64,
    /// Unit the charging cycle count was entered in.
    pub cycle_unit: TimeUnit,
    pub energy_unit: EnergyUnit,
}

impl BatteryConsumption {
    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        self.charging_cycles_per_year
            .saturating_mul(self.capacity_watt_seconds)
            / TimeUnit::Hour.factor()
    }
}

/// Exactly one consumption variant per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    Electric(ElectricConsumption),
    Battery(BatteryConsumption),
}

impl Consumption {
    /// Device kind this variant belongs to.
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Electric(_) => DeviceKind::Wired,
            Self::Battery(_) => DeviceKind::Mobile,
        }
    }

    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        match self {
            Self::Electric(value) => value.yearly_consumption_watt_seconds(),
            Self::Battery(value) => value.yearly_consumption_watt_seconds(),
        }
    }
}

/// Input value object supplied by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceRecord<'a> {
    pub kind: DeviceKind,
    pub name: &'a str,
    pub category: DeviceCategory,
    pub consumption: Consumption,
}

/// One device owned by a room.
#[derive(Debug)]
pub struct Device {
    id: u32,
    owner_id: u32,
    kind: DeviceKind,
    name: String,
    category: DeviceCategory,
    consumption: Consumption,
    notifier: Notifier,
}

impl Device {
    /// Creates a device, rejecting a consumption variant that does not fit `kind`.
    pub fn new(
        id: u32,
        owner_id: u32,
        kind: DeviceKind,
        name: impl Into<String>,
        category: DeviceCategory,
        consumption: Consumption,
    ) -> Result<Self, DomainError> {
        require_consumption(kind, &consumption)?;
        Ok(Self {
            id,
            owner_id,
            kind,
            name: name.into(),
            category,
            consumption,
            notifier: Notifier::new(),
        })
    }

    pub fn wired(
        id: u32,
        owner_id: u32,
        name: impl Into<String>,
        category: DeviceCategory,
        consumption: ElectricConsumption,
    ) -> Self {
        Self {
            id,
            owner_id,
            kind: DeviceKind::Wired,
            name: name.into(),
            category,
            consumption: Consumption::Electric(consumption),
            notifier: Notifier::new(),
        }
    }

    pub fn mobile(
        id: u32,
        owner_id: u32,
        name: impl Into<String>,
        category: DeviceCategory,
        consumption: BatteryConsumption,
    ) -> Self {
        Self {
            id,
            owner_id,
            kind: DeviceKind::Mobile,
            name: name.into(),
            category,
            consumption: Consumption::Battery(consumption),
            notifier: Notifier::new(),
        }
    }

    pub fn from_record(id: u32, owner_id: u32, record: &DeviceRecord<'_>) -> Result<Self, DomainError> {
        Self::new(
            id,
            owner_id,
            record.kind,
            record.name,
            record.category,
            record.consumption,
        )
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_wired(&self) -> bool {
        self.kind == DeviceKind::Wired
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> DeviceCategory {
        self.category
    }

    pub fn consumption(&self) -> &Consumption {
        &self.consumption
    }

    /// Electric consumption, present only for wired devices.
    pub fn electric(&self) -> Option<&ElectricConsumption> {
        match &self.consumption {
            Consumption::Electric(value) => Some(value),
            Consumption::Battery(_) => None,
        }
    }

    /// Battery consumption, present only for mobile devices.
    pub fn battery(&self) -> Option<&BatteryConsumption> {
        match &self.consumption {
            Consumption::Battery(value) => Some(value),
            Consumption::Electric(_) => None,
        }
    }

    pub fn yearly_consumption_watt_seconds(&self) -> u64 {
        self.consumption.yearly_consumption_watt_seconds()
    }

    /// Replaces name, category and consumption in one edit.
    ///
    /// Nothing changes when the consumption variant does not match the
    /// device kind.
    pub fn edit(&mut self, record: &DeviceRecord<'_>) -> Result<(), DomainError> {
        require_consumption(self.kind, &record.consumption)?;
        if record.kind != self.kind {
            return Err(DomainError::ConsumptionTypeMismatch {
                expected: self.kind,
                found: record.kind,
            });
        }
        self.name = record.name.to_string();
        self.category = record.category;
        self.consumption = record.consumption;
        self.notifier.emit(&ChangeEvent::field_edit(
            EntityKind::Device,
            self.id,
            ChangePayload::Device(self),
        ));
        Ok(())
    }

    pub fn to_record(&self) -> DeviceRecord<'_> {
        DeviceRecord {
            kind: self.kind,
            name: &self.name,
            category: self.category,
            consumption: self.consumption,
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

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.owner_id == other.owner_id
            && self.kind == other.kind
            && self.name == other.name
            && self.category == other.category
            && self.consumption == other.consumption
    }
}

fn require_consumption(kind: DeviceKind, consumption: &Consumption) -> Result<(), DomainError> {
    if consumption.kind() != kind {
        return Err(DomainError::ConsumptionTypeMismatch {
            expected: kind,
            found: consumption.kind(),
        });
    }
    Ok(())
}
