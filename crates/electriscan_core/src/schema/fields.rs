//! Wire field names and per-entity property tables.

use crate::model::change::EntityKind;
use crate::model::device::{Consumption, Device};
use crate::model::household::Household;
use crate::model::room::Room;
use crate::model::solar_panel::SolarPanel;
use crate::model::units::{EnergyUnit, TimeUnit};
use crate::schema::{EntitySchema, FieldType, PropertyDescriptor};
use serde::Serialize;
use serde_json::Value;

/// Dense catalog id, rewritten on every scan.
pub const ID_FIELD: &str = "id";
/// Tombstone flag; absent means live.
pub const DELETE_FIELD: &str = "delete";

pub const HOUSEHOLD_NAME: &str = "HOUSEHOLD_NAME";
pub const NUMBER_OF_RESIDENTS: &str = "NUMBER_OF_RESIDENTS";
pub const POSTAL_CODE: &str = "POSTAL_CODE";
pub const ROOMS_FIELD: &str = "rooms";
pub const SOLAR_PANELS_FIELD: &str = "solarPanels";

pub const ROOM_ID: &str = "ROOM_ID";
pub const ROOM_NAME: &str = "ROOM_NAME";
pub const ROOM_TYPE: &str = "ROOM_TYPE";
pub const ROOM_SIZE: &str = "ROOM_SIZE";
pub const DEVICES_FIELD: &str = "devices";

pub const SOLAR_PANEL_ID: &str = "SOLAR_PANEL_ID";
pub const SOLAR_PANEL_NAME: &str = "SOLAR_PANEL_NAME";
pub const SOLAR_PANEL_AREA: &str = "SOLAR_PANEL_AREA";
pub const ORIENTATION: &str = "ORIENTATION";

pub const DEVICE_ID: &str = "DEVICE_ID";
pub const IS_WIRED: &str = "IS_WIRED";
pub const DEVICE_NAME: &str = "DEVICE_NAME";
pub const DEVICE_CATEGORY: &str = "DEVICE_CATEGORY";
pub const POWER_CONSUMPTION: &str = "POWER_CONSUMPTION";
pub const POWER_CONSUMPTION_UNIT: &str = "POWER_CONSUMPTION_UNIT";
pub const USAGE: &str = "USAGE";
pub const USAGE_UNIT: &str = "USAGE_UNIT";
pub const USAGE_PER_UNIT: &str = "USAGE_PER_UNIT";
pub const BATTERY_CAPACITY: &str = "BATTERY_CAPACITY";
pub const BATTERY_CAPACITY_UNIT: &str = "BATTERY_CAPACITY_UNIT";
pub const CHARGING_CYCLE: &str = "CHARGING_CYCLE";
pub const CHARGING_CYCLE_UNIT: &str = "CHARGING_CYCLE_UNIT";

const fn property<E>(
    name: &'static str,
    field_type: FieldType,
    accessor: fn(&E) -> Value,
) -> PropertyDescriptor<E> {
    PropertyDescriptor {
        name,
        field_type,
        accessor,
    }
}

/// Wire name of an enumerated value.
///
/// Unit variants always serialize to a string; `Null` is unreachable and
/// would be rejected by validation.
fn wire<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Non-finite floats would serialize as `null`; store them as zero instead.
fn number(value: f64) -> Value {
    if value.is_finite() {
        Value::from(value)
    } else {
        Value::from(0)
    }
}

static HOUSEHOLD_PROPERTIES: [PropertyDescriptor<Household>; 3] = [
    property(HOUSEHOLD_NAME, FieldType::Text, |h: &Household| Value::from(h.name())),
    property(NUMBER_OF_RESIDENTS, FieldType::Integer, |h: &Household| {
        Value::from(h.residents())
    }),
    property(POSTAL_CODE, FieldType::Integer, |h: &Household| Value::from(h.postal_code())),
];

static ROOM_PROPERTIES: [PropertyDescriptor<Room>; 4] = [
    property(ROOM_ID, FieldType::Integer, |r: &Room| Value::from(r.id())),
    property(ROOM_NAME, FieldType::Text, |r: &Room| Value::from(r.name())),
    property(ROOM_TYPE, FieldType::Text, |r: &Room| wire(r.room_type())),
    property(ROOM_SIZE, FieldType::Number, |r: &Room| number(r.size())),
];

static SOLAR_PANEL_PROPERTIES: [PropertyDescriptor<SolarPanel>; 4] = [
    property(SOLAR_PANEL_ID, FieldType::Integer, |p: &SolarPanel| Value::from(p.id())),
    property(SOLAR_PANEL_NAME, FieldType::Text, |p: &SolarPanel| Value::from(p.name())),
    property(SOLAR_PANEL_AREA, FieldType::Number, |p: &SolarPanel| number(p.area())),
    property(ORIENTATION, FieldType::Text, |p: &SolarPanel| {
        wire(p.orientation())
    }),
];

static DEVICE_PROPERTIES: [PropertyDescriptor<Device>; 13] = [
    property(DEVICE_ID, FieldType::Integer, |d: &Device| Value::from(d.id())),
    property(IS_WIRED, FieldType::Boolean, |d: &Device| Value::from(d.is_wired())),
    property(DEVICE_NAME, FieldType::Text, |d: &Device| Value::from(d.name())),
    property(DEVICE_CATEGORY, FieldType::Text, |d: &Device| {
        wire(d.category())
    }),
    property(POWER_CONSUMPTION, FieldType::Number, |d: &Device| {
        Value::from(d.electric().map_or(0, |e| e.power_watt_seconds))
    }),
    property(POWER_CONSUMPTION_UNIT, FieldType::Text, |d: &Device| {
        let unit = match d.consumption() {
            Consumption::Electric(e) => e.energy_unit,
            Consumption::Battery(_) => EnergyUnit::WattSecond,
        };
        wire(unit)
    }),
    property(USAGE, FieldType::Number, |d: &Device| {
        Value::from(d.electric().map_or(0, |e| e.yearly_usage_seconds))
    }),
    property(USAGE_UNIT, FieldType::Text, |d: &Device| {
        let unit = d.electric().map_or(TimeUnit::Second, |e| e.usage_unit);
        wire(unit)
    }),
    property(USAGE_PER_UNIT, FieldType::Text, |d: &Device| {
        let unit = d.electric().map_or(TimeUnit::Second, |e| e.usage_per_unit);
        wire(unit)
    }),
    property(BATTERY_CAPACITY, FieldType::Number, |d: &Device| {
        Value::from(d.battery().map_or(0, |b| b.capacity_watt_seconds))
    }),
    property(BATTERY_CAPACITY_UNIT, FieldType::Text, |d: &Device| {
        let unit = d.battery().map_or(EnergyUnit::WattSecond, |b| b.energy_unit);
        wire(unit)
    }),
    property(CHARGING_CYCLE, FieldType::Number, |d: &Device| {
        Value::from(d.battery().map_or(0, |b| b.charging_cycles_per_year))
    }),
    property(CHARGING_CYCLE_UNIT, FieldType::Text, |d: &Device| {
        let unit = d.battery().map_or(TimeUnit::Second, |b| b.cycle_unit);
        wire(unit)
    }),
];

impl EntitySchema for Household {
    const KIND: EntityKind = EntityKind::Household;

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &HOUSEHOLD_PROPERTIES
    }
}

impl EntitySchema for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &ROOM_PROPERTIES
    }
}

impl EntitySchema for SolarPanel {
    const KIND: EntityKind = EntityKind::SolarPanel;

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &SOLAR_PANEL_PROPERTIES
    }
}

impl EntitySchema for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn properties() -> &'static [PropertyDescriptor<Self>] {
        &DEVICE_PROPERTIES
    }
}
