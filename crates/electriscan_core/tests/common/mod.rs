#![allow(dead_code)]

use electriscan_core::repo::write_document;
use electriscan_core::{Document, StorageConfig};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub fn object(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

pub fn wired_device(id: u32, name: &str, power: u64) -> Value {
    json!({
        "DEVICE_ID": id,
        "IS_WIRED": true,
        "DEVICE_NAME": name,
        "DEVICE_CATEGORY": "KITCHEN",
        "POWER_CONSUMPTION": power,
        "POWER_CONSUMPTION_UNIT": "WATT_HOUR",
        "USAGE": 3_600,
        "USAGE_UNIT": "HOUR",
        "USAGE_PER_UNIT": "DAY",
        "BATTERY_CAPACITY": 0,
        "BATTERY_CAPACITY_UNIT": "WATT_SECOND",
        "CHARGING_CYCLE": 0,
        "CHARGING_CYCLE_UNIT": "SECOND",
    })
}

pub fn mobile_device(id: u32, name: &str, capacity: u64) -> Value {
    json!({
        "DEVICE_ID": id,
        "IS_WIRED": false,
        "DEVICE_NAME": name,
        "DEVICE_CATEGORY": "COMMUNICATION",
        "POWER_CONSUMPTION": 0,
        "POWER_CONSUMPTION_UNIT": "WATT_SECOND",
        "USAGE": 0,
        "USAGE_UNIT": "SECOND",
        "USAGE_PER_UNIT": "SECOND",
        "BATTERY_CAPACITY": capacity,
        "BATTERY_CAPACITY_UNIT": "WATT_HOUR",
        "CHARGING_CYCLE": 365,
        "CHARGING_CYCLE_UNIT": "YEAR",
    })
}

pub fn room(id: u32, name: &str, devices: Vec<Value>) -> Value {
    json!({
        "ROOM_ID": id,
        "ROOM_NAME": name,
        "ROOM_TYPE": "KITCHEN",
        "ROOM_SIZE": 14.5,
        "devices": devices,
    })
}

pub fn solar_panel(id: u32, name: &str) -> Value {
    json!({
        "SOLAR_PANEL_ID": id,
        "SOLAR_PANEL_NAME": name,
        "SOLAR_PANEL_AREA": 6.25,
        "ORIENTATION": "SOUTH",
    })
}

/// Household with two rooms (two devices and one device) and one panel.
pub fn household(name: &str) -> Document {
    object(json!({
        "HOUSEHOLD_NAME": name,
        "NUMBER_OF_RESIDENTS": 3,
        "POSTAL_CODE": 8400,
        "rooms": [
            room(1, "Kitchen", vec![wired_device(1, "Fridge", 150), wired_device(2, "Oven", 2_000)]),
            room(2, "Office", vec![mobile_device(1, "Phone", 15)]),
        ],
        "solarPanels": [solar_panel(1, "Roof")],
    }))
}

pub fn write_household(dir: &Path, file_name: &str, doc: &Document) -> PathBuf {
    let path = dir.join(file_name);
    write_document(&path, doc).unwrap();
    path
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Storage directory whose autosave timer never fires during a test.
pub fn storage() -> (TempDir, StorageConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::new(dir.path())
        .unwrap()
        .with_autosave_interval(Duration::from_secs(3_600))
        .unwrap();
    (dir, config)
}
