//! Device converter: the leaf of the propagation chain.
//!
//! # Responsibility
//! - Build a `Device` from one entry of a room's `devices` array.
//! - Patch that entry when the device's fields change and hand the patched
//!   document to the owning room converter.
//!
//! # Invariants
//! - The device's kind follows `IS_WIRED`; consumption fields of the other
//!   kind are neither read nor written.
//! - A device is bound to at most one converter. Converting it again moves
//!   the binding.
//!
//! # See also
//! - crate::convert::room
//! - crate::model::device

use crate::convert::cache::DocumentCache;
use crate::model::change::{listener, ChangeEvent, ChangeKind, ChangePayload, EntityKind, Listener};
use crate::model::device::{
    BatteryConsumption, Device, DeviceCategory, ElectricConsumption,
};
use crate::model::units::{EnergyUnit, TimeUnit};
use crate::schema::{
    read_bool, read_enum, read_text, read_u32, read_u64, validate, write_fields, Document,
    SchemaError, BATTERY_CAPACITY, BATTERY_CAPACITY_UNIT, CHARGING_CYCLE, CHARGING_CYCLE_UNIT,
    DEVICE_CATEGORY, DEVICE_ID, DEVICE_NAME, IS_WIRED, POWER_CONSUMPTION, POWER_CONSUMPTION_UNIT,
    USAGE, USAGE_PER_UNIT, USAGE_UNIT,
};
use log::debug;
use std::sync::Arc;

const KIND: EntityKind = EntityKind::Device;

/// Keeps one device document in sync with its `Device`.
///
/// `owner_id` is the room the converted devices belong to. It becomes the
/// owner id of every device built here. Clones share the cached document.
#[derive(Debug, Clone)]
pub struct DeviceConverter {
    cache: Arc<DocumentCache>,
    owner_id: u32,
}

impl DeviceConverter {
    /// Creates a converter for devices owned by room `owner_id`.
    pub fn new(owner_id: u32) -> Self {
        Self {
            cache: Arc::new(DocumentCache::default()),
            owner_id,
        }
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    pub fn subscribe(&self, listener: Listener) {
        self.cache.subscribe(listener);
    }

    pub fn from_document(&self, doc: &Document) -> Result<Device, SchemaError> {
        validate::<Device>(doc)?;
        let id = read_u32(doc, KIND, DEVICE_ID)?;
        let name = read_text(doc, KIND, DEVICE_NAME)?;
        let category = read_enum(
            doc,
            KIND,
            DEVICE_CATEGORY,
            DeviceCategory::parse,
            DeviceCategory::Other,
        )?;

        let device = if read_bool(doc, KIND, IS_WIRED)? {
            Device::wired(id, self.owner_id, name, category, read_electric(doc)?)
        } else {
            Device::mobile(id, self.owner_id, name, category, read_battery(doc)?)
        };

        self.cache.replace(id, doc.clone());
        device.bind(self.listener());
        Ok(device)
    }

    pub fn to_document(&self, device: &Device) -> Document {
        let mut doc = Document::new();
        write_fields(device, &mut doc);
        self.cache.replace(device.id(), doc.clone());
        device.bind(self.listener());
        doc
    }

    pub fn apply_change(&self, event: &ChangeEvent<'_>) {
        let patched = match (event.kind, event.payload) {
            (ChangeKind::FieldEdit, ChangePayload::Device(device)) => {
                self.cache.patch(|doc| write_fields(device, doc))
            }
            _ => {
                debug!(
                    "event=change_ignored module=convert status=skip converter=device kind={:?} source={}",
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

    fn listener(&self) -> Listener {
        let converter = self.clone();
        listener(move |event| converter.apply_change(event))
    }
}

fn read_electric(doc: &Document) -> Result<ElectricConsumption, SchemaError> {
    Ok(ElectricConsumption {
        power_watt_seconds: read_u64(doc, KIND, POWER_CONSUMPTION)?,
        yearly_usage_seconds: read_u64(doc, KIND, USAGE)?,
        usage_unit: read_time_unit(doc, USAGE_UNIT)?,
        usage_per_unit: read_time_unit(doc, USAGE_PER_UNIT)?,
        energy_unit: read_energy_unit(doc, POWER_CONSUMPTION_UNIT)?,
    })
}

fn read_battery(doc: &Document) -> Result<BatteryConsumption, SchemaError> {
    Ok(BatteryConsumption {
        charging_cycles_per_year: read_u64(doc, KIND, CHARGING_CYCLE)?,
        capacity_watt_seconds: read_u64(doc, KIND, BATTERY_CAPACITY)?,
        cycle_unit: read_time_unit(doc, CHARGING_CYCLE_UNIT)?,
        energy_unit: read_energy_unit(doc, BATTERY_CAPACITY_UNIT)?,
    })
}

fn read_time_unit(doc: &Document, field: &'static str) -> Result<TimeUnit, SchemaError> {
    read_enum(doc, KIND, field, TimeUnit::parse, TimeUnit::Second)
}

fn read_energy_unit(doc: &Document, field: &'static str) -> Result<EnergyUnit, SchemaError> {
    read_enum(doc, KIND, field, EnergyUnit::parse, EnergyUnit::WattSecond)
}
