//! Core persistence logic for ElectriScan.
//! This crate keeps the in-memory household graph and its JSON documents in
//! sync and owns every household file in the storage directory.

pub mod config;
pub mod convert;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use config::{ConfigError, StorageConfig};
pub use convert::{DeviceConverter, HouseholdConverter, RoomConverter, SolarPanelConverter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::change::{listener, ChangeEvent, ChangeKind, ChangePayload, EntityKind, Listener};
pub use model::device::{
    BatteryConsumption, Consumption, Device, DeviceCategory, DeviceKind, DeviceRecord,
    ElectricConsumption,
};
pub use model::error::DomainError;
pub use model::household::{Household, HouseholdRecord};
pub use model::room::{Room, RoomRecord, RoomType};
pub use model::solar_panel::{Orientation, SolarPanel, SolarRecord};
pub use model::units::{EnergyUnit, TimeUnit};
pub use repo::{Catalog, CatalogEntry, DocumentRecord, ScanReport, SharedHousehold, StoreError};
pub use schema::{Document, SchemaError};
pub use service::{PersistenceError, PersistenceManager, PersistenceResult, SwitchOutcome};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
