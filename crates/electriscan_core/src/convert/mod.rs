//! Bidirectional entity ↔ document converters.
//!
//! # Responsibility
//! - Build domain entities from validated household documents.
//! - Keep a cached document per entity and patch it in place on every
//!   `ChangeEvent`, then forward the patched document to the parent
//!   converter (device → room → household).
//!
//! # Invariants
//! - Converters are linked upward only through listeners; an entity never
//!   holds a reference to its parent.
//! - Each converter patches under its own mutex and emits only after the
//!   lock is released.
//! - One `ChildFieldChanged` is emitted per applied change.
//!
//! # See also
//! - crate::schema
//! - crate::model::change

mod cache;
mod device;
mod household;
mod room;
mod solar_panel;

pub use device::DeviceConverter;
pub use household::{default_household_document, validate_household_document, HouseholdConverter};
pub use room::RoomConverter;
pub use solar_panel::SolarPanelConverter;
