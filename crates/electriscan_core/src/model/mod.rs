//! Household energy domain model.
//!
//! # Responsibility
//! - Define the in-memory object graph edited by the UI layer.
//! - Announce every mutation as a `ChangeEvent` so converters can keep their
//!   documents in sync.
//!
//! # Invariants
//! - Ownership is a strict tree: household owns rooms and solar panels, rooms
//!   own devices. Parents are referenced by plain ids only.
//! - Entities never touch the filesystem.
//!
//! # See also
//! - crate::convert

pub mod change;
pub mod device;
pub mod error;
pub mod household;
pub mod room;
pub mod solar_panel;
pub mod units;
