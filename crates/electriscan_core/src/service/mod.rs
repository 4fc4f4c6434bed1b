//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog, converters and document files into the household
//!   lifecycle used by the UI layer.
//! - Run the background autosave cycle.
//!
//! # See also
//! - crate::repo

pub mod autosave;
pub mod persistence;

pub use autosave::AutosaveTimer;
pub use persistence::{PersistenceError, PersistenceManager, PersistenceResult, SwitchOutcome};
