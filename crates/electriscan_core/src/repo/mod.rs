//! File-backed household storage.
//!
//! # Responsibility
//! - Map the storage directory onto a catalog of document records.
//! - Own document file I/O; nothing above this layer touches `std::fs`
//!   for household files except import/export copies.
//!
//! # Invariants
//! - File paths are the stable identity of a household; catalog ids are
//!   dense positions and may change on every rebuild.
//! - Errors carry the path they refer to.

pub mod catalog;
pub mod document;
pub mod record;

pub use catalog::{Catalog, CatalogEntry, ScanReport};
pub use document::{
    create_document, is_document_path, is_tombstoned, list_documents, read_document,
    write_document, StoreError, StoreResult, DOCUMENT_EXTENSION,
};
pub use record::{DocumentRecord, SharedHousehold};
