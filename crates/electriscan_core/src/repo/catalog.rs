//! Catalog of household documents in one storage directory.
//!
//! # Responsibility
//! - Enumerate document files and register the valid ones.
//! - Assign dense ids `1..=n` in file-name order and persist them in each
//!   file's `id` field.
//! - Separate tombstoned files from live ones.
//!
//! # Invariants
//! - After `scan` or `resort`, record `k` sits at index `k - 1`.
//! - Records that already loaded their household survive a rescan.
//! - Tombstones are queued for deletion on the first scan only.

use crate::convert::validate_household_document;
use crate::repo::document::{is_tombstoned, list_documents, read_document, write_document, StoreResult};
use crate::repo::record::DocumentRecord;
use crate::schema::{Document, HOUSEHOLD_NAME, ID_FIELD};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Outcome of one scan besides the registered records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Tombstoned files to delete physically.
    pub queued_deletions: Vec<PathBuf>,
    /// Unreadable or schema-invalid files left out of the catalog.
    pub skipped: Vec<PathBuf>,
}

/// Read-only view of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u32,
    pub display_name: String,
    pub path: PathBuf,
    pub loaded: bool,
}

#[derive(Debug)]
pub struct Catalog {
    directory: PathBuf,
    records: Vec<DocumentRecord>,
    scanned: bool,
}

impl Catalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            records: Vec::new(),
            scanned: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Rebuilds the record list from the directory contents.
    ///
    /// Per-file problems are logged and reported in `ScanReport::skipped`;
    /// only a failure to list the directory is returned as an error.
    pub fn scan(&mut self) -> StoreResult<ScanReport> {
        let paths = list_documents(&self.directory)?;
        let first_scan = !self.scanned;
        self.scanned = true;

        let mut previous = std::mem::take(&mut self.records);
        let mut report = ScanReport::default();

        for path in paths {
            let doc = match read_document(&path) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(
                        "event=catalog_scan module=repo status=skip reason=unreadable error={}",
                        err
                    );
                    report.skipped.push(path);
                    continue;
                }
            };

            if is_tombstoned(&doc) {
                if first_scan {
                    debug!(
                        "event=catalog_scan module=repo status=skip reason=tombstone queued=true path={}",
                        path.display()
                    );
                    report.queued_deletions.push(path);
                }
                continue;
            }

            if let Err(err) = validate_household_document(&doc) {
                warn!(
                    "event=catalog_scan module=repo status=skip reason=schema path={} error={}",
                    path.display(),
                    err
                );
                report.skipped.push(path);
                continue;
            }

            let id = self.next_id();
            persist_id(&path, doc.clone(), id);
            let display_name = display_name_of(&doc);
            let record = match previous.iter().position(|record| record.path() == path) {
                Some(index) => {
                    let mut record = previous.swap_remove(index);
                    record.assign_id(id);
                    record.set_display_name(display_name);
                    record
                }
                None => DocumentRecord::new(id, display_name, path),
            };
            self.records.push(record);
        }

        info!(
            "event=catalog_scan module=repo status=ok records={} queued_deletions={} skipped={}",
            self.records.len(),
            report.queued_deletions.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Re-sorts by file name, reassigns dense ids and rewrites every file's
    /// `id` field.
    pub fn resort(&mut self) {
        self.records
            .sort_by(|left, right| left.path().file_name().cmp(&right.path().file_name()));
        for (index, record) in self.records.iter_mut().enumerate() {
            let id = dense_id(index);
            record.assign_id(id);
            match read_document(record.path()) {
                Ok(doc) => persist_id(record.path(), doc, id),
                Err(err) => warn!(
                    "event=catalog_resort module=repo status=error error={}",
                    err
                ),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: u32) -> Option<&DocumentRecord> {
        self.index_of(id).map(|index| &self.records[index])
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut DocumentRecord> {
        self.index_of(id).map(|index| &mut self.records[index])
    }

    /// Takes record `id` out of the catalog without renumbering the rest.
    pub fn remove(&mut self, id: u32) -> Option<DocumentRecord> {
        self.index_of(id).map(|index| self.records.remove(index))
    }

    /// Id of the record backed by `path`.
    pub fn id_of(&self, path: &Path) -> Option<u32> {
        self.records
            .iter()
            .find(|record| record.path() == path)
            .map(DocumentRecord::id)
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.records
            .iter()
            .map(|record| CatalogEntry {
                id: record.id(),
                display_name: record.display_name().to_string(),
                path: record.path().to_path_buf(),
                loaded: record.is_loaded(),
            })
            .collect()
    }

    /// Id the next registered record would receive.
    pub fn next_id(&self) -> u32 {
        dense_id(self.records.len())
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }
}

fn dense_id(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn display_name_of(doc: &Document) -> String {
    doc.get(HOUSEHOLD_NAME)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Writes `id` into the file unless it is already there.
fn persist_id(path: &Path, mut doc: Document, id: u32) {
    let id_value = Value::from(id);
    if doc.get(ID_FIELD) == Some(&id_value) {
        return;
    }
    doc.insert(ID_FIELD.to_string(), id_value);
    if let Err(err) = write_document(path, &doc) {
        warn!(
            "event=catalog_id_write module=repo status=error id={} error={}",
            id, err
        );
    }
}
