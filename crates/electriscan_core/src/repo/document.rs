//! Household document files.
//!
//! # Responsibility
//! - Read and write single household documents.
//! - Allocate timestamped file names for new households.
//!
//! # Invariants
//! - Writes go through a synced sibling temp file and a rename, so a reader
//!   never observes a half-written document.
//! - On Unix the parent directory is synced after the rename.
//! - Only regular `*.json` files count as documents.

use crate::schema::{Document, SchemaError, DELETE_FIELD};
use chrono::Local;
use log::{debug, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DOCUMENT_EXTENSION: &str = "json";
const FILE_NAME_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

pub type StoreResult<T> = Result<T, StoreError>;

/// File-level failure, always tagged with the offending path.
#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    NotAnObject {
        path: PathBuf,
    },
    Schema {
        path: PathBuf,
        source: SchemaError,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::NotAnObject { path }
            | Self::Schema { path, .. } => path,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "{}: invalid JSON: {source}", path.display())
            }
            Self::NotAnObject { path } => {
                write!(f, "{}: document is not a JSON object", path.display())
            }
            Self::Schema { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::NotAnObject { .. } => None,
            Self::Schema { source, .. } => Some(source),
        }
    }
}

pub fn read_document(path: &Path) -> StoreResult<Document> {
    let bytes = fs::read(path).map_err(|err| StoreError::io(path, err))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(doc) => Ok(doc),
        _ => Err(StoreError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Replaces `path` with the pretty-printed `doc`.
pub fn write_document(path: &Path, doc: &Document) -> StoreResult<()> {
    let bytes = encode(path, doc)?;
    let temp_path = path.with_extension("json.tmp");
    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(err) = written {
        discard_temp(&temp_path);
        return Err(StoreError::io(&temp_path, err));
    }
    if let Err(err) = fs::rename(&temp_path, path) {
        discard_temp(&temp_path);
        return Err(StoreError::io(path, err));
    }
    sync_parent(path);
    Ok(())
}

fn discard_temp(temp_path: &Path) {
    if let Err(err) = fs::remove_file(temp_path) {
        warn!(
            "event=temp_cleanup module=repo status=error path={} error={}",
            temp_path.display(),
            err
        );
    }
}

/// Persists the rename itself. A failure leaves the new content in place, so
/// it is logged rather than returned.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return;
    };
    if let Err(err) = File::open(parent).and_then(|directory| directory.sync_all()) {
        warn!(
            "event=directory_sync module=repo status=error path={} error={}",
            parent.display(),
            err
        );
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}

/// Writes `doc` to a new `<timestamp>[.counter].json` file in `directory`.
///
/// Existing files are never overwritten; the counter is bumped instead.
pub fn create_document(directory: &Path, doc: &Document) -> StoreResult<PathBuf> {
    let bytes = encode(directory, doc)?;
    let stem = Local::now().format(FILE_NAME_TIMESTAMP).to_string();
    let mut counter = 0u32;
    loop {
        let path = directory.join(document_file_name(&stem, counter));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&bytes)
                    .and_then(|()| file.sync_all())
                    .map_err(|err| StoreError::io(&path, err))?;
                return Ok(path);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(
                    "event=file_name_taken module=repo status=skip path={}",
                    path.display()
                );
                counter += 1;
            }
            Err(err) => return Err(StoreError::io(&path, err)),
        }
    }
}

fn document_file_name(stem: &str, counter: u32) -> String {
    if counter == 0 {
        format!("{stem}.{DOCUMENT_EXTENSION}")
    } else {
        format!("{stem}.{counter}.{DOCUMENT_EXTENSION}")
    }
}

fn encode(path: &Path, doc: &Document) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_document_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == DOCUMENT_EXTENSION)
}

/// Regular document files directly inside `directory`, sorted by file name.
pub fn list_documents(directory: &Path) -> StoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(directory).map_err(|err| StoreError::io(directory, err))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| StoreError::io(directory, err))?;
        let is_file = entry
            .file_type()
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);
        let path = entry.path();
        if is_file && is_document_path(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(paths)
}

/// Returns `true` when the tombstone flag is set.
pub fn is_tombstoned(doc: &Document) -> bool {
    doc.get(DELETE_FIELD).and_then(Value::as_bool) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::{create_document, list_documents, read_document, write_document, StoreError};
    use crate::schema::Document;
    use serde_json::json;

    #[test]
    fn write_then_read_keeps_document_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.json");
        let doc: Document = json!({ "HOUSEHOLD_NAME": "Home" }).as_object().cloned().unwrap();

        write_document(&path, &doc).unwrap();
        assert_eq!(read_document(&path).unwrap(), doc);
        assert_eq!(list_documents(dir.path()).unwrap(), vec![path]);
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.json");
        std::fs::write(&path, "stale and much longer than the replacement document").unwrap();
        let doc: Document = json!({ "HOUSEHOLD_NAME": "Fresh" }).as_object().cloned().unwrap();

        write_document(&path, &doc).unwrap();
        write_document(&path, &doc).unwrap();
        assert_eq!(read_document(&path).unwrap(), doc);
        assert!(!dir.path().join("home.json.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let error = write_document(&path, &Document::new()).unwrap_err();
        assert!(matches!(error, StoreError::Io { .. }));
        assert!(!dir.path().join("taken.json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn read_rejects_non_object_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            read_document(&path),
            Err(StoreError::NotAnObject { .. })
        ));
    }

    #[test]
    fn create_never_overwrites_same_second_names() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new();
        let first = create_document(dir.path(), &doc).unwrap();
        let second = create_document(dir.path(), &doc).unwrap();
        assert_ne!(first, second);
        assert_eq!(list_documents(dir.path()).unwrap().len(), 2);
    }
}
