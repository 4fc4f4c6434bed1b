//! Persistence manager for the active household.
//!
//! # Responsibility
//! - Own the catalog, the active document and the autosave cycle.
//! - Order the side effects of switching, creating, deleting, importing and
//!   exporting households.
//!
//! # Invariants
//! - At most one household is active; its converter document is the only
//!   save target.
//! - A switch never loses edits: the previous document is saved first and a
//!   failed save aborts the switch.
//! - Lock order is manager state, then converter document. Converter
//!   listeners never take the manager lock.
//! - Autosave errors are logged and swallowed; every other operation
//!   returns them.

use crate::config::{ConfigError, StorageConfig};
use crate::convert::{default_household_document, validate_household_document, HouseholdConverter};
use crate::repo::{
    create_document, is_document_path, read_document, write_document, Catalog, CatalogEntry,
    ScanReport, SharedHousehold, StoreError,
};
use crate::schema::{Document, SchemaError, DELETE_FIELD};
use crate::service::autosave::AutosaveTimer;
use log::{error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug)]
pub enum PersistenceError {
    /// Requested catalog id does not exist.
    HouseholdIdOutOfRange { id: u32, available: usize },
    NoActiveHousehold,
    /// Export target resolves to the storage directory itself.
    ExportIntoStorage(PathBuf),
    /// A file with the imported name already exists in storage.
    ImportConflict(PathBuf),
    /// Import source is not a `.json` file.
    UnsupportedDocument(PathBuf),
    /// A file written by this manager did not show up after a rescan.
    NotRegistered(PathBuf),
    Store(StoreError),
    Config(ConfigError),
    Autosave(io::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HouseholdIdOutOfRange { id, available } => write!(
                f,
                "household id {id} out of range; {available} households available"
            ),
            Self::NoActiveHousehold => write!(f, "no household is active"),
            Self::ExportIntoStorage(path) => write!(
                f,
                "cannot export into the storage directory: {}",
                path.display()
            ),
            Self::ImportConflict(path) => {
                write!(f, "a household file already exists at {}", path.display())
            }
            Self::UnsupportedDocument(path) => {
                write!(f, "not a household document: {}", path.display())
            }
            Self::NotRegistered(path) => write!(
                f,
                "household file was not registered by the catalog: {}",
                path.display()
            ),
            Self::Store(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Autosave(err) => write!(f, "failed to start autosave: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Autosave(err) => Some(err),
            Self::HouseholdIdOutOfRange { .. }
            | Self::NoActiveHousehold
            | Self::ExportIntoStorage(_)
            | Self::ImportConflict(_)
            | Self::UnsupportedDocument(_)
            | Self::NotRegistered(_) => None,
        }
    }
}

impl From<StoreError> for PersistenceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ConfigError> for PersistenceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Result of a successful `switch_to`.
#[derive(Debug, Clone)]
pub enum SwitchOutcome {
    Activated(SharedHousehold),
    /// The requested household was already active; nothing was saved or
    /// loaded.
    AlreadyActive(SharedHousehold),
}

impl SwitchOutcome {
    pub fn household(&self) -> &SharedHousehold {
        match self {
            Self::Activated(household) | Self::AlreadyActive(household) => household,
        }
    }

    pub fn was_already_active(&self) -> bool {
        matches!(self, Self::AlreadyActive(_))
    }
}

#[derive(Debug)]
struct ActiveDocument {
    path: PathBuf,
    converter: HouseholdConverter,
    household: SharedHousehold,
    saved_revision: u64,
}

#[derive(Debug)]
struct ManagerState {
    config: StorageConfig,
    catalog: Catalog,
    active: Option<ActiveDocument>,
    pending_deletions: Vec<PathBuf>,
}

impl ManagerState {
    fn active_id(&self) -> u32 {
        self.active
            .as_ref()
            .and_then(|active| self.catalog.id_of(&active.path))
            .unwrap_or(0)
    }

    fn require(&self, id: u32) -> PersistenceResult<()> {
        if self.catalog.contains(id) {
            Ok(())
        } else {
            Err(PersistenceError::HouseholdIdOutOfRange {
                id,
                available: self.catalog.len(),
            })
        }
    }

    /// Writes the active document. Returns `false` when nothing is active.
    fn save_active(&mut self) -> PersistenceResult<bool> {
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };
        let (doc, revision) = active.converter.snapshot_with_revision();
        write_document(&active.path, &doc)?;
        active.saved_revision = revision;
        info!(
            "event=household_save module=service status=ok revision={} path={}",
            revision,
            active.path.display()
        );
        Ok(true)
    }

    /// Physically removes queued tombstones. Failures stay queued.
    fn flush_deletions(&mut self) {
        self.pending_deletions.retain(|path| match fs::remove_file(path) {
            Ok(()) => {
                info!(
                    "event=tombstone_purge module=service status=ok path={}",
                    path.display()
                );
                false
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!(
                    "event=tombstone_purge module=service status=error path={} error={}",
                    path.display(),
                    err
                );
                true
            }
        });
    }

    fn autosave(&mut self) -> bool {
        match self.save_active() {
            Ok(saved) => saved,
            Err(err) => {
                error!("event=autosave module=service status=error error={}", err);
                false
            }
        }
    }
}

fn lock(shared: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coordinates the storage directory, the active household and autosave.
#[derive(Debug)]
pub struct PersistenceManager {
    shared: Arc<Mutex<ManagerState>>,
    autosave: Mutex<Option<AutosaveTimer>>,
    torn_down: AtomicBool,
}

impl PersistenceManager {
    /// Scans the storage directory, purges queued tombstones and starts the
    /// autosave timer.
    ///
    /// # Errors
    /// - `Store` when the directory cannot be listed.
    /// - `Autosave` when the timer thread cannot be spawned.
    pub fn open(config: StorageConfig) -> PersistenceResult<Self> {
        let mut catalog = Catalog::new(config.storage_dir());
        let report = catalog.scan()?;
        let interval = config.autosave_interval();

        let mut state = ManagerState {
            config,
            catalog,
            active: None,
            pending_deletions: report.queued_deletions,
        };
        state.flush_deletions();

        let shared = Arc::new(Mutex::new(state));
        let weak: Weak<Mutex<ManagerState>> = Arc::downgrade(&shared);
        let timer = AutosaveTimer::start(interval, move || {
            if let Some(shared) = weak.upgrade() {
                lock(&shared).autosave();
            }
        })
        .map_err(PersistenceError::Autosave)?;

        info!(
            "event=persistence_open module=service status=ok households={}",
            lock(&shared).catalog.len()
        );
        Ok(Self {
            shared,
            autosave: Mutex::new(Some(timer)),
            torn_down: AtomicBool::new(false),
        })
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        lock(&self.shared)
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.state().config.storage_dir().to_path_buf()
    }

    /// Catalog id of the active household, `0` when none is active.
    pub fn active_id(&self) -> u32 {
        self.state().active_id()
    }

    pub fn active_household(&self) -> Option<SharedHousehold> {
        self.state()
            .active
            .as_ref()
            .map(|active| Arc::clone(&active.household))
    }

    /// Current in-memory document of the active household.
    pub fn active_document(&self) -> Option<Document> {
        self.state()
            .active
            .as_ref()
            .map(|active| active.converter.document())
    }

    /// `true` when the active document changed since it was last written.
    pub fn has_unsaved_changes(&self) -> bool {
        self.state()
            .active
            .as_ref()
            .is_some_and(|active| active.converter.revision() != active.saved_revision)
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.state().catalog.entries()
    }

    pub fn household_count(&self) -> usize {
        self.state().catalog.len()
    }

    /// Rebuilds the catalog from disk. Loaded households are kept.
    pub fn rescan(&self) -> PersistenceResult<ScanReport> {
        Ok(self.state().catalog.scan()?)
    }

    /// Makes household `id` active.
    ///
    /// Pending deletions are flushed and the previously active document is
    /// saved before the new one is loaded.
    ///
    /// # Errors
    /// - `HouseholdIdOutOfRange` for an unknown id.
    /// - `Store` when saving the previous document or loading the new one
    ///   fails; the previous household stays active in both cases.
    pub fn switch_to(&self, id: u32) -> PersistenceResult<SwitchOutcome> {
        let mut state = self.state();
        state.require(id)?;
        if state.active_id() == id {
            if let Some(active) = state.active.as_ref() {
                return Ok(SwitchOutcome::AlreadyActive(Arc::clone(&active.household)));
            }
        }

        state.flush_deletions();
        state.save_active()?;

        let available = state.catalog.len();
        let record = state
            .catalog
            .get_mut(id)
            .ok_or(PersistenceError::HouseholdIdOutOfRange { id, available })?;
        let household = record.load()?;
        let path = record.path().to_path_buf();
        let converter = record
            .converter()
            .cloned()
            .ok_or_else(|| PersistenceError::NotRegistered(path.clone()))?;

        info!(
            "event=household_switch module=service status=ok id={} path={}",
            id,
            path.display()
        );
        state.active = Some(ActiveDocument {
            path,
            saved_revision: converter.revision(),
            converter,
            household: Arc::clone(&household),
        });
        Ok(SwitchOutcome::Activated(household))
    }

    /// Writes a default household to a new timestamped file and registers
    /// it. The new household is not activated.
    pub fn create(&self) -> PersistenceResult<u32> {
        let mut state = self.state();
        let doc = default_household_document(state.catalog.next_id());
        let path = create_document(state.config.storage_dir(), &doc)?;
        state.catalog.scan()?;
        let id = state
            .catalog
            .id_of(&path)
            .ok_or_else(|| PersistenceError::NotRegistered(path.clone()))?;
        info!(
            "event=household_create module=service status=ok id={} path={}",
            id,
            path.display()
        );
        Ok(id)
    }

    /// Tombstones household `id`, drops it from the catalog and renumbers
    /// the rest. The file itself is purged before the next switch or on the
    /// next open.
    pub fn delete(&self, id: u32) -> PersistenceResult<()> {
        let mut state = self.state();
        state.require(id)?;

        let path = if state.active_id() == id {
            let Some(active) = state.active.take() else {
                return Err(PersistenceError::NoActiveHousehold);
            };
            active.converter.mark_deleted();
            let (doc, _) = active.converter.snapshot_with_revision();
            if let Err(err) = write_document(&active.path, &doc) {
                state.active = Some(active);
                return Err(err.into());
            }
            active.path
        } else {
            let path = state
                .catalog
                .get(id)
                .map(|record| record.path().to_path_buf())
                .ok_or(PersistenceError::HouseholdIdOutOfRange {
                    id,
                    available: state.catalog.len(),
                })?;
            let mut doc = read_document(&path)?;
            doc.insert(DELETE_FIELD.to_string(), Value::Bool(true));
            write_document(&path, &doc)?;
            path
        };

        state.catalog.remove(id);
        state.catalog.resort();
        state.pending_deletions.push(path.clone());
        info!(
            "event=household_delete module=service status=ok id={} path={}",
            id,
            path.display()
        );
        Ok(())
    }

    /// Saves the active household now.
    ///
    /// Returns `false` when nothing is active.
    pub fn save_active(&self) -> PersistenceResult<bool> {
        self.state().save_active()
    }

    /// One autosave cycle; errors are logged, never returned.
    pub fn autosave_tick(&self) -> bool {
        self.state().autosave()
    }

    /// Saves the active document and copies it into `target_dir`.
    ///
    /// Returns the path of the copy.
    pub fn export(&self, target_dir: &Path) -> PersistenceResult<PathBuf> {
        let mut state = self.state();
        let source = state
            .active
            .as_ref()
            .map(|active| active.path.clone())
            .ok_or(PersistenceError::NoActiveHousehold)?;
        if same_directory(target_dir, state.config.storage_dir())? {
            return Err(PersistenceError::ExportIntoStorage(target_dir.to_path_buf()));
        }
        state.save_active()?;

        let file_name = source
            .file_name()
            .ok_or_else(|| PersistenceError::UnsupportedDocument(source.clone()))?;
        let destination = target_dir.join(file_name);
        fs::copy(&source, &destination).map_err(|err| StoreError::io(&destination, err))?;
        info!(
            "event=household_export module=service status=ok path={}",
            destination.display()
        );
        Ok(destination)
    }

    /// Copies `source` into storage, validates it and registers it.
    ///
    /// The copy is tombstoned while it is being validated. When validation
    /// fails the tombstoned copy stays on disk and is purged before the next
    /// switch or on the next open.
    pub fn import(&self, source: &Path) -> PersistenceResult<u32> {
        if !is_document_path(source) {
            return Err(PersistenceError::UnsupportedDocument(source.to_path_buf()));
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| PersistenceError::UnsupportedDocument(source.to_path_buf()))?;

        let mut state = self.state();
        let destination = state.config.storage_dir().join(file_name);
        if destination.exists() {
            return Err(PersistenceError::ImportConflict(destination));
        }
        fs::copy(source, &destination).map_err(|err| StoreError::io(&destination, err))?;

        let mut doc = match read_document(&destination) {
            Ok(doc) => doc,
            Err(err) => {
                // Unparseable copies cannot carry a tombstone.
                if let Err(cleanup) = fs::remove_file(&destination) {
                    warn!(
                        "event=import_cleanup module=service status=error path={} error={}",
                        destination.display(),
                        cleanup
                    );
                }
                return Err(err.into());
            }
        };
        doc.insert(DELETE_FIELD.to_string(), Value::Bool(true));
        write_document(&destination, &doc)?;

        if let Err(err) = round_trip(&doc) {
            warn!(
                "event=household_import module=service status=error path={} error={}",
                destination.display(),
                err
            );
            state.pending_deletions.push(destination.clone());
            return Err(StoreError::Schema {
                path: destination,
                source: err,
            }
            .into());
        }

        doc.remove(DELETE_FIELD);
        write_document(&destination, &doc)?;
        state.catalog.scan()?;
        let id = state
            .catalog
            .id_of(&destination)
            .ok_or_else(|| PersistenceError::NotRegistered(destination.clone()))?;
        info!(
            "event=household_import module=service status=ok id={} path={}",
            id,
            destination.display()
        );
        Ok(id)
    }

    /// Final save, then stops autosave for good. Later calls do nothing.
    pub fn tear_down(&self) -> PersistenceResult<()> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let saved = self.state().save_active();

        let timer = self
            .autosave
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut timer) = timer {
            timer.cancel();
        }
        info!(
            "event=persistence_teardown module=service status={}",
            if saved.is_ok() { "ok" } else { "error" }
        );
        saved.map(drop)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl Drop for PersistenceManager {
    fn drop(&mut self) {
        if let Err(err) = self.tear_down() {
            error!(
                "event=persistence_teardown module=service status=error error={}",
                err
            );
        }
    }
}

/// Parses `doc` into a household and checks the regenerated document.
fn round_trip(doc: &Document) -> Result<(), SchemaError> {
    let converter = HouseholdConverter::new();
    let household = converter.from_document(doc)?;
    validate_household_document(&converter.to_document(&household))
}

fn same_directory(left: &Path, right: &Path) -> PersistenceResult<bool> {
    let left = fs::canonicalize(left).map_err(|err| StoreError::io(left, err))?;
    let right = fs::canonicalize(right).map_err(|err| StoreError::io(right, err))?;
    Ok(left == right)
}
