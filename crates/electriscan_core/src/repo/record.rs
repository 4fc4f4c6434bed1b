//! Catalog record with lazy household loading.

use crate::convert::HouseholdConverter;
use crate::model::household::Household;
use crate::repo::document::{read_document, StoreError, StoreResult};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Household shared between the caller and the persistence layer.
pub type SharedHousehold = Arc<Mutex<Household>>;

#[derive(Debug)]
struct Loaded {
    household: SharedHousehold,
    converter: HouseholdConverter,
}

/// One catalog entry.
///
/// The path is the stable identity; the id is reassigned whenever the
/// catalog is rebuilt.
#[derive(Debug)]
pub struct DocumentRecord {
    id: u32,
    display_name: String,
    path: PathBuf,
    loaded: Option<Loaded>,
}

impl DocumentRecord {
    pub(crate) fn new(id: u32, display_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            path,
            loaded: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Household name captured when the file was last scanned.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Parses and converts the backing file on first call; afterwards
    /// returns the same shared household.
    ///
    /// # Errors
    /// - `StoreError::Io` when the file vanished or is unreadable.
    /// - `StoreError::Json` / `NotAnObject` / `Schema` for malformed content.
    pub fn load(&mut self) -> StoreResult<SharedHousehold> {
        if let Some(loaded) = &self.loaded {
            return Ok(Arc::clone(&loaded.household));
        }

        let doc = read_document(&self.path)?;
        let converter = HouseholdConverter::new();
        let household = converter
            .from_document(&doc)
            .map_err(|source| StoreError::Schema {
                path: self.path.clone(),
                source,
            })?;
        converter.set_catalog_id(self.id);

        let household = Arc::new(Mutex::new(household));
        info!(
            "event=household_load module=repo status=ok id={} path={}",
            self.id,
            self.path.display()
        );
        self.loaded = Some(Loaded {
            household: Arc::clone(&household),
            converter,
        });
        Ok(household)
    }

    pub fn household(&self) -> Option<SharedHousehold> {
        self.loaded
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.household))
    }

    /// Converter holding the live document; present once loaded.
    pub fn converter(&self) -> Option<&HouseholdConverter> {
        self.loaded.as_ref().map(|loaded| &loaded.converter)
    }

    pub(crate) fn assign_id(&mut self, id: u32) {
        self.id = id;
        if let Some(loaded) = &self.loaded {
            loaded.converter.set_catalog_id(id);
        }
    }

    pub(crate) fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }
}
