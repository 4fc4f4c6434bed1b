//! Solar panel converter.
//!
//! # Responsibility
//! - Build a `SolarPanel` from one entry of `solarPanels`.
//! - Patch that entry on field edits and report it to the household
//!   converter.
//!
//! # Invariants
//! - Unknown orientations load as `Orientation::SouthWest` with a warning.
//!
//! # See also
//! - crate::convert::household

use crate::convert::cache::DocumentCache;
use crate::model::change::{listener, ChangeEvent, ChangeKind, ChangePayload, EntityKind, Listener};
use crate::model::solar_panel::{Orientation, SolarPanel};
use crate::schema::{
    read_enum, read_f64, read_text, read_u32, validate, write_fields, Document, SchemaError,
    ORIENTATION, SOLAR_PANEL_AREA, SOLAR_PANEL_ID, SOLAR_PANEL_NAME,
};
use log::debug;
use std::sync::Arc;

const KIND: EntityKind = EntityKind::SolarPanel;

/// Keeps one solar panel document in sync with its `SolarPanel`.
///
/// Clones share the cached document, so the listener bound to the panel and
/// the converter held by the caller always agree.
#[derive(Debug, Clone, Default)]
pub struct SolarPanelConverter {
    cache: Arc<DocumentCache>,
}

impl SolarPanelConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) {
        self.cache.subscribe(listener);
    }

    pub fn from_document(&self, doc: &Document) -> Result<SolarPanel, SchemaError> {
        validate::<SolarPanel>(doc)?;
        let id = read_u32(doc, KIND, SOLAR_PANEL_ID)?;
        let panel = SolarPanel::new(
            id,
            read_text(doc, KIND, SOLAR_PANEL_NAME)?,
            read_f64(doc, KIND, SOLAR_PANEL_AREA)?,
            read_enum(
                doc,
                KIND,
                ORIENTATION,
                Orientation::parse,
                Orientation::SouthWest,
            )?,
        );
        self.cache.replace(id, doc.clone());
        panel.bind(self.listener());
        Ok(panel)
    }

    pub fn to_document(&self, panel: &SolarPanel) -> Document {
        let mut doc = Document::new();
        write_fields(panel, &mut doc);
        self.cache.replace(panel.id(), doc.clone());
        panel.bind(self.listener());
        doc
    }

    pub fn apply_change(&self, event: &ChangeEvent<'_>) {
        let patched = match (event.kind, event.payload) {
            (ChangeKind::FieldEdit, ChangePayload::SolarPanel(panel)) => {
                self.cache.patch(|doc| write_fields(panel, doc))
            }
            _ => {
                debug!(
                    "event=change_ignored module=convert status=skip converter=solar_panel kind={:?}",
                    event.kind
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
