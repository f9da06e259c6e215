//! Florist catalog loaded from a JSON file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::events::EventCalendar;
use crate::model::{FloristDeliveryProfile, FloristId, InvalidInput};

#[derive(thiserror::Error, Debug)]
/// Catalog file could not be loaded.
pub enum CatalogError {
    /// File could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid catalog JSON.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// A florist profile breaks an invariant.
    #[error("invalid florist {florist}: {source}")]
    Invalid {
        /// Offending florist.
        florist: FloristId,
        /// What is wrong.
        #[source]
        source: InvalidInput,
    },
}

#[derive(Debug, Clone, Deserialize)]
/// Florists plus an optional event calendar override.
pub struct Catalog {
    /// Florist delivery profiles.
    pub florists: Vec<FloristDeliveryProfile>,
    /// Replaces the built-in special-event calendar when present.
    #[serde(default)]
    pub events: Option<EventCalendar>,
}

impl Catalog {
    /// Calendar to evaluate against.
    #[must_use]
    pub fn calendar(&self) -> EventCalendar {
        self.events.clone().unwrap_or_default()
    }
}

/// Read and validate a catalog file.
///
/// # Errors
///
/// Returns [`CatalogError`] when the file is unreadable, malformed, or holds an invalid profile.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = fs::read_to_string(path)?;
    let catalog = parse_catalog(&raw)?;
    tracing::info!(
        path = %path.display(),
        florists = catalog.florists.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parse and validate catalog JSON.
///
/// # Errors
///
/// Returns [`CatalogError`] when the JSON is malformed or holds an invalid profile.
pub fn parse_catalog(raw: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = serde_json::from_str(raw)?;
    for florist in &catalog.florists {
        florist.validate().map_err(|source| CatalogError::Invalid {
            florist: florist.id.clone(),
            source,
        })?;
    }
    Ok(catalog)
}
