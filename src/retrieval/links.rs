//! Filename-to-URL mapping for source citations

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Two-column filename → URL mapping, loaded once at process start.
///
/// A lookup miss is a recoverable condition; callers render the bare
/// identifier instead.
#[derive(Debug, Clone, Default)]
pub struct LinkMap {
    entries: HashMap<String, String>,
    strip_prefix: String,
}

impl LinkMap {
    /// Create an empty map with the given corpus prefix
    pub fn empty(strip_prefix: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            strip_prefix: strip_prefix.into(),
        }
    }

    /// Load a two-column CSV file of `filename,url` rows.
    ///
    /// Failure to load the file at startup is a configuration error.
    pub fn load(path: &Path, strip_prefix: impl Into<String>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| Error::config(format!("cannot read link map {}: {}", path.display(), e)))?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| Error::config(format!("malformed link map row: {}", e)))?;
            if record.len() < 2 {
                return Err(Error::config(format!(
                    "link map rows need two columns, got {}",
                    record.len()
                )));
            }
            entries.insert(record[0].to_string(), record[1].to_string());
        }

        tracing::info!("Loaded {} link map entries from {}", entries.len(), path.display());

        Ok(Self {
            entries,
            strip_prefix: strip_prefix.into(),
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name for a source identifier: separators normalized to
    /// `/` and the corpus prefix stripped.
    pub fn display_name(&self, source_id: &str) -> String {
        let normalized = source_id.replace('\\', "/");
        normalized
            .strip_prefix(&self.strip_prefix)
            .unwrap_or(&normalized)
            .to_string()
    }

    /// Resolve a source identifier to its display URL, if mapped
    pub fn resolve(&self, source_id: &str) -> Option<&str> {
        let name = self.display_name(source_id);
        self.entries.get(&name).map(String::as_str)
    }
}
