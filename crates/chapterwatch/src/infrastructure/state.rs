use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use chapterwatch_lib::prelude::SeriesWatermark;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Watermarks keyed by series url, backed by a JSON file.
///
/// Mutations stay in memory until `save`, which the driver calls once per
/// run.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    entries: BTreeMap<String, SeriesWatermark>,
}

impl StateStore {
    /// Load state from `path`. A missing file is an empty state, an
    /// unreadable one is logged and also treated as empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = PathBuf::new().join(path);

        let entries = if path.exists() {
            match Self::load(&path) {
                Ok(entries) => {
                    info!("loaded {} series from {:?}", entries.len(), path);
                    entries
                }
                Err(e) => {
                    error!("failed to load state from {:?}: {e}", path);
                    BTreeMap::new()
                }
            }
        } else {
            info!("no state at {:?}, starting fresh", path);
            BTreeMap::new()
        };

        Self { path, entries }
    }

    fn load(path: &Path) -> Result<BTreeMap<String, SeriesWatermark>, StateError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, url: &str) -> SeriesWatermark {
        self.entries.get(url).copied().unwrap_or_default()
    }

    pub fn set(&mut self, url: &str, watermark: SeriesWatermark) {
        self.entries.insert(url.to_string(), watermark);
    }

    /// Write the state next to its final path and rename it into place, so an
    /// interrupted save leaves the previous file intact.
    pub fn save(&self) -> Result<(), StateError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!("saved {} series to {:?}", self.entries.len(), self.path);

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
