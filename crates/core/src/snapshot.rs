//! Snapshot persistence.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::models::GameRecord;

/// Reads and writes the exported snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot.
    ///
    /// A missing, unreadable or malformed file yields an empty snapshot so
    /// the next save rewrites everything.
    pub fn load(&self) -> Vec<GameRecord> {
        match self.read() {
            Ok(records) => records,
            Err(err) => {
                warn!("Failed to read existing snapshot, starting empty: {err:#}");
                Vec::new()
            }
        }
    }

    fn read(&self) -> Result<Vec<GameRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no snapshot at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let records: Option<Vec<GameRecord>> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(records.unwrap_or_default())
    }

    /// Write `records` as pretty-printed JSON, replacing the file atomically.
    ///
    /// The data goes to a temporary file in the same directory first, so a
    /// failure leaves any previous snapshot intact.
    pub fn save(&self, records: &[GameRecord]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let serialized =
            serde_json::to_vec_pretty(records).context("failed to serialize snapshot")?;

        let mut tmp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        tmp.write_all(&serialized)
            .and_then(|_| tmp.as_file().sync_all())
            .context("failed to write snapshot")?;
        tmp.persist(&self.path)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
