use super::{RecordSource, decompress};
use crate::error::SourceError;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::debug;

/// Reads one batch per directory entry.
///
/// Entries are listed by name so runs over the same directory are
/// reproducible. Entries that are not regular files are still listed and are
/// reported as unavailable when read.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl RecordSource for DirectorySource {
    async fn list_units(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("failed to list {}", self.root.display()))?;

        let mut units = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            units.push(entry.file_name().to_string_lossy().into_owned());
        }
        units.sort();

        debug!(root = %self.root.display(), units = units.len(), "Listed source directory");
        Ok(units)
    }

    async fn read_unit(&self, unit: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.root.join(unit);

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| SourceError::Read {
                unit: unit.to_string(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(SourceError::Unavailable {
                unit: unit.to_string(),
                reason: "not a regular file".to_string(),
            });
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Read {
                unit: unit.to_string(),
                source,
            })?;
        decompress(unit, bytes)
    }
}
