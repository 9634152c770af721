//! Preferences persisted as a JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

use super::{Mutation, PreferenceStore, Preferences};

/// JSON file store.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash never leaves a half-written document. Updates within the process
/// are serialized by an async lock.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store at `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Document location.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Preferences> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default());
            }
            Err(e) => return Err(Error::store(&self.path, e.to_string())),
        };

        serde_json::from_str(&content).map_err(|e| Error::store(&self.path, e.to_string()))
    }

    async fn write(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store(&self.path, e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(prefs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Error::store(&tmp, e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::store(&self.path, e.to_string()))?;

        debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    async fn load(&self) -> Result<Preferences> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn update(&self, mutate: Mutation) -> Result<Preferences> {
        let _guard = self.lock.lock().await;
        let before = self.read().await?;
        let mut after = before.clone();
        mutate(&mut after);

        if after != before {
            self.write(&after).await?;
        }
        Ok(before)
    }
}

// ============================================================================
// Tests
// ============================================================================
