//! In-memory preferences.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

use super::{Mutation, PreferenceStore, Preferences};

/// Preferences held in memory for the life of the process.
#[derive(Default)]
pub struct MemoryStore {
    prefs: Mutex<Preferences>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn load(&self) -> Result<Preferences> {
        Ok(self.prefs.lock().clone())
    }

    async fn update(&self, mutate: Mutation) -> Result<Preferences> {
        let mut prefs = self.prefs.lock();
        let before = prefs.clone();
        mutate(&mut *prefs);
        Ok(before)
    }
}
