//! Persistent preferences.
//!
//! All persisted state lives in one [`Preferences`] document. Components read
//! it with [`PreferenceStore::load`] and change it only through
//! [`PreferenceStore::update`], which is an atomic read-modify-write.
//!
//! | Key | Field |
//! |-----|-------|
//! | `preferredFolderId` | [`Preferences::preferred_folder_id`] |
//! | `savedFolders` | [`Preferences::saved_folders`] |
//! | `foldersLastUpdated` | [`Preferences::folders_last_updated`] |
//! | `chatTabId` | [`Preferences::chat_tab_id`] |
//! | `geminiTabId` | [`Preferences::gemini_tab_id`] |
//! | `aiProvider` | [`Preferences::ai_provider`] |
//! | `lastUsedTimestamp` | [`Preferences::last_used_timestamp`] |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::folders::FolderRecord;
use crate::identifiers::TabId;
use crate::provider::{Destination, Provider};

// ============================================================================
// Submodules
// ============================================================================

/// JSON file store.
pub mod file;

/// In-memory store.
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

// ============================================================================
// Preferences
// ============================================================================

/// The persisted preference document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    /// Destination chosen in the popup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_folder_id: Option<Destination>,

    /// Folders found by the last successful discovery.
    pub saved_folders: Vec<FolderRecord>,

    /// When `saved_folders` was written.
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub folders_last_updated: Option<DateTime<Utc>>,

    /// Remembered tab of the default provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_tab_id: Option<TabId>,

    /// Remembered tab of the alternate provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_tab_id: Option<TabId>,

    /// Selected provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<Provider>,

    /// When the last capture ran.
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used_timestamp: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Stored destination, [`Destination::Main`] when unset.
    #[must_use]
    pub fn destination(&self) -> Destination {
        self.preferred_folder_id.clone().unwrap_or_default()
    }

    /// Stored provider, the default one when unset.
    #[must_use]
    pub fn provider(&self) -> Provider {
        self.ai_provider.unwrap_or_default()
    }

    /// Remembered tab for a provider.
    #[must_use]
    pub fn remembered_tab(&self, provider: Provider) -> Option<TabId> {
        match provider {
            Provider::ChatGpt => self.chat_tab_id,
            Provider::Gemini => self.gemini_tab_id,
        }
    }

    fn remembered_tab_mut(&mut self, provider: Provider) -> &mut Option<TabId> {
        match provider {
            Provider::ChatGpt => &mut self.chat_tab_id,
            Provider::Gemini => &mut self.gemini_tab_id,
        }
    }
}

// ============================================================================
// PreferenceStore
// ============================================================================

/// Mutation applied inside [`PreferenceStore::update`].
pub type Mutation = Box<dyn FnOnce(&mut Preferences) + Send>;

/// Storage for the [`Preferences`] document.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Reads the current document. A missing document reads as the default.
    async fn load(&self) -> Result<Preferences>;

    /// Applies `mutate` atomically and persists the result.
    ///
    /// Returns the document as it was *before* the mutation, so callers can
    /// tell whether a conditional change applied.
    async fn update(&self, mutate: Mutation) -> Result<Preferences>;
}

/// Typed helpers over [`PreferenceStore`].
#[async_trait]
pub trait StoreExt: PreferenceStore {
    /// Persists the destination.
    async fn set_destination(&self, destination: Destination) -> Result<()> {
        self.update(Box::new(move |p| p.preferred_folder_id = Some(destination)))
            .await?;
        Ok(())
    }

    /// Persists the provider.
    async fn set_provider(&self, provider: Provider) -> Result<()> {
        self.update(Box::new(move |p| p.ai_provider = Some(provider)))
            .await?;
        Ok(())
    }

    /// Remembers a provider's tab.
    async fn remember_tab(&self, provider: Provider, tab_id: TabId) -> Result<()> {
        self.update(Box::new(move |p| *p.remembered_tab_mut(provider) = Some(tab_id)))
            .await?;
        Ok(())
    }

    /// Forgets `tab_id` wherever it is remembered.
    ///
    /// The comparison and removal happen in one update, so a tab remembered
    /// concurrently is never cleared by mistake. Returns `true` if anything
    /// was forgotten.
    async fn forget_tab(&self, tab_id: TabId) -> Result<bool> {
        let before = self
            .update(Box::new(move |p| {
                for provider in [Provider::ChatGpt, Provider::Gemini] {
                    let slot = p.remembered_tab_mut(provider);
                    if *slot == Some(tab_id) {
                        *slot = None;
                    }
                }
            }))
            .await?;

        Ok(before.chat_tab_id == Some(tab_id) || before.gemini_tab_id == Some(tab_id))
    }

    /// Replaces the saved folders and stamps the update time.
    async fn save_folders(&self, folders: Vec<FolderRecord>, now: DateTime<Utc>) -> Result<()> {
        self.update(Box::new(move |p| {
            p.saved_folders = folders;
            p.folders_last_updated = Some(now);
        }))
        .await?;
        Ok(())
    }

    /// Records the time of a capture.
    async fn touch_last_used(&self, now: DateTime<Utc>) -> Result<()> {
        self.update(Box::new(move |p| p.last_used_timestamp = Some(now)))
            .await?;
        Ok(())
    }

    /// Writes first-run defaults and returns the resulting document.
    async fn ensure_defaults(&self) -> Result<Preferences> {
        self.update(Box::new(|p| {
            p.preferred_folder_id.get_or_insert(Destination::Main);
        }))
        .await?;
        self.load().await
    }
}

impl<T: PreferenceStore + ?Sized> StoreExt for T {}

// ============================================================================
// Tests
// ============================================================================
