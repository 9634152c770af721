//! Messages from the popup and options page, and their replies.
//!
//! Messages arrive inside `runtime.message` events and are tagged by
//! `action`.
//!
//! | Action | Reply |
//! |--------|-------|
//! | `captureAndUpload` | `{accepted: true}` |
//! | `getFolders` | [`FoldersReply`] |
//! | `getDestinationMenu` | [`DestinationMenu`](crate::menu::DestinationMenu) |
//! | `setDestination` | `{saved: true}` |
//! | `setProvider` | `{saved: true}` |

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::folders::FolderRecord;
use crate::provider::{Destination, Provider};

// ============================================================================
// Message
// ============================================================================

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// Capture now, optionally to an explicit destination.
    CaptureAndUpload {
        /// Destination chosen in the popup. Blank means the stored one.
        #[serde(default, deserialize_with = "blank_as_none")]
        destination: Option<Destination>,
    },
    /// List folders for the destination menu.
    GetFolders,
    /// Build the popup's destination menu.
    GetDestinationMenu,
    /// Persist the popup's destination selection.
    SetDestination {
        /// Selected destination.
        destination: Destination,
    },
    /// Persist the options page's provider choice.
    SetProvider {
        /// Selected provider.
        provider: Provider,
    },
}

/// Reads an optional destination where a blank string counts as absent.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Destination>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.trim().is_empty())
        .map(|v| Destination::parse(&v)))
}

/// Reply to a fire-and-forget capture request.
#[must_use]
pub fn accepted_reply() -> Value {
    json!({ "accepted": true })
}

/// Reply to a persistence request.
#[must_use]
pub fn saved_reply() -> Value {
    json!({ "saved": true })
}

/// Reply to an unreadable message.
#[must_use]
pub fn error_reply(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

// ============================================================================
// FoldersReply
// ============================================================================

/// Reply to `getFolders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldersReply {
    /// Folders for the menu.
    #[serde(default)]
    pub folders: Vec<FolderRecord>,
    /// The folders came from storage, not the live page.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub from_storage: bool,
    /// Error met while looking for folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FoldersReply {
    /// Folders found on the live page.
    #[must_use]
    pub fn live(folders: Vec<FolderRecord>) -> Self {
        Self {
            folders,
            ..Self::default()
        }
    }

    /// Folders read from storage.
    #[must_use]
    pub fn stored(folders: Vec<FolderRecord>) -> Self {
        Self {
            folders,
            from_storage: true,
            error: None,
        }
    }

    /// No folders anywhere.
    #[must_use]
    pub fn empty(error: Option<String>) -> Self {
        Self {
            error,
            ..Self::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
