//! Upload providers and destinations.
//!
//! Two chat web apps are supported. Folder destinations only exist on the
//! default provider; their identifiers are opaque strings with substring
//! conventions (see [`Markers`]).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Markers;

// ============================================================================
// Constants
// ============================================================================

/// Destination string meaning "no folder".
pub const MAIN_DESTINATION: &str = "main";

/// Origin that folder addresses are built on.
const FOLDER_ORIGIN: &str = "https://chatgpt.com";

// ============================================================================
// Provider
// ============================================================================

/// A supported chat web application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Default provider with folder support.
    #[default]
    #[serde(rename = "chatgpt")]
    ChatGpt,
    /// Alternate provider, uploaded to with the reduced pipeline.
    Gemini,
}

impl Provider {
    /// Address opened when no matching tab exists.
    #[must_use]
    pub const fn home_url(&self) -> &'static str {
        match self {
            Self::ChatGpt => "https://chatgpt.com/",
            Self::Gemini => "https://gemini.google.com/app",
        }
    }

    /// Match patterns that identify this provider's tabs.
    #[must_use]
    pub const fn url_patterns(&self) -> &'static [&'static str] {
        match self {
            Self::ChatGpt => &["https://chatgpt.com/*", "https://chat.openai.com/*"],
            Self::Gemini => &["https://gemini.google.com/app"],
        }
    }

    /// Storage name, as written by the options page.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Destination
// ============================================================================

/// Where an upload should land on the default provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Destination {
    /// Main chat, no folder.
    #[default]
    Main,
    /// A folder/project identified by an opaque id.
    Folder(String),
}

/// What a folder identifier's markers say about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    /// No markers.
    Plain,
    /// Contains the project marker.
    Project,
    /// Contains the variant marker.
    Variant,
}

impl Destination {
    /// Parses a stored or requested destination string.
    ///
    /// Empty strings and `"main"` mean [`Destination::Main`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == MAIN_DESTINATION {
            Self::Main
        } else {
            Self::Folder(value.to_string())
        }
    }

    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => MAIN_DESTINATION,
            Self::Folder(id) => id,
        }
    }

    /// Returns the folder id, if any.
    #[inline]
    #[must_use]
    pub fn folder_id(&self) -> Option<&str> {
        match self {
            Self::Main => None,
            Self::Folder(id) => Some(id),
        }
    }

    /// Classifies the folder id by its markers.
    ///
    /// The variant marker takes precedence over the project marker.
    #[must_use]
    pub fn kind(&self, markers: &Markers) -> Option<FolderKind> {
        let id = self.folder_id()?;
        Some(if id.contains(&markers.variant) {
            FolderKind::Variant
        } else if id.contains(&markers.project) {
            FolderKind::Project
        } else {
            FolderKind::Plain
        })
    }

    /// Returns `true` if the destination needs variant page preparation.
    #[inline]
    #[must_use]
    pub fn is_variant(&self, markers: &Markers) -> bool {
        self.kind(markers) == Some(FolderKind::Variant)
    }

    /// Fully-qualified address for this destination.
    ///
    /// `Main` has no address of its own; callers fall back to the provider
    /// home. Every folder kind uses the same pattern: the origin, the folder
    /// path marker, then the id.
    #[must_use]
    pub fn target_url(&self, markers: &Markers) -> Option<String> {
        self.folder_id()
            .map(|id| format!("{FOLDER_ORIGIN}{}{id}", markers.folder_path))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Destination {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Destination {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

// ============================================================================
// Tests
// ============================================================================
