//! Event message types.
//!
//! Events are notifications sent from the remote end (relay extension) to the
//! local end (Rust) when browser activity occurs.
//!
//! # Event Types
//!
//! | Method | Params | Needs reply |
//! |--------|--------|-------------|
//! | `tabs.removed` | `tabId` | no |
//! | `commands.command` | `name` | no |
//! | `runtime.message` | `message` | yes, via [`EventReply`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "id": "event-uuid",
///   "type": "event",
///   "method": "module.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Unique identifier for EventReply correlation.
    pub id: RequestId,

    /// Event type marker (always "event").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Returns the module name from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.method.as_str() {
            "tabs.removed" => match self.get_tab_id("tabId") {
                Some(tab_id) => ParsedEvent::TabRemoved { tab_id },
                None => self.unknown(),
            },

            "commands.command" => ParsedEvent::Command {
                name: self.get_string("name"),
            },

            "runtime.message" => ParsedEvent::Message {
                message: self.params.get("message").cloned().unwrap_or(Value::Null),
            },

            _ => self.unknown(),
        }
    }

    fn unknown(&self) -> ParsedEvent {
        ParsedEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a tab ID from params.
    #[inline]
    fn get_tab_id(&self, key: &str) -> Option<TabId> {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .and_then(TabId::new)
    }
}

// ============================================================================
// EventReply
// ============================================================================

/// A reply from local end to remote end for events requiring an answer.
///
/// Used to answer `runtime.message` events from the popup.
///
/// # Format
///
/// ```json
/// {
///   "id": "event-uuid",
///   "replyTo": "runtime.message",
///   "result": { "folders": [] }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EventReply {
    /// Matches the event's ID.
    pub id: RequestId,

    /// Event method being replied to.
    #[serde(rename = "replyTo")]
    pub reply_to: String,

    /// Reply payload.
    pub result: Value,
}

impl EventReply {
    /// Creates a new event reply.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, reply_to: impl Into<String>, result: Value) -> Self {
        Self {
            id,
            reply_to: reply_to.into(),
            result,
        }
    }

    /// Creates a reply to the given event.
    #[inline]
    #[must_use]
    pub fn to(event: &Event, result: Value) -> Self {
        Self::new(event.id, event.method.clone(), result)
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// A tab was closed.
    TabRemoved {
        /// Closed tab.
        tab_id: TabId,
    },

    /// A keyboard command fired.
    Command {
        /// Command name from the manifest.
        name: String,
    },

    /// A UI surface sent a one-shot message.
    Message {
        /// Raw message body.
        message: Value,
    },

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Tests
// ============================================================================
