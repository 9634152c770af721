//! Command definitions organized by module.
//!
//! Commands follow `module.methodName` format, mirroring the WebExtension
//! namespaces the relay extension calls into.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `tabs` | Query, get, create, update, visible-area capture |
//! | `windows` | Focus |
//! | `scripting` | Page script execution |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::{TabQuery, TabUpdate};
use crate::identifiers::{TabId, WindowId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
///
/// This enum wraps module-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Tabs module commands.
    Tabs(TabsCommand),
    /// Windows module commands.
    Windows(WindowsCommand),
    /// Scripting module commands.
    Scripting(ScriptingCommand),
}

impl Command {
    /// Returns the `module.methodName` of this command.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Tabs(TabsCommand::Query(_)) => "tabs.query",
            Self::Tabs(TabsCommand::Get { .. }) => "tabs.get",
            Self::Tabs(TabsCommand::Create { .. }) => "tabs.create",
            Self::Tabs(TabsCommand::Update { .. }) => "tabs.update",
            Self::Tabs(TabsCommand::CaptureVisibleTab { .. }) => "tabs.captureVisibleTab",
            Self::Windows(WindowsCommand::Update { .. }) => "windows.update",
            Self::Scripting(ScriptingCommand::ExecuteScript { .. }) => "scripting.executeScript",
        }
    }
}

// ============================================================================
// Tabs Commands
// ============================================================================

/// Tabs module commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabsCommand {
    /// Query tabs.
    #[serde(rename = "tabs.query")]
    Query(TabQuery),

    /// Get one tab by ID.
    #[serde(rename = "tabs.get")]
    Get {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Open a new tab.
    #[serde(rename = "tabs.create")]
    Create {
        /// Initial address.
        url: String,
        /// Activate on creation.
        active: bool,
    },

    /// Update tab properties.
    #[serde(rename = "tabs.update")]
    Update {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Properties to change.
        #[serde(flatten)]
        update: TabUpdate,
    },

    /// Capture the visible area of a window's active tab.
    #[serde(rename = "tabs.captureVisibleTab")]
    CaptureVisibleTab {
        /// Window to capture.
        #[serde(rename = "windowId")]
        window_id: WindowId,
        /// `png` or `jpeg`.
        format: String,
        /// JPEG quality.
        #[serde(skip_serializing_if = "Option::is_none")]
        quality: Option<u8>,
    },
}

// ============================================================================
// Windows Commands
// ============================================================================

/// Windows module commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum WindowsCommand {
    /// Update window properties.
    #[serde(rename = "windows.update")]
    Update {
        /// Window ID.
        #[serde(rename = "windowId")]
        window_id: WindowId,
        /// Bring the window to the front.
        focused: bool,
    },
}

// ============================================================================
// Scripting Commands
// ============================================================================

/// Scripting module commands for page-context JavaScript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ScriptingCommand {
    /// Run a function body in the tab's main frame.
    ///
    /// The source is the body of an async function receiving `args`.
    #[serde(rename = "scripting.executeScript")]
    ExecuteScript {
        /// Tab ID.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Script name, for remote-side logging.
        name: String,
        /// Function body.
        source: String,
        /// Script arguments.
        #[serde(default)]
        args: Vec<Value>,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_tabs_query() {
        let cmd = Command::Tabs(TabsCommand::Query(TabQuery::urls(&["https://chatgpt.com/*"])));
        let value = serde_json::to_value(&cmd).expect("serialize");

        assert_eq!(
            value,
            json!({ "method": "tabs.query", "params": { "url": ["https://chatgpt.com/*"] } })
        );
        assert_eq!(cmd.method(), "tabs.query");
    }

    #[test]
    fn test_tabs_update_flattens() {
        let cmd = TabsCommand::Update {
            tab_id: TabId::new(3).expect("valid tab id"),
            update: TabUpdate::navigate("https://chatgpt.com/g/abc"),
        };
        let value = serde_json::to_value(&cmd).expect("serialize");

        assert_eq!(value["method"], "tabs.update");
        assert_eq!(value["params"]["tabId"], 3);
        assert_eq!(value["params"]["url"], "https://chatgpt.com/g/abc");
        assert!(value["params"].get("active").is_none());
    }

    #[test]
    fn test_capture_visible_tab() {
        let cmd = TabsCommand::CaptureVisibleTab {
            window_id: WindowId::new(9),
            format: "png".to_string(),
            quality: None,
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        assert!(json.contains("tabs.captureVisibleTab"));
        assert!(json.contains(r#""windowId":9"#));
        assert!(!json.contains("quality"));
    }

    #[test]
    fn test_execute_script() {
        let cmd = Command::Scripting(ScriptingCommand::ExecuteScript {
            tab_id: TabId::new(1).expect("valid tab id"),
            name: "uploadProbe".to_string(),
            source: "return 1;".to_string(),
            args: vec![json!(["a"])],
        });
        let value = serde_json::to_value(&cmd).expect("serialize");

        assert_eq!(value["method"], "scripting.executeScript");
        assert_eq!(value["params"]["name"], "uploadProbe");
        assert_eq!(value["params"]["args"], json!([["a"]]));
    }
}
