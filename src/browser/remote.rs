//! [`Browser`] over the relay extension connection.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{TabId, WindowId};
use crate::protocol::{Command, Request, Response, ScriptingCommand, TabsCommand, WindowsCommand};
use crate::transport::Connection;

use super::{Browser, ImageFormat, PageScript, TabInfo, TabQuery, TabUpdate};

// ============================================================================
// Constants
// ============================================================================

/// Error code the relay reports for closed tabs.
const NO_SUCH_TAB: &str = "no such tab";

/// Error code the relay reports for exceptions thrown by page scripts.
const SCRIPT_ERROR: &str = "script error";

// ============================================================================
// RemoteBrowser
// ============================================================================

/// Browser driven through the relay extension.
#[derive(Clone)]
pub struct RemoteBrowser {
    connection: Connection,
}

impl RemoteBrowser {
    /// Wraps an established connection.
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Sends a command and converts error responses.
    async fn call(&self, command: Command, tab_id: Option<TabId>) -> Result<Response> {
        let method = command.method();
        trace!(method, "Sending command");

        let response = self.connection.send(Request::new(command)).await?;
        if response.is_success() {
            return Ok(response);
        }

        let message = response
            .message
            .clone()
            .or_else(|| response.error.clone())
            .unwrap_or_else(|| "unknown error".to_string());

        match (response.error_code(), tab_id) {
            (Some(NO_SUCH_TAB), Some(tab_id)) => Err(Error::tab_not_found(tab_id)),
            _ => {
                debug!(method, error = %message, "Command failed");
                Err(Error::protocol(format!("{method}: {message}")))
            }
        }
    }
}

#[async_trait]
impl Browser for RemoteBrowser {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>> {
        let mut response = self
            .call(Command::Tabs(TabsCommand::Query(query.clone())), None)
            .await?;
        response.take_field("tabs")
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo> {
        let mut response = self
            .call(Command::Tabs(TabsCommand::Get { tab_id }), Some(tab_id))
            .await?;
        response.take_field("tab")
    }

    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo> {
        let command = Command::Tabs(TabsCommand::Create {
            url: url.to_string(),
            active,
        });
        let mut response = self.call(command, None).await?;
        response.take_field("tab")
    }

    async fn update_tab(&self, tab_id: TabId, update: &TabUpdate) -> Result<TabInfo> {
        let command = Command::Tabs(TabsCommand::Update {
            tab_id,
            update: update.clone(),
        });
        let mut response = self.call(command, Some(tab_id)).await?;
        response.take_field("tab")
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        let command = Command::Windows(WindowsCommand::Update {
            window_id,
            focused: true,
        });
        self.call(command, None).await?;
        Ok(())
    }

    async fn capture_visible_tab(
        &self,
        window_id: WindowId,
        format: ImageFormat,
    ) -> Result<String> {
        let command = Command::Tabs(TabsCommand::CaptureVisibleTab {
            window_id,
            format: format.format_str().to_string(),
            quality: format.quality(),
        });

        let mut response = self
            .call(command, None)
            .await
            .map_err(|e| Error::capture(e.to_string()))?;
        response.take_field("dataUrl")
    }

    async fn execute_script(
        &self,
        tab_id: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value> {
        let command = Command::Scripting(ScriptingCommand::ExecuteScript {
            tab_id,
            name: script.name.to_string(),
            source: script.source.to_string(),
            args,
        });

        let mut response = self.connection.send(Request::new(command)).await?;
        if response.is_success() {
            return Ok(response
                .result
                .as_mut()
                .and_then(|r| r.get_mut("value"))
                .map(Value::take)
                .unwrap_or(Value::Null));
        }

        let message = response.message.take().unwrap_or_default();
        match response.error_code() {
            Some(NO_SUCH_TAB) => Err(Error::tab_not_found(tab_id)),
            Some(SCRIPT_ERROR) => Err(Error::script_error(script.name, message)),
            other => Err(Error::script_error(
                script.name,
                format!("{}: {message}", other.unwrap_or("unknown error")),
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::json;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;
    use crate::browser::script;
    use crate::transport::PendingServer;

    /// Runs a relay stub that answers every request with `respond(method, params)`.
    async fn connect_with_stub<F>(respond: F) -> RemoteBrowser
    where
        F: Fn(&str, &Value) -> Value + Send + 'static,
    {
        let server = PendingServer::bind("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("bind");
        let url = server.ws_url();

        tokio::spawn(async move {
            let (mut ws, _) = connect_async(url).await.expect("connect");
            let ready = json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "type": "success",
                "result": {"extensionVersion": "1.0", "userAgent": "test"}
            });
            ws.send(Message::Text(ready.to_string().into()))
                .await
                .expect("ready");

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).expect("json");
                let method = request["method"].as_str().unwrap_or_default().to_string();
                let mut reply = respond(&method, &request["params"]);
                reply["id"] = request["id"].clone();
                ws.send(Message::Text(reply.to_string().into()))
                    .await
                    .expect("reply");
            }
        });

        let accepted = server
            .accept(Some(Duration::from_secs(5)))
            .await
            .expect("accept");
        RemoteBrowser::new(accepted.connection)
    }

    fn tab_json(id: u32, url: &str) -> Value {
        json!({"id": id, "windowId": 1, "url": url, "status": "complete", "active": true})
    }

    #[tokio::test]
    async fn test_query_and_get() {
        let browser = connect_with_stub(|method, params| match method {
            "tabs.query" => json!({"type": "success", "result": {"tabs": [tab_json(3, "https://chatgpt.com/")]}}),
            "tabs.get" if params["tabId"] == 3 => json!({"type": "success", "result": {"tab": tab_json(3, "https://chatgpt.com/")}}),
            _ => json!({"type": "error", "error": "no such tab", "message": "No tab"}),
        })
        .await;

        let tabs = browser
            .query_tabs(&TabQuery::urls(&["https://chatgpt.com/*"]))
            .await
            .expect("query");
        assert_eq!(tabs.len(), 1);
        assert!(tabs[0].is_complete());

        let tab_id = TabId::new(3).expect("tab id");
        assert_eq!(browser.get_tab(tab_id).await.expect("get").id, tab_id);

        let missing = TabId::new(9).expect("tab id");
        let err = browser.get_tab(missing).await.expect_err("missing tab");
        assert!(err.is_tab_gone());
    }

    #[tokio::test]
    async fn test_execute_script_value_and_error() {
        let browser = connect_with_stub(|_, params| {
            if params["name"] == "focusElement" {
                json!({"type": "success", "result": {"value": true}})
            } else {
                json!({"type": "error", "error": "script error", "message": "boom"})
            }
        })
        .await;

        let tab_id = TabId::new(1).expect("tab id");
        let value = browser
            .execute_script(tab_id, &script::FOCUS_ELEMENT, vec![json!("textarea")])
            .await
            .expect("value");
        assert_eq!(value, Value::Bool(true));

        let err = browser
            .execute_script(tab_id, &script::SEND_PROBE, vec![json!([])])
            .await
            .expect_err("script error");
        assert!(matches!(err, Error::ScriptError { .. }));
    }

    #[tokio::test]
    async fn test_capture_failure_maps_to_capture_error() {
        let browser = connect_with_stub(|_, _| {
            json!({"type": "error", "error": "unknown error", "message": "not allowed"})
        })
        .await;

        let err = browser
            .capture_visible_tab(WindowId::new(1), ImageFormat::Png)
            .await
            .expect_err("capture fails");
        assert!(matches!(err, Error::Capture { .. }));
    }
}
