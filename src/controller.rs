//! Background controller.
//!
//! Receives the relay extension's events, answers popup messages and starts
//! captures. One [`Controller`] serves one extension connection; [`serve`]
//! accepts connections for the lifetime of the process.
//!
//! | Event | Handling |
//! |-------|----------|
//! | `tabs.removed` | Forget the tab if it was remembered |
//! | `commands.command` | `capture-and-upload` starts a capture |
//! | `runtime.message` | Dispatch a [`Message`] and reply |
//!
//! `getDestinationMenu` runs the folder request under the popup's deadline
//! and answers with the finished [`DestinationMenu`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{Browser, RemoteBrowser, TabQuery, prefer_complete};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::folders::{FolderRecord, discover_folders};
use crate::menu::{DestinationMenu, fetch_folders, refresh_menu};
use crate::message::{FoldersReply, Message, accepted_reply, error_reply, saved_reply};
use crate::orchestrator::CaptureOrchestrator;
use crate::protocol::{Event, EventReply, ParsedEvent};
use crate::provider::{Destination, Provider};
use crate::store::{PreferenceStore, Preferences, StoreExt};
use crate::transport::{Connection, EventStream, PendingServer};

// ============================================================================
// Constants
// ============================================================================

/// Keyboard command that starts a capture.
pub const CAPTURE_COMMAND: &str = "capture-and-upload";

// ============================================================================
// Controller
// ============================================================================

/// Dispatches events and messages to the capture services.
#[derive(Clone)]
pub struct Controller {
    browser: Arc<dyn Browser>,
    store: Arc<dyn PreferenceStore>,
    config: Arc<Config>,
    orchestrator: Arc<CaptureOrchestrator>,
}

impl Controller {
    /// Creates a controller over shared services.
    #[must_use]
    pub fn new(
        browser: Arc<dyn Browser>,
        store: Arc<dyn PreferenceStore>,
        config: Arc<Config>,
    ) -> Self {
        let orchestrator = Arc::new(CaptureOrchestrator::new(
            Arc::clone(&browser),
            Arc::clone(&store),
            Arc::clone(&config),
        ));
        Self {
            browser,
            store,
            config,
            orchestrator,
        }
    }

    /// Writes first-run defaults and logs the stored preferences.
    pub async fn startup(&self) {
        match self.store.ensure_defaults().await {
            Ok(prefs) => info!(
                destination = %prefs.destination(),
                provider = %prefs.provider(),
                folders = prefs.saved_folders.len(),
                "Loaded preferences"
            ),
            Err(e) => warn!(error = %e, "Failed to initialize preferences"),
        }
    }

    /// Handles one event, returning the reply payload if it needs one.
    pub async fn handle_event(&self, event: &Event) -> Option<Value> {
        match event.parse() {
            ParsedEvent::TabRemoved { tab_id } => {
                match self.store.forget_tab(tab_id).await {
                    Ok(true) => info!(%tab_id, "Forgot closed upload tab"),
                    Ok(false) => {}
                    Err(e) => warn!(%tab_id, error = %e, "Failed to forget closed tab"),
                }
                None
            }
            ParsedEvent::Command { name } if name == CAPTURE_COMMAND => {
                debug!("Capture command received");
                self.spawn_capture(None);
                None
            }
            ParsedEvent::Command { name } => {
                debug!(command = %name, "Ignoring command");
                None
            }
            ParsedEvent::Message { message } => Some(self.handle_message(message).await),
            ParsedEvent::Unknown { method, .. } => {
                debug!(%method, "Ignoring event");
                None
            }
        }
    }

    /// Handles a popup or options-page message.
    pub async fn handle_message(&self, message: Value) -> Value {
        let message: Message = match serde_json::from_value(message) {
            Ok(message) => message,
            Err(e) => {
                let e = Error::invalid_argument(format!("unrecognized message: {e}"));
                warn!(error = %e, "Dropping message");
                return error_reply(e.to_string());
            }
        };
        debug!(?message, "Message received");

        match message {
            Message::CaptureAndUpload { destination } => {
                self.spawn_capture(destination);
                accepted_reply()
            }
            Message::GetFolders => to_reply(&self.get_folders().await),
            Message::GetDestinationMenu => to_reply(&self.destination_menu().await),
            Message::SetDestination { destination } => {
                saved_or_error(self.store.set_destination(destination).await)
            }
            Message::SetProvider { provider } => {
                saved_or_error(self.store.set_provider(provider).await)
            }
        }
    }

    /// Lists folders, live when possible and from storage otherwise.
    pub async fn get_folders(&self) -> FoldersReply {
        let mut error = None;
        match self.discover_live().await {
            Ok(folders) if !folders.is_empty() => return FoldersReply::live(folders),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Folder discovery failed");
                error = Some(e.to_string());
            }
        }

        match self.store.load().await {
            Ok(prefs) if !prefs.saved_folders.is_empty() => {
                debug!(count = prefs.saved_folders.len(), "Using stored folders");
                FoldersReply::stored(prefs.saved_folders)
            }
            Ok(_) => FoldersReply::empty(error),
            Err(e) => {
                warn!(error = %e, "Failed to read stored folders");
                FoldersReply::empty(Some(e.to_string()))
            }
        }
    }

    /// Builds the destination menu the popup shows after its folder request.
    ///
    /// The request is bounded by the folder request deadline. A stored-folder
    /// answer keeps the stored list on screen.
    pub async fn destination_menu(&self) -> DestinationMenu {
        let prefs = self.store.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read preferences for menu");
            Preferences::default()
        });
        let preferred = prefs.destination();
        let saved = &prefs.saved_folders;

        let reply = fetch_folders(
            async { Ok(self.get_folders().await) },
            saved,
            self.config.timing.folder_request_timeout(),
        )
        .await;

        refresh_menu(saved, &reply, &preferred)
            .unwrap_or_else(|| DestinationMenu::initial(saved, &preferred))
    }

    async fn discover_live(&self) -> Result<Vec<FolderRecord>> {
        let tabs = self
            .browser
            .query_tabs(&TabQuery::urls(Provider::ChatGpt.url_patterns()))
            .await?;
        let Some(tab) = prefer_complete(&tabs) else {
            debug!("No provider tab for folder discovery");
            return Ok(Vec::new());
        };

        sleep(self.config.timing.folder_scan_delay()).await;
        discover_folders(
            self.browser.as_ref(),
            self.store.as_ref(),
            tab.id,
            &self.config.markers.folder_path,
        )
        .await
    }

    fn spawn_capture(&self, destination: Option<Destination>) {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            orchestrator.capture_and_upload(destination).await;
        });
    }

    /// Handles events until the extension disconnects.
    ///
    /// Each event runs on its own task so a slow message does not hold up
    /// tab-removed events.
    pub async fn run(self, mut events: EventStream, connection: Connection) {
        while let Some(event) = events.recv().await {
            let controller = self.clone();
            let connection = connection.clone();
            tokio::spawn(async move {
                if let Some(result) = controller.handle_event(&event).await
                    && let Err(e) = connection.reply(EventReply::to(&event, result))
                {
                    warn!(method = %event.method, error = %e, "Failed to send reply");
                }
            });
        }
    }
}

fn to_reply<T: serde::Serialize>(reply: &T) -> Value {
    serde_json::to_value(reply).unwrap_or_else(|e| error_reply(e.to_string()))
}

fn saved_or_error(result: Result<()>) -> Value {
    match result {
        Ok(()) => saved_reply(),
        Err(e) => {
            warn!(error = %e, "Failed to save preference");
            error_reply(e.to_string())
        }
    }
}

// ============================================================================
// Serve
// ============================================================================

/// Accepts relay connections and runs a controller for each, one at a time.
///
/// # Errors
///
/// Returns [`Error::Io`] if the server cannot bind or accept.
pub async fn serve(config: Arc<Config>, store: Arc<dyn PreferenceStore>) -> Result<()> {
    let server = PendingServer::bind(config.bind_addr()).await?;
    info!(url = %server.ws_url(), "Waiting for relay extension");

    loop {
        let accepted = match server.accept(None).await {
            Ok(accepted) => accepted,
            Err(e @ Error::Io(_)) => return Err(e),
            Err(e) if e.is_timeout() => {
                debug!(error = %e, "Relay handshake timed out");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Relay handshake failed");
                continue;
            }
        };
        info!(
            version = %accepted.ready.extension_version,
            user_agent = %accepted.ready.user_agent,
            "Relay extension connected"
        );

        let browser = Arc::new(RemoteBrowser::new(accepted.connection.clone()));
        let controller = Controller::new(browser, Arc::clone(&store), Arc::clone(&config));
        controller.startup().await;
        controller.run(accepted.events, accepted.connection).await;

        info!("Relay extension disconnected");
    }
}

// ============================================================================
// Tests
// ============================================================================
