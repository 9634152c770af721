//! Capture-and-upload pipeline.
//!
//! One run captures the visible area of the active tab, resolves the upload
//! tab for the selected provider, focuses it and hands the image to the
//! injector. Runs are serialized: a capture that arrives while another is in
//! flight waits for it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::{Browser, CapturedImage, ImageFormat, TabInfo, TabQuery, TabUpdate};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::injector::{Injector, UploadOutcome};
use crate::provider::{Destination, Provider};
use crate::resolver::{find_or_create_alternate_tab, find_or_create_chat_tab, resolve_destination};
use crate::store::{PreferenceStore, StoreExt};

// ============================================================================
// CaptureOutcome
// ============================================================================

/// Result of one capture run, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The pipeline reached the injector.
    Completed {
        /// Provider the image went to.
        provider: Provider,
        /// Upload tab.
        tab_id: TabId,
        /// What the injector achieved.
        upload: UploadOutcome,
    },
    /// The pipeline stopped early; the error was logged.
    Failed(String),
}

// ============================================================================
// Capture
// ============================================================================

/// Captures the visible area of the active tab in the last focused window.
///
/// # Errors
///
/// Returns [`Error::NoActiveTab`] if there is no such tab, or the capture
/// error.
pub async fn capture_active_visible_area(browser: &dyn Browser) -> Result<CapturedImage> {
    let tabs = browser
        .query_tabs(&TabQuery::active_in_last_focused())
        .await?;
    let tab = tabs.first().ok_or(Error::NoActiveTab)?;

    let format = ImageFormat::Png;
    let data_url = browser.capture_visible_tab(tab.window_id, format).await?;
    let image = CapturedImage::new(data_url, tab.id, format);

    match image.dimensions() {
        Ok((width, height)) => debug!(tab_id = %tab.id, width, height, "Captured visible area"),
        Err(e) => warn!(tab_id = %tab.id, error = %e, "Capture is not a readable image"),
    }
    Ok(image)
}

// ============================================================================
// CaptureOrchestrator
// ============================================================================

/// Runs the capture pipeline against shared services.
pub struct CaptureOrchestrator {
    browser: Arc<dyn Browser>,
    store: Arc<dyn PreferenceStore>,
    config: Arc<Config>,
    running: Mutex<()>,
}

impl CaptureOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        browser: Arc<dyn Browser>,
        store: Arc<dyn PreferenceStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            browser,
            store,
            config,
            running: Mutex::new(()),
        }
    }

    /// Captures and uploads, using `requested` or the stored destination.
    ///
    /// Never fails; errors are logged and reported in the outcome.
    pub async fn capture_and_upload(&self, requested: Option<Destination>) -> CaptureOutcome {
        let _running = self.running.lock().await;

        match self.run(requested).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Capture failed");
                CaptureOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run(&self, requested: Option<Destination>) -> Result<CaptureOutcome> {
        let browser = self.browser.as_ref();
        let store = self.store.as_ref();

        let destination = resolve_destination(store, requested).await;
        info!(%destination, "Starting capture");

        let image = capture_active_visible_area(browser).await?;

        let provider = match store.load().await {
            Ok(prefs) => prefs.provider(),
            Err(e) => {
                warn!(error = %e, "Failed to read provider, using default");
                Provider::default()
            }
        };

        let (tab_id, upload) = match provider {
            Provider::Gemini => self.upload_alternate(&image).await?,
            Provider::ChatGpt => self.upload_default(destination, &image).await?,
        };

        if let Err(e) = store.touch_last_used(Utc::now()).await {
            warn!(error = %e, "Failed to record capture time");
        }

        info!(%provider, %tab_id, ?upload, "Capture finished");
        Ok(CaptureOutcome::Completed {
            provider,
            tab_id,
            upload,
        })
    }

    async fn upload_default(
        &self,
        destination: Destination,
        image: &CapturedImage,
    ) -> Result<(TabId, UploadOutcome)> {
        let browser = self.browser.as_ref();
        let timing = &self.config.timing;

        let variant = destination.is_variant(&self.config.markers);
        let tab = find_or_create_chat_tab(
            browser,
            self.store.as_ref(),
            &self.config,
            Some(destination),
        )
        .await?;
        self.bring_to_front(&tab).await?;
        sleep(timing.focus_settle()).await;

        let injector = Injector::new(browser, tab.id, &self.config);
        if variant {
            sleep(timing.variant_probe()).await;
            if let Err(e) = injector.reveal_upload_area().await {
                warn!(tab_id = %tab.id, error = %e, "Variant page check failed");
            }
        }

        Ok((tab.id, injector.upload(image).await))
    }

    async fn upload_alternate(&self, image: &CapturedImage) -> Result<(TabId, UploadOutcome)> {
        let browser = self.browser.as_ref();

        let tab = find_or_create_alternate_tab(browser, self.store.as_ref(), &self.config).await?;
        self.bring_to_front(&tab).await?;

        let injector = Injector::new(browser, tab.id, &self.config);
        Ok((tab.id, injector.upload_simple(image).await))
    }

    /// Activates the tab and focuses its window unless it is already active.
    async fn bring_to_front(&self, tab: &TabInfo) -> Result<()> {
        if tab.active {
            return Ok(());
        }
        self.browser.update_tab(tab.id, &TabUpdate::activate()).await?;
        self.browser.focus_window(tab.window_id).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::browser::TabStatus;
    use crate::browser::fake::{Call, FakeBrowser};
    use crate::browser::screenshot::tests::png_data_url;
    use crate::browser::script::{ATTACH_FILE, FOCUS_ELEMENT, SEND_PROBE, UPLOAD_PROBE};
    use crate::identifiers::WindowId;
    use crate::store::MemoryStore;

    struct Harness {
        browser: Arc<FakeBrowser>,
        store: Arc<MemoryStore>,
        orchestrator: CaptureOrchestrator,
    }

    fn harness() -> Harness {
        let browser = Arc::new(FakeBrowser::new());
        let store = Arc::new(MemoryStore::new());
        browser.set_capture(png_data_url(4, 4));
        let orchestrator = CaptureOrchestrator::new(
            browser.clone(),
            store.clone(),
            Arc::new(Config::default()),
        );
        Harness {
            browser,
            store,
            orchestrator,
        }
    }

    fn ready_page(browser: &FakeBrowser, tab: TabId) {
        browser.on_script(tab, &FOCUS_ELEMENT, vec![json!(true)]);
        browser.on_script(tab, &ATTACH_FILE, vec![json!(true)]);
        browser.on_script(tab, &SEND_PROBE, vec![json!([])]);
        browser.on_script(
            tab,
            &UPLOAD_PROBE,
            vec![json!({
                "url": "https://chatgpt.com/",
                "fileInputs": [{"index": 0, "accept": "image/*"}]
            })],
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_active_tab() {
        let h = harness();

        let outcome = h.orchestrator.capture_and_upload(None).await;
        assert_eq!(outcome, CaptureOutcome::Failed(Error::NoActiveTab.to_string()));
        assert!(h.browser.created().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_provider_focuses_and_uploads() {
        let h = harness();
        h.browser.add_active_tab("https://example.com/homework");
        let chat = h.browser.add_tab_in(
            "https://chatgpt.com/",
            TabStatus::Complete,
            WindowId::new(2),
            false,
        );
        ready_page(&h.browser, chat);

        let outcome = h
            .orchestrator
            .capture_and_upload(Some(Destination::Main))
            .await;

        let CaptureOutcome::Completed {
            provider,
            tab_id,
            upload,
        } = outcome
        else {
            panic!("capture failed: {outcome:?}");
        };
        assert_eq!(provider, Provider::ChatGpt);
        assert_eq!(tab_id, chat);
        assert!(upload.is_attached());

        let calls = h.browser.calls();
        assert!(calls.contains(&Call::Update(chat, TabUpdate::activate())));
        assert!(calls.contains(&Call::FocusWindow(WindowId::new(2))));

        let prefs = h.store.load().await.expect("load");
        assert!(prefs.last_used_timestamp.is_some());
        assert_eq!(prefs.chat_tab_id, Some(chat));
    }

    #[tokio::test(start_paused = true)]
    async fn test_variant_destination_checks_page_first() {
        let h = harness();
        h.browser.add_active_tab("https://example.com/");
        let chat = h
            .browser
            .add_tab("https://chatgpt.com/g/g-p-1-deltamath", TabStatus::Complete);
        ready_page(&h.browser, chat);

        h.orchestrator
            .capture_and_upload(Some(Destination::parse("g-p-1-deltamath")))
            .await;

        // variant check, injector preparation, one discovery pass
        assert_eq!(h.browser.script_runs(&UPLOAD_PROBE).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alternate_provider_uses_simple_path() {
        let h = harness();
        h.store.set_provider(Provider::Gemini).await.expect("provider");
        h.store
            .set_destination(Destination::parse("g-p-1"))
            .await
            .expect("destination");
        h.browser.add_active_tab("https://example.com/");

        let outcome = h.orchestrator.capture_and_upload(None).await;

        let CaptureOutcome::Completed { provider, tab_id, .. } = outcome else {
            panic!("capture failed: {outcome:?}");
        };
        assert_eq!(provider, Provider::Gemini);
        assert_eq!(
            h.browser.created(),
            vec!["https://gemini.google.com/app".to_string()]
        );
        assert!(h.browser.navigations(tab_id).is_empty());
        assert!(h.browser.script_runs(&UPLOAD_PROBE).is_empty());
        assert!(h.browser.script_runs(&SEND_PROBE).is_empty());
        assert_eq!(h.browser.script_runs(&ATTACH_FILE).len(), 1);
        assert_eq!(h.store.load().await.expect("load").gemini_tab_id, Some(tab_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_captures_are_serialized() {
        let h = Arc::new(harness());
        h.browser.add_active_tab("https://example.com/");
        let chat = h.browser.add_tab("https://chatgpt.com/", TabStatus::Complete);
        ready_page(&h.browser, chat);

        let first = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.orchestrator.capture_and_upload(None).await })
        };
        let second = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.orchestrator.capture_and_upload(None).await })
        };
        first.await.expect("join");
        second.await.expect("join");

        // each run's captures are followed by its own upload before the next capture
        let captures: Vec<usize> = h
            .browser
            .calls()
            .iter()
            .enumerate()
            .filter_map(|(i, c)| matches!(c, Call::Capture(_)).then_some(i))
            .collect();
        let first_attach = h
            .browser
            .calls()
            .iter()
            .position(|c| matches!(c, Call::Script { name, .. } if *name == ATTACH_FILE.name))
            .expect("attached");
        assert_eq!(captures.len(), 2);
        assert!(first_attach < captures[1]);
    }
}
