//! Attaching a capture to the chat page and sending it.
//!
//! The full variant prepares variant pages, focuses the composer, discovers a
//! file input with retries, attaches the image and clicks send. The alternate
//! variant attaches to the first input and focuses the prompt.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::script::{
    ATTACH_FILE, CLICK_ELEMENT, CLICK_MATCH, CLICKABLE_SELECTOR, FOCUS_ELEMENT, SEND_PROBE,
    UPLOAD_PROBE,
};
use crate::browser::{Browser, CapturedImage, PageScript};
use crate::config::Config;
use crate::error::Result;
use crate::identifiers::TabId;
use crate::page::{
    ALTERNATE_PROMPT_SELECTOR, COMPOSER_CONTAINER_SELECTOR, COMPOSER_SELECTOR,
    FILE_INPUT_STRATEGIES, PAGE_PREP_KEYWORDS, PAGE_PREP_TARGETS, PRE_UPLOAD_KEYWORDS,
    PRE_UPLOAD_TARGETS, SEND_SELECTORS, SendCandidates, UPLOAD_BUTTON_KEYWORDS,
    UPLOAD_BUTTON_TARGETS, UploadProbe, first_match, pick_send_button,
};

// ============================================================================
// UploadOutcome
// ============================================================================

/// What an injection attempt achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No file input appeared; nothing was attached.
    NoInput,
    /// The image was attached.
    Attached {
        /// Strategy that picked the input.
        strategy: &'static str,
        /// Whether a send control was clicked.
        sent: bool,
    },
    /// A page script failed; the error was logged.
    Failed(String),
}

impl UploadOutcome {
    /// Returns `true` if the image reached a file input.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }
}

// ============================================================================
// Injector
// ============================================================================

/// Page operations against one tab.
pub struct Injector<'a> {
    browser: &'a dyn Browser,
    tab_id: TabId,
    config: &'a Config,
}

impl<'a> Injector<'a> {
    /// Creates an injector for `tab_id`.
    #[must_use]
    pub fn new(browser: &'a dyn Browser, tab_id: TabId, config: &'a Config) -> Self {
        Self {
            browser,
            tab_id,
            config,
        }
    }

    /// Full upload: prepare, discover with retries, attach, send.
    ///
    /// Never fails; errors are logged and reported in the outcome.
    pub async fn upload(&self, image: &CapturedImage) -> UploadOutcome {
        if let Err(e) = self.prepare_page().await {
            warn!(tab_id = %self.tab_id, error = %e, "Page preparation failed");
        }

        match self.attach_and_send(image).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tab_id = %self.tab_id, error = %e, "Upload failed");
                UploadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Alternate upload: first input, then the prompt. No send click.
    pub async fn upload_simple(&self, image: &CapturedImage) -> UploadOutcome {
        let result: Result<UploadOutcome> = async {
            let outcome = if self.attach(0, image).await? {
                UploadOutcome::Attached {
                    strategy: "first",
                    sent: false,
                }
            } else {
                warn!(tab_id = %self.tab_id, "No file input on page");
                UploadOutcome::NoInput
            };
            self.focus(ALTERNATE_PROMPT_SELECTOR).await?;
            Ok(outcome)
        }
        .await;

        result.unwrap_or_else(|e| {
            warn!(tab_id = %self.tab_id, error = %e, "Upload failed");
            UploadOutcome::Failed(e.to_string())
        })
    }

    /// Opens the project upload area when a variant destination shows no
    /// file input. Returns `true` if a control was clicked.
    ///
    /// # Errors
    ///
    /// Returns page script errors.
    pub async fn reveal_upload_area(&self) -> Result<bool> {
        let probe = self.probe().await?;
        if !probe.file_inputs.is_empty() {
            debug!(tab_id = %self.tab_id, "Page ready for upload");
            return Ok(false);
        }

        let Some(target) = probe.find_clickable_any(PRE_UPLOAD_TARGETS, PRE_UPLOAD_KEYWORDS) else {
            debug!(tab_id = %self.tab_id, "No project control found");
            return Ok(false);
        };
        debug!(text = %target.text, "Clicking project control");
        self.click(target.index).await?;
        sleep(self.config.timing.page_prep()).await;
        Ok(true)
    }

    /// Reveals the upload area on variant pages that have no input yet.
    async fn prepare_page(&self) -> Result<()> {
        let probe = self.probe().await?;
        debug!(
            tab_id = %self.tab_id,
            url = %probe.url,
            title = %probe.title,
            inputs = probe.file_inputs.len(),
            "Page status before upload"
        );

        if !probe.url.contains(&self.config.markers.variant) || !probe.file_inputs.is_empty() {
            return Ok(());
        }

        if let Some((keyword, target)) =
            probe.find_clickable_by_priority(PAGE_PREP_TARGETS, PAGE_PREP_KEYWORDS)
        {
            debug!(keyword, text = %target.text, "Clicking upload area control");
            self.click(target.index).await?;
        }
        sleep(self.config.timing.page_prep()).await;
        Ok(())
    }

    async fn attach_and_send(&self, image: &CapturedImage) -> Result<UploadOutcome> {
        self.focus(COMPOSER_SELECTOR).await?;
        sleep(self.config.timing.composer_focus()).await;

        let mut found = self.find_file_input().await?;
        for delay in self.config.timing.input_retries() {
            if found.is_some() {
                break;
            }
            debug!(
                tab_id = %self.tab_id,
                ?delay,
                "No input yet, retrying"
            );
            sleep(delay).await;
            found = self.find_file_input().await?;
        }

        let Some((strategy, index)) = found else {
            warn!(tab_id = %self.tab_id, "No file input found after retries");
            return Ok(UploadOutcome::NoInput);
        };

        if !self.attach(index, image).await? {
            warn!(tab_id = %self.tab_id, index, "File input vanished before attach");
            return Ok(UploadOutcome::NoInput);
        }
        info!(tab_id = %self.tab_id, strategy, "Attached capture");

        sleep(self.config.timing.send_delay()).await;
        let mut sent = self.click_send().await?;
        if !sent {
            debug!(tab_id = %self.tab_id, "Send not ready, retrying");
            sleep(self.config.timing.send_retry()).await;
            sent = self.click_send().await?;
        }
        if !sent {
            debug!(tab_id = %self.tab_id, "No enabled send control");
        }

        Ok(UploadOutcome::Attached { strategy, sent })
    }

    /// One discovery pass.
    ///
    /// With no inputs at all, clicks an upload-looking control and yields
    /// nothing so the next pass can see what it revealed.
    async fn find_file_input(&self) -> Result<Option<(&'static str, usize)>> {
        let probe = self.probe().await?;

        if probe.file_inputs.is_empty()
            && let Some(button) =
                probe.find_clickable_any(UPLOAD_BUTTON_TARGETS, UPLOAD_BUTTON_KEYWORDS)
        {
            debug!(text = %button.text, "Clicking upload control");
            self.click(button.index).await?;
            return Ok(None);
        }

        let found = first_match(FILE_INPUT_STRATEGIES, &probe);
        if let Some((strategy, index)) = found {
            debug!(strategy, index, "File input found");
        }
        Ok(found)
    }

    /// Clicks the first enabled send control.
    async fn click_send(&self) -> Result<bool> {
        let value = self.run(&SEND_PROBE, vec![json!(SEND_SELECTORS)]).await?;
        let candidates: Vec<SendCandidates> = serde_json::from_value(value)?;

        let Some((selector, index)) = pick_send_button(&candidates) else {
            return Ok(false);
        };
        debug!(selector, "Clicking send");
        let clicked = self.run(&CLICK_MATCH, vec![json!(selector), json!(index)]).await?;
        Ok(is_true(&clicked))
    }

    async fn probe(&self) -> Result<UploadProbe> {
        let value = self
            .run(
                &UPLOAD_PROBE,
                vec![json!(COMPOSER_CONTAINER_SELECTOR), json!(CLICKABLE_SELECTOR)],
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn click(&self, index: usize) -> Result<bool> {
        let clicked = self
            .run(&CLICK_ELEMENT, vec![json!(CLICKABLE_SELECTOR), json!(index)])
            .await?;
        Ok(is_true(&clicked))
    }

    async fn focus(&self, selector: &str) -> Result<bool> {
        let focused = is_true(&self.run(&FOCUS_ELEMENT, vec![json!(selector)]).await?);
        if !focused {
            debug!(selector, "Nothing to focus");
        }
        Ok(focused)
    }

    async fn attach(&self, index: usize, image: &CapturedImage) -> Result<bool> {
        let attached = self
            .run(
                &ATTACH_FILE,
                vec![
                    json!(index),
                    json!(image.data_url),
                    json!(image.file_name()),
                    json!(image.mime_type()),
                ],
            )
            .await?;
        Ok(is_true(&attached))
    }

    async fn run(&self, script: &PageScript, args: Vec<Value>) -> Result<Value> {
        self.browser.execute_script(self.tab_id, script, args).await
    }
}

fn is_true(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
