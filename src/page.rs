//! Page snapshots and the strategies that read them.
//!
//! Probe scripts return the shapes below; every decision about *which*
//! element to use is a named [`Strategy`] tried in priority order.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

// ============================================================================
// Selectors
// ============================================================================

/// Editable composer elements, first one is focused.
pub const COMPOSER_SELECTOR: &str = r#"textarea, [contenteditable="true"]"#;

/// Containers that scope the composer's own file input.
pub const COMPOSER_CONTAINER_SELECTOR: &str =
    r#".chat-composer, .text-input-with-buttons, [data-testid="text-input-with-attachments"]"#;

/// Prompt element of the alternate provider.
pub const ALTERNATE_PROMPT_SELECTOR: &str = r#"rich-textarea .ql-editor, div[contenteditable="true"]"#;

/// Send controls in priority order.
pub const SEND_SELECTORS: &[&str] = &[
    r#"button[type="submit"]"#,
    r#"[data-testid="send-button"]"#,
    r#"button:has(svg[aria-label="Send"])"#,
    r#"button[aria-label="Send"]"#,
    "button.send-button",
    "button.primary",
    "button.submit",
];

/// Keywords tried in order when a variant page has no file input yet.
pub const PAGE_PREP_KEYWORDS: &[&str] = &["upload", "project", "attach", "file", "photo", "image"];

/// Keywords that mark an upload control when no file input exists.
pub const UPLOAD_BUTTON_KEYWORDS: &[&str] = &["upload", "attach", "file", "image", "photo"];

/// Keywords that reveal the upload area before injection.
pub const PRE_UPLOAD_KEYWORDS: &[&str] = &["project", "upload"];

// ============================================================================
// Strategy
// ============================================================================

/// A named pure function from a snapshot to an optional result.
pub struct Strategy<S: ?Sized, T> {
    /// Name used in logs.
    pub name: &'static str,
    /// Returns `None` to pass to the next strategy.
    pub run: fn(&S) -> Option<T>,
}

/// Runs strategies in order and returns the first result with its name.
pub fn first_match<S: ?Sized, T>(
    strategies: &[Strategy<S, T>],
    snapshot: &S,
) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(snapshot).map(|result| (s.name, result)))
}

// ============================================================================
// Folder snapshot
// ============================================================================

/// Result of the folder scan probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FolderSnapshot {
    /// Matches per targeted selector, in priority order.
    pub targeted: Vec<SelectorHits>,
    /// Every link whose href contains the folder marker.
    pub all_links: Vec<LinkNode>,
}

/// Links matched by one selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorHits {
    /// The selector.
    pub selector: String,
    /// Matched links in document order.
    pub links: Vec<LinkNode>,
}

/// A link element and the text around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkNode {
    /// Raw `href` attribute.
    pub href: Option<String>,
    /// Trimmed visible text.
    pub text: String,
    /// Text of the first `div, span` inside the link.
    pub child_text: String,
    /// Text of the first `div, span` inside the parent.
    pub parent_text: String,
}

// ============================================================================
// Upload probe
// ============================================================================

/// Result of the upload probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadProbe {
    /// Page address.
    pub url: String,
    /// Page title.
    pub title: String,
    /// `input[type=file]` elements in document order.
    pub file_inputs: Vec<FileInput>,
    /// Candidate click targets in document order.
    pub clickables: Vec<Clickable>,
}

/// A file input element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileInput {
    /// Position among the page's file inputs.
    pub index: usize,
    /// `accept` attribute.
    pub accept: String,
    /// Inside a composer container.
    pub in_composer: bool,
    /// The input or its parent is not `display: none`.
    pub displayed: bool,
}

/// A clickable element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Clickable {
    /// Position in the probe's clickable list.
    pub index: usize,
    /// Lowercase tag name.
    pub tag: String,
    /// `role` attribute.
    pub role: String,
    /// Trimmed visible text.
    pub text: String,
}

/// Element shapes a click search may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `button`
    Button,
    /// `a`
    Link,
    /// `span`
    Span,
    /// `div[role=button]`
    RoleButton,
}

impl Clickable {
    /// Returns `true` if the element has one of the given shapes.
    #[must_use]
    pub fn is_one_of(&self, kinds: &[ElementKind]) -> bool {
        kinds.iter().any(|kind| match kind {
            ElementKind::Button => self.tag == "button",
            ElementKind::Link => self.tag == "a",
            ElementKind::Span => self.tag == "span",
            ElementKind::RoleButton => self.tag == "div" && self.role == "button",
        })
    }

    /// Case-insensitive text containment.
    #[must_use]
    pub fn text_contains(&self, keyword: &str) -> bool {
        self.text.to_lowercase().contains(keyword)
    }
}

/// Shapes searched when preparing a variant page.
pub const PAGE_PREP_TARGETS: &[ElementKind] =
    &[ElementKind::Button, ElementKind::Link, ElementKind::RoleButton];

/// Shapes searched for an upload control when no input exists.
pub const UPLOAD_BUTTON_TARGETS: &[ElementKind] =
    &[ElementKind::Button, ElementKind::Span, ElementKind::RoleButton];

/// Shapes searched before injection on variant destinations.
pub const PRE_UPLOAD_TARGETS: &[ElementKind] = &[ElementKind::Button, ElementKind::Link];

impl UploadProbe {
    /// First element of the given shapes whose text contains any keyword.
    #[must_use]
    pub fn find_clickable_any(&self, kinds: &[ElementKind], keywords: &[&str]) -> Option<&Clickable> {
        self.clickables
            .iter()
            .find(|c| c.is_one_of(kinds) && keywords.iter().any(|k| c.text_contains(k)))
    }

    /// Tries keywords in order and returns the first element matching one.
    ///
    /// Keyword priority wins over document order.
    #[must_use]
    pub fn find_clickable_by_priority(
        &self,
        kinds: &[ElementKind],
        keywords: &[&'static str],
    ) -> Option<(&'static str, &Clickable)> {
        keywords.iter().find_map(|keyword| {
            self.clickables
                .iter()
                .find(|c| c.is_one_of(kinds) && c.text_contains(keyword))
                .map(|c| (*keyword, c))
        })
    }
}

// ============================================================================
// File input strategies
// ============================================================================

/// File input strategies, most specific first.
pub const FILE_INPUT_STRATEGIES: &[Strategy<UploadProbe, usize>] = &[
    Strategy {
        name: "image-accept",
        run: |probe| {
            probe
                .file_inputs
                .iter()
                .find(|i| i.accept.to_lowercase().contains("image"))
                .map(|i| i.index)
        },
    },
    Strategy {
        name: "composer-scoped",
        run: |probe| probe.file_inputs.iter().find(|i| i.in_composer).map(|i| i.index),
    },
    Strategy {
        name: "displayed",
        run: |probe| probe.file_inputs.iter().find(|i| i.displayed).map(|i| i.index),
    },
    Strategy {
        name: "first",
        run: |probe| probe.file_inputs.first().map(|i| i.index),
    },
];

// ============================================================================
// Send probe
// ============================================================================

/// Send-button candidates under one selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendCandidates {
    /// The selector.
    pub selector: String,
    /// Matches in document order.
    pub buttons: Vec<SendButton>,
}

/// A send-button candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SendButton {
    /// `disabled` property.
    pub disabled: bool,
}

/// First enabled button under the first selector that has one.
#[must_use]
pub fn pick_send_button(candidates: &[SendCandidates]) -> Option<(&str, usize)> {
    candidates.iter().find_map(|group| {
        group
            .buttons
            .iter()
            .position(|b| !b.disabled)
            .map(|index| (group.selector.as_str(), index))
    })
}

// ============================================================================
// Tests
// ============================================================================
