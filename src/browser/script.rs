//! Named page-context scripts.
//!
//! Each script is the body of an async function that receives `args` and runs
//! in the target tab's main frame. Probe scripts only read the DOM and return
//! JSON snapshots; action scripts touch exactly one element and return
//! whether they found it. Decisions are made in Rust over the snapshots
//! (see [`crate::page`]).

// ============================================================================
// PageScript
// ============================================================================

/// A page script with a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageScript {
    /// Name, used for logging on both ends.
    pub name: &'static str,
    /// Function body.
    pub source: &'static str,
}

/// Selector shared by the probe and [`CLICK_ELEMENT`], so indices agree.
pub const CLICKABLE_SELECTOR: &str = r#"button, a, span, div[role="button"]"#;

/// Snapshot of folder links.
///
/// Args: `[selectors: string[], marker: string]`.
pub const FOLDER_SCAN: PageScript = PageScript {
    name: "folderScan",
    source: r#"
const [selectors, marker] = args;
const text = (el) => (el && el.innerText ? el.innerText.trim() : "");
const targeted = selectors.map((selector) => {
  let links = [];
  try {
    links = Array.from(document.querySelectorAll(selector)).map((el) => ({
      href: el.getAttribute("href"),
      text: text(el),
      childText: text(el.querySelector("div, span")),
    }));
  } catch (e) {
    links = [];
  }
  return { selector, links };
});
const allLinks = Array.from(document.querySelectorAll("a"))
  .filter((el) => (el.getAttribute("href") || "").includes(marker))
  .map((el) => ({
    href: el.getAttribute("href"),
    text: text(el),
    parentText: el.parentElement ? text(el.parentElement.querySelector("div, span")) : "",
  }));
return { targeted, allLinks };
"#,
};

/// Snapshot of file inputs and clickable elements.
///
/// Args: `[composerSelector: string, clickableSelector: string]`.
pub const UPLOAD_PROBE: PageScript = PageScript {
    name: "uploadProbe",
    source: r#"
const [composerSelector, clickableSelector] = args;
const composer = document.querySelector(composerSelector);
const shown = (el) => !!el && window.getComputedStyle(el).display !== "none";
const fileInputs = Array.from(document.querySelectorAll('input[type="file"]')).map(
  (input, index) => ({
    index,
    accept: input.accept || "",
    inComposer: !!composer && composer.contains(input),
    displayed: shown(input) || shown(input.parentElement),
  })
);
const clickables = Array.from(document.querySelectorAll(clickableSelector)).map((el, index) => ({
  index,
  tag: el.tagName.toLowerCase(),
  role: el.getAttribute("role") || "",
  text: (el.innerText || "").trim(),
}));
return { url: window.location.href, title: document.title, fileInputs, clickables };
"#,
};

/// Clicks the clickable element at an index from [`UPLOAD_PROBE`].
///
/// Args: `[clickableSelector: string, index: number]`.
pub const CLICK_ELEMENT: PageScript = PageScript {
    name: "clickElement",
    source: r#"
const [clickableSelector, index] = args;
const el = document.querySelectorAll(clickableSelector)[index];
if (!el) return false;
el.click();
return true;
"#,
};

/// Focuses the first element matching a selector.
///
/// Args: `[selector: string]`.
pub const FOCUS_ELEMENT: PageScript = PageScript {
    name: "focusElement",
    source: r#"
const [selector] = args;
const el = document.querySelector(selector);
if (!el) return false;
el.focus();
return true;
"#,
};

/// Attaches a data URL as a file to the file input at an index.
///
/// Args: `[inputIndex: number, dataUrl: string, fileName: string, mime: string]`.
pub const ATTACH_FILE: PageScript = PageScript {
    name: "attachFile",
    source: r#"
const [inputIndex, dataUrl, fileName, mime] = args;
const input = document.querySelectorAll('input[type="file"]')[inputIndex];
if (!input) return false;
const payload = dataUrl.split(",")[1] || "";
const binary = atob(payload);
const bytes = new Uint8Array(binary.length);
for (let i = 0; i < binary.length; i++) bytes[i] = binary.charCodeAt(i);
const transfer = new DataTransfer();
transfer.items.add(new File([bytes], fileName, { type: mime }));
input.files = transfer.files;
input.dispatchEvent(new Event("change", { bubbles: true }));
return true;
"#,
};

/// Snapshot of send-button candidates per selector.
///
/// Args: `[selectors: string[]]`.
pub const SEND_PROBE: PageScript = PageScript {
    name: "sendProbe",
    source: r#"
const [selectors] = args;
return selectors.map((selector) => {
  let buttons = [];
  try {
    buttons = Array.from(document.querySelectorAll(selector)).map((btn) => ({
      disabled: !!btn.disabled,
    }));
  } catch (e) {
    buttons = [];
  }
  return { selector, buttons };
});
"#,
};

/// Clicks the button at an index under a selector.
///
/// Args: `[selector: string, index: number]`.
pub const CLICK_MATCH: PageScript = PageScript {
    name: "clickMatch",
    source: r#"
const [selector, index] = args;
const el = document.querySelectorAll(selector)[index];
if (!el || el.disabled) return false;
el.click();
return true;
"#,
};

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_names_are_unique() {
        let names = [
            FOLDER_SCAN.name,
            UPLOAD_PROBE.name,
            CLICK_ELEMENT.name,
            FOCUS_ELEMENT.name,
            ATTACH_FILE.name,
            SEND_PROBE.name,
            CLICK_MATCH.name,
        ];
        let unique: rustc_hash::FxHashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_scripts_read_args() {
        for script in [FOLDER_SCAN, UPLOAD_PROBE, CLICK_ELEMENT, ATTACH_FILE, SEND_PROBE] {
            assert!(script.source.contains("args"), "{} ignores args", script.name);
        }
    }
}
