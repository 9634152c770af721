//! Folder navigation for an existing tab.

use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::browser::{Browser, TabInfo, TabUpdate, wait_for_tab_complete};
use crate::config::Config;
use crate::provider::Destination;

/// Pattern capturing everything after `marker` in a path.
fn folder_pattern(marker: &str) -> Option<Regex> {
    Regex::new(&format!("{}([^?#]+)", regex::escape(marker))).ok()
}

/// Folder id embedded in a URL's path after `marker`, including any
/// trailing path.
///
/// Query and fragment are ignored. Unparseable input is matched as-is.
#[must_use]
pub fn embedded_folder_id(url: &str, marker: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    folder_pattern(marker)?
        .captures(&path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns `true` if the URL already points at folder `id`.
///
/// Either the whole embedded path or its first segment must equal `id`.
#[must_use]
pub fn is_at_folder(url: &str, id: &str, marker: &str) -> bool {
    embedded_folder_id(url, marker)
        .is_some_and(|embedded| embedded == id || embedded.split('/').next() == Some(id))
}

/// Moves `tab` to the destination's folder unless it is already there.
///
/// Failures are logged and never returned; the caller keeps using the tab.
pub async fn navigate_to_folder(
    browser: &dyn Browser,
    tab: &TabInfo,
    destination: &Destination,
    config: &Config,
) {
    let markers = &config.markers;
    let timing = &config.timing;
    let (Some(id), Some(target)) = (destination.folder_id(), destination.target_url(markers))
    else {
        return;
    };

    if is_at_folder(tab.url_str(), id, &markers.folder_path) {
        debug!(tab_id = %tab.id, folder = id, "Tab already at folder");
        return;
    }

    debug!(tab_id = %tab.id, url = %target, "Navigating to folder");
    if let Err(e) = browser.update_tab(tab.id, &TabUpdate::navigate(&target)).await {
        warn!(tab_id = %tab.id, error = %e, "Folder navigation failed");
        return;
    }

    let state =
        wait_for_tab_complete(browser, tab.id, timing.tab_poll(), timing.tab_load_timeout()).await;
    if !state.is_finished() {
        warn!(tab_id = %tab.id, "Folder page still loading, continuing");
    }

    sleep(timing.navigation_settle()).await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::browser::TabStatus;
    use crate::browser::fake::FakeBrowser;
    use crate::config::Markers;

    const MARKER: &str = "/g/";

    fn project_config() -> Config {
        Config {
            markers: Markers {
                folder_path: "/project/".to_string(),
                ..Markers::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_embedded_folder_id() {
        assert_eq!(
            embedded_folder_id("https://chatgpt.com/g/g-p-1/project", MARKER).as_deref(),
            Some("g-p-1/project")
        );
        assert_eq!(
            embedded_folder_id("https://chatgpt.com/g/g-2?model=x", MARKER).as_deref(),
            Some("g-2")
        );
        assert_eq!(embedded_folder_id("https://chatgpt.com/", MARKER), None);
        assert_eq!(embedded_folder_id("https://chatgpt.com/?next=/g/g-3", MARKER), None);
    }

    #[test]
    fn test_is_at_folder() {
        assert!(is_at_folder("https://chatgpt.com/g/g-p-1", "g-p-1", MARKER));
        assert!(is_at_folder("https://chatgpt.com/g/g-p-1/c/abc", "g-p-1", MARKER));
        assert!(is_at_folder("https://chatgpt.com/g/g-p-1/project", "g-p-1/project", MARKER));
        assert!(!is_at_folder("https://chatgpt.com/g/g-p-10", "g-p-1", MARKER));
        assert!(!is_at_folder("https://chatgpt.com/", "g-p-1", MARKER));
    }

    #[test]
    fn test_custom_marker_round_trips_discovered_id() {
        let config = project_config();
        let marker = &config.markers.folder_path;

        let id = embedded_folder_id("https://chatgpt.com/project/abc", marker).expect("id");
        assert_eq!(id, "abc");

        let target = Destination::parse(&id).target_url(&config.markers).expect("target");
        assert_eq!(target, "https://chatgpt.com/project/abc");
        assert!(is_at_folder(&target, &id, marker));
        assert!(!is_at_folder("https://chatgpt.com/g/abc", &id, marker));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_marker_navigation() {
        let browser = FakeBrowser::new();
        let at = browser.add_tab("https://chatgpt.com/project/abc/c/1", TabStatus::Complete);
        let away = browser.add_tab("https://chatgpt.com/", TabStatus::Complete);
        let config = project_config();
        let destination = Destination::parse("abc");

        let tab = browser.tab(at).expect("tab");
        navigate_to_folder(&browser, &tab, &destination, &config).await;
        assert!(browser.navigations(at).is_empty());

        let tab = browser.tab(away).expect("tab");
        navigate_to_folder(&browser, &tab, &destination, &config).await;
        assert_eq!(
            browser.navigations(away),
            vec!["https://chatgpt.com/project/abc".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_at_folder_is_noop() {
        let browser = FakeBrowser::new();
        let tab_id = browser.add_tab("https://chatgpt.com/g/g-p-1/c/42", TabStatus::Complete);
        let tab = browser.tab(tab_id).expect("tab");

        navigate_to_folder(&browser, &tab, &Destination::parse("g-p-1"), &Config::default()).await;
        assert!(browser.navigations(tab_id).is_empty());
        assert_eq!(browser.get_count(tab_id), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigates_and_waits() {
        let browser = FakeBrowser::new();
        let tab_id = browser.add_tab("https://chatgpt.com/", TabStatus::Loading);
        browser.complete_after(tab_id, 2);
        let tab = browser.tab(tab_id).expect("tab");

        navigate_to_folder(&browser, &tab, &Destination::parse("g-p-2"), &Config::default()).await;

        assert_eq!(browser.navigations(tab_id), vec!["https://chatgpt.com/g/g-p-2".to_string()]);
        assert_eq!(browser.get_count(tab_id), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_destination_is_noop() {
        let browser = FakeBrowser::new();
        let tab_id = browser.add_tab("https://chatgpt.com/g/g-p-1", TabStatus::Complete);
        let tab = browser.tab(tab_id).expect("tab");

        navigate_to_folder(&browser, &tab, &Destination::Main, &Config::default()).await;
        assert!(browser.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_tab_is_swallowed() {
        let browser = FakeBrowser::new();
        let tab_id = browser.add_tab("https://chatgpt.com/", TabStatus::Complete);
        let tab = browser.tab(tab_id).expect("tab");
        browser.close(tab_id);

        navigate_to_folder(&browser, &tab, &Destination::parse("g-p-3"), &Config::default()).await;
        assert_eq!(browser.get_count(tab_id), 0);
    }
}
