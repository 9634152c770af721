//! Finding or opening the upload tab.
//!
//! The default provider resolver prefers, in order: a tab already at the
//! destination's address, the remembered tab, any provider tab, a new tab.
//! The alternate provider resolver skips the address search and navigation.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::browser::{Browser, TabInfo, TabQuery, prefer_complete, wait_for_tab_complete};
use crate::config::Config;
use crate::error::Result;
use crate::navigator::navigate_to_folder;
use crate::provider::{Destination, Provider};
use crate::store::{PreferenceStore, StoreExt};

// ============================================================================
// Destination
// ============================================================================

/// Persists an explicit destination, or reads the stored one.
///
/// Storage failures are logged; the requested value (or `Main`) is used.
pub async fn resolve_destination(
    store: &dyn PreferenceStore,
    requested: Option<Destination>,
) -> Destination {
    match requested {
        Some(destination) => {
            if let Err(e) = store.set_destination(destination.clone()).await {
                warn!(error = %e, "Failed to save destination");
            } else {
                debug!(%destination, "Saved preferred destination");
            }
            destination
        }
        None => match store.load().await {
            Ok(prefs) => prefs.destination(),
            Err(e) => {
                warn!(error = %e, "Failed to read destination, using main");
                Destination::Main
            }
        },
    }
}

// ============================================================================
// Default provider
// ============================================================================

/// Resolves the default provider's tab for a destination.
///
/// # Errors
///
/// Returns browser errors from tab queries or tab creation. Navigation and
/// storage failures are logged instead.
pub async fn find_or_create_chat_tab(
    browser: &dyn Browser,
    store: &dyn PreferenceStore,
    config: &Config,
    requested: Option<Destination>,
) -> Result<TabInfo> {
    let provider = Provider::ChatGpt;
    let destination = resolve_destination(store, requested).await;
    let target = destination.target_url(&config.markers);

    if let Some(kind) = destination.kind(&config.markers) {
        debug!(%destination, ?kind, "Folder destination");
    }

    if let Some(target) = &target
        && let Some(tab) = find_tab_at(browser, target).await?
    {
        debug!(tab_id = %tab.id, url = %target, "Tab already at destination");
        remember(store, provider, &tab).await;
        return Ok(tab);
    }

    if let Some(tab) = remembered_live_tab(browser, store, provider).await {
        navigate_to_folder(browser, &tab, &destination, config).await;
        return Ok(tab);
    }

    let candidates = browser
        .query_tabs(&TabQuery::urls(provider.url_patterns()))
        .await?;
    if let Some(tab) = prefer_complete(&candidates).cloned() {
        debug!(tab_id = %tab.id, "Using existing provider tab");
        remember(store, provider, &tab).await;
        navigate_to_folder(browser, &tab, &destination, config).await;
        return Ok(tab);
    }

    let url = target.as_deref().unwrap_or(provider.home_url());
    open_tab(browser, store, config, provider, url).await
}

/// Tabs exactly at `target`, else tabs under it.
async fn find_tab_at(browser: &dyn Browser, target: &str) -> Result<Option<TabInfo>> {
    let tabs = browser.query_tabs(&TabQuery::all()).await?;

    let exact: Vec<TabInfo> = tabs
        .iter()
        .filter(|t| t.url_str() == target)
        .cloned()
        .collect();
    if let Some(tab) = prefer_complete(&exact) {
        return Ok(Some(tab.clone()));
    }

    let prefixed: Vec<TabInfo> = tabs
        .into_iter()
        .filter(|t| t.url_str().starts_with(target))
        .collect();
    Ok(prefer_complete(&prefixed).cloned())
}

// ============================================================================
// Alternate provider
// ============================================================================

/// Resolves the alternate provider's tab.
///
/// # Errors
///
/// Returns browser errors from tab queries or tab creation.
pub async fn find_or_create_alternate_tab(
    browser: &dyn Browser,
    store: &dyn PreferenceStore,
    config: &Config,
) -> Result<TabInfo> {
    let provider = Provider::Gemini;

    if let Some(tab) = remembered_live_tab(browser, store, provider).await {
        return Ok(tab);
    }

    let candidates = browser
        .query_tabs(&TabQuery::urls(provider.url_patterns()))
        .await?;
    if let Some(tab) = prefer_complete(&candidates).cloned() {
        remember(store, provider, &tab).await;
        return Ok(tab);
    }

    open_tab(browser, store, config, provider, provider.home_url()).await
}

// ============================================================================
// Shared steps
// ============================================================================

/// The remembered tab, if it still exists and holds its content.
async fn remembered_live_tab(
    browser: &dyn Browser,
    store: &dyn PreferenceStore,
    provider: Provider,
) -> Option<TabInfo> {
    let tab_id = match store.load().await {
        Ok(prefs) => prefs.remembered_tab(provider)?,
        Err(e) => {
            warn!(error = %e, "Failed to read remembered tab");
            return None;
        }
    };

    match browser.get_tab(tab_id).await {
        Ok(tab) if !tab.discarded => {
            debug!(%tab_id, %provider, "Using remembered tab");
            Some(tab)
        }
        Ok(_) => {
            debug!(%tab_id, "Remembered tab was discarded");
            None
        }
        Err(e) => {
            debug!(%tab_id, error = %e, "Remembered tab is gone");
            None
        }
    }
}

/// Opens a tab, remembers it, and returns it once loaded.
async fn open_tab(
    browser: &dyn Browser,
    store: &dyn PreferenceStore,
    config: &Config,
    provider: Provider,
    url: &str,
) -> Result<TabInfo> {
    let created = browser.create_tab(url, true).await?;
    info!(tab_id = %created.id, url, "Opened upload tab");
    remember(store, provider, &created).await;

    let state = wait_for_tab_complete(
        browser,
        created.id,
        config.timing.tab_poll(),
        config.timing.tab_load_timeout(),
    )
    .await;
    if state.is_finished() {
        debug!(tab_id = %created.id, ?state, "New tab load finished");
    } else {
        warn!(tab_id = %created.id, "New tab still loading, continuing");
    }

    match browser.get_tab(created.id).await {
        Ok(tab) => Ok(tab),
        Err(e) => {
            debug!(tab_id = %created.id, error = %e, "Refresh failed, using created tab");
            Ok(created)
        }
    }
}

async fn remember(store: &dyn PreferenceStore, provider: Provider, tab: &TabInfo) {
    if let Err(e) = store.remember_tab(provider, tab.id).await {
        warn!(tab_id = %tab.id, error = %e, "Failed to remember tab");
    }
}

// ============================================================================
// Tests
// ============================================================================
