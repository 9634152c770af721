//! Deadline-bounded wait for tab load.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::identifiers::TabId;

use super::Browser;

// ============================================================================
// LoadState
// ============================================================================

/// How a wait for tab load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Tab reported `complete`.
    Complete,
    /// Tab could no longer be queried.
    Gone,
    /// Deadline passed while the tab was still loading.
    TimedOut,
}

impl LoadState {
    /// Returns `true` unless the deadline passed.
    ///
    /// A gone tab counts as finished.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }
}

// ============================================================================
// wait_for_tab_complete
// ============================================================================

/// Polls a tab until it finishes loading, disappears or the deadline passes.
///
/// The first check happens immediately.
pub async fn wait_for_tab_complete(
    browser: &dyn Browser,
    tab_id: TabId,
    poll: Duration,
    deadline: Duration,
) -> LoadState {
    let until = Instant::now() + deadline;

    loop {
        match browser.get_tab(tab_id).await {
            Ok(tab) if tab.is_complete() => return LoadState::Complete,
            Ok(tab) => trace!(%tab_id, status = ?tab.status, "Tab still loading"),
            Err(e) => {
                debug!(%tab_id, error = %e, "Tab no longer queryable");
                return LoadState::Gone;
            }
        }

        if Instant::now() + poll > until {
            return LoadState::TimedOut;
        }
        sleep(poll).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
