//! In-memory [`Browser`] for tests.
//!
//! Records every call and answers page scripts from per-tab queues. The last
//! queued value for a script repeats, so a single entry acts as a constant.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{TabId, WindowId};

use super::{Browser, ImageFormat, PageScript, TabInfo, TabQuery, TabStatus, TabUpdate};

/// A recorded browser call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Query(TabQuery),
    Get(TabId),
    Create { url: String, active: bool },
    Update(TabId, TabUpdate),
    FocusWindow(WindowId),
    Capture(WindowId),
    Script { tab_id: TabId, name: &'static str, args: Vec<Value> },
}

type ScriptQueue = VecDeque<std::result::Result<Value, String>>;

#[derive(Default)]
struct State {
    tabs: Vec<TabInfo>,
    next_id: u32,
    calls: Vec<Call>,
    scripts: FxHashMap<(TabId, &'static str), ScriptQueue>,
    /// Remaining `get` polls before a loading tab completes.
    pending_loads: FxHashMap<TabId, usize>,
    /// Polls newly created tabs need before completing.
    create_load_polls: usize,
    capture: Option<String>,
    focused_window: WindowId,
}

/// Scriptable in-memory browser.
pub(crate) struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                focused_window: WindowId::new(1),
                ..State::default()
            }),
        }
    }

    /// Adds an inactive tab in window 1.
    pub(crate) fn add_tab(&self, url: &str, status: TabStatus) -> TabId {
        self.add_tab_in(url, status, WindowId::new(1), false)
    }

    /// Adds the active tab of the focused window.
    pub(crate) fn add_active_tab(&self, url: &str) -> TabId {
        let window = self.state.lock().focused_window;
        self.add_tab_in(url, TabStatus::Complete, window, true)
    }

    pub(crate) fn add_tab_in(
        &self,
        url: &str,
        status: TabStatus,
        window_id: WindowId,
        active: bool,
    ) -> TabId {
        let mut state = self.state.lock();
        let id = next_tab_id(&mut state);
        if active {
            deactivate_window(&mut state, window_id);
        }
        state.tabs.push(TabInfo {
            id,
            window_id,
            url: Some(url.to_string()),
            status,
            active,
            discarded: false,
        });
        id
    }

    pub(crate) fn discard(&self, tab_id: TabId) {
        if let Some(tab) = self.state.lock().tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.discarded = true;
        }
    }

    pub(crate) fn close(&self, tab_id: TabId) {
        self.state.lock().tabs.retain(|t| t.id != tab_id);
    }

    /// Completes a loading tab after `polls` further `get` calls.
    pub(crate) fn complete_after(&self, tab_id: TabId, polls: usize) {
        self.state.lock().pending_loads.insert(tab_id, polls);
    }

    /// Newly created tabs start loading and complete after `polls` gets.
    pub(crate) fn load_created_tabs_after(&self, polls: usize) {
        self.state.lock().create_load_polls = polls;
    }

    pub(crate) fn set_capture(&self, data_url: impl Into<String>) {
        self.state.lock().capture = Some(data_url.into());
    }

    /// Queues results for a script on a tab.
    pub(crate) fn on_script(&self, tab_id: TabId, script: &PageScript, values: Vec<Value>) {
        self.state
            .lock()
            .scripts
            .insert((tab_id, script.name), values.into_iter().map(Ok).collect());
    }

    /// Makes a script throw on a tab.
    pub(crate) fn fail_script(&self, tab_id: TabId, script: &PageScript, message: &str) {
        self.state
            .lock()
            .scripts
            .insert((tab_id, script.name), VecDeque::from([Err(message.to_string())]));
    }

    pub(crate) fn tab(&self, tab_id: TabId) -> Option<TabInfo> {
        self.state.lock().tabs.iter().find(|t| t.id == tab_id).cloned()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn get_count(&self, tab_id: TabId) -> usize {
        self.count(|c| matches!(c, Call::Get(id) if *id == tab_id))
    }

    pub(crate) fn query_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Query(_)))
    }

    pub(crate) fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    /// URLs the tab was navigated to.
    pub(crate) fn navigations(&self, tab_id: TabId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(id, update) if id == tab_id => update.url,
                _ => None,
            })
            .collect()
    }

    /// Argument lists of every run of a script.
    pub(crate) fn script_runs(&self, script: &PageScript) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Script { name, args, .. } if name == script.name => Some(args),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

fn next_tab_id(state: &mut State) -> TabId {
    let id = TabId::new(state.next_id).unwrap_or_else(|| unreachable!("ids start at 1"));
    state.next_id += 1;
    id
}

fn deactivate_window(state: &mut State, window_id: WindowId) {
    for tab in state.tabs.iter_mut().filter(|t| t.window_id == window_id) {
        tab.active = false;
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<TabInfo>> {
        self.record(Call::Query(query.clone()));
        let state = self.state.lock();
        Ok(state
            .tabs
            .iter()
            .filter(|t| query.active.is_none_or(|active| t.active == active))
            .filter(|t| {
                query.last_focused_window != Some(true) || t.window_id == state.focused_window
            })
            .filter(|t| query.matches_url(t.url_str()))
            .cloned()
            .collect())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo> {
        self.record(Call::Get(tab_id));
        let mut state = self.state.lock();

        let finished = match state.pending_loads.get_mut(&tab_id) {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if finished {
            state.pending_loads.remove(&tab_id);
        }

        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| Error::tab_not_found(tab_id))?;
        if finished {
            tab.status = TabStatus::Complete;
        }
        Ok(tab.clone())
    }

    async fn create_tab(&self, url: &str, active: bool) -> Result<TabInfo> {
        self.record(Call::Create {
            url: url.to_string(),
            active,
        });

        let mut state = self.state.lock();
        let id = next_tab_id(&mut state);
        let window_id = state.focused_window;
        let polls = state.create_load_polls;
        let status = if polls == 0 {
            TabStatus::Complete
        } else {
            state.pending_loads.insert(id, polls);
            TabStatus::Loading
        };
        if active {
            deactivate_window(&mut state, window_id);
        }

        let tab = TabInfo {
            id,
            window_id,
            url: Some(url.to_string()),
            status,
            active,
            discarded: false,
        };
        state.tabs.push(tab.clone());
        Ok(tab)
    }

    async fn update_tab(&self, tab_id: TabId, update: &TabUpdate) -> Result<TabInfo> {
        self.record(Call::Update(tab_id, update.clone()));

        let mut state = self.state.lock();
        let window_id = state
            .tabs
            .iter()
            .find(|t| t.id == tab_id)
            .map(|t| t.window_id)
            .ok_or_else(|| Error::tab_not_found(tab_id))?;
        if update.active == Some(true) {
            deactivate_window(&mut state, window_id);
        }

        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| Error::tab_not_found(tab_id))?;
        if let Some(url) = &update.url {
            tab.url = Some(url.clone());
        }
        if let Some(active) = update.active {
            tab.active = active;
        }
        Ok(tab.clone())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        self.record(Call::FocusWindow(window_id));
        self.state.lock().focused_window = window_id;
        Ok(())
    }

    async fn capture_visible_tab(
        &self,
        window_id: WindowId,
        _format: ImageFormat,
    ) -> Result<String> {
        self.record(Call::Capture(window_id));
        self.state
            .lock()
            .capture
            .clone()
            .ok_or_else(|| Error::capture("capture not configured"))
    }

    async fn execute_script(
        &self,
        tab_id: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.record(Call::Script {
            tab_id,
            name: script.name,
            args,
        });

        let mut state = self.state.lock();
        if !state.tabs.iter().any(|t| t.id == tab_id) {
            return Err(Error::tab_not_found(tab_id));
        }

        let Some(queue) = state.scripts.get_mut(&(tab_id, script.name)) else {
            return Ok(Value::Null);
        };
        let result = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match result {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::script_error(script.name, message)),
            None => Ok(Value::Null),
        }
    }
}
