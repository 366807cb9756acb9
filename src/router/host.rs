use std::sync::{Arc, Mutex, MutexGuard};

use super::click::ClickEvent;

pub type ClickListener = Arc<dyn Fn(&mut ClickEvent) + Send + Sync>;
pub type PopStateListener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What the router needs from the environment it runs in: the location,
/// history push, and document-level click / window-level popstate
/// listener registration.
pub trait BrowserHost: Send + Sync {
    /// Scheme, host and port of the current document, e.g. `http://localhost:8000`.
    fn origin(&self) -> String;

    fn current_path(&self) -> String;

    /// Push a new history entry without reloading.
    fn push_state(&self, path: &str);

    fn add_click_listener(&self, listener: ClickListener) -> ListenerId;

    fn add_popstate_listener(&self, listener: PopStateListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

// ── In-memory host ───────────────────────────────────────────────────

struct HostState {
    entries: Vec<String>,
    index: usize,
    next_id: u64,
    click_listeners: Vec<(ListenerId, ClickListener)>,
    popstate_listeners: Vec<(ListenerId, PopStateListener)>,
    native_navigations: usize,
}

/// Browser stand-in with a back/forward stack. Used by the CLI to walk
/// the dashboard and by tests to drive the router.
pub struct MemoryHost {
    origin: String,
    state: Mutex<HostState>,
}

impl MemoryHost {
    pub fn new(origin: impl Into<String>, initial_path: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            state: Mutex::new(HostState {
                entries: vec![initial_path.into()],
                index: 0,
                next_id: 0,
                click_listeners: Vec::new(),
                popstate_listeners: Vec::new(),
                native_navigations: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Dispatch a click to the document listeners. A click on a link that no
    /// listener prevented counts as a native navigation (full load, new tab
    /// or external site), which leaves this page's history untouched.
    pub fn click(&self, event: &mut ClickEvent) {
        let listeners: Vec<ClickListener> = self
            .state()
            .click_listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
        if !event.default_prevented && event.closest_anchor(|_| true).is_some() {
            self.state().native_navigations += 1;
        }
    }

    pub fn back(&self) -> bool {
        self.traverse(-1)
    }

    pub fn forward(&self) -> bool {
        self.traverse(1)
    }

    fn traverse(&self, delta: isize) -> bool {
        let listeners: Vec<PopStateListener> = {
            let mut state = self.state();
            let Some(target) = state.index.checked_add_signed(delta) else {
                return false;
            };
            if target >= state.entries.len() {
                return false;
            }
            state.index = target;
            state
                .popstate_listeners
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect()
        };
        for listener in listeners {
            listener();
        }
        true
    }

    pub fn history_len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state();
        state.click_listeners.len() + state.popstate_listeners.len()
    }

    pub fn native_navigations(&self) -> usize {
        self.state().native_navigations
    }
}

impl BrowserHost for MemoryHost {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn current_path(&self) -> String {
        let state = self.state();
        state.entries[state.index].clone()
    }

    fn push_state(&self, path: &str) {
        let mut state = self.state();
        let keep = state.index + 1;
        state.entries.truncate(keep);
        state.entries.push(path.to_string());
        state.index = keep;
    }

    fn add_click_listener(&self, listener: ClickListener) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state.click_listeners.push((id, listener));
        id
    }

    fn add_popstate_listener(&self, listener: PopStateListener) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state.popstate_listeners.push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut state = self.state();
        state.click_listeners.retain(|(existing, _)| *existing != id);
        state.popstate_listeners.retain(|(existing, _)| *existing != id);
    }
}
