use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with the payload of a dispatched event.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by `on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event-name → ordered subscriber list. Insertion order is invocation
/// order; the table never looks inside payloads.
#[derive(Default)]
pub struct SubscriberTable {
    next_id: u64,
    listeners: HashMap<String, Vec<(SubscriptionId, Listener)>>,
}

impl SubscriberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: &str, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, event: &str, id: SubscriptionId) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|(existing, _)| *existing != id);
            if list.is_empty() {
                self.listeners.remove(event);
            }
        }
    }

    /// Snapshot of the listeners for `event`, so callers can invoke them
    /// without holding the table lock (listeners may subscribe or
    /// unsubscribe re-entrantly).
    pub fn listeners_for(&self, event: &str) -> Vec<Listener> {
        self.listeners
            .get(event)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }
}
