//! Listener Registry
//!
//! Maps event names to listeners, preserving registration order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use flock_common::{EventTokenClaims, InboundEvent};

use super::types::Outcome;

/// Handler for one event name.
///
/// Called synchronously during dispatch; return [`Outcome::Deferred`] to do
/// asynchronous work before responding.
pub trait EventListener: Send + Sync + 'static {
    /// Handle an event. `token` holds the verified event token claims, if the
    /// request carried a token.
    fn on_event(&self, event: &InboundEvent, token: Option<&EventTokenClaims>) -> Outcome;
}

impl<F> EventListener for F
where
    F: Fn(&InboundEvent, Option<&EventTokenClaims>) -> Outcome + Send + Sync + 'static,
{
    fn on_event(&self, event: &InboundEvent, token: Option<&EventTokenClaims>) -> Outcome {
        self(event, token)
    }
}

/// Handle returned by registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Arc<dyn EventListener>,
}

/// Event name to ordered listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: DashMap<String, Vec<Registration>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&InboundEvent, Option<&EventTokenClaims>) -> Outcome + Send + Sync + 'static,
    {
        self.add_listener(name, Arc::new(handler))
    }

    /// Register a listener for `name`. It runs after every listener already
    /// registered for that name.
    pub fn add_listener(
        &self,
        name: impl Into<String>,
        listener: Arc<dyn EventListener>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(name.into())
            .or_default()
            .push(Registration { id, listener });
        id
    }

    /// Remove a listener. Returns whether it was registered for `name`.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let removed = {
            let Some(mut registrations) = self.listeners.get_mut(name) else {
                return false;
            };
            let before = registrations.len();
            registrations.retain(|r| r.id != id);
            registrations.len() != before
        };

        if removed {
            self.listeners.remove_if(name, |_, regs| regs.is_empty());
        }
        removed
    }

    /// Snapshot of the listeners for `name`, in registration order.
    ///
    /// Taken as a copy so listeners can register or remove listeners while
    /// being dispatched to.
    pub fn listeners(&self, name: &str) -> Vec<(ListenerId, Arc<dyn EventListener>)> {
        self.listeners
            .get(name)
            .map(|regs| {
                regs.iter()
                    .map(|r| (r.id, Arc::clone(&r.listener)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, |regs| regs.len())
    }

    /// Event names with at least one listener.
    pub fn event_names(&self) -> Vec<String> {
        self.listeners.iter().map(|e| e.key().clone()).collect()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.listeners {
            map.entry(entry.key(), &entry.value().len());
        }
        map.finish()
    }
}
