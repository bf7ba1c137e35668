//! Event Dispatch
//!
//! Fans an inbound event out to its listeners and settles on exactly one
//! reply: the first outcome any listener delivers, or `{}` once the response
//! timeout passes without one.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use flock_common::{EventTokenClaims, InboundEvent};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::registry::{EventListener, ListenerId, ListenerRegistry};
use super::types::{DeferredReply, EventReply, Outcome};
use crate::config::{Config, DEFAULT_RESPONSE_TIMEOUT};

/// Routes inbound events to registered listeners.
#[derive(Debug)]
pub struct EventDispatcher {
    registry: ListenerRegistry,
    response_timeout: Duration,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_TIMEOUT)
    }
}

impl EventDispatcher {
    /// Create a dispatcher that waits up to `response_timeout` for a
    /// deferred reply.
    pub fn new(response_timeout: Duration) -> Self {
        Self {
            registry: ListenerRegistry::new(),
            response_timeout,
        }
    }

    /// Create a dispatcher from server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.response_timeout)
    }

    /// Register a closure for the event `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&InboundEvent, Option<&EventTokenClaims>) -> Outcome + Send + Sync + 'static,
    {
        self.registry.on(name, handler)
    }

    /// Register a listener for the event `name`.
    pub fn add_listener(
        &self,
        name: impl Into<String>,
        listener: Arc<dyn EventListener>,
    ) -> ListenerId {
        self.registry.add_listener(name, listener)
    }

    /// Remove a listener.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.registry.off(name, id)
    }

    /// Number of listeners for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry.listener_count(name)
    }

    /// The listener registry.
    pub const fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// How long dispatch waits for a deferred reply.
    pub const fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Dispatch an event and produce its single reply.
    ///
    /// Listeners run in registration order. The first outcome delivered wins,
    /// whether it came back synchronously or from a deferred future; later
    /// outcomes are logged and dropped. A listener that panics is logged and
    /// treated as passing.
    pub async fn dispatch(
        &self,
        event: InboundEvent,
        token: Option<EventTokenClaims>,
    ) -> EventReply {
        let (slot, reply_rx) = ReplySlot::new(&event.name);

        let listeners = self.registry.listeners(&event.name);
        if listeners.is_empty() {
            debug!(event = %event.name, "No listeners registered for event");
        }

        for (id, listener) in listeners {
            let outcome =
                match catch_unwind(AssertUnwindSafe(|| listener.on_event(&event, token.as_ref()))) {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        warn!(
                            event = %event.name,
                            listener = %id,
                            panic = panic_message(panic.as_ref()),
                            "Event listener panicked"
                        );
                        continue;
                    }
                };

            match outcome {
                Outcome::Pass => {}
                Outcome::Error(error) => {
                    slot.fill(EventReply::from_error(&error));
                }
                Outcome::Body(body) => {
                    slot.fill(EventReply::from_body(body));
                }
                Outcome::Deferred(future) => spawn_deferred(slot.clone(), id, future),
            }
        }

        slot.wait(reply_rx, self.response_timeout).await
    }
}

/// Per-event reply slot. Taking the sender is the one point where the event
/// becomes responded.
#[derive(Clone)]
struct ReplySlot {
    event: Arc<str>,
    sender: Arc<Mutex<Option<oneshot::Sender<EventReply>>>>,
}

impl ReplySlot {
    fn new(event: &str) -> (Self, oneshot::Receiver<EventReply>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self {
            event: Arc::from(event),
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (slot, rx)
    }

    fn take_sender(&self) -> Option<oneshot::Sender<EventReply>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Offer a reply. Returns whether it was accepted.
    fn fill(&self, reply: EventReply) -> bool {
        if let Some(tx) = self.take_sender() {
            // The receiver only goes away once the reply has been settled.
            let _ = tx.send(reply);
            true
        } else {
            warn!(
                event = %self.event,
                "Only one listener may respond to an event; dropping extra response"
            );
            false
        }
    }

    /// Wait for the accepted reply, falling back to `{}` after `timeout`.
    async fn wait(
        self,
        mut reply_rx: oneshot::Receiver<EventReply>,
        timeout: Duration,
    ) -> EventReply {
        match tokio::time::timeout(timeout, &mut reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => EventReply::empty(),
            Err(_) => {
                if self.take_sender().is_some() {
                    debug!(event = %self.event, "No listener responded in time, sending empty reply");
                    EventReply::empty()
                } else {
                    // A deferred reply landed between the timer firing and here.
                    reply_rx.try_recv().unwrap_or_else(|_| EventReply::empty())
                }
            }
        }
    }
}

/// Run a deferred listener on its own task and offer its result to the slot.
fn spawn_deferred(slot: ReplySlot, listener: ListenerId, future: DeferredReply) {
    tokio::spawn(async move {
        let handle = tokio::spawn(future);
        match handle.await {
            Ok(Ok(Some(body))) => {
                slot.fill(EventReply::from_body(body));
            }
            Ok(Ok(None)) => {
                debug!(event = %slot.event, listener = %listener, "Deferred event listener declined");
            }
            Ok(Err(error)) => {
                slot.fill(EventReply::from_error(&error));
            }
            Err(e) => {
                warn!(
                    event = %slot.event,
                    listener = %listener,
                    error = %e,
                    "Deferred event listener failed"
                );
            }
        }
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
