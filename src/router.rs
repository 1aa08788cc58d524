//! Event routing.
//!
//! A [`HookRouter`] is a publish/subscribe registry keyed by strings.
//! Listeners subscribe to exactly one key with [`HookRouter::on`]; a parsed
//! delivery is dispatched to every listener under each of the event's
//! [dispatch keys](crate::webhooks::HookEvent::dispatch_keys), in key order
//! and then registration order.
//!
//! The router is owned by the application and passed explicitly to the
//! server; there is no global registry. Subscriptions are normally wired at
//! startup, but registration is safe at any time: dispatch snapshots the
//! listener list per key before invoking, so a concurrent `on` cannot
//! corrupt an in-flight emission.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, error};

use crate::webhooks::{HookEvent, RepositoryEvent, SystemEvent};

/// A subscriber to routed webhook events.
///
/// Implement the method for the event kind(s) the subscription key can
/// receive; the defaults ignore the other kind. Returning an error is
/// logged by the router and does not affect other listeners or the HTTP
/// response.
pub trait HookListener: Send + Sync {
    fn on_repository_event(&self, event: &RepositoryEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }

    fn on_system_event(&self, event: &SystemEvent) -> anyhow::Result<()> {
        let _ = event;
        Ok(())
    }
}

/// Publish/subscribe registry for webhook events.
#[derive(Default)]
pub struct HookRouter {
    listeners: RwLock<HashMap<String, Vec<Arc<dyn HookListener>>>>,
}

impl HookRouter {
    pub fn new() -> Self {
        HookRouter::default()
    }

    /// Registers a listener under a single key.
    ///
    /// Use [`WILDCARD_KEY`](crate::webhooks::WILDCARD_KEY) to receive every
    /// event. Multiple listeners per key all fire, in registration order.
    /// There is no unsubscribe; subscriptions live until the router is
    /// dropped.
    pub fn on(&self, key: impl Into<String>, listener: Arc<dyn HookListener>) {
        let mut listeners = self.listeners.write().expect("listener registry poisoned");
        listeners.entry(key.into()).or_default().push(listener);
    }

    /// Number of listeners registered under a key.
    pub fn listener_count(&self, key: &str) -> usize {
        let listeners = self.listeners.read().expect("listener registry poisoned");
        listeners.get(key).map_or(0, Vec::len)
    }

    /// Dispatches one event to all matching listeners, synchronously.
    ///
    /// Keys are visited in the event's fixed dispatch order; within a key,
    /// listeners run in registration order. A failing listener is logged and
    /// skipped so it cannot block delivery to the rest.
    pub fn dispatch(&self, event: &HookEvent) {
        for key in event.dispatch_keys() {
            // Snapshot outside the listener calls: listeners may register
            // new subscriptions without deadlocking or perturbing this
            // emission.
            let snapshot = {
                let listeners = self.listeners.read().expect("listener registry poisoned");
                listeners.get(&key).cloned().unwrap_or_default()
            };

            if snapshot.is_empty() {
                continue;
            }
            debug!(key = %key, listeners = snapshot.len(), "dispatching event");

            for listener in snapshot {
                let result = match event {
                    HookEvent::Repository(event) => listener.on_repository_event(event),
                    HookEvent::System(event) => listener.on_system_event(event),
                };
                if let Err(err) = result {
                    let cause = format!("{err:#}");
                    error!(key = %key, cause = %cause, "listener failed");
                }
            }
        }
    }
}
