//! Observer hooks around every network call.
//!
//! Listeners run synchronously, in registration order, on the task that
//! performs the request. Each invocation is isolated: a panicking listener
//! is logged and skipped, the remaining listeners still run and the request
//! carries on.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Method;
use staticship_protocol::ShipError;
use tracing::warn;

/// Event emitted by the transport.
#[derive(Debug)]
pub enum TransportEvent<'a> {
    /// About to send. Always precedes the matching `Response`/`Error`.
    Request { method: &'a Method, url: &'a str },
    /// A response arrived (any status), once per request.
    Response { status: u16, url: &'a str },
    /// The request failed; carries the classified error.
    Error { error: &'a ShipError, url: &'a str },
}

impl TransportEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Request { .. } => EventKind::Request,
            Self::Response { .. } => EventKind::Response,
            Self::Error { .. } => EventKind::Error,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Response { url, .. } | Self::Error { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Request,
    Response,
    Error,
}

/// Handle returned by [`EventBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&TransportEvent<'_>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

/// Listener registry shared by clones of a transport.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&TransportEvent<'_>) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry.listeners.push((id, kind, Arc::new(listener)));
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut registry = self.lock();
        let before = registry.listeners.len();
        registry.listeners.retain(|(lid, _, _)| *lid != id);
        registry.listeners.len() != before
    }

    pub fn clear(&self) {
        self.lock().listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Delivers `event` to every listener registered for its kind.
    pub(crate) fn emit(&self, event: &TransportEvent<'_>) {
        let kind = event.kind();
        // Snapshot so listeners may (un)register without deadlocking.
        let targets: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Arc::clone(l))
            .collect();

        for listener in targets {
            if catch_unwind(AssertUnwindSafe(|| (*listener)(event))).is_err() {
                warn!(event = ?kind, url = %event.url(), "event listener panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
