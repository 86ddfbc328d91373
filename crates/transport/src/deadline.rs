//! Per-request deadline composed with the caller's cancellation token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Counts armed and cleared deadlines for a transport.
///
/// Every request arms exactly one deadline and clears it on every exit
/// path, so `pending()` returns to zero once requests settle.
#[derive(Debug, Default)]
pub struct DeadlineTracker {
    armed: AtomicUsize,
    cleared: AtomicUsize,
}

impl DeadlineTracker {
    pub fn armed(&self) -> usize {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }

    /// Deadlines whose timers are still running.
    pub fn pending(&self) -> usize {
        self.armed().saturating_sub(self.cleared())
    }
}

/// A request-scoped token cancelled by whichever fires first: the caller's
/// token or the timer. Dropping the deadline stops the timer.
pub(crate) struct RequestDeadline {
    token: CancellationToken,
    timed_out: Arc<AtomicBool>,
    timer: JoinHandle<()>,
    tracker: Arc<DeadlineTracker>,
}

impl RequestDeadline {
    pub(crate) fn arm(
        caller: Option<&CancellationToken>,
        timeout: Duration,
        tracker: Arc<DeadlineTracker>,
    ) -> Self {
        let token = caller.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let timed_out = Arc::new(AtomicBool::new(false));

        let timer = tokio::spawn({
            let token = token.clone();
            let timed_out = timed_out.clone();
            async move {
                tokio::time::sleep(timeout).await;
                timed_out.store(true, Ordering::SeqCst);
                token.cancel();
            }
        });

        tracker.armed.fetch_add(1, Ordering::SeqCst);
        Self {
            token,
            timed_out,
            timer,
            tracker,
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True when the timer, not the caller, aborted the request.
    pub(crate) fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }
}

impl Drop for RequestDeadline {
    fn drop(&mut self) {
        self.timer.abort();
        self.tracker.cleared.fetch_add(1, Ordering::SeqCst);
        debug!(timed_out = self.timed_out(), "request deadline cleared");
    }
}
