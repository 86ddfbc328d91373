//! Process-wide cache for the platform's upload limits.
//!
//! Limits are fetched on first use and then served from memory. Concurrent
//! first callers share a single in-flight fetch; a failed fetch leaves the
//! cache empty so the next caller tries again.

use std::future::Future;
use std::sync::{Arc, LazyLock};

use staticship_protocol::{ConfigLimits, ShipError};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

static GLOBAL: LazyLock<Arc<ConfigCache>> = LazyLock::new(|| Arc::new(ConfigCache::new()));

#[derive(Debug, Default)]
pub struct ConfigCache {
    limits: OnceCell<ConfigLimits>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every transport that was not given its own.
    pub fn global() -> Arc<ConfigCache> {
        GLOBAL.clone()
    }

    /// Cached limits, if a fetch has already succeeded.
    pub fn cached(&self) -> Option<ConfigLimits> {
        self.limits.get().copied()
    }

    /// Returns the cached limits, running `fetch` if none are cached yet.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<ConfigLimits, ShipError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ConfigLimits, ShipError>>,
    {
        self.limits
            .get_or_try_init(|| async move {
                debug!("fetching platform limits");
                let result = fetch().await;
                if let Err(e) = &result {
                    warn!(error = %e, "platform limits fetch failed, will retry on next use");
                }
                result
            })
            .await
            .copied()
    }
}
