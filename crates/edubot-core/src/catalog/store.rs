//! Live catalog snapshot with atomic replacement.
//!
//! Readers take an `Arc<CatalogSnapshot>` and keep it for as long as they need
//! it; a refresh publishes a new `Arc` through a watch channel and never
//! touches the one readers already hold.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use edubot_types::errors::BotError;
use edubot_types::{CatalogSnapshot, CatalogSource};

/// Owner of the current catalog snapshot.
pub struct CatalogStore {
    source: Arc<dyn CatalogSource>,
    tx: watch::Sender<Arc<CatalogSnapshot>>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CatalogStore")
            .field("courses", &snapshot.courses.len())
            .field("faqs", &snapshot.faqs.len())
            .finish()
    }
}

impl CatalogStore {
    /// Create a store backed by `source`, starting from the empty snapshot.
    ///
    /// Nothing is loaded until [`refresh`](Self::refresh) is called.
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CatalogSnapshot::empty()));
        Self { source, tx }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CatalogSnapshot>> {
        self.tx.subscribe()
    }

    /// Publish `snapshot` as the current catalog.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Reload from the source and swap the result in.
    ///
    /// On failure the previous snapshot stays live and the error is returned.
    pub async fn refresh(&self) -> Result<Arc<CatalogSnapshot>, BotError> {
        let loaded = self.source.load().await.and_then(|snapshot| {
            snapshot.validate()?;
            Ok(snapshot)
        });

        match loaded {
            Ok(snapshot) => {
                info!(
                    courses = snapshot.courses.len(),
                    faqs = snapshot.faqs.len(),
                    "catalog refreshed"
                );
                Ok(self.replace(snapshot))
            }
            Err(e) => {
                let current = self.snapshot();
                warn!(
                    error = %e,
                    courses = current.courses.len(),
                    faqs = current.faqs.len(),
                    "catalog refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Whether the backing source is reachable.
    pub async fn ping(&self) -> bool {
        self.source.ping().await
    }

    /// Refresh every `interval` until the store is dropped.
    ///
    /// The first refresh happens one full interval after spawning; callers
    /// perform the initial load themselves.
    pub fn spawn_refresh_loop(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("catalog store dropped, stopping refresh loop");
                    break;
                };
                // Failures are logged by refresh() and retried next tick.
                let _ = store.refresh().await;
            }
        })
    }
}
