use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use common::config::FeedConfig;
use common::{ContestId, ContestStore};
use dashmap::DashMap;
use feed::ChangeFeed;
use results_core::{ContestViews, ResultsWatcher, WatchStatus};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Cached views of one contest and the watcher keeping them current.
pub struct ContestWatch {
    views: Arc<ContestViews>,
    watcher: Mutex<ResultsWatcher>,
    last_used: Mutex<Instant>,
}

impl ContestWatch {
    pub fn views(&self) -> &ContestViews {
        &self.views
    }

    pub fn status(&self) -> WatchStatus {
        self.watcher().status()
    }

    fn watcher(&self) -> MutexGuard<'_, ResultsWatcher> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// One live watch per contest, started on first use and stopped once it has
/// gone unread for a while.
pub struct WatchRegistry {
    store: Arc<dyn ContestStore>,
    feed: Arc<dyn ChangeFeed>,
    feed_config: FeedConfig,
    watches: DashMap<ContestId, Arc<ContestWatch>>,
}

impl WatchRegistry {
    pub fn new(
        store: Arc<dyn ContestStore>,
        feed: Arc<dyn ChangeFeed>,
        feed_config: FeedConfig,
    ) -> Self {
        Self {
            store,
            feed,
            feed_config,
            watches: DashMap::new(),
        }
    }

    /// The watch for `contest_id`, starting it if needed. A watch that gave up
    /// is restarted here, so every read is also a retry.
    pub fn ensure(&self, contest_id: ContestId) -> Arc<ContestWatch> {
        let watch = {
            let watch = self.watches.entry(contest_id).or_insert_with(|| {
                let views = Arc::new(ContestViews::new());
                let mut watcher = ResultsWatcher::new(
                    self.store.clone(),
                    self.feed.clone(),
                    self.feed_config.clone(),
                    views.clone(),
                );
                watcher.watch(contest_id);
                Arc::new(ContestWatch {
                    views,
                    watcher: Mutex::new(watcher),
                    last_used: Mutex::new(Instant::now()),
                })
            });
            watch.touch();
            watch.clone()
        };

        let mut watcher = watch.watcher();
        if watcher.status().retry_required {
            info!(contest_id, "Restarting contest watch");
            watcher.retry();
        }
        drop(watcher);

        watch
    }

    /// Stop and forget the watch for `contest_id`. The next read starts a new
    /// one. Returns false when the contest was not watched.
    pub fn stop(&self, contest_id: ContestId) -> bool {
        match self.watches.remove(&contest_id) {
            Some((_, watch)) => {
                watch.watcher().stop();
                info!(contest_id, "Stopped contest watch");
                true
            }
            None => false,
        }
    }

    /// Stop every watch that has not been read for `max_idle`. Returns how
    /// many were stopped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<ContestId> = self
            .watches
            .iter()
            .filter(|watch| watch.idle_for() >= max_idle)
            .map(|watch| *watch.key())
            .collect();

        let mut evicted = 0;
        for contest_id in idle {
            // A read may have touched the watch since it was listed.
            let removed = self
                .watches
                .remove_if(&contest_id, |_, watch| watch.idle_for() >= max_idle);
            if let Some((_, watch)) = removed {
                watch.watcher().stop();
                debug!(contest_id, "Evicted idle contest watch");
                evicted += 1;
            }
        }
        evicted
    }

    /// Stop every watch. Cached views stay readable.
    pub fn stop_all(&self) {
        for watch in self.watches.iter() {
            watch.watcher().stop();
        }
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

/// Periodically evict watches that have gone unread for `max_idle`.
pub fn spawn_idle_eviction(registry: Arc<WatchRegistry>, max_idle: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval((max_idle / 2).max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(max_idle);
            if evicted > 0 {
                info!(evicted, remaining = registry.len(), "Evicted idle contest watches");
            }
        }
    })
}
