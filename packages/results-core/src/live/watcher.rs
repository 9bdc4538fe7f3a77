use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use common::config::FeedConfig;
use common::event::RowFilter;
use common::{ChangeEvent, ChannelStatus, ContestId, ContestStore, SubscriptionSpec, Table};
use feed::{ChangeFeed, Subscription, SubscriptionId};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::WatchError;
use crate::live::{ContestMembership, ContestViews, ViewKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchPhase {
    Unwatched,
    /// Subscriptions are being opened and membership fetched.
    Initializing,
    Subscribed,
}

/// Externally visible state of a [`ResultsWatcher`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchStatus {
    pub contest_id: Option<ContestId>,
    pub phase: WatchPhase,
    /// Live updates are not flowing; cached views may be out of date.
    pub degraded: bool,
    /// The watch will not recover on its own. Call [`ResultsWatcher::retry`].
    pub retry_required: bool,
    pub last_error: Option<String>,
}

impl WatchStatus {
    fn unwatched(contest_id: Option<ContestId>) -> Self {
        Self {
            contest_id,
            phase: WatchPhase::Unwatched,
            degraded: false,
            retry_required: false,
            last_error: None,
        }
    }

    /// Views are being kept current by live events.
    pub fn is_live(&self) -> bool {
        self.phase == WatchPhase::Subscribed && !self.degraded
    }
}

/// State shared between a watcher and the session task it spawned.
struct Shared {
    store: Arc<dyn ContestStore>,
    feed: Arc<dyn ChangeFeed>,
    views: Arc<ContestViews>,
    generation: AtomicU64,
    status: watch::Sender<WatchStatus>,
    active: Mutex<Vec<SubscriptionId>>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply a status change unless the session has been superseded.
    fn update_status(&self, generation: u64, update: impl FnOnce(&mut WatchStatus)) {
        self.status.send_if_modified(|status| {
            if !self.is_current(generation) {
                return false;
            }
            update(status);
            true
        });
    }

    /// Record the session's subscriptions so teardown can release them
    /// synchronously. Returns false if the session is already stale.
    fn register(&self, generation: u64, ids: &[SubscriptionId]) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            return false;
        }
        active.extend_from_slice(ids);
        true
    }

    fn release(&self) {
        let ids: Vec<_> = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for id in ids {
            self.feed.unsubscribe(id);
        }
    }
}

/// Keeps the cached views of one contest current from the change feed.
///
/// At most one contest is watched at a time. Watching another contest, stopping,
/// or dropping the watcher tears the previous session down before anything else
/// happens, and a torn-down session never touches the views again.
pub struct ResultsWatcher {
    shared: Arc<Shared>,
    feed_config: FeedConfig,
    contest_id: Option<ContestId>,
    task: Option<JoinHandle<()>>,
}

impl ResultsWatcher {
    pub fn new(
        store: Arc<dyn ContestStore>,
        feed: Arc<dyn ChangeFeed>,
        feed_config: FeedConfig,
        views: Arc<ContestViews>,
    ) -> Self {
        let (status, _) = watch::channel(WatchStatus::unwatched(None));
        Self {
            shared: Arc::new(Shared {
                store,
                feed,
                views,
                generation: AtomicU64::new(0),
                status,
                active: Mutex::new(Vec::new()),
            }),
            feed_config,
            contest_id: None,
            task: None,
        }
    }

    pub fn views(&self) -> &Arc<ContestViews> {
        &self.shared.views
    }

    pub fn contest_id(&self) -> Option<ContestId> {
        self.contest_id
    }

    pub fn status(&self) -> WatchStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<WatchStatus> {
        self.shared.status.subscribe()
    }

    /// Start watching `contest_id`, replacing any current watch.
    ///
    /// Returns once the session is spawned; progress is reported through
    /// [`Self::status`]. Must be called from within a Tokio runtime.
    pub fn watch(&mut self, contest_id: ContestId) {
        self.teardown();

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.contest_id = Some(contest_id);
        self.shared.views.reset(contest_id);
        self.shared.status.send_replace(WatchStatus {
            phase: WatchPhase::Initializing,
            ..WatchStatus::unwatched(Some(contest_id))
        });

        let session = Session {
            shared: self.shared.clone(),
            generation,
            contest_id,
            channel: self.feed_config.channel_for(contest_id),
        };
        self.task = Some(tokio::spawn(session.run()));
        info!(contest_id, generation, "Watching contest");
    }

    /// Tear down the current watch and start it again for the same contest.
    /// Returns false when nothing was being watched.
    pub fn retry(&mut self) -> bool {
        match self.contest_id {
            Some(contest_id) => {
                self.watch(contest_id);
                true
            }
            None => false,
        }
    }

    /// Stop watching. Cached views are kept.
    pub fn stop(&mut self) {
        self.teardown();
        self.shared
            .status
            .send_replace(WatchStatus::unwatched(self.contest_id));
    }

    fn teardown(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.release();
        if let Some(contest_id) = self.contest_id {
            debug!(contest_id, "Watch torn down");
        }
    }
}

impl Drop for ResultsWatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct Session {
    shared: Arc<Shared>,
    generation: u64,
    contest_id: ContestId,
    channel: String,
}

struct Streams {
    entries: Subscription,
    scores: Subscription,
    votes: Subscription,
}

impl Session {
    #[instrument(skip_all, fields(contest_id = self.contest_id, generation = self.generation))]
    async fn run(self) {
        let (streams, membership) = match self.initialize().await {
            Ok(Some(ready)) => ready,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Failed to start watch");
                self.shared.update_status(self.generation, |status| {
                    status.phase = WatchPhase::Unwatched;
                    status.retry_required = true;
                    status.last_error = Some(e.to_string());
                });
                return;
            }
        };

        self.refresh_views();
        self.shared.update_status(self.generation, |status| {
            status.phase = WatchPhase::Subscribed;
        });
        info!(members = membership.len(), "Subscribed to contest changes");

        self.listen(streams, membership).await;
    }

    /// Open the subscriptions, then fetch the initial membership. Events that
    /// arrive in between are buffered by the subscriptions and applied after.
    ///
    /// `Ok(None)` means the session was superseded along the way.
    async fn initialize(&self) -> Result<Option<(Streams, ContestMembership)>, WatchError> {
        let feed = &self.shared.feed;
        let entries = feed
            .subscribe(
                &self.channel,
                SubscriptionSpec::table(Table::Entries)
                    .with_filter(RowFilter::Contest(self.contest_id)),
            )
            .await?;
        let scores = feed
            .subscribe(&self.channel, SubscriptionSpec::table(Table::JudgeScores))
            .await?;
        let votes = feed
            .subscribe(&self.channel, SubscriptionSpec::table(Table::PublicVotes))
            .await?;

        if !self
            .shared
            .register(self.generation, &[entries.id(), scores.id(), votes.id()])
        {
            return Ok(None);
        }

        let entry_ids = self.shared.store.entry_ids(self.contest_id).await?;
        if !self.shared.is_current(self.generation) {
            debug!("Discarding membership of superseded watch");
            return Ok(None);
        }

        let mut membership = ContestMembership::new(self.contest_id);
        membership.prime(entry_ids);
        Ok(Some((
            Streams {
                entries,
                scores,
                votes,
            },
            membership,
        )))
    }

    async fn listen(&self, mut streams: Streams, mut membership: ContestMembership) {
        let mut channel_status = streams.entries.status_watch();
        let initial = channel_status.borrow_and_update().clone();
        if !initial.is_live() && self.on_channel_status(initial) {
            return;
        }

        loop {
            let event = tokio::select! {
                event = streams.entries.recv() => event,
                event = streams.scores.recv() => event,
                event = streams.votes.recv() => event,
                changed = channel_status.changed() => {
                    if changed.is_err() {
                        self.terminate("change feed went away");
                        return;
                    }
                    let status = channel_status.borrow_and_update().clone();
                    if self.on_channel_status(status) {
                        return;
                    }
                    continue;
                }
            };

            match event {
                Some(event) => self.on_event(&mut membership, &event),
                None => {
                    self.terminate("subscription closed");
                    return;
                }
            }
        }
    }

    fn on_event(&self, membership: &mut ContestMembership, event: &ChangeEvent) {
        let kinds = membership.apply(event);
        if kinds.is_empty() || !self.shared.is_current(self.generation) {
            return;
        }
        debug!(
            table = event.table.as_str(),
            kind = ?event.kind,
            ?kinds,
            "Invalidating views"
        );
        self.shared.views.invalidate(self.contest_id, kinds);
    }

    /// Views computed while the session was not live may have missed events.
    /// Must run before the status reports live.
    fn refresh_views(&self) {
        if self.shared.is_current(self.generation) {
            self.shared.views.invalidate(self.contest_id, ViewKind::ALL);
        }
    }

    /// Returns true when the session must end.
    fn on_channel_status(&self, status: ChannelStatus) -> bool {
        match status {
            ChannelStatus::Subscribed => {
                info!("Live updates restored");
                self.refresh_views();
                self.shared.update_status(self.generation, |s| {
                    s.phase = WatchPhase::Subscribed;
                    s.degraded = false;
                    s.last_error = None;
                });
                false
            }
            ChannelStatus::ChannelError(reason) => {
                warn!(%reason, "Live updates degraded, serving cached views");
                self.shared.update_status(self.generation, |s| {
                    s.degraded = true;
                    s.last_error = Some(reason);
                });
                false
            }
            ChannelStatus::TimedOut => {
                warn!("Change feed timed out, serving cached views");
                self.shared.update_status(self.generation, |s| {
                    s.degraded = true;
                    s.last_error = Some("timed out".into());
                });
                false
            }
            ChannelStatus::Closed => {
                self.terminate("channel closed");
                true
            }
        }
    }

    fn terminate(&self, reason: &str) {
        warn!(reason, "Watch ended, retry required");
        self.shared.update_status(self.generation, |s| {
            s.phase = WatchPhase::Unwatched;
            s.degraded = true;
            s.retry_required = true;
            s.last_error = Some(reason.to_string());
        });
    }
}
