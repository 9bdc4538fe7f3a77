use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::config::FeedConfig;
use common::{
    ContestId, ContestStore, Entry, EntryId, EntryStatus, JudgeScore, PublicVote, Row,
    StoreError,
};
use feed::MemoryFeed;
use results_core::{ContestViews, ResultsWatcher, WatchStatus};
use tokio::sync::{Notify, watch};

/// How long a test waits for the watcher before giving up.
pub const WAIT: Duration = Duration::from_secs(2);

/// Holds membership fetches until released.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until a fetch is held at the gate.
    pub async fn entered(&self) {
        tokio::time::timeout(WAIT, self.entered.notified())
            .await
            .expect("membership fetch never started");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// In-memory contest rows. Reads fail while `fail` is set.
#[derive(Default)]
pub struct FakeStore {
    entries: Mutex<Vec<Entry>>,
    scores: Mutex<Vec<JudgeScore>>,
    votes: Mutex<Vec<PublicVote>>,
    fail: AtomicBool,
    reads: AtomicUsize,
    gate: Mutex<Option<(ContestId, Arc<Gate>)>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_entry(&self, id: EntryId, contest_id: ContestId, status: EntryStatus) -> Entry {
        let entry = entry(id, contest_id, status);
        self.entries.lock().unwrap().push(entry.clone());
        entry
    }

    pub fn add_score(&self, entry_id: EntryId, judge_id: i32, score: f64) -> JudgeScore {
        let row = JudgeScore {
            id: judge_id * 1000 + entry_id,
            entry_id,
            judge_id,
            overall_score: score,
            created_at: Utc::now(),
        };
        self.scores.lock().unwrap().push(row.clone());
        row
    }

    pub fn add_vote(&self, entry_id: EntryId, voter_id: i32, score: f64) -> PublicVote {
        let row = vote(entry_id, voter_id, score);
        self.votes.lock().unwrap().push(row.clone());
        row
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Hold membership fetches of `contest_id` until the returned gate is released.
    pub fn gate_membership(&self, contest_id: ContestId) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some((contest_id, gate.clone()));
        gate
    }

    /// Number of `entries` reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContestStore for FakeStore {
    async fn entry_ids(&self, contest_id: ContestId) -> Result<Vec<EntryId>, StoreError> {
        let gate = self
            .gate
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(gated, _)| *gated == contest_id)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.contest_id == contest_id)
            .map(|e| e.id)
            .collect())
    }

    async fn entries(
        &self,
        contest_id: ContestId,
        statuses: &[EntryStatus],
    ) -> Result<Vec<Entry>, StoreError> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.contest_id == contest_id && statuses.contains(&e.status))
            .cloned()
            .collect())
    }

    async fn judge_scores(&self, entry_ids: &[EntryId]) -> Result<Vec<JudgeScore>, StoreError> {
        self.check()?;
        Ok(self
            .scores
            .lock()
            .unwrap()
            .iter()
            .filter(|s| entry_ids.contains(&s.entry_id))
            .cloned()
            .collect())
    }

    async fn public_votes(&self, entry_ids: &[EntryId]) -> Result<Vec<PublicVote>, StoreError> {
        self.check()?;
        Ok(self
            .votes
            .lock()
            .unwrap()
            .iter()
            .filter(|v| entry_ids.contains(&v.entry_id))
            .cloned()
            .collect())
    }
}

pub fn entry(id: EntryId, contest_id: ContestId, status: EntryStatus) -> Entry {
    Entry {
        id,
        contest_id,
        producer_id: 500 + id,
        name: format!("Entry {id}"),
        category: "flower".into(),
        thc_percent: Some(20.0),
        cbd_percent: Some(0.5),
        terpene_percent: None,
        status,
    }
}

pub fn vote(entry_id: EntryId, voter_id: i32, score: f64) -> PublicVote {
    PublicVote {
        id: voter_id * 1000 + entry_id,
        entry_id,
        voter_id,
        score,
        comment: None,
        created_at: Utc::now(),
    }
}

pub fn score_row(entry_id: EntryId) -> Row {
    Row::JudgeScore(JudgeScore {
        id: 1,
        entry_id,
        judge_id: 1,
        overall_score: 80.0,
        created_at: Utc::now(),
    })
}

pub fn vote_row(entry_id: EntryId) -> Row {
    Row::PublicVote(vote(entry_id, 1, 4.0))
}

pub fn entry_row(id: EntryId, contest_id: ContestId) -> Row {
    Row::Entry(entry(id, contest_id, EntryStatus::Approved))
}

/// A watcher over a fresh feed and its own views.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub feed: MemoryFeed,
    pub views: Arc<ContestViews>,
    pub watcher: ResultsWatcher,
    pub status: watch::Receiver<WatchStatus>,
    /// Invalidation count when the watcher last went live.
    live_at: u64,
}

impl Harness {
    pub fn new(store: Arc<FakeStore>) -> Self {
        let feed = MemoryFeed::new();
        let views = Arc::new(ContestViews::new());
        let watcher = ResultsWatcher::new(
            store.clone(),
            Arc::new(feed.clone()),
            FeedConfig::default(),
            views.clone(),
        );
        let status = watcher.subscribe_status();
        Self {
            store,
            feed,
            views,
            watcher,
            status,
            live_at: 0,
        }
    }

    /// Wait until the watcher status satisfies `predicate`.
    ///
    /// A live status resets the baseline of [`Self::invalidations`].
    pub async fn wait_status(
        &mut self,
        predicate: impl FnMut(&WatchStatus) -> bool,
    ) -> WatchStatus {
        let status = tokio::time::timeout(WAIT, self.status.wait_for(predicate))
            .await
            .expect("timed out waiting for watch status")
            .expect("watcher dropped")
            .clone();
        if status.is_live() {
            self.live_at = self.views.invalidation_count();
        }
        status
    }

    pub async fn wait_subscribed(&mut self) -> WatchStatus {
        self.wait_status(|s| s.is_live()).await
    }

    /// Invalidations since the watcher last went live.
    pub fn invalidations(&self) -> u64 {
        self.views.invalidation_count() - self.live_at
    }

    /// Wait until at least `count` invalidations have happened since the
    /// watcher last went live.
    pub async fn wait_invalidations(&self, count: u64) {
        let target = self.live_at + count;
        let mut invalidations = self.views.subscribe();
        tokio::time::timeout(WAIT, invalidations.wait_for(|n| *n >= target))
            .await
            .expect("timed out waiting for invalidation")
            .expect("views dropped");
    }

    /// Give the watcher a chance to process anything already delivered.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
