use std::sync::Arc;

use common::{ChangeEvent, EntryStatus, Row};
use results_core::ranking::{JudgeAverage, Weighted};
use results_core::{ContestViews, LoadError, ResultsLoader, ViewKind};

use crate::harness::{FakeStore, Harness};

fn loader(store: &Arc<FakeStore>) -> ResultsLoader {
    ResultsLoader::new(store.clone(), Arc::new(JudgeAverage))
}

mod results {
    use super::*;

    #[tokio::test]
    async fn ranks_approved_and_archived_entries() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        store.add_entry(2, 1, EntryStatus::Archived);
        store.add_entry(3, 1, EntryStatus::Draft);
        store.add_entry(4, 1, EntryStatus::Approved);
        store.add_entry(5, 2, EntryStatus::Approved);
        store.add_score(1, 1, 80.0);
        store.add_score(1, 2, 91.0);
        store.add_score(2, 1, 88.0);
        store.add_score(3, 1, 99.0);
        let views = ContestViews::for_contest(1);

        let ranked = loader(&store).results(&views, 1).await.unwrap();

        let ids: Vec<_> = ranked.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![2, 1, 4]);
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].view.judge_average, Some(85.5));
        assert_eq!(ranked[1].view.judge_count, 2);
        assert_eq!(ranked[2].rank, None);
        assert_eq!(ranked[2].view.judge_average, None);
        assert_eq!(ranked[2].view.judge_count, 0);
    }

    #[tokio::test]
    async fn fresh_results_are_served_from_cache() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        let views = ContestViews::for_contest(1);
        let loader = loader(&store);

        loader.results(&views, 1).await.unwrap();
        loader.results(&views, 1).await.unwrap();
        assert_eq!(store.reads(), 1);

        views.invalidate(1, &[ViewKind::Results]);
        loader.results(&views, 1).await.unwrap();
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn entries_invalidation_leaves_results_cached() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        let views = ContestViews::for_contest(1);
        let loader = loader(&store);

        loader.results(&views, 1).await.unwrap();
        views.invalidate(1, &[ViewKind::Entries]);
        loader.results(&views, 1).await.unwrap();

        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_last_known_results() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        store.add_score(1, 1, 70.0);
        let views = ContestViews::for_contest(1);
        let loader = loader(&store);
        let before = loader.results(&views, 1).await.unwrap();

        views.invalidate(1, &[ViewKind::Results]);
        store.set_failing(true);
        let err = loader.results(&views, 1).await.unwrap_err();

        assert!(matches!(err, LoadError::Fetch(ref e) if e.code == "UNAVAILABLE"));
        assert_eq!(loader.last_known_results(&views, 1), Some(before));

        store.set_failing(false);
        assert!(loader.results(&views, 1).await.is_ok());
        assert!(views.results(1).fresh);
    }

    #[tokio::test]
    async fn weighted_strategy_combines_channels() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        store.add_entry(2, 1, EntryStatus::Approved);
        store.add_score(1, 1, 60.0);
        store.add_vote(1, 1, 5.0);
        store.add_score(2, 1, 90.0);
        store.add_vote(2, 1, 1.0);
        let views = ContestViews::for_contest(1);
        let loader = ResultsLoader::new(store.clone(), Arc::new(Weighted::new(0.5, 0.5)));

        let ranked = loader.results(&views, 1).await.unwrap();

        assert_eq!(ranked[0].entry.id, 1);
        assert_eq!(ranked[0].score, Some(80.0));
        assert_eq!(ranked[1].score, Some(45.0));
    }
}

mod entries {
    use super::*;

    #[tokio::test]
    async fn lists_public_averages() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        store.add_entry(2, 1, EntryStatus::Approved);
        store.add_entry(3, 1, EntryStatus::Submitted);
        store.add_vote(1, 1, 4.0);
        store.add_vote(1, 2, 5.0);
        store.add_score(2, 1, 95.0);
        let views = ContestViews::for_contest(1);

        let listings = loader(&store).entries(&views, 1).await.unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].public_average, Some(4.5));
        assert_eq!(listings[0].public_count, 2);
        assert_eq!(listings[1].public_average, None);
    }

    #[tokio::test]
    async fn unbound_views_are_never_cached() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        let views = ContestViews::new();
        let loader = loader(&store);

        loader.entries(&views, 1).await.unwrap();
        loader.entries(&views, 1).await.unwrap();

        assert_eq!(store.reads(), 2);
        assert_eq!(loader.last_known_entries(&views, 1), None);
    }
}

mod live {
    use super::*;

    #[tokio::test]
    async fn vote_event_makes_next_read_recompute() {
        let store = FakeStore::new();
        store.add_entry(1, 1, EntryStatus::Approved);
        let mut h = Harness::new(store.clone());
        let loader = ResultsLoader::new(store.clone(), Arc::new(JudgeAverage));
        h.watcher.watch(1);
        h.wait_subscribed().await;

        let listings = loader.entries(&h.views, 1).await.unwrap();
        assert_eq!(listings[0].public_average, None);

        let vote = store.add_vote(1, 7, 3.0);
        h.feed.publish(ChangeEvent::inserted(Row::PublicVote(vote)));
        h.wait_invalidations(1).await;

        let listings = loader.entries(&h.views, 1).await.unwrap();
        assert_eq!(listings[0].public_average, Some(3.0));
        assert_eq!(store.reads(), 2);
    }
}
