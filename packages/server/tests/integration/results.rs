use std::time::Duration;

use crate::harness::{TestApp, routes};
use serde_json::{Value, json};

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|row| row["entry"]["id"].as_i64().unwrap())
        .collect()
}

fn ranks(body: &Value) -> Vec<Value> {
    body["data"]
        .as_array()
        .expect("data is not an array")
        .iter()
        .map(|row| row["rank"].clone())
        .collect()
}

mod ranking {
    use super::*;

    #[tokio::test]
    async fn ranks_approved_entries_by_judge_average() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Harvest Cup").await;
        let a = app.create_entry(contest, "Lemon Haze", "approved").await;
        let b = app.create_entry(contest, "Blue Dream", "approved").await;
        let c = app.create_entry(contest, "Sour Diesel", "archived").await;
        app.create_entry(contest, "Unfinished", "draft").await;

        assert_eq!(app.submit_score(a, 1, 90.0).await.status, 201);
        assert_eq!(app.submit_score(a, 2, 80.0).await.status, 201);
        assert_eq!(app.submit_score(b, 1, 85.0).await.status, 201);
        assert_eq!(app.submit_score(c, 1, 70.0).await.status, 201);

        let res = app.get(&routes::contest_results(contest)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["ranking"], "judge");
        assert_eq!(ids(&res.body), vec![a as i64, b as i64, c as i64]);
        assert_eq!(ranks(&res.body), vec![json!(1), json!(1), json!(3)]);
        assert_eq!(res.body["data"][0]["judge_average"], 85.0);
        assert_eq!(res.body["data"][0]["judge_count"], 2);
        assert_eq!(res.body["data"][1]["judge_average"], 85.0);
        assert_eq!(res.body["stale"], false);
    }

    #[tokio::test]
    async fn unscored_entries_sort_last_without_rank() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Harvest Cup").await;
        let unscored = app.create_entry(contest, "Quiet One", "approved").await;
        let scored = app.create_entry(contest, "Loud One", "approved").await;
        app.submit_score(scored, 1, 12.0).await;

        let res = app.get(&routes::contest_results(contest)).await;

        assert_eq!(ids(&res.body), vec![scored as i64, unscored as i64]);
        assert_eq!(ranks(&res.body), vec![json!(1), Value::Null]);
        assert_eq!(res.body["data"][1]["judge_average"], Value::Null);
        assert_eq!(res.body["data"][1]["judge_count"], 0);
    }

    #[tokio::test]
    async fn empty_contest_has_no_pages() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Empty Cup").await;

        let res = app.get(&routes::contest_results(contest)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total"], 0);
        assert_eq!(res.body["pagination"]["total_pages"], 0);
        assert_eq!(res.body["page_numbers"], json!([]));
    }

    #[tokio::test]
    async fn returns_404_for_unknown_contest() {
        let app = TestApp::spawn().await;

        for path in [
            routes::contest_results(999),
            routes::contest_entries(999),
            routes::contest_live(999),
        ] {
            let res = app.get(&path).await;
            assert_eq!(res.status, 404, "{path}");
            assert_eq!(res.body["code"], "NOT_FOUND");
        }
    }
}

mod pagination {
    use super::*;

    async fn contest_with_entries(app: &TestApp, count: usize) -> (i32, Vec<i32>) {
        let contest = app.create_contest("Paged Cup").await;
        let mut entries = Vec::new();
        for i in 0..count {
            let id = app
                .create_entry(contest, &format!("Entry {i}"), "approved")
                .await;
            // Higher score for earlier entries keeps ranking in creation order.
            app.submit_score(id, 1, 100.0 - i as f64).await;
            entries.push(id);
        }
        (contest, entries)
    }

    #[tokio::test]
    async fn returns_requested_page() {
        let app = TestApp::spawn().await;
        let (contest, entries) = contest_with_entries(&app, 5).await;

        let res = app.get(&routes::contest_results_page(contest, 2, 2)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(ids(&res.body), vec![entries[2] as i64, entries[3] as i64]);
        assert_eq!(ranks(&res.body), vec![json!(3), json!(4)]);
        let pagination = &res.body["pagination"];
        assert_eq!(pagination["page"], 2);
        assert_eq!(pagination["per_page"], 2);
        assert_eq!(pagination["total"], 5);
        assert_eq!(pagination["total_pages"], 3);
        assert_eq!(pagination["has_next"], true);
        assert_eq!(pagination["has_previous"], true);
        assert_eq!(res.body["page_numbers"], json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn page_past_the_end_falls_back_to_first_page() {
        let app = TestApp::spawn().await;
        let (contest, entries) = contest_with_entries(&app, 3).await;

        let res = app.get(&routes::contest_results_page(contest, 9, 2)).await;

        assert_eq!(res.body["pagination"]["page"], 1);
        assert_eq!(ids(&res.body), vec![entries[0] as i64, entries[1] as i64]);
        assert_eq!(res.body["pagination"]["has_previous"], false);
    }

    #[tokio::test]
    async fn condenses_page_numbers() {
        let app = TestApp::spawn().await;
        let (contest, _) = contest_with_entries(&app, 7).await;

        let res = app.get(&routes::contest_results_page(contest, 4, 1)).await;

        assert_eq!(
            res.body["page_numbers"],
            json!([1, "ellipsis", 3, 4, 5, "ellipsis", 7])
        );
    }

    #[tokio::test]
    async fn caps_page_size() {
        let app = TestApp::spawn().await;
        let (contest, _) = contest_with_entries(&app, 1).await;

        let res = app
            .get(&routes::contest_results_page(contest, 1, 100_000))
            .await;

        assert_eq!(res.body["pagination"]["per_page"], 100);
    }
}

mod live {
    use super::*;

    #[tokio::test]
    async fn reports_subscribed_watch() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Live Cup").await;

        let res = app.wait_live(contest).await;

        assert_eq!(res.body["contest_id"], contest);
        assert_eq!(res.body["retry_required"], false);
        assert_eq!(res.body["last_error"], Value::Null);
        assert_eq!(app.state.watches.len(), 1);
    }

    #[tokio::test]
    async fn new_score_reorders_results() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Live Cup").await;
        let a = app.create_entry(contest, "Early Lead", "approved").await;
        let b = app.create_entry(contest, "Late Surge", "approved").await;
        app.submit_score(a, 1, 80.0).await;
        app.submit_score(b, 1, 70.0).await;

        app.wait_live(contest).await;
        let before = app.get(&routes::contest_results(contest)).await;
        assert_eq!(ids(&before.body), vec![a as i64, b as i64]);
        assert_eq!(before.body["live"], true);
        let invalidations = app.get(&routes::contest_live(contest)).await.body["invalidations"]
            .as_u64()
            .unwrap();

        assert_eq!(app.submit_score(b, 2, 100.0).await.status, 201);

        let after = app
            .wait_for(&routes::contest_results(contest), |body| {
                body["data"][0]["entry"]["id"] == b
            })
            .await;
        assert_eq!(after.body["data"][0]["judge_average"], 85.0);
        assert_eq!(after.body["stale"], false);

        let status = app.get(&routes::contest_live(contest)).await;
        assert!(status.body["invalidations"].as_u64().unwrap() > invalidations);
    }

    #[tokio::test]
    async fn approving_an_entry_adds_it_to_results() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Live Cup").await;
        let entry = app.create_entry(contest, "Late Arrival", "submitted").await;

        app.wait_live(contest).await;
        let before = app.get(&routes::contest_results(contest)).await;
        assert_eq!(before.body["data"], json!([]));

        let res = app
            .patch(&routes::entry_status(entry), &json!({ "status": "approved" }))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "approved");

        let after = app
            .wait_for(&routes::contest_results(contest), |body| {
                body["pagination"]["total"] == 1
            })
            .await;
        assert_eq!(ids(&after.body), vec![entry as i64]);
    }

    #[tokio::test]
    async fn rejecting_an_entry_removes_it_from_listing() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Live Cup").await;
        let keep = app.create_entry(contest, "Keeper", "approved").await;
        let dropped = app.create_entry(contest, "Dropped", "approved").await;

        app.wait_live(contest).await;
        let before = app.get(&routes::contest_entries(contest)).await;
        assert_eq!(ids(&before.body), vec![keep as i64, dropped as i64]);

        app.patch(&routes::entry_status(dropped), &json!({ "status": "rejected" }))
            .await;

        let after = app
            .wait_for(&routes::contest_entries(contest), |body| {
                body["pagination"]["total"] == 1
            })
            .await;
        assert_eq!(ids(&after.body), vec![keep as i64]);
    }
    #[tokio::test]
    async fn stopping_a_watch_releases_its_subscriptions() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Live Cup").await;
        app.wait_live(contest).await;
        assert_eq!(app.state.feed.subscriber_count(), 3);

        assert!(app.state.watches.stop(contest));

        assert!(app.state.watches.is_empty());
        assert_eq!(app.state.feed.subscriber_count(), 0);
        assert!(!app.state.watches.stop(contest));

        app.wait_live(contest).await;
        assert_eq!(app.state.watches.len(), 1);
        assert_eq!(app.state.feed.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn idle_watches_are_evicted() {
        let app = TestApp::spawn().await;
        let idle = app.create_contest("Quiet Cup").await;
        let busy = app.create_contest("Busy Cup").await;
        app.wait_live(idle).await;
        app.wait_live(busy).await;
        assert_eq!(app.state.watches.evict_idle(Duration::from_secs(60)), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        app.get(&routes::contest_results(busy)).await;

        assert_eq!(app.state.watches.evict_idle(Duration::from_millis(50)), 1);
        assert_eq!(app.state.watches.len(), 1);
        assert_eq!(app.state.feed.subscriber_count(), 3);

        let res = app.get(&routes::contest_live(busy)).await;
        assert_eq!(res.body["phase"], "subscribed");
    }
}
