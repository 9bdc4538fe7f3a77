use crate::harness::{TestApp, routes};
use serde_json::{Value, json};

mod creation {
    use super::*;

    #[tokio::test]
    async fn creates_contest() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::CONTESTS, &json!({ "name": "  Spring Cup  " }))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Spring Cup");
        assert_eq!(res.body["description"], "");
    }

    #[tokio::test]
    async fn rejects_blank_contest_name() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::CONTESTS, &json!({ "name": "   " })).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let app = TestApp::spawn().await;

        let res = app.post(routes::CONTESTS, &json!({ "title": "x" })).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn entry_defaults_to_draft() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;

        let res = app
            .post(
                &routes::contest_entries(contest),
                &json!({ "producer_id": 3, "name": "Gelato", "category": "flower" }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "draft");
        assert_eq!(res.body["contest_id"], contest);
        assert_eq!(res.body["thc_percent"], Value::Null);
    }

    #[tokio::test]
    async fn rejects_out_of_range_percentage() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;

        let res = app
            .post(
                &routes::contest_entries(contest),
                &json!({
                    "producer_id": 3,
                    "name": "Gelato",
                    "category": "flower",
                    "thc_percent": 150.0,
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn entry_in_unknown_contest_is_404() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                &routes::contest_entries(42),
                &json!({ "producer_id": 3, "name": "Gelato", "category": "flower" }),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod votes {
    use super::*;

    #[tokio::test]
    async fn second_vote_replaces_the_first() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;
        let entry = app.create_entry(contest, "Gelato", "approved").await;

        let first = app.cast_vote(entry, 11, 2.0).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app
            .put(
                &routes::entry_votes(entry),
                &json!({ "voter_id": 11, "score": 5.0, "comment": "Changed my mind" }),
            )
            .await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["id"], first.body["id"]);
        assert_eq!(second.body["score"], 5.0);
        assert_eq!(second.body["comment"], "Changed my mind");

        app.cast_vote(entry, 12, 4.0).await;

        let listing = app
            .wait_for(&routes::contest_entries(contest), |body| {
                body["data"][0]["public_count"] == 2
            })
            .await;
        assert_eq!(listing.body["data"][0]["public_average"], 4.5);
    }

    #[tokio::test]
    async fn rejects_score_outside_vote_range() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;
        let entry = app.create_entry(contest, "Gelato", "approved").await;

        for score in [0.0, 5.5] {
            let res = app.cast_vote(entry, 11, score).await;
            assert_eq!(res.status, 400, "score {score}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rejects_vote_on_unapproved_entry() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;
        let entry = app.create_entry(contest, "Gelato", "draft").await;

        let res = app.cast_vote(entry, 11, 3.0).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn vote_on_unknown_entry_is_404() {
        let app = TestApp::spawn().await;

        let res = app.cast_vote(404, 11, 3.0).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod scores {
    use super::*;

    #[tokio::test]
    async fn resubmitting_replaces_the_score() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;
        let entry = app.create_entry(contest, "Gelato", "approved").await;

        let first = app.submit_score(entry, 1, 60.0).await;
        assert_eq!(first.status, 201, "{}", first.text);
        let second = app.submit_score(entry, 1, 90.0).await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["id"], first.body["id"]);

        let res = app
            .wait_for(&routes::contest_results(contest), |body| {
                body["data"][0]["judge_average"] == 90.0
            })
            .await;
        assert_eq!(res.body["data"][0]["judge_count"], 1);
    }

    #[tokio::test]
    async fn rejects_score_outside_judge_range() {
        let app = TestApp::spawn().await;
        let contest = app.create_contest("Spring Cup").await;
        let entry = app.create_entry(contest, "Gelato", "approved").await;

        let res = app.submit_score(entry, 1, 100.5).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
