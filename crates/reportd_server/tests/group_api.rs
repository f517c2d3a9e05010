//! Integration tests for batch upload/update and group listing.

mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::setup_test_server;

#[tokio::test]
async fn test_group_upload_and_listing() {
    let (server, _state, _temp) = setup_test_server();

    let response = server
        .post("/upload-group")
        .json(&json!({
            "groupId": "release-42",
            "reports": [
                { "key": "coverage", "html": "<p>cov</p>" },
                { "key": "perf", "html": "<p>perf</p>" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["groupId"], "release-42");
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["results"][0]["key"], "coverage");
    assert_eq!(body["results"][1]["success"], true);

    server
        .get("/group/release-42")
        .await
        .assert_json(&json!({ "groupId": "release-42", "keys": ["coverage", "perf"] }));

    let groups: serde_json::Value = server.get("/groups").await.json();
    assert_eq!(groups["total"], 1);
    assert_eq!(groups["groups"][0]["groupId"], "release-42");

    assert_eq!(server.get("/report/perf").await.text(), "<p>perf</p>");
}

#[tokio::test]
async fn test_group_upload_rejects_duplicate_keys_wholesale() {
    let (server, state, _temp) = setup_test_server();

    let response = server
        .post("/upload-group")
        .json(&json!({
            "groupId": "g1",
            "reports": [
                { "key": "k1", "html": "a" },
                { "key": "k1", "html": "b" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count().expect("count"), 0);
    assert_eq!(server.get("/group/g1").await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_upload_conflict_names_existing_keys() {
    let (server, state, _temp) = setup_test_server();

    server
        .post("/upload")
        .json(&json!({ "key": "k1", "html": "original" }))
        .await
        .assert_status_ok();

    let response = server
        .post("/upload-group")
        .json(&json!({
            "groupId": "g1",
            "reports": [
                { "key": "k0", "html": "new" },
                { "key": "k1", "html": "clobber" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["keys"], json!(["k1"]));

    assert_eq!(state.db.count().expect("count"), 1);
    assert_eq!(server.get("/report/k1").await.text(), "original");
    server
        .get("/exists/k0")
        .await
        .assert_json(&json!({ "exists": false, "key": "k0" }));
}

#[tokio::test]
async fn test_group_upload_requires_group_id_and_reports() {
    let (server, _state, _temp) = setup_test_server();

    let no_group = server
        .post("/upload-group")
        .json(&json!({ "reports": [{ "key": "a", "html": "x" }] }))
        .await;
    assert_eq!(no_group.status_code(), StatusCode::BAD_REQUEST);

    let empty = server
        .post("/upload-group")
        .json(&json!({ "groupId": "g", "reports": [] }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);

    let partial_item = server
        .post("/upload-group")
        .json(&json!({ "groupId": "g", "reports": [{ "key": "a" }] }))
        .await;
    assert_eq!(partial_item.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_group_replaces_bodies_or_lists_missing_keys() {
    let (server, _state, _temp) = setup_test_server();

    server
        .post("/upload-group")
        .json(&json!({
            "groupId": "g",
            "reports": [
                { "key": "a", "html": "a1" },
                { "key": "b", "html": "b1" }
            ]
        }))
        .await
        .assert_status_ok();

    let missing = server
        .post("/update-group")
        .json(&json!({
            "reports": [
                { "key": "a", "html": "a2" },
                { "key": "x", "html": "x2" },
                { "key": "y", "html": "y2" }
            ]
        }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = missing.json();
    assert_eq!(body["keys"], json!(["x", "y"]));
    assert_eq!(server.get("/report/a").await.text(), "a1");

    let updated = server
        .post("/update-group")
        .json(&json!({
            "reports": [
                { "key": "a", "html": "a2" },
                { "key": "b", "html": "b2" }
            ]
        }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let body: serde_json::Value = updated.json();
    assert_eq!(body["succeeded"], 2);
    assert!(body.get("groupId").is_none());
    assert_eq!(server.get("/report/a").await.text(), "a2");
    assert_eq!(server.get("/report/b").await.text(), "b2");
}

#[tokio::test]
async fn test_deleting_last_member_removes_group() {
    let (server, _state, _temp) = setup_test_server();

    server
        .post("/upload-group")
        .json(&json!({
            "groupId": "solo",
            "reports": [{ "key": "only", "html": "x" }]
        }))
        .await
        .assert_status_ok();
    server
        .post("/upload-group")
        .json(&json!({
            "groupId": "pair",
            "reports": [
                { "key": "p1", "html": "x" },
                { "key": "p2", "html": "y" }
            ]
        }))
        .await
        .assert_status_ok();

    server.delete("/report/only").await.assert_status_ok();
    server.delete("/report/p1").await.assert_status_ok();

    assert_eq!(server.get("/group/solo").await.status_code(), StatusCode::NOT_FOUND);
    server
        .get("/group/pair")
        .await
        .assert_json(&json!({ "groupId": "pair", "keys": ["p2"] }));
    let groups: serde_json::Value = server.get("/groups").await.json();
    assert_eq!(groups["total"], 1);
}
