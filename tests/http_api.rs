//! HTTP API tests.
//!
//! Drive the full router in-process (no socket) and check status codes and
//! JSON shapes, including the error envelope.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pr_reviewer::db;
use pr_reviewer::services::build_router;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn setup() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("api.db")).await.unwrap();
    (dir, build_router(pool))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// Team "Backend" with members 1..=4, all active. Returns the team id.
async fn seed_team(app: &Router) -> i64 {
    let (status, body) = post(
        app,
        "/team/add",
        json!({
            "team_name": "Backend",
            "members": [
                {"user_id": 1, "username": "alice", "is_active": true},
                {"user_id": 2, "username": "bob", "is_active": true},
                {"user_id": 3, "username": "carol", "is_active": true},
                {"user_id": 4, "username": "dave"}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["team"]["team_id"].as_i64().unwrap()
}

async fn create_pr(app: &Router, team_id: i64) -> Value {
    let (status, body) = post(
        app,
        "/pullRequest/create",
        json!({"pull_request_name": "Add search", "author_id": 1, "team_id": team_id}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["pr"].clone()
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = setup().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_team_add_and_get() {
    let (_dir, app) = setup().await;
    let team_id = seed_team(&app).await;

    let (status, body) = get(&app, "/team/get?team_name=Backend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team"]["team_id"], json!(team_id));
    let members = body["team"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 4);
    assert_eq!(members[3], json!({"user_id": 4, "username": "dave", "is_active": true}));

    let (status, body) = get(&app, "/team/get?team_name=Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_pull_request_shape() {
    let (_dir, app) = setup().await;
    let team_id = seed_team(&app).await;

    let pr = create_pr(&app, team_id).await;
    assert_eq!(pr["pull_request_name"], "Add search");
    assert_eq!(pr["author_id"], 1);
    assert_eq!(pr["status"], "OPEN");
    assert!(pr["createdAt"].is_string());
    assert!(pr.get("mergedAt").is_none());

    let reviewers = pr["assigned_reviewers"].as_array().unwrap();
    assert_eq!(reviewers.len(), 2);
    assert!(!reviewers.contains(&json!(1)));

    let uri = format!("/pullRequest/get?pull_request_id={}", pr["pull_request_id"]);
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"], pr);
}

#[tokio::test]
async fn test_merge_is_idempotent_over_http() {
    let (_dir, app) = setup().await;
    let team_id = seed_team(&app).await;
    let pr = create_pr(&app, team_id).await;
    let req = json!({"pull_request_id": pr["pull_request_id"]});

    let (status, first) = post(&app, "/pullRequest/merge", req.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "MERGED");
    assert!(first["pr"]["mergedAt"].is_string());

    let (status, second) = post(&app, "/pullRequest/merge", req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_reassign_over_http() {
    let (_dir, app) = setup().await;
    let team_id = seed_team(&app).await;
    let pr = create_pr(&app, team_id).await;
    let pr_id = pr["pull_request_id"].clone();
    let old = pr["assigned_reviewers"][0].as_i64().unwrap();

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr_id, "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let replaced_by = body["replaced_by"].as_i64().unwrap();
    let reviewers = body["pr"]["assigned_reviewers"].as_array().unwrap();
    assert!(reviewers.contains(&json!(replaced_by)));
    assert!(!reviewers.contains(&json!(old)));

    // The old reviewer is no longer assigned.
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr_id, "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_ASSIGNED");

    post(&app, "/pullRequest/merge", json!({"pull_request_id": pr_id})).await;
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr_id, "old_user_id": replaced_by}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_MERGED");
}

#[tokio::test]
async fn test_set_is_active_and_get_reviews() {
    let (_dir, app) = setup().await;
    let team_id = seed_team(&app).await;
    let pr = create_pr(&app, team_id).await;
    let reviewer = pr["assigned_reviewers"][0].as_i64().unwrap();

    let (status, body) = post(
        &app,
        "/users/setIsActive",
        json!({"user_id": reviewer, "is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_active"], false);
    assert_eq!(body["user"]["team_name"], "Backend");

    let (status, body) = get(&app, &format!("/users/getReview?user_id={}", reviewer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], reviewer);
    let prs = body["pull_requests"].as_array().unwrap();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0]["pull_request_id"], pr["pull_request_id"]);

    let (status, body) = post(&app, "/users/setIsActive", json!({"user_id": 99, "is_active": true})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_requests_are_invalid_input() {
    let (_dir, app) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/pullRequest/create")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = post(&app, "/pullRequest/merge", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = get(&app, "/pullRequest/get?pull_request_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({"pull_request_name": " ", "author_id": 1, "team_id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_no_candidate_maps_to_conflict() {
    let (_dir, app) = setup().await;
    let (_, body) = post(
        &app,
        "/team/add",
        json!({
            "team_name": "Tiny",
            "members": [
                {"user_id": 1, "username": "alice"},
                {"user_id": 2, "username": "bob"}
            ]
        }),
    )
    .await;
    let team_id = body["team"]["team_id"].as_i64().unwrap();
    let pr = create_pr(&app, team_id).await;
    assert_eq!(pr["assigned_reviewers"], json!([2]));

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr["pull_request_id"], "old_user_id": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");
}
