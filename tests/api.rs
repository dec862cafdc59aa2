use std::path::Path;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use polling_backend::{app, build_state, config::{Config, PollCreation}};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

const SECRET: &str = "s3cret";

async fn test_app(data_file: &Path, poll_creation: PollCreation) -> Router {
    let config = Config {
        admin_pass: SECRET.to_string(),
        data_file: Some(data_file.to_path_buf()),
        poll_creation,
        seed_whitelist: Vec::new(),
        ..Config::default()
    };
    app(build_state(config).await.unwrap()).unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    secret: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(secret) = secret {
        builder = builder.header("x-admin-pass", secret);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn pizza_friday_end_to_end() {
    let dir = tempdir().unwrap();
    let data_file = dir.path().join("data.json");
    let app = test_app(&data_file, PollCreation::Open).await;

    let (status, poll) = send(
        &app,
        Method::POST,
        "/polls",
        Some(json!({ "question": "Pizza Friday?" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poll["id"], 1);
    assert_eq!((poll["yes"].clone(), poll["no"].clone()), (json!(0), json!(0)));

    let vote = |ballot: &'static str| json!({ "user": "a", "vote": ballot });

    let (_, poll) = send(&app, Method::POST, "/polls/1/vote", Some(vote("yes")), None).await;
    assert_eq!((poll["yes"].clone(), poll["no"].clone()), (json!(1), json!(0)));

    let (_, again) = send(&app, Method::POST, "/polls/1/vote", Some(vote("yes")), None).await;
    assert_eq!(again, poll);

    let (_, poll) = send(&app, Method::POST, "/polls/1/vote", Some(vote("no")), None).await;
    assert_eq!((poll["yes"].clone(), poll["no"].clone()), (json!(0), json!(1)));
    assert_eq!(poll["voters"], json!({ "a": "no" }));

    let (_, poll) = send(
        &app,
        Method::POST,
        "/polls/1/comment",
        Some(json!({ "user": "b", "text": "+1" })),
        None,
    )
    .await;
    assert_eq!(poll["comments"], json!([{ "user": "b", "text": "+1" }]));

    let persisted: Value = serde_json::from_str(&std::fs::read_to_string(&data_file).unwrap()).unwrap();
    assert_eq!(persisted["polls"][0], poll);
    assert_eq!(persisted["pollIdCounter"], 2);

    let (status, body) = send(&app, Method::DELETE, "/admin/polls/1", None, Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "polls": [] }));

    let (status, body) = send(&app, Method::DELETE, "/admin/polls/1", None, Some(SECRET)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn membership_request_lifecycle() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Open).await;
    let newuser = || Some(json!({ "user": "newuser" }));

    let (status, body) = send(&app, Method::POST, "/whitelist/request", newuser(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = send(&app, Method::POST, "/whitelist/request", newuser(), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, pending) = send(&app, Method::GET, "/whitelist/requests", None, Some(SECRET)).await;
    assert_eq!(pending, json!(["newuser"]));
    let (_, whitelist) = send(&app, Method::GET, "/whitelist", None, None).await;
    assert_eq!(whitelist, json!([]));

    let (status, body) = send(&app, Method::POST, "/whitelist/approve", newuser(), Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "whitelist": ["newuser"] }));

    let (_, pending) = send(&app, Method::GET, "/whitelist/requests", None, Some(SECRET)).await;
    assert_eq!(pending, json!([]));

    let (status, _) = send(&app, Method::POST, "/whitelist/approve", newuser(), Some(SECRET)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/whitelist/request", newuser(), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn operator_whitelist_management() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Open).await;
    let user = |name: &str| Some(json!({ "user": name }));

    let (_, body) = send(&app, Method::POST, "/whitelist", user("EnderPro"), Some(SECRET)).await;
    assert_eq!(body["whitelist"], json!(["EnderPro"]));

    let (status, _) = send(&app, Method::POST, "/whitelist", user("EnderPro"), Some(SECRET)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, Method::POST, "/whitelist/request", user("late"), None).await;
    let (status, body) = send(&app, Method::POST, "/whitelist/reject", user("late"), Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = send(&app, Method::DELETE, "/admin/whitelist", user("EnderPro"), Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["whitelist"], json!([]));

    let (status, _) = send(&app, Method::DELETE, "/admin/whitelist", user("EnderPro"), Some(SECRET)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/admin/whitelist", Some(json!({})), Some(SECRET)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn operator_routes_require_the_secret() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Open).await;

    for secret in [None, Some("wrong")] {
        let (status, body) = send(&app, Method::GET, "/whitelist/requests", None, secret).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");

        let (status, _) = send(
            &app,
            Method::POST,
            "/whitelist",
            Some(json!({ "user": "sneaky" })),
            secret,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::DELETE, "/admin/polls/1", None, secret).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, whitelist) = send(&app, Method::GET, "/whitelist", None, None).await;
    assert_eq!(whitelist, json!([]));
}

#[tokio::test]
async fn operator_only_poll_creation_policy() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Operator).await;
    let question = || Some(json!({ "question": "Server reset?" }));

    let (status, _) = send(&app, Method::POST, "/polls", question(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, poll) = send(&app, Method::POST, "/polls", question(), Some(SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poll["question"], "Server reset?");
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Open).await;

    let (status, body) = send(&app, Method::POST, "/polls", Some(json!({})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    send(&app, Method::POST, "/polls", Some(json!({ "question": "q" })), None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/polls/abc/vote",
        Some(json!({ "user": "a", "vote": "yes" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/polls/1/vote",
        Some(json!({ "user": "a", "vote": "maybe" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/polls/9/vote",
        Some(json!({ "user": "a", "vote": "yes" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/polls/1/comment", Some(json!({ "user": "a" })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn send_raw(app: &Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn unreadable_bodies_use_the_error_envelope() {
    let dir = tempdir().unwrap();
    let data_file = dir.path().join("data.json");
    let app = test_app(&data_file, PollCreation::Open).await;
    send(&app, Method::POST, "/polls", Some(json!({ "question": "q" })), None).await;

    let json = Some("application/json");
    let cases = [
        ("/polls", json, r#"{"question": null}"#),
        ("/polls", json, r#"{"question": 5}"#),
        ("/polls", None, r#"{"question": "q"}"#),
        ("/polls", json, "{ not json"),
        ("/polls/1/vote", json, r#"{"user": "a", "vote": null}"#),
        ("/polls/1/comment", Some("text/plain"), r#"{"user": "a", "text": "hi"}"#),
        ("/whitelist/request", json, r#"{"user": ["a"]}"#),
    ];

    for (uri, content_type, body) in cases {
        let (status, body) = send_raw(&app, uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["message"].is_string());
    }

    let (_, polls) = send(&app, Method::GET, "/polls", None, None).await;
    assert_eq!(polls.as_array().unwrap().len(), 1);
    assert_eq!(polls[0]["yes"], 0);
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempdir().unwrap();
    let data_file = dir.path().join("data.json");

    {
        let app = test_app(&data_file, PollCreation::Open).await;
        send(&app, Method::POST, "/polls", Some(json!({ "question": "one" })), None).await;
        send(&app, Method::POST, "/polls", Some(json!({ "question": "two" })), None).await;
        send(&app, Method::DELETE, "/admin/polls/2", None, Some(SECRET)).await;
        send(&app, Method::POST, "/whitelist/request", Some(json!({ "user": "u" })), None).await;
    }

    let app = test_app(&data_file, PollCreation::Open).await;
    let (_, polls) = send(&app, Method::GET, "/polls", None, None).await;
    assert_eq!(polls.as_array().unwrap().len(), 1);

    let (_, pending) = send(&app, Method::GET, "/whitelist/requests", None, Some(SECRET)).await;
    assert_eq!(pending, json!(["u"]));

    // Deleted ids are never handed out again.
    let (_, poll) = send(&app, Method::POST, "/polls", Some(json!({ "question": "three" })), None).await;
    assert_eq!(poll["id"], 3);
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempdir().unwrap();
    let app = test_app(&dir.path().join("data.json"), PollCreation::Open).await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn first_start_seeds_default_whitelist() {
    let dir = tempdir().unwrap();
    let config = Config {
        data_file: Some(dir.path().join("data.json")),
        ..Config::default()
    };
    let app = app(build_state(config).await.unwrap()).unwrap();

    let (_, whitelist) = send(&app, Method::GET, "/whitelist", None, None).await;
    assert_eq!(whitelist, json!(["_xzl", "EnderPro", "PixelFreak", "UnruheSMP12"]));
}
