use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use rapport::api::{create_router, AppState};
use rapport::config::{Config, RelationshipConfig, ServerConfig};
use rapport::db::{Database, DatabaseBackend, LibSqlBackend};
use rapport::llm::LlmProvider;

mod common;
use common::database_config;

const KEY: &str = "integration-key";

async fn app() -> Router {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_keys: vec![KEY.to_string()],
        },
        database: database_config(":memory:".to_string()),
        relationships: RelationshipConfig::default(),
        llm: None,
    };
    let db = Database::new(&config.database).await.unwrap();
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
    let llm = LlmProvider::new(None);
    create_router(AppState::new(config, db, llm))
}

fn request(method: &str, uri: &str, user: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {KEY}"))
        .header("X-User-Id", user);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn outbound_event(to: &str) -> Value {
    json!({
        "emailId": format!("m-{to}"),
        "from": "me@mail.test",
        "to": to,
        "subject": "Hello",
        "body": "Thanks for the great session",
        "direction": "outbound",
        "sentAt": "2026-01-05T10:00:00Z"
    })
}

#[tokio::test]
async fn test_contacts_are_scoped_per_user() {
    let app = app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/v1/relationships:track",
            "alice",
            Some(outbound_event("Pat <pat@example.com>, lee@example.com")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);

    let (_, alice) = send(&app, request("GET", "/api/v1/relationships", "alice", None)).await;
    assert_eq!(alice["meta"]["total"], 2);

    let (_, bob) = send(&app, request("GET", "/api/v1/relationships", "bob", None)).await;
    assert_eq!(bob["meta"]["total"], 0);
    assert_eq!(bob["data"]["contacts"], json!([]));

    let contact_id = alice["data"]["contacts"][0]["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        request("GET", &format!("/api/v1/relationships/{contact_id}"), "bob", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_limit_is_applied() {
    let app = app().await;
    for to in ["a@x.com", "b@x.com", "c@x.com"] {
        send(
            &app,
            request(
                "POST",
                "/api/v1/relationships:track",
                "u",
                Some(outbound_event(to)),
            ),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        request("GET", "/api/v1/relationships?limit=2", "u", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["contacts"].as_array().unwrap().len(), 2);

    let (_, stats) = send(&app, request("GET", "/api/v1/relationships/stats", "u", None)).await;
    assert_eq!(stats["data"]["totalContacts"], 3);
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let app = app().await;
    let req = Request::builder()
        .uri("/api/v1/relationships")
        .header("Authorization", "Bearer nope")
        .header("X-User-Id", "u")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}
