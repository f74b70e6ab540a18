//! API integration tests
//!
//! The router runs in-process over the in-memory store. The `#[ignore]`d
//! tests at the bottom target a live server on localhost.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::{visit_day, Harness};
use ldh_admission_server::{
    api::create_router,
    config::{
        AdmissionConfig, AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, RedisConfig,
        ServerConfig,
    },
    models::{Category, Role, UserClaims},
    services::clock::Clock,
    AppState,
};

const SECRET: &str = "api-test-secret";

struct TestApp {
    harness: Harness,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let harness = Harness::new();
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig {
                jwt_secret: SECRET.to_string(),
            },
            logging: LoggingConfig::default(),
            redis: RedisConfig::default(),
            admission: AdmissionConfig::default(),
        };
        let state = AppState {
            config: Arc::new(config),
            services: Arc::new(harness.services.clone()),
            started_at: harness.clock.now(),
        };
        Self {
            router: create_router(state),
            harness,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn token(sub: Uuid, role: Role) -> String {
    let now = Utc::now();
    UserClaims {
        sub,
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
    }
    .create_token(SECRET)
    .unwrap()
}

fn admin() -> String {
    token(Uuid::new_v4(), Role::Admin)
}

fn intake_body(visitor_id: Uuid) -> Value {
    json!({
        "visitor_id": visitor_id,
        "category": "food",
        "visit_day": visit_day(),
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/help-requests", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_visitor_submits_own_request_only() {
    let app = TestApp::new();
    let visitor = Uuid::new_v4();
    let visitor_token = token(visitor, Role::Visitor);

    let (status, body) = app
        .send(Method::POST, "/help-requests", Some(&visitor_token), Some(intake_body(visitor)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["category"], "food");
    assert!(body["ticket_number"].is_null());

    let (status, _) = app
        .send(
            Method::POST,
            "/help-requests",
            Some(&visitor_token),
            Some(intake_body(Uuid::new_v4())),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::GET, "/help-requests", Some(&visitor_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approve_with_ticket_then_capacity_exceeded() {
    let app = TestApp::new();
    let admin = admin();
    app.harness.set_food_capacity(1).await;

    let first = app.harness.submit(Category::Food).await;
    let second = app.harness.submit(Category::Food).await;
    let approve = json!({ "issue_ticket_now": true });

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/help-requests/{}/approve", first.id),
            Some(&admin),
            Some(approve.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ticket_issued");
    assert_eq!(body["ticket_number"], "LDH20240701001");
    assert!(body["qr_code"].as_str().unwrap().contains("\"action\":\"checkin\""));

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/help-requests/{}/approve", second.id),
            Some(&admin),
            Some(approve),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8);
    assert_eq!(body["error"], "CapacityExceeded");

    let (status, body) = app
        .send(Method::GET, &format!("/help-requests/{}", second.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_reject_requires_reason_and_pending_status() {
    let app = TestApp::new();
    let admin = admin();
    let request = app.harness.submit(Category::General).await;
    let uri = format!("/help-requests/{}/reject", request.id);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "reason": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);

    let (status, body) = app
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "reason": "Outside the service area" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "Outside the service area");

    let (status, body) = app
        .send(Method::POST, &uri, Some(&admin), Some(json!({ "reason": "again" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6);
}

#[tokio::test]
async fn test_batch_issue_and_check_in() {
    let app = TestApp::new();
    let admin = admin();
    for _ in 0..3 {
        app.harness.approved(Category::Food).await;
    }

    let (status, body) = app
        .send(
            Method::POST,
            "/tickets/batch",
            Some(&admin),
            Some(json!({ "visit_day": visit_day(), "category": "food", "max_tickets": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issued"], 2);
    let ticket = body["tickets"][0]["ticket_number"].as_str().unwrap().to_string();
    assert_eq!(ticket, "LDH20240701001");

    let volunteer = token(Uuid::new_v4(), Role::Volunteer);
    let uri = format!("/tickets/{}/check-in", ticket);

    // Too early: the harness clock is three days before the visit.
    let (status, _) = app.send(Method::POST, &uri, Some(&volunteer), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.harness.clock.advance(Duration::days(3));
    let (status, body) = app.send(Method::POST, &uri, Some(&volunteer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, _) = app.send(Method::POST, &uri, Some(&volunteer), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::POST, "/tickets/LDH20240701999/check-in", Some(&volunteer), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_rejects_negative_limit() {
    let app = TestApp::new();

    let (status, _) = app
        .send(
            Method::POST,
            "/tickets/batch",
            Some(&admin()),
            Some(json!({ "visit_day": visit_day(), "category": "food", "max_tickets": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_read_and_update() {
    let app = TestApp::new();
    let admin = admin();
    let uri = format!("/capacity/{}", visit_day());

    let (status, body) = app
        .send(Method::GET, &uri, Some(&token(Uuid::new_v4(), Role::Volunteer)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_food"], 50);
    assert_eq!(body["available_general"], 20);

    let (status, _) = app
        .send(Method::GET, &uri, Some(&token(Uuid::new_v4(), Role::Visitor)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.harness.approved(Category::Food).await;
    app.harness
        .services
        .admission
        .batch_issue_tickets(visit_day(), &Category::Food, 0, app.harness.admin)
        .await
        .unwrap();

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "max_food": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "max_food": 5, "is_operating_day": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_food"], 5);
    assert_eq!(body["current_food"], 1);
    assert_eq!(body["available_food"], 0);
}

#[tokio::test]
async fn test_cancel_by_owner_only() {
    let app = TestApp::new();
    let request = app.harness.submit(Category::General).await;
    let uri = format!("/help-requests/{}/cancel", request.id);

    let (status, _) = app
        .send(Method::POST, &uri, Some(&token(Uuid::new_v4(), Role::Visitor)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let owner = token(request.visitor_id, Role::Visitor);
    let (status, body) = app.send(Method::POST, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = app.send(Method::POST, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// Live server tests. Run with: cargo test --test api -- --ignored

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[tokio::test]
#[ignore]
async fn test_live_health_check() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_live_requires_token() {
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/help-requests", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
