//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use worldforge_core::clock::Clock;
use worldforge_generation::application::client::GenerationClient;
use worldforge_generation::application::executor::CallExecutor;
use worldforge_generation::application::recorder::CallRecorder;
use worldforge_generation::application::settings::{GenerationSettings, RetryPolicy};
use worldforge_generation::domain::ports::{ImageGenerator, TextGenerator};
use worldforge_store::InMemoryStore;
use worldforge_tasks::application::queue::TaskQueue;
use worldforge_test_support::FixedClock;
use worldforge_worldgen::application::orchestrator::WorldGenerator;

use worldforge_api::routes;
use worldforge_api::state::AppState;

/// The full app router plus the store behind it.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    /// A fresh router over the shared state.
    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }
}

/// Build the app over the given backends, a fixed clock, and fast retries.
pub fn build_test_app(text: Arc<dyn TextGenerator>, image: Arc<dyn ImageGenerator>) -> TestApp {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    let store = Arc::new(InMemoryStore::new());
    let settings = GenerationSettings {
        text_policy: RetryPolicy::from_millis(2, 1, 1_000),
        image_policy: RetryPolicy::from_millis(2, 1, 1_000),
        ..GenerationSettings::default()
    };
    let client = GenerationClient::new(
        text,
        image,
        CallExecutor::new(CallRecorder::new(store.clone(), clock.clone())),
        settings,
    );
    let generator = WorldGenerator::new(client, store.clone(), clock.clone());
    let state = AppState::new(TaskQueue::new(clock), generator, store.clone(), 100);
    TestApp { state, store }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Poll `GET /api/v1/tasks/{task_id}` until the task is terminal.
pub async fn poll_task(app: &TestApp, task_id: &str) -> serde_json::Value {
    for _ in 0..2_000 {
        let (status, json) = get_json(app.router(), &format!("/api/v1/tasks/{task_id}")).await;
        assert_eq!(status, StatusCode::OK);
        if json["status"] == "completed" || json["status"] == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} did not finish");
}
