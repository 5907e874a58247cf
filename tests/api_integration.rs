//! Integration tests for Fitplan API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API,
//! with the generative model replaced by a fixed-output stub.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use serde_json::json;
use tower::ServiceExt;

use fitplan::api::{self, AppState};
use fitplan::generator::{GenerationError, SamplingParams, TextGenerator};
use fitplan::model::RequestLogRecord;
use fitplan::orchestrator::{FALLBACK_ERROR, PlanOrchestrator, TEMPLATE_FALLBACK_ERROR};
use fitplan::request_log::RequestLogger;
use fitplan::storage::Storage;

const PROFILE_QUERY: &str =
    "age=25&height_cm=175&weight_kg=70&gender=Male&activity_level=moderate&goal=gain";

const MODEL_OUTPUT: &str = r#"BEGIN_JSON
{
  "meal_plan": [
    {"day": 1, "meals": [{"meal_time": "breakfast", "food": "Eggs"}]},
    {"day": 2, "meals": [{"meal_time": "breakfast", "food": "Oats"}]}
  ],
  "workout_plan": [
    {"day": 1, "exercises": [{"name": "Squats", "sets": 4, "reps": 10}]}
  ]
}
END_JSON"#;

/// Always answers with the same text.
struct FixedGenerator {
    output: String,
    calls: AtomicUsize,
}

impl FixedGenerator {
    fn new(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    fn model_name(&self) -> &str {
        "fixed-test-model"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &SamplingParams,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

async fn create_state(generator: Option<Arc<FixedGenerator>>) -> AppState {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let generator = generator.map(|g| g as Arc<dyn TextGenerator>);
    let orchestrator =
        PlanOrchestrator::new(generator).with_logger(RequestLogger::new(storage.clone()));

    AppState {
        storage,
        orchestrator,
    }
}

async fn create_test_server(generator: Option<Arc<FixedGenerator>>) -> (TestServer, AppState) {
    let state = create_state(generator).await;
    let server = TestServer::new(api::routes(state.clone())).unwrap();
    (server, state)
}

/// Request logging happens off the response path; poll until the row lands.
async fn wait_for_requests(storage: &Storage, count: usize) -> Vec<RequestLogRecord> {
    for _ in 0..200 {
        let records = storage.list_model_requests(10).await.unwrap();
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} logged requests");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _) = create_test_server(None).await;

    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_root_with_cors() {
    let state = create_state(None).await;
    let app = api::router(state, "http://localhost:5173").unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Fitplan backend running");
}

#[tokio::test]
async fn test_generate_with_valid_model_output() {
    let generator = FixedGenerator::new(MODEL_OUTPUT);
    let (server, state) = create_test_server(Some(generator.clone())).await;

    let response = server
        .get(&format!("/ai/generate?{PROFILE_QUERY}&user_id=4"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["duration_weeks"], 8);
    assert_eq!(body["data"]["macros"]["calories"], 3094.0);
    assert_eq!(body["data"]["meal_plan"].as_array().unwrap().len(), 2);
    // Entries are served exactly as the model wrote them.
    assert_eq!(body["data"]["workout_plan"][0]["exercises"][0]["reps"], 10);
    assert!(body["data"].get("error").is_none());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let records = wait_for_requests(&state.storage, 1).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, Some(4));
    assert_eq!(records[0].model_name, "fixed-test-model");
}

#[tokio::test]
async fn test_generate_with_unusable_model_output() {
    let generator = FixedGenerator::new("Sorry, here is some prose instead.");
    let (server, _) = create_test_server(Some(generator.clone())).await;

    let response = server.get(&format!("/ai/generate?{PROFILE_QUERY}")).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["error"], FALLBACK_ERROR);
    assert!(body["data"]["meal_plan"].as_array().unwrap().is_empty());
    assert!(body["data"]["workout_plan"].as_array().unwrap().is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_generate_template_fallback() {
    let (server, _) = create_test_server(None).await;

    let response = server
        .get(&format!("/ai/generate?{PROFILE_QUERY}&fallback=template"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["error"], TEMPLATE_FALLBACK_ERROR);
    let meal_plan = body["data"]["meal_plan"].as_array().unwrap();
    assert_eq!(meal_plan.len(), 7);
    assert_eq!(meal_plan[0]["meals"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_generate_rejects_invalid_profile() {
    let (server, _) = create_test_server(None).await;

    let response = server
        .get("/ai/generate?age=25&height_cm=175&weight_kg=70&gender=xyz&activity_level=moderate&goal=gain")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert!(body["detail"].as_str().unwrap().contains("gender"));

    let response = server
        .get("/ai/generate?age=5&height_cm=175&weight_kg=70&gender=male&activity_level=moderate&goal=gain")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get(&format!("/ai/generate?{PROFILE_QUERY}&fallback=magic"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_plan() {
    let (server, _) = create_test_server(None).await;

    let response = server
        .post("/plans/calculate")
        .json(&json!({
            "age": 25,
            "height_cm": 175.0,
            "weight_kg": 70.0,
            "gender": "male",
            "activity_level": "moderate",
            "goal": "GAIN"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["bmr"], 1673.75);
    assert_eq!(body["calories"], 3094.0);
    assert_eq!(body["protein_g"], 140.0);
    assert_eq!(body["meal_plan"].as_array().unwrap().len(), 4);
    assert_eq!(body["workout_plan"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_calculate_rejects_invalid_goal() {
    let (server, _) = create_test_server(None).await;

    let response = server
        .post("/plans/calculate")
        .json(&json!({
            "age": 25,
            "height_cm": 175.0,
            "weight_kg": 70.0,
            "gender": "male",
            "activity_level": "moderate",
            "goal": "bulk"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["detail"],
        "Invalid goal 'bulk'. Must be: lose, maintain, or gain."
    );
}

#[tokio::test]
async fn test_template_plan() {
    let (server, _) = create_test_server(None).await;

    let response = server.get("/plans/template?goal=lose").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["duration_weeks"], 8);
    let meal_plan = body["meal_plan"].as_array().unwrap();
    assert_eq!(meal_plan.len(), 7);
    assert_eq!(meal_plan[6]["meals"].as_array().unwrap().len(), 3);
    assert_eq!(body["workout_plan"][0]["exercises"][0]["duration"], "2 min");

    let response = server.get("/plans/template?goal=gain&weeks=12").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["duration_weeks"], 12);

    server
        .get("/plans/template?goal=bulk")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/plans/template?goal=gain&weeks=0").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Invalid weeks 0. Must be at least 1.");
}

#[tokio::test]
async fn test_user_workflow() {
    let (server, _) = create_test_server(None).await;
    let user = json!({
        "email": "runner@example.com",
        "age": 31,
        "height_cm": 168.0,
        "weight_kg": 61.5,
        "gender": "Female",
        "activity_level": "active",
        "goal": "maintain"
    });

    // 1. Create
    let response = server.post("/users").json(&user).await;
    response.assert_status_ok();
    let created: serde_json::Value = response.json();
    assert_eq!(created["email"], "runner@example.com");
    assert_eq!(created["gender"], "female");

    // 2. Duplicate email
    let response = server.post("/users").json(&user).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["detail"], "Email already registered");

    // 3. Invalid email
    let mut bad = user.clone();
    bad["email"] = json!("not-an-email");
    let response = server.post("/users").json(&bad).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["detail"],
        "Invalid email 'not-an-email'. Must be a valid email address."
    );

    // 4. List
    let response = server.get("/users").await;
    response.assert_status_ok();
    let users: serde_json::Value = response.json();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["id"], created["id"]);
}
