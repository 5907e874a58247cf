//! HTTP API handlers for Fitplan.
//!
//! # Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `GET /ai/generate` - Macros plus a model-generated 7-day plan
//! - `POST /plans/calculate` - Macros plus a portion-sized plan, no model
//! - `GET /plans/template` - Template plan for a goal
//! - `POST /users` / `GET /users` - Create and list user profiles
//!
//! Validation failures answer `400` with `{"detail": "..."}`. Store failures
//! on the user endpoints answer `500` with a generic body; the real error only
//! goes to the log.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::model::{
    ApiEnvelope, CalculatedPlan, CreateUserRequest, GenerateQuery, GeneratedPlan, RawProfile,
    TemplatePlan, TemplateQuery, UserRecord,
};
use crate::nutrition;
use crate::orchestrator::{FallbackPolicy, PlanOrchestrator};
use crate::storage::Storage;
use crate::templates;
use crate::validation::{self, ValidationError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub orchestrator: PlanOrchestrator,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::DuplicateEmail => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(e) => {
                warn!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Build the full router with tracing and CORS for `cors_origin`.
pub fn router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    ))
}

/// Routes without middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ai/generate", get(generate_plan))
        .route("/plans/calculate", post(calculate_plan))
        .route("/plans/template", get(template_plan))
        .route("/users", post(create_user).get(list_users))
        .with_state(state)
}

/// GET / - Service banner.
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Fitplan backend running" }))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /ai/generate - Macros plus a generated meal and workout plan.
///
/// # Query Parameters
///
/// - `age`, `height_cm`, `weight_kg`, `gender`, `activity_level`, `goal` (required)
/// - `user_id` (optional): attached to the request log
/// - `fallback` (optional): `template` substitutes the template plan when the
///   model output is unusable
///
/// # Response
///
/// ```json
/// {
///     "status": "success",
///     "message": "AI-generated plan created successfully",
///     "data": {
///         "macros": {"bmr": 1673.75, "tdee": 2594.31, "calories": 3094.0, ...},
///         "meal_plan": [{"day": 1, "meals": [...]}],
///         "workout_plan": [{"day": 1, "exercises": [...]}],
///         "duration_weeks": 8
///     }
/// }
/// ```
///
/// `data.error` is present when the model output was unusable.
#[instrument(skip(state))]
pub async fn generate_plan(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<ApiEnvelope<GeneratedPlan>>, ApiError> {
    let profile = validation::normalize(&query.raw_profile())?;
    let fallback = FallbackPolicy::from_param(query.fallback.as_deref()).ok_or_else(|| {
        ValidationError::Field("Invalid fallback. Must be: none or template.".to_string())
    })?;

    let plan = state
        .orchestrator
        .orchestrate_with(&profile, query.user_id, fallback)
        .await;

    info!(
        goal = %profile.goal,
        user_id = ?query.user_id,
        fallback_used = plan.error.is_some(),
        "Generated plan served"
    );

    Ok(Json(ApiEnvelope::success(
        "AI-generated plan created successfully",
        plan,
    )))
}

/// POST /plans/calculate - Macros plus a portion-sized plan, without the model.
#[instrument(skip_all)]
pub async fn calculate_plan(
    Json(raw): Json<RawProfile>,
) -> Result<Json<CalculatedPlan>, ApiError> {
    let profile = validation::normalize(&raw)?;
    let macros = nutrition::compute(&profile);
    let portions = templates::portion_plan(&macros, profile.goal);

    info!(goal = %profile.goal, calories = macros.calories.round(), "Plan calculated");

    Ok(Json(CalculatedPlan {
        macros: macros.rounded(),
        meal_plan: portions.meal_plan,
        workout_plan: portions.workout_plan,
    }))
}

/// GET /plans/template - Template plan for a goal.
///
/// # Query Parameters
///
/// - `goal` (required): lose, maintain or gain
/// - `weeks` (optional): plan duration, at least 1 (default: 8)
#[instrument]
pub async fn template_plan(
    Query(query): Query<TemplateQuery>,
) -> Result<Json<TemplatePlan>, ApiError> {
    let goal = validation::parse_goal(&query.goal)?;
    let weeks = validation::duration_weeks(query.weeks)?;
    Ok(Json(templates::synthesize(goal, weeks)))
}

/// POST /users - Register a user profile.
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    let profile = validation::user_profile(&request)?;

    if state
        .storage
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateEmail);
    }

    let user = state.storage.create_user(&request.email, &profile).await?;
    info!(user_id = user.id, "User created");
    Ok(Json(user))
}

/// GET /users - List all users.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.storage.list_users().await?;
    info!(count = users.len(), "Users listed");
    Ok(Json(users))
}
