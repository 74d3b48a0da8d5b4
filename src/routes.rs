use axum::{Json, extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    ar_flow::{ArOrchestrator, ArSnapshot},
    auth::{AuthError, AuthService},
    design_flow::{DesignOrchestrator, DesignSnapshot},
    error::{ApiError, FlowError},
    models::{ArRequest, ArResult, DesignRequest, User},
    presentation::{self, CostSummary, HistoryEntry, Tab},
    slider::ComparisonSlider,
};

#[derive(Clone)]
pub struct AppState {
    pub design: Arc<DesignOrchestrator>,
    pub ar: Arc<ArOrchestrator>,
    pub auth: Arc<AuthService>,
    pub configured: bool,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Validation(err.to_string()),
            AuthError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/design", post(submit_design).get(get_design))
        .route("/api/design/reset", post(reset_design))
        .route("/api/design/summary", get(design_summary))
        .route("/api/ar", post(generate_ar).get(get_ar).delete(reset_ar))
        .route("/api/ar/source", post(upload_source))
        .route("/api/ar/history", get(ar_history))
        .route("/api/ar/select/:id", post(select_ar))
        .route("/api/ar/compare/:id", get(compare_ar))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session).delete(logout))
        .route("/api/shopping-link", get(shopping_link))
        .route("/api/ambient-audio", get(ambient_audio))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "configured": state.configured }))
}

pub async fn submit_design(State(state): State<AppState>, Json(body): Json<DesignRequest>) -> Result<Json<DesignSnapshot>, ApiError> {
    body.validate().map_err(ApiError::Validation)?;
    // Failures are part of the snapshot; the UI renders them from there.
    match state.design.submit(body).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(_) => Ok(Json(state.design.snapshot())),
    }
}

pub async fn get_design(State(state): State<AppState>) -> Json<DesignSnapshot> {
    Json(state.design.snapshot())
}

pub async fn reset_design(State(state): State<AppState>) -> Json<DesignSnapshot> {
    state.design.reset();
    Json(state.design.snapshot())
}

pub async fn design_summary(State(state): State<AppState>) -> Result<Json<CostSummary>, ApiError> {
    let snapshot = state.design.snapshot();
    let list = snapshot.result.furniture_data.ok_or_else(|| ApiError::NotFound("furniture list".into()))?;
    Ok(Json(presentation::cost_summary(&list)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpload {
    pub source_image: String,
}

pub async fn upload_source(State(state): State<AppState>, Json(body): Json<SourceUpload>) -> Result<Json<ArSnapshot>, ApiError> {
    state.ar.set_source_image(&body.source_image).map_err(|e| ApiError::Validation(e.to_string()))?;
    Ok(Json(state.ar.snapshot()))
}

pub async fn generate_ar(State(state): State<AppState>, Json(body): Json<ArRequest>) -> Result<Json<ArSnapshot>, ApiError> {
    if body.style.trim().is_empty() {
        return Err(ApiError::Validation("style must not be empty".into()));
    }
    match state.ar.generate(body).await {
        Err(FlowError::Parse(e)) => Err(ApiError::Validation(e.to_string())),
        _ => Ok(Json(state.ar.snapshot())),
    }
}

pub async fn get_ar(State(state): State<AppState>) -> Json<ArSnapshot> {
    Json(state.ar.snapshot())
}

pub async fn reset_ar(State(state): State<AppState>) -> Json<ArSnapshot> {
    state.ar.reset_all();
    Json(state.ar.snapshot())
}

pub async fn ar_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let snapshot = state.ar.snapshot();
    Json(presentation::history_entries(&snapshot.history, snapshot.selected_id))
}

pub async fn select_ar(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<ArResult>, ApiError> {
    state.ar.select(id).map(Json).ok_or_else(|| ApiError::NotFound(format!("AR result {id}")))
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub position: Option<f64>,
}

pub async fn compare_ar(
    Path(id): Path<Uuid>,
    Query(query): Query<CompareQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.ar.snapshot();
    let result = snapshot.history.iter().find(|r| r.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("AR result {id}")))?;
    let mut slider = ComparisonSlider::new();
    if let Some(position) = query.position {
        slider.set_position(position);
    }
    let view = slider.view(&result.original_image, result.generated_image.as_deref());
    serde_json::to_value(view).map(Json).map_err(|e| ApiError::Internal(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.login(&body.email, &body.password)?))
}

pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.register(body.name.as_deref(), &body.email, &body.password)?))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.auth.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    state.auth.current().map(Json).ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Deserialize)]
pub struct ShoppingQuery {
    pub q: String,
}

pub async fn shopping_link(Query(query): Query<ShoppingQuery>) -> Result<Json<Value>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::Validation("search keyword must not be empty".into()));
    }
    Ok(Json(json!({ "url": presentation::shopping_link(&query.q) })))
}

#[derive(Debug, Deserialize)]
pub struct AmbientQuery {
    pub tab: Tab,
}

pub async fn ambient_audio(Query(query): Query<AmbientQuery>, State(state): State<AppState>) -> Json<Value> {
    let design = state.design.snapshot();
    let play = presentation::ambient_audio_active(query.tab, &design.result, state.ar.has_results());
    Json(json!({ "play": play }))
}
