//! HTTP surface for the translation layer.
//!
//! The translate endpoints are fail-soft: provider or store trouble still
//! yields `200 OK` with the original text. Only caller mistakes (an unknown
//! `targetLanguage`, an unparsable body) are rejected.

use crate::i18n::{Locale, LocaleError, MetricsReport};
use crate::translation::{ContentRecord, Translator};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
}

impl AppState {
    pub fn new(translator: Arc<Translator>) -> Self {
        Self { translator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/translate", post(translate))
        .route("/api/translate/records", post(translate_records))
        .route("/api/translate/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `{ "text": "..." }` or `{ "texts": [...] }`, plus `"targetLanguage"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(flatten)]
    pub payload: TranslatePayload,
    pub target_language: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TranslatePayload {
    Single { text: String },
    Many { texts: Vec<String> },
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TranslateResponse {
    pub translated: Translated,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Translated {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRecordsRequest {
    pub records: Vec<ContentRecord>,
    pub fields: Vec<String>,
    pub target_language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRecordsResponse {
    pub records: Vec<ContentRecord>,
}

/// Errors surfaced to HTTP callers.
#[derive(Debug)]
pub enum ApiError {
    InvalidLocale(LocaleError),
}

impl From<LocaleError> for ApiError {
    fn from(err: LocaleError) -> Self {
        ApiError::InvalidLocale(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidLocale(err) => {
                warn!("Rejected translation request: {}", err);
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let target = Locale::from_code(&request.target_language)?;

    let translated = match request.payload {
        TranslatePayload::Single { text } => {
            Translated::Single(state.translator.translate_text(&text, target).await)
        }
        TranslatePayload::Many { texts } => {
            Translated::Many(state.translator.translate_texts(&texts, target).await)
        }
    };

    Ok(Json(TranslateResponse { translated }))
}

pub async fn translate_records(
    State(state): State<AppState>,
    Json(request): Json<TranslateRecordsRequest>,
) -> Result<Json<TranslateRecordsResponse>, ApiError> {
    let target = Locale::from_code(&request.target_language)?;

    let records = state
        .translator
        .translate_content_array(request.records, &request.fields, target)
        .await;

    Ok(Json(TranslateRecordsResponse { records }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.translator.metrics())
}
