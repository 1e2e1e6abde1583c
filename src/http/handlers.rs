use super::state::AppState;
use crate::telephony::twiml;
use crate::transcript::Turn;
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TwimlQuery {
    pub scenario: Option<String>,
}

/// Status callback posted by the telephony provider
#[derive(Debug, Deserialize)]
pub struct CallStatusForm {
    #[serde(rename = "CallSid", default)]
    pub call_sid: String,

    #[serde(rename = "CallStatus", default)]
    pub call_status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CallStatusResponse {
    pub call_sid: String,
    pub completed: bool,
    pub turns: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn call_not_found(call_sid: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Call {} not found", call_sid),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// GET|POST /twiml?scenario=
/// Tell the provider to open a media stream back to us
pub async fn twiml(
    State(state): State<AppState>,
    Query(query): Query<TwimlQuery>,
) -> impl IntoResponse {
    let scenario = query
        .scenario
        .unwrap_or_else(|| state.services.config.default_scenario.clone());

    (
        [(header::CONTENT_TYPE, "text/xml")],
        twiml::connect_stream(&state.public_host, &scenario),
    )
}

/// POST /call-status
/// A `completed` status releases whoever waits on the call
pub async fn call_status(
    State(state): State<AppState>,
    Form(form): Form<CallStatusForm>,
) -> impl IntoResponse {
    info!(
        "Call status: SID={} status={}",
        form.call_sid, form.call_status
    );

    if form.call_status == "completed" {
        state.registry().complete(&form.call_sid).await;
    }

    "OK"
}

/// GET /calls/:call_sid/status
pub async fn get_call_status(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> impl IntoResponse {
    let registry = state.registry();

    let Some(signal) = registry.get(&call_sid).await else {
        return call_not_found(&call_sid);
    };

    let turns = match registry.transcript(&call_sid).await {
        Some(recorder) => recorder.len().await,
        None => 0,
    };

    (
        StatusCode::OK,
        Json(CallStatusResponse {
            call_sid,
            completed: signal.is_raised(),
            turns,
        }),
    )
        .into_response()
}

/// GET /calls/:call_sid/transcript
/// Turns logged for a call so far
pub async fn get_call_transcript(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> impl IntoResponse {
    match state.registry().transcript(&call_sid).await {
        Some(recorder) => {
            let turns: Vec<Turn> = recorder.turns().await;
            (StatusCode::OK, Json(turns)).into_response()
        }
        None => call_not_found(&call_sid),
    }
}
