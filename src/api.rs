use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::models::SummarizeJob;
use crate::state::AppState;
use crate::ui::{self, FormDefaults};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index_page))
        .route("/api/summarize", post(summarize))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn index_page() -> Html<String> {
    Html(ui::render_index_page(&FormDefaults::default()))
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = serde_json::from_slice::<Value>(&body)
        .map_err(|_| ApiError::bad_request("Invalid JSON body."))?;
    let job = SummarizeJob::from_payload(&payload).map_err(|err| {
        debug!("rejected summarize request: {err}");
        ApiError::bad_request(err.to_string())
    })?;

    info!(
        "summarizing {} with {}/{}",
        job.url, job.config.provider, job.config.model_name
    );
    relay_summarize(&state, &job).await
}

/// Forwards a validated job and hands the summarizer's status and JSON back unchanged.
async fn relay_summarize(state: &AppState, job: &SummarizeJob) -> Result<Response, ApiError> {
    let upstream = state.config.summarizer_url.as_str();
    let response = state
        .http
        .post(upstream)
        .json(job)
        .send()
        .await
        .map_err(|err| {
            warn!("summarizer request to {upstream} failed: {err}");
            ApiError::bad_gateway(format!("Summarizer unavailable: {err}"))
        })?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = response.bytes().await.map_err(|err| {
        warn!("failed reading summarizer response: {err}");
        ApiError::bad_gateway(format!("Summarizer unavailable: {err}"))
    })?;

    let value = serde_json::from_slice::<Value>(&body).map_err(|_| {
        warn!("summarizer answered {status} with a non-JSON body");
        ApiError::bad_gateway(format!(
            "Summarizer returned an invalid response (status {}).",
            status.as_u16()
        ))
    })?;

    Ok((status, Json(value)).into_response())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
    detail: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            ok: false,
            error: self.message.clone(),
            detail: self.message,
        });
        (self.status, body).into_response()
    }
}
