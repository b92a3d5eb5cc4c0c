use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::settings::Settings;

pub const SUMMARIZE_ENDPOINT: &str = "/api/summarize";

#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// The request never produced a response (offline, CORS, aborted).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait Transport {
    fn post_json<'a>(
        &'a self,
        url: &'a str,
        body: String,
    ) -> LocalBoxFuture<'a, Result<HttpReply, TransportError>>;
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Backend(String),
    #[error("Unexpected response from server (status {status}).")]
    Malformed { status: u16 },
    #[error("Could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct SummarizeRequest<'a> {
    pub url: &'a str,
    pub config: &'a Settings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct SummaryStats {
    #[serde(default)]
    pub input_words: f64,
    #[serde(default)]
    pub output_words: f64,
    #[serde(default)]
    pub elapsed_seconds: f64,
}

/// Output of one completed run. Replaced wholesale by the next run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    pub html: String,
    pub markdown: String,
    pub video_id: String,
    pub stats: SummaryStats,
}

#[derive(Debug, Deserialize)]
struct SummarizeReply {
    ok: Option<bool>,
    #[serde(default)]
    html: String,
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    stats: SummaryStats,
    error: Option<String>,
    detail: Option<Value>,
}

impl SummarizeReply {
    fn failure_message(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref().map(str::trim) {
            if !error.is_empty() {
                return Some(error.to_string());
            }
        }
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    fn into_result(self) -> SummaryResult {
        SummaryResult {
            html: self.html,
            markdown: self.markdown,
            video_id: self.video_id,
            stats: self.stats,
        }
    }
}

pub fn status_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

/// Classify an HTTP reply from the summarize endpoint.
pub fn interpret_reply(reply: &HttpReply) -> Result<SummaryResult, RequestError> {
    let success = (200..300).contains(&reply.status);
    let parsed = serde_json::from_str::<SummarizeReply>(&reply.body).ok();

    match parsed {
        Some(body) if success && body.ok != Some(false) => Ok(body.into_result()),
        Some(body) => Err(RequestError::Backend(
            body.failure_message()
                .unwrap_or_else(|| status_message(reply.status)),
        )),
        None if success => Err(RequestError::Malformed {
            status: reply.status,
        }),
        None => Err(RequestError::Backend(status_message(reply.status))),
    }
}
