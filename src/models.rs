use std::str::FromStr;

use isolang::Language;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("length must be one of: short, medium, long.")]
pub struct UnknownLength;

impl FromStr for SummaryLength {
    type Err = UnknownLength;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "short" => Self::Short,
            "medium" => Self::Medium,
            "long" => Self::Long,
            _ => return Err(UnknownLength),
        })
    }
}

/// A summarize request that passed validation, ready to hand to the summarizer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummarizeJob {
    pub url: String,
    pub config: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    pub provider: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub target_language: String,
    pub length: SummaryLength,
    pub include_summary: bool,
    pub include_key_points: bool,
    pub temperature: f64,
    pub target_chunk_words: i64,
    pub max_tokens: i64,
    pub max_retries: i64,
    pub think: bool,
}

/// Rejection reason, worded for display in the page's error panel.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl From<UnknownLength> for ValidationError {
    fn from(err: UnknownLength) -> Self {
        Self(err.to_string())
    }
}

fn invalid(message: impl Into<String>) -> ValidationError {
    ValidationError(message.into())
}

impl SummarizeJob {
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let Some(payload) = payload.as_object() else {
            return Err(invalid("Expected a JSON object."));
        };

        let url = payload
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| invalid("Missing 'url'."))?;

        let config = payload
            .get("config")
            .and_then(Value::as_object)
            .ok_or_else(|| invalid("Missing or invalid 'config' object."))?;

        Ok(Self {
            url: url.to_string(),
            config: SummaryConfig::from_map(config)?,
        })
    }
}

impl SummaryConfig {
    pub fn from_map(config: &JsonMap<String, Value>) -> Result<Self, ValidationError> {
        let provider = required_text(config, "provider")?.to_ascii_lowercase();
        let model_name = required_text(config, "modelName")?;
        if provider.is_empty() {
            return Err(invalid("Missing provider."));
        }
        if model_name.is_empty() {
            return Err(invalid("Missing model name."));
        }

        let host = config
            .get("host")
            .filter(|value| !value.is_null())
            .map(value_text)
            .filter(|host| !host.is_empty());

        let target_language = required_text(config, "targetLanguage")?;
        if !is_iso639_code(&target_language) {
            return Err(invalid(format!(
                "Invalid language code: '{target_language}' (expected an ISO 639 code like 'en')."
            )));
        }

        let length = required_text(config, "length")?
            .to_ascii_lowercase()
            .parse::<SummaryLength>()?;

        let include_summary = truthy(required(config, "includeSummary")?);
        let include_key_points = truthy(required(config, "includeKeyPoints")?);
        if !(include_summary || include_key_points) {
            return Err(invalid(
                "At least one of summary/key points must be enabled.",
            ));
        }

        let temperature = number_field(config, "temperature")?;
        let target_chunk_words = int_field(config, "targetChunkWords")?;
        let max_tokens = int_field(config, "maxTokens")?;
        let max_retries = int_field(config, "maxRetries")?;
        if max_retries < 0 {
            return Err(invalid(
                "maxRetries must be greater than or equal to 0.",
            ));
        }

        let think = truthy(required(config, "think")?);

        Ok(Self {
            provider,
            model_name,
            host,
            target_language: target_language.to_ascii_lowercase(),
            length,
            include_summary,
            include_key_points,
            temperature,
            target_chunk_words,
            max_tokens,
            max_retries,
            think,
        })
    }
}

fn required<'a>(config: &'a JsonMap<String, Value>, key: &str) -> Result<&'a Value, ValidationError> {
    config
        .get(key)
        .ok_or_else(|| invalid(format!("Missing config field: {key}")))
}

fn required_text(config: &JsonMap<String, Value>, key: &str) -> Result<String, ValidationError> {
    required(config, key).map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|v| v != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn number_field(config: &JsonMap<String, Value>, key: &str) -> Result<f64, ValidationError> {
    let value = required(config, key)?;
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed
        .filter(|value| value.is_finite())
        .ok_or_else(|| invalid(format!("{key} must be a number.")))
}

fn int_field(config: &JsonMap<String, Value>, key: &str) -> Result<i64, ValidationError> {
    let value = required(config, key)?;
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(format!("{key} must be a number.")))
}

/// Known ISO 639-1 or ISO 639-3 code, case-insensitive.
fn is_iso639_code(code: &str) -> bool {
    let code = code.to_ascii_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code).is_some(),
        3 => Language::from_639_3(&code).is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> Value {
        json!({
            "url": "  https://www.youtube.com/watch?v=abc123  ",
            "config": {
                "url": "https://www.youtube.com/watch?v=abc123",
                "provider": " Ollama ",
                "modelName": "llama3.2:3b",
                "host": "",
                "targetLanguage": "en",
                "length": "medium",
                "temperature": 1,
                "targetChunkWords": 800,
                "maxTokens": 16384,
                "maxRetries": 3,
                "think": false,
                "includeSummary": true,
                "includeKeyPoints": true
            }
        })
    }

    fn rejection(mutate: impl FnOnce(&mut JsonMap<String, Value>)) -> String {
        let mut body = payload();
        mutate(body["config"].as_object_mut().unwrap());
        SummarizeJob::from_payload(&body).unwrap_err().to_string()
    }

    #[test]
    fn accepts_and_normalizes_form_payload() {
        let job = SummarizeJob::from_payload(&payload()).unwrap();
        assert_eq!(job.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(job.config.provider, "ollama");
        assert_eq!(job.config.host, None);
        assert_eq!(job.config.length, SummaryLength::Medium);
        assert_eq!(job.config.temperature, 1.0);

        let forwarded = serde_json::to_value(&job).unwrap();
        assert_eq!(forwarded["config"]["modelName"], json!("llama3.2:3b"));
        assert!(forwarded["config"].get("host").is_none());
    }

    #[test]
    fn rejects_non_objects_and_missing_url() {
        let err = SummarizeJob::from_payload(&json!([1])).unwrap_err();
        assert_eq!(err.to_string(), "Expected a JSON object.");

        let err = SummarizeJob::from_payload(&json!({"url": "   ", "config": {}})).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'url'.");

        let err = SummarizeJob::from_payload(&json!({"url": "x", "config": "medium"})).unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid 'config' object.");
    }

    #[test]
    fn reports_missing_fields_by_name() {
        let message = rejection(|config| {
            config.remove("maxTokens");
        });
        assert_eq!(message, "Missing config field: maxTokens");
    }

    #[test]
    fn rejects_blank_provider_and_model() {
        assert_eq!(
            rejection(|config| {
                config.insert("provider".into(), json!("  "));
            }),
            "Missing provider."
        );
        assert_eq!(
            rejection(|config| {
                config.insert("modelName".into(), json!(""));
            }),
            "Missing model name."
        );
    }

    #[test]
    fn rejects_bad_language_and_length() {
        assert_eq!(
            rejection(|config| {
                config.insert("targetLanguage".into(), json!("english"));
            }),
            "Invalid language code: 'english' (expected an ISO 639 code like 'en')."
        );
        assert_eq!(
            rejection(|config| {
                config.insert("length".into(), json!("tiny"));
            }),
            "length must be one of: short, medium, long."
        );
    }

    #[test]
    fn rejects_unassigned_language_codes() {
        for code in ["zz", "qqq"] {
            assert_eq!(
                rejection(|config| {
                    config.insert("targetLanguage".into(), json!(code));
                }),
                format!("Invalid language code: '{code}' (expected an ISO 639 code like 'en').")
            );
        }
    }

    #[test]
    fn accepts_two_and_three_letter_codes() {
        for (code, normalized) in [("DE", "de"), ("deu", "deu"), ("ja", "ja")] {
            let mut body = payload();
            body["config"]["targetLanguage"] = json!(code);
            let job = SummarizeJob::from_payload(&body).unwrap();
            assert_eq!(job.config.target_language, normalized);
        }
    }

    #[test]
    fn length_parse_error_carries_message() {
        let err = "tiny".parse::<SummaryLength>().unwrap_err();
        assert_eq!(err.to_string(), "length must be one of: short, medium, long.");
    }

    #[test]
    fn requires_at_least_one_section() {
        let message = rejection(|config| {
            config.insert("includeSummary".into(), json!(false));
            config.insert("includeKeyPoints".into(), json!(false));
        });
        assert_eq!(message, "At least one of summary/key points must be enabled.");
    }

    #[test]
    fn numeric_fields_accept_strings_but_not_words() {
        let mut body = payload();
        body["config"]["maxTokens"] = json!("2048");
        body["config"]["temperature"] = json!("0.3");
        let job = SummarizeJob::from_payload(&body).unwrap();
        assert_eq!(job.config.max_tokens, 2048);
        assert_eq!(job.config.temperature, 0.3);

        assert_eq!(
            rejection(|config| {
                config.insert("temperature".into(), json!("warm"));
            }),
            "temperature must be a number."
        );
    }

    #[test]
    fn rejects_negative_retries() {
        let message = rejection(|config| {
            config.insert("maxRetries".into(), json!(-1));
        });
        assert_eq!(message, "maxRetries must be greater than or equal to 0.");
    }

    #[test]
    fn keeps_explicit_host() {
        let mut body = payload();
        body["config"]["host"] = json!(" http://localhost:11434 ");
        let job = SummarizeJob::from_payload(&body).unwrap();
        assert_eq!(job.config.host.as_deref(), Some("http://localhost:11434"));
    }
}
