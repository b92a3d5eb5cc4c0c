use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

use crate::fields::{Field, FormFields};

pub const DEFAULT_PROVIDER: &str = "ollama";
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TARGET_CHUNK_WORDS: i64 = 800;
pub const DEFAULT_MAX_TOKENS: i64 = 16384;
pub const DEFAULT_MAX_RETRIES: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl Length {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            _ => None,
        }
    }
}

/// Everything the user can tune for one summarization run.
///
/// Serialized with the camelCase keys the summarize endpoint expects; the same
/// payload is what gets persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub url: String,
    pub provider: String,
    pub model_name: String,
    pub host: String,
    pub target_language: String,
    pub length: Length,
    pub temperature: f64,
    pub target_chunk_words: i64,
    pub max_tokens: i64,
    pub max_retries: i64,
    pub think: bool,
    pub include_summary: bool,
    pub include_key_points: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: String::new(),
            provider: DEFAULT_PROVIDER.to_string(),
            model_name: String::new(),
            host: String::new(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            length: Length::default(),
            temperature: DEFAULT_TEMPERATURE,
            target_chunk_words: DEFAULT_TARGET_CHUNK_WORDS,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            think: false,
            include_summary: true,
            include_key_points: true,
        }
    }
}

impl Settings {
    /// Snapshot the form into a fully populated record. Missing controls and
    /// unparseable numbers fall back to the defaults above.
    pub fn read_from(form: &dyn FormFields) -> Self {
        let defaults = Self::default();
        let text = |field: Field, fallback: String| form.value(field).unwrap_or(fallback);
        let flag = |field: Field, fallback: bool| form.checked(field).unwrap_or(fallback);

        Self {
            url: text(Field::Url, defaults.url),
            provider: text(Field::Provider, defaults.provider),
            model_name: text(Field::ModelName, defaults.model_name),
            host: text(Field::Host, defaults.host),
            target_language: text(Field::TargetLanguage, defaults.target_language),
            length: form
                .value(Field::Length)
                .and_then(|raw| Length::parse(&raw))
                .unwrap_or(defaults.length),
            temperature: parse_float_or(form.value(Field::Temperature), defaults.temperature),
            target_chunk_words: parse_int_or(
                form.value(Field::TargetChunkWords),
                defaults.target_chunk_words,
            ),
            max_tokens: parse_int_or(form.value(Field::MaxTokens), defaults.max_tokens),
            max_retries: parse_int_or(form.value(Field::MaxRetries), defaults.max_retries),
            think: flag(Field::Think, defaults.think),
            include_summary: flag(Field::IncludeSummary, defaults.include_summary),
            include_key_points: flag(Field::IncludeKeyPoints, defaults.include_key_points),
        }
    }
}

fn parse_float_or(raw: Option<String>, default: f64) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn parse_int_or(raw: Option<String>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    // "800.5" is still a number; keep the integer part.
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
        .unwrap_or(default)
}

/// A stored settings object after type checking: each field is `Some` only when
/// the persisted value had the expected JSON type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub url: Option<String>,
    pub provider: Option<String>,
    pub model_name: Option<String>,
    pub host: Option<String>,
    pub target_language: Option<String>,
    pub length: Option<Length>,
    pub temperature: Option<f64>,
    pub target_chunk_words: Option<i64>,
    pub max_tokens: Option<i64>,
    pub max_retries: Option<i64>,
    pub think: Option<bool>,
    pub include_summary: Option<bool>,
    pub include_key_points: Option<bool>,
}

impl SettingsPatch {
    /// Returns `None` unless `value` is a JSON object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            url: json_string(map, "url"),
            provider: json_string(map, "provider"),
            model_name: json_string(map, "modelName"),
            host: json_string(map, "host"),
            target_language: json_string(map, "targetLanguage"),
            length: json_string(map, "length").and_then(|raw| Length::parse(&raw)),
            temperature: map
                .get("temperature")
                .and_then(Value::as_f64)
                .filter(|value| value.is_finite()),
            target_chunk_words: json_int(map, "targetChunkWords"),
            max_tokens: json_int(map, "maxTokens"),
            max_retries: json_int(map, "maxRetries"),
            think: map.get("think").and_then(Value::as_bool),
            include_summary: map.get("includeSummary").and_then(Value::as_bool),
            include_key_points: map.get("includeKeyPoints").and_then(Value::as_bool),
        })
    }

    /// Merge into the form. Fields that are `None` leave their control alone.
    pub fn apply_to(&self, form: &dyn FormFields) {
        let texts = [
            (Field::Url, self.url.as_deref()),
            (Field::Provider, self.provider.as_deref()),
            (Field::ModelName, self.model_name.as_deref()),
            (Field::Host, self.host.as_deref()),
            (Field::TargetLanguage, self.target_language.as_deref()),
            (Field::Length, self.length.map(Length::as_str)),
        ];
        for (field, value) in texts {
            if let Some(value) = value {
                form.set_value(field, value);
            }
        }

        let numbers = [
            (Field::Temperature, self.temperature.map(|v| v.to_string())),
            (
                Field::TargetChunkWords,
                self.target_chunk_words.map(|v| v.to_string()),
            ),
            (Field::MaxTokens, self.max_tokens.map(|v| v.to_string())),
            (Field::MaxRetries, self.max_retries.map(|v| v.to_string())),
        ];
        for (field, value) in numbers {
            if let Some(value) = value {
                form.set_value(field, &value);
            }
        }

        let flags = [
            (Field::Think, self.think),
            (Field::IncludeSummary, self.include_summary),
            (Field::IncludeKeyPoints, self.include_key_points),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                form.set_checked(field, value);
            }
        }
    }
}

fn json_string(map: &JsonMap<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn json_int(map: &JsonMap<String, Value>, key: &str) -> Option<i64> {
    let number = map.get(key)?.as_number()?;
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.is_finite())
            .map(|value| value.trunc() as i64)
    })
}
