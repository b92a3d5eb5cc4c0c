/// Form controls the controller reads and writes. Each maps to a fixed element id
/// rendered by the server page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Provider,
    ModelName,
    Host,
    TargetLanguage,
    Length,
    Temperature,
    TargetChunkWords,
    MaxTokens,
    MaxRetries,
    Think,
    IncludeSummary,
    IncludeKeyPoints,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Url,
        Field::Provider,
        Field::ModelName,
        Field::Host,
        Field::TargetLanguage,
        Field::Length,
        Field::Temperature,
        Field::TargetChunkWords,
        Field::MaxTokens,
        Field::MaxRetries,
        Field::Think,
        Field::IncludeSummary,
        Field::IncludeKeyPoints,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Provider => "provider",
            Self::ModelName => "model-name",
            Self::Host => "host",
            Self::TargetLanguage => "target-language",
            Self::Length => "length",
            Self::Temperature => "temperature",
            Self::TargetChunkWords => "target-chunk-words",
            Self::MaxTokens => "max-tokens",
            Self::MaxRetries => "max-retries",
            Self::Think => "think",
            Self::IncludeSummary => "include-summary",
            Self::IncludeKeyPoints => "include-key-points",
        }
    }

    /// Checkbox controls carry a checked flag instead of a text value.
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::Think | Self::IncludeSummary | Self::IncludeKeyPoints
        )
    }
}

/// Read/write access to the settings form.
///
/// Getters return `None` when the control is missing from the page; setters on a
/// missing control do nothing.
pub trait FormFields {
    fn value(&self, field: Field) -> Option<String>;
    fn set_value(&self, field: Field, value: &str);
    fn checked(&self, field: Field) -> Option<bool>;
    fn set_checked(&self, field: Field, checked: bool);
}
