//! Error types for snippet loading.

use thiserror::Error;

/// Why a snippet could not be turned into canonical data. Loading failures never
/// touch the registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnippetError {
    /// Input text is not valid JSON, or does not match the wire schema.
    #[error("snippet json parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top-level snippet value must be a JSON object.
    #[error("snippet must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// A curve entry is not a keyframe array, or a keyframe is not usable.
    #[error("invalid curve '{channel}': {reason}")]
    InvalidCurve { channel: String, reason: String },

    /// A scalar field has the wrong JSON type.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

impl SnippetError {
    pub(crate) fn curve(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCurve {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse(_) => "serialization",
            Self::NotAnObject { .. } => "shape",
            Self::InvalidCurve { .. } | Self::InvalidField { .. } => "validation",
        }
    }
}

pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
