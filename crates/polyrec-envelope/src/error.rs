//! # Envelope Errors
//!
//! Every decode step fails with its own variant so callers can tell a
//! malformed payload from an unregistered type from a record that failed
//! field validation. [`EnvelopeError::kind`] flattens the variants into
//! those categories for callers that only need to branch on them.

use polyrec_core::{RegistryError, RegistryKey};
use serde_json::Value;
use thiserror::Error;

/// Error raised while encoding or decoding an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The byte message is not valid UTF-8.
    #[error("message is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The text is not well-formed JSON.
    #[error("message is not well-formed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// The JSON (or a record's serialized form) is not an object.
    #[error("expected a JSON object, found {found}")]
    NotAMapping {
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// The message carries no type tag.
    #[error("message has no '{tag}' type tag")]
    MissingTag {
        /// Tag field name that was expected.
        tag: String,
    },

    /// The type tag is present but is not a string.
    #[error("type tag '{tag}' must be a string, found {found}")]
    InvalidTag {
        /// Tag field name.
        tag: String,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// The tag names a type that is not registered.
    #[error("unknown record type: {0}")]
    UnknownType(#[from] RegistryError),

    /// The remaining fields do not satisfy the resolved record type.
    #[error("fields do not satisfy record type '{key}': {source}")]
    Validation {
        /// Key of the resolved record type.
        key: RegistryKey,
        /// Error reported by the record's `Deserialize` impl.
        #[source]
        source: serde_json::Error,
    },

    /// The record could not be serialized.
    #[error("record serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The record has a field with the same name as the type tag.
    #[error("record type '{key}' has a field named '{tag}', which is reserved for the type tag")]
    TagCollision {
        /// Key of the offending record type.
        key: RegistryKey,
        /// Tag field name.
        tag: String,
    },

    /// A typed decode found a different record type than requested.
    #[error("expected record type '{expected}', message holds '{found}'")]
    TypeMismatch {
        /// Key of the requested type.
        expected: RegistryKey,
        /// Key of the type actually decoded.
        found: RegistryKey,
    },
}

/// Coarse category of an [`EnvelopeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bytes are not UTF-8.
    Encoding,
    /// Text is not a JSON object.
    Parse,
    /// No usable type tag.
    MissingTag,
    /// Tag names no registered type.
    UnknownType,
    /// Fields rejected by the record type.
    Validation,
    /// The record could not be turned into a tagged mapping.
    Encode,
    /// Typed decode resolved to another type.
    TypeMismatch,
}

impl EnvelopeError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Parse(_) | Self::NotAMapping { .. } => ErrorKind::Parse,
            Self::MissingTag { .. } | Self::InvalidTag { .. } => ErrorKind::MissingTag,
            Self::UnknownType(_) => ErrorKind::UnknownType,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Serialization(_) | Self::TagCollision { .. } => ErrorKind::Encode,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_wraps_registry_error() {
        let err: EnvelopeError = RegistryError::NotFound {
            key: "no.such.Type".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        assert_eq!(
            err.to_string(),
            "unknown record type: no record type registered under key 'no.such.Type'"
        );
    }

    #[test]
    fn test_missing_and_invalid_tag_share_a_kind() {
        let missing = EnvelopeError::MissingTag {
            tag: "DECODER_MODEL_TYPE".into(),
        };
        let invalid = EnvelopeError::InvalidTag {
            tag: "DECODER_MODEL_TYPE".into(),
            found: "number",
        };
        assert_eq!(missing.kind(), ErrorKind::MissingTag);
        assert_eq!(invalid.kind(), ErrorKind::MissingTag);
        assert_eq!(missing.to_string(), "message has no 'DECODER_MODEL_TYPE' type tag");
    }

    #[test]
    fn test_json_kind_names() {
        assert_eq!(json_kind(&Value::Null), "null");
        assert_eq!(json_kind(&serde_json::json!([1])), "array");
        assert_eq!(json_kind(&serde_json::json!({})), "object");
    }
}
