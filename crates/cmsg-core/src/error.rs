//! Typed error definitions for the unified message layer.
//!
//! [`CmsgError`] separates the three ways decoding an engine result can fail
//! (schema, type, parse) from failures reported by the engine itself. Every
//! error is fatal to the call in progress; nothing here retries or falls back
//! to a default value.

use thiserror::Error;

/// Result alias used throughout `cmsg-core`.
pub type Result<T> = std::result::Result<T, CmsgError>;

/// A document does not match the unified schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A required field is absent. `field` is a path such as `asks[2].price`.
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    /// An enum string has no entry in the wire table.
    #[error("unrecognized value `{value}` for field `{field}`")]
    UnknownVariant { field: String, value: String },
}

/// Failure reported by the external parsing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Domain-specific errors for the unified message layer.
#[derive(Debug, Error)]
pub enum CmsgError {
    /// Required field missing or enum string unrecognized.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A JSON value is present but has the wrong kind.
    #[error("type error: field `{field}` expected {expected}, found {found}")]
    Type {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The engine's output is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The engine rejected the input.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// A snapshot book violates the price ordering invariant.
    #[error("snapshot {side} out of order at index {index}")]
    UnorderedSnapshot { side: &'static str, index: usize },
}

impl CmsgError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::Schema(SchemaError::MissingField { field: field.into() })
    }

    pub(crate) fn unknown_variant(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Schema(SchemaError::UnknownVariant {
            field: field.into(),
            value: value.into(),
        })
    }
}
