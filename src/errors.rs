//! Error types for evalstack
//!
//! Every failure in the aggregation pipeline is surfaced to the caller as a
//! [`ChartError`]. Nothing is zero-filled or skipped to keep a chart going:
//! a plausible-looking chart built from silently dropped data is worse than
//! no chart.

use thiserror::Error;

use crate::pipeline::error_code::ErrorCode;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ChartError>;

/// Main error type for evalstack
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Raw input is missing an expected column or carries a label outside
    /// the declared renaming table.
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// A category's question count is not a positive whole number, or the
    /// categories are not balanced where uniformity was assumed.
    #[error("Denominator error: {message}")]
    Denominator { message: String },

    /// An observed category, system or bucket is not covered by the declared
    /// domain.
    #[error("Domain gap: {message}")]
    DomainGap { message: String },

    /// Layout or palette configuration is unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ChartError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Create a denominator error
    pub fn denominator(message: impl Into<String>) -> Self {
        Self::Denominator {
            message: message.into(),
        }
    }

    /// Create a domain gap error
    pub fn domain_gap(message: impl Into<String>) -> Self {
        Self::DomainGap {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Stable code used when this error crosses the pipeline boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Schema { .. } => ErrorCode::SchemaViolation,
            Self::Denominator { .. } => ErrorCode::InvalidDenominator,
            Self::DomainGap { .. } => ErrorCode::DomainGap,
            Self::InvalidConfig { .. } => ErrorCode::InvalidValue,
            Self::Serialization { .. } => ErrorCode::InvalidJson,
        }
    }

    /// The bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Schema { message }
            | Self::Denominator { message }
            | Self::DomainGap { message }
            | Self::InvalidConfig { message }
            | Self::Serialization { message } => message,
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
