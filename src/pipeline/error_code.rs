//! Stable error codes shared by spec-time and run-time chart errors.
//!
//! Codes serialize as `snake_case` strings and never change meaning once
//! published, so callers (including the Python bindings) can match on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a chart error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A raw row is missing a column or carries an undeclared label.
    SchemaViolation,
    /// A per-category question count is missing, zero, or fractional.
    InvalidDenominator,
    /// An observed value falls outside the declared domain.
    DomainGap,
    /// A required ordering or section is absent from the spec.
    MissingOrder,
    /// A value is out of range or malformed.
    InvalidValue,
    /// Two settings cannot be used together.
    InvalidCombo,
    /// The same label appears twice in an ordered list.
    DuplicateEntry,
    /// A drawn (system, bucket) pair has no palette color.
    MissingColor,
    /// The spec contains a field the schema does not know.
    UnknownField,
    /// The spec version is not supported.
    UnsupportedVersion,
    /// The spec or input is not valid JSON for the expected shape.
    InvalidJson,
    /// A pipeline stage failed for a reason not covered above.
    StageFailed,
}

impl ErrorCode {
    /// The serialized `snake_case` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema_violation",
            Self::InvalidDenominator => "invalid_denominator",
            Self::DomainGap => "domain_gap",
            Self::MissingOrder => "missing_order",
            Self::InvalidValue => "invalid_value",
            Self::InvalidCombo => "invalid_combo",
            Self::DuplicateEntry => "duplicate_entry",
            Self::MissingColor => "missing_color",
            Self::UnknownField => "unknown_field",
            Self::UnsupportedVersion => "unsupported_version",
            Self::InvalidJson => "invalid_json",
            Self::StageFailed => "stage_failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for code in [
            ErrorCode::SchemaViolation,
            ErrorCode::InvalidDenominator,
            ErrorCode::DomainGap,
            ErrorCode::MissingColor,
            ErrorCode::StageFailed,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }
}
