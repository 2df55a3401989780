//! Errors raised while checking a chart spec and while running it.
//!
//! [`ChartSpecError`] points into the spec JSON; [`ChartRuntimeError`] names
//! the stage that failed over real rows. Both serialize as
//! `{code, path|stage, message, hint?}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error_code::ErrorCode;
use crate::errors::ChartError;

// ─── Spec errors ─────────────────────────────────────────────────────────────

/// A validation error found in a chart spec before any row is read.
///
/// # Display format
///
/// ```text
/// [missing_order] /stack_order: A stacked chart needs a stack order
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {path}: {message}")]
pub struct ChartSpecError {
    pub code: ErrorCode,

    /// JSON pointer to the offending value.
    ///
    /// Examples: `"/stack_order/2"`, `"/width"`, `""` (root).
    pub path: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ChartSpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Builder method: attach a fix suggestion.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ─── Stage errors ────────────────────────────────────────────────────────────

/// A failure that occurred while executing a chart stage.
///
/// # Display format
///
/// ```text
/// [invalid_denominator] (stage: denominators): categories are unevenly sized
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] (stage: {stage}): {message}")]
pub struct ChartRuntimeError {
    pub code: ErrorCode,

    /// Failing stage, e.g. `"normalize"`.
    pub stage: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ChartRuntimeError {
    pub fn new(code: ErrorCode, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            stage: stage.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Wrap a core [`ChartError`] raised inside `stage`.
    pub fn from_chart_error(stage: impl Into<String>, err: ChartError) -> Self {
        let hint = match &err {
            ChartError::Schema { .. } => {
                Some("Check the category renaming table and the system column names")
            }
            ChartError::Denominator { .. } => {
                Some("Pass explicit questions_per_category instead of inferring it")
            }
            ChartError::DomainGap { .. } => {
                Some("Extend the declared categories, systems or bucket scheme")
            }
            _ => None,
        };
        let out = Self::new(err.code(), stage, err.message());
        match hint {
            Some(h) => out.with_hint(h),
            None => out,
        }
    }

    /// Builder method: attach a fix suggestion.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
