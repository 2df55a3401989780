//! Chart specs: parsing, validation and execution.
//!
//! ## Submodules
//!
//! - [`spec`]: the JSON chart spec (v1) and runtime limits
//! - [`validation`]: rule engine producing a [`ValidationReport`]
//! - [`error_code`] / [`errors`]: stable codes and spec/runtime error types
//! - [`runner`]: stage orchestration and batch execution

pub mod error_code;
pub mod errors;
pub mod runner;
pub mod spec;
pub mod validation;

pub use error_code::ErrorCode;
pub use errors::{ChartRuntimeError, ChartSpecError};
pub use runner::{run_batch, ChartOutput, ChartPipeline};
pub use spec::{ChartKind, ChartSpec, DenominatorSource, RuntimeSpec, SPEC_VERSION};
pub use validation::{
    Severity, ValidationDiagnostic, ValidationEngine, ValidationReport, ValidationRule,
};
