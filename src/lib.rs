//! # evalstack
//!
//! Per-category correctness breakdowns for head-to-head system evaluations.
//!
//! Per-question outcomes of competing systems, each attempted over repeated
//! trials, are bucketed by how many trials succeeded, normalized into
//! percentages of each category's questions, and laid out as grouped or
//! side-by-side stacked bar charts. The output is a fully positioned,
//! serializable chart description; drawing it is left to a renderer.
//!
//! ## Flow
//!
//! ```text
//! trial rows ─tally→ raw rows ─normalize→ records ─aggregate→ cells
//!   ─percent→ percent cells ─layout→ StackedChart / GroupedChart
//! ```
//!
//! ## Features
//!
//! - **tracing** (default): spans per pipeline stage and diagnostic events
//! - **python**: JSON-in/JSON-out bindings via PyO3

pub mod aggregate;
pub mod denominator;
pub mod errors;
pub mod layout;
pub mod normalize;
pub mod palette;
pub mod percent;
pub mod pipeline;
pub mod presets;
pub mod tally;
pub mod timing;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use errors::{ChartError, Result};
pub use types::{
    AggregateCell, BucketScheme, Bucketing, Category, ChartDomain, CorrectnessBucket,
    EvaluationRecord, PercentCell, System,
};

// Re-export main functionality
pub use aggregate::{aggregate, AggregateTable};
pub use denominator::QuestionCounts;
pub use layout::{
    lay_out_grouped, lay_out_stacked, GroupConfig, GroupedBar, GroupedChart, Segment, Series,
    StackConfig, StackedBar, StackedChart,
};
pub use normalize::{CategoryTable, RawRow, RecordNormalizer, SystemColumn, TimingRecord};
pub use palette::{Palette, SeriesStyle};
pub use percent::{fraction_label, percent_label, to_percentages, verify_totals};
pub use pipeline::{
    run_batch, ChartKind, ChartOutput, ChartPipeline, ChartRuntimeError, ChartSpec,
    ChartSpecError, ErrorCode, RuntimeSpec, ValidationEngine, ValidationReport,
};
pub use tally::{tally_trials, SystemRun, TrialRow, TrialTally, Verdict};
pub use timing::{lay_out_boxes, BoxChart, BoxConfig, BoxStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Initialize the Python module
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_module(m)?;
    Ok(())
}
