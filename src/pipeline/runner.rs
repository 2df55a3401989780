//! Chart runner: orchestrates stage execution from raw rows to a laid-out chart.
//!
//! A [`ChartPipeline`] is built once from a validated [`ChartSpec`] and can
//! be run any number of times. [`ChartPipeline::run`] executes the stages in
//! order:
//!
//! | Stage | Input → Output |
//! |-------|----------------|
//! | `normalize` | raw rows → `EvaluationRecord`s |
//! | `aggregate` | records → dense `AggregateTable` |
//! | `denominators` | records → `QuestionCounts` |
//! | `percent` | table + counts → `PercentCell`s |
//! | `layout` | cells → `StackedChart` / `GroupedChart` |
//!
//! A failing stage stops the run with a [`ChartRuntimeError`] naming it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error_code::ErrorCode;
use super::errors::{ChartRuntimeError, ChartSpecError};
use super::spec::{ChartKind, ChartSpec, DenominatorSource, RuntimeSpec};
use super::validation::{ValidationEngine, ValidationReport};
use crate::aggregate::{aggregate, AggregateTable};
use crate::layout::{lay_out_grouped, lay_out_stacked, GroupedChart, StackedChart};
use crate::normalize::{RawRow, RecordNormalizer};
use crate::percent::{to_percentages, verify_totals, TOTAL_TOLERANCE};
use crate::types::{ChartDomain, EvaluationRecord, PercentCell};

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for a pipeline stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("chart_stage", stage = $name).entered();
    };
}

pub const STAGE_NORMALIZE: &str = "normalize";
pub const STAGE_AGGREGATE: &str = "aggregate";
pub const STAGE_DENOMINATORS: &str = "denominators";
pub const STAGE_PERCENT: &str = "percent";
pub const STAGE_LAYOUT: &str = "layout";
pub const STAGE_BATCH: &str = "batch";

fn in_stage<T>(stage: &str, result: crate::errors::Result<T>) -> Result<T, ChartRuntimeError> {
    result.map_err(|e| ChartRuntimeError::from_chart_error(stage, e))
}

/// A laid-out chart of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartOutput {
    Stacked(StackedChart),
    Grouped(GroupedChart),
}

impl ChartOutput {
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Stacked(_) => ChartKind::Stacked,
            Self::Grouped(_) => ChartKind::Grouped,
        }
    }

    pub fn as_stacked(&self) -> Option<&StackedChart> {
        match self {
            Self::Stacked(chart) => Some(chart),
            Self::Grouped(_) => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&GroupedChart> {
        match self {
            Self::Grouped(chart) => Some(chart),
            Self::Stacked(_) => None,
        }
    }
}

// ============================================================================
// ChartPipeline
// ============================================================================

/// A validated chart spec ready to run over raw rows.
#[derive(Debug, Clone)]
pub struct ChartPipeline {
    spec: ChartSpec,
    domain: ChartDomain,
    normalizer: RecordNormalizer,
    report: ValidationReport,
}

impl ChartPipeline {
    /// Validate `spec` with the default rules and build the pipeline.
    ///
    /// Returns the first error if validation fails; warnings are kept and
    /// available through [`ChartPipeline::warnings`].
    pub fn from_spec(spec: ChartSpec) -> Result<Self, ChartSpecError> {
        Self::from_spec_with(spec, &ValidationEngine::with_defaults())
    }

    /// Validate `spec` with a custom engine and build the pipeline.
    pub fn from_spec_with(
        spec: ChartSpec,
        engine: &ValidationEngine,
    ) -> Result<Self, ChartSpecError> {
        let report = engine.validate(&spec);
        if let Some(err) = report.errors().next() {
            return Err(err.clone());
        }

        #[cfg(feature = "tracing")]
        {
            for warning in report.warnings() {
                tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
            }
        }

        Ok(Self {
            domain: spec.domain(),
            normalizer: spec.normalizer(),
            spec,
            report,
        })
    }

    /// Parse a JSON spec, validate it and build the pipeline.
    pub fn from_json(json: &str) -> Result<Self, ChartSpecError> {
        let spec: ChartSpec = serde_json::from_str(json).map_err(|e| {
            ChartSpecError::new(ErrorCode::InvalidJson, "", format!("invalid chart spec: {e}"))
        })?;
        Self::from_spec(spec)
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn domain(&self) -> &ChartDomain {
        &self.domain
    }

    /// Warnings raised while validating the spec.
    pub fn warnings(&self) -> impl Iterator<Item = &ChartSpecError> {
        self.report.warnings()
    }

    /// Run the `normalize` stage only.
    pub fn records(&self, rows: &[RawRow]) -> Result<Vec<EvaluationRecord>, ChartRuntimeError> {
        trace_stage!(STAGE_NORMALIZE);
        in_stage(STAGE_NORMALIZE, self.normalizer.normalize(rows))
    }

    /// Run every stage up to and including `percent`.
    pub fn percentages(&self, rows: &[RawRow]) -> Result<Vec<PercentCell>, ChartRuntimeError> {
        let records = self.records(rows)?;
        let table = self.aggregate(&records)?;
        self.percent(&records, &table)
    }

    /// Run the whole pipeline.
    pub fn run(&self, rows: &[RawRow]) -> Result<ChartOutput, ChartRuntimeError> {
        let cells = self.percentages(rows)?;
        self.lay_out(&cells)
    }

    fn aggregate(&self, records: &[EvaluationRecord]) -> Result<AggregateTable, ChartRuntimeError> {
        trace_stage!(STAGE_AGGREGATE);
        in_stage(
            STAGE_AGGREGATE,
            aggregate(records, &self.spec.buckets, &self.domain),
        )
    }

    fn percent(
        &self,
        records: &[EvaluationRecord],
        table: &AggregateTable,
    ) -> Result<Vec<PercentCell>, ChartRuntimeError> {
        let counts = {
            trace_stage!(STAGE_DENOMINATORS);
            in_stage(STAGE_DENOMINATORS, self.spec.question_counts(records))?
        };

        trace_stage!(STAGE_PERCENT);
        let cells = in_stage(STAGE_PERCENT, to_percentages(table, &counts))?;
        // Derived denominators match the records, so every pair must be complete.
        if self.spec.denominator_source() != DenominatorSource::Explicit {
            in_stage(STAGE_PERCENT, verify_totals(&cells, &[], TOTAL_TOLERANCE))?;
        }
        Ok(cells)
    }

    fn lay_out(&self, cells: &[PercentCell]) -> Result<ChartOutput, ChartRuntimeError> {
        trace_stage!(STAGE_LAYOUT);
        match self.spec.kind {
            ChartKind::Stacked => in_stage(
                STAGE_LAYOUT,
                lay_out_stacked(&self.spec.stack_config(), cells),
            )
            .map(ChartOutput::Stacked),
            ChartKind::Grouped => in_stage(
                STAGE_LAYOUT,
                lay_out_grouped(&self.spec.group_config(), cells),
            )
            .map(ChartOutput::Grouped),
        }
    }
}

// ============================================================================
// Batch execution
// ============================================================================

/// Run several pipelines over the same rows in parallel.
///
/// Each pipeline is independent; results come back in input order and are
/// identical to running the pipelines one after another. The outer error is
/// only returned when the thread pool described by `runtime` cannot be built.
pub fn run_batch(
    pipelines: &[ChartPipeline],
    rows: &[RawRow],
    runtime: &RuntimeSpec,
) -> Result<Vec<Result<ChartOutput, ChartRuntimeError>>, ChartRuntimeError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        charts = pipelines.len(),
        rows = rows.len(),
        threads = ?runtime.effective_threads(),
        "running chart batch"
    );

    runtime
        .scoped(|| pipelines.par_iter().map(|p| p.run(rows)).collect())
        .map_err(|e| {
            ChartRuntimeError::new(
                ErrorCode::StageFailed,
                STAGE_BATCH,
                format!("failed to build thread pool: {e}"),
            )
            .with_hint("Lower runtime.max_threads or set single_thread")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{CategoryTable, SystemColumn};
    use crate::palette::Palette;
    use crate::types::{BucketScheme, CorrectnessBucket};

    fn three(correct: u32) -> CorrectnessBucket {
        CorrectnessBucket::Count { correct, trials: 3 }
    }

    fn stacked_spec() -> ChartSpec {
        ChartSpec::stacked(
            CategoryTable::new().with("a", "A").with("b", "B"),
            vec![SystemColumn::new("s1", "S1")],
            BucketScheme::PerTrial { trials: 3 },
        )
        .with_stack_order(vec![three(3), three(2), three(1), three(0)])
        .with_palette(Palette::new().with_system_color("S1", "#1f78b4"))
    }

    fn rows() -> Vec<RawRow> {
        vec![
            RawRow::new("a1", "a").with_field("s1", 0),
            RawRow::new("a2", "a").with_field("s1", 3),
            RawRow::new("b1", "b").with_field("s1", 3),
            RawRow::new("b2", "b").with_field("s1", 3),
        ]
    }

    #[test]
    fn test_stacked_run() {
        let pipeline = ChartPipeline::from_spec(stacked_spec()).unwrap();
        let output = pipeline.run(&rows()).unwrap();
        let chart = output.as_stacked().unwrap();

        let a = chart.bar(&"A".into(), &"S1".into()).unwrap();
        let heights: Vec<f64> = a.segments.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![50.0, 0.0, 0.0, 50.0]);
        let b = chart.bar(&"B".into(), &"S1".into()).unwrap();
        assert_eq!(b.segments[0].height, 100.0);
        assert_eq!(b.total, 100.0);
    }

    #[test]
    fn test_invalid_spec_rejected_at_build() {
        let spec = stacked_spec().with_stack_order(vec![]);
        let err = ChartPipeline::from_spec(spec).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingOrder);
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = ChartPipeline::from_json("{ \"v\": 1 }").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidJson);
    }

    #[test]
    fn test_unknown_category_fails_in_normalize() {
        let pipeline = ChartPipeline::from_spec(stacked_spec()).unwrap();
        let mut input = rows();
        input.push(RawRow::new("c1", "c").with_field("s1", 1));
        let err = pipeline.run(&input).unwrap_err();
        assert_eq!(err.stage, STAGE_NORMALIZE);
        assert_eq!(err.code, ErrorCode::SchemaViolation);
    }

    #[test]
    fn test_uneven_uniform_fails_in_denominators() {
        let pipeline =
            ChartPipeline::from_spec(stacked_spec().with_assume_uniform(true)).unwrap();
        let mut input = rows();
        input.push(RawRow::new("a3", "a").with_field("s1", 1));
        let err = pipeline.run(&input).unwrap_err();
        assert_eq!(err.stage, STAGE_DENOMINATORS);
        assert_eq!(err.code, ErrorCode::InvalidDenominator);
    }

    #[test]
    fn test_explicit_denominator_overcount_fails_in_percent() {
        let spec = stacked_spec().with_questions_per_category([("A", 1.0), ("B", 2.0)]);
        let pipeline = ChartPipeline::from_spec(spec).unwrap();
        let err = pipeline.run(&rows()).unwrap_err();
        assert_eq!(err.stage, STAGE_PERCENT);
    }

    #[test]
    fn test_warnings_kept() {
        let spec = stacked_spec().with_stack_order(vec![three(3), three(2)]);
        let pipeline = ChartPipeline::from_spec(spec).unwrap();
        assert_eq!(pipeline.warnings().count(), 1);
        let chart = pipeline.run(&rows()).unwrap();
        assert_eq!(
            chart.as_stacked().unwrap().excluded_buckets,
            vec![three(0), three(1)]
        );
    }

    #[test]
    fn test_batch_matches_sequential() {
        let pipelines = vec![
            ChartPipeline::from_spec(stacked_spec()).unwrap(),
            ChartPipeline::from_spec(stacked_spec().with_width(0.5)).unwrap(),
        ];
        let runtime = RuntimeSpec {
            max_threads: Some(2),
            ..Default::default()
        };
        let batch = run_batch(&pipelines, &rows(), &runtime).unwrap();
        let sequential: Vec<_> = pipelines.iter().map(|p| p.run(&rows())).collect();
        assert_eq!(batch, sequential);
    }

    #[test]
    fn test_output_is_tagged() {
        let pipeline = ChartPipeline::from_spec(stacked_spec()).unwrap();
        let value = serde_json::to_value(pipeline.run(&rows()).unwrap()).unwrap();
        assert_eq!(value["kind"], "stacked");
        assert_eq!(value["stack_order"][0], "3/3");
    }
}
