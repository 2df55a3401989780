//! JSON interface for chart building and spec validation
//!
//! Python callers pass a chart spec and the raw rows as JSON (for example a
//! `DataFrame.to_json(orient="records")` dump) and get the laid-out chart
//! back as JSON, ready for a matplotlib renderer.

use std::collections::BTreeMap;

use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::normalize::RawRow;
use crate::pipeline::errors::{ChartRuntimeError, ChartSpecError};
use crate::pipeline::runner::{run_batch, ChartOutput, ChartPipeline};
use crate::pipeline::spec::{ChartSpec, RuntimeSpec};
use crate::pipeline::validation::ValidationEngine;

/// Input row from JSON. Every key other than the id and category is a cell.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRow {
    #[serde(alias = "id")]
    pub question_id: String,
    #[serde(alias = "complexityType")]
    pub raw_category: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl From<JsonRow> for RawRow {
    fn from(jr: JsonRow) -> Self {
        let mut row = RawRow::new(jr.question_id, jr.raw_category);
        for (column, value) in jr.fields {
            let cell = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => number_cell(&n),
                other => other.to_string(),
            };
            row = row.with_field(column, cell);
        }
        row
    }
}

/// Whole-number floats (`2.0`, as pandas writes integer columns holding
/// NaN) render without the fraction so they parse as counts.
fn number_cell(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Single-chart request
#[derive(Debug, Clone, Deserialize)]
pub struct JsonChartRequest {
    pub spec: ChartSpec,
    pub rows: Vec<JsonRow>,
}

/// Batch request: several charts over the same rows
#[derive(Debug, Clone, Deserialize)]
pub struct JsonBatchRequest {
    pub specs: Vec<ChartSpec>,
    pub rows: Vec<JsonRow>,
    #[serde(default)]
    pub runtime: RuntimeSpec,
}

/// Per-chart batch result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonBatchItem {
    Ok(ChartOutput),
    Error(ChartRuntimeError),
}

/// Validation result
#[derive(Debug, Clone, Serialize)]
pub struct JsonValidation {
    pub valid: bool,
    pub diagnostics: crate::pipeline::validation::ValidationReport,
}

fn spec_error(err: ChartSpecError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

fn json_error(err: serde_json::Error) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(format!("Invalid JSON: {}", err))
}

fn to_rows(rows: Vec<JsonRow>) -> Vec<RawRow> {
    rows.into_iter().map(RawRow::from).collect()
}

pub(crate) fn build_chart(request: JsonChartRequest) -> Result<String, PyErr> {
    let pipeline = ChartPipeline::from_spec(request.spec).map_err(spec_error)?;
    let output = pipeline
        .run(&to_rows(request.rows))
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
    serde_json::to_string(&output).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

pub(crate) fn build_batch(request: JsonBatchRequest) -> Result<Vec<JsonBatchItem>, PyErr> {
    let pipelines = request
        .specs
        .into_iter()
        .map(ChartPipeline::from_spec)
        .collect::<Result<Vec<_>, _>>()
        .map_err(spec_error)?;
    let rows = to_rows(request.rows);
    let results = run_batch(&pipelines, &rows, &request.runtime)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
    Ok(results
        .into_iter()
        .map(|r| match r {
            Ok(chart) => JsonBatchItem::Ok(chart),
            Err(err) => JsonBatchItem::Error(err),
        })
        .collect())
}

pub(crate) fn validate(spec: &ChartSpec) -> JsonValidation {
    let report = ValidationEngine::with_defaults().validate(spec);
    JsonValidation {
        valid: report.is_valid(),
        diagnostics: report,
    }
}

/// Build one chart from a JSON request
///
/// Args:
///     json_input: JSON string `{"spec": {...}, "rows": [...]}`
///
/// Returns:
///     JSON string with the laid-out chart
#[pyfunction]
#[pyo3(signature = (json_input))]
pub fn build_chart_from_json(json_input: &str) -> PyResult<String> {
    let request: JsonChartRequest = serde_json::from_str(json_input).map_err(json_error)?;
    build_chart(request)
}

/// Build several charts over the same rows, in parallel
///
/// Args:
///     json_input: JSON string `{"specs": [...], "rows": [...], "runtime": {...}}`
///
/// Returns:
///     JSON array; each item is `{"ok": chart}` or `{"error": {...}}`
#[pyfunction]
#[pyo3(signature = (json_input))]
pub fn build_charts_batch_from_json(json_input: &str) -> PyResult<String> {
    let request: JsonBatchRequest = serde_json::from_str(json_input).map_err(json_error)?;
    let items = build_batch(request)?;
    serde_json::to_string(&items).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Validate a chart spec without running it
///
/// Returns:
///     JSON string `{"valid": bool, "diagnostics": {"diagnostics": [...]}}`
#[pyfunction]
#[pyo3(signature = (spec_json))]
pub fn validate_chart_spec(spec_json: &str) -> PyResult<String> {
    let spec: ChartSpec = serde_json::from_str(spec_json).map_err(json_error)?;
    serde_json::to_string(&validate(&spec))
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}
