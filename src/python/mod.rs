//! Python bindings via PyO3
//!
//! This module provides the JSON-in/JSON-out Python interface for evalstack.

pub mod json;

use pyo3::prelude::*;

/// Register all Python classes and functions
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    m.add_function(wrap_pyfunction!(json::build_chart_from_json, m)?)?;
    m.add_function(wrap_pyfunction!(json::build_charts_batch_from_json, m)?)?;
    m.add_function(wrap_pyfunction!(json::validate_chart_spec, m)?)?;

    Ok(())
}
