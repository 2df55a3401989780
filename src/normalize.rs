//! Record normalization: raw wide rows → canonical long records.
//!
//! A raw row carries one correctness column per system. The normalizer maps
//! the row's category code through a [`CategoryTable`] and unpivots the
//! system columns into one [`EvaluationRecord`] per (question, system).

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};
use crate::types::{Category, EvaluationRecord, System};

/// A row as handed over by the loading layer: an id, a category code, and
/// the remaining cells keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRow {
    pub question_id: String,
    pub raw_category: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(question_id: impl Into<String>, raw_category: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            raw_category: raw_category.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder method: set a cell value
    pub fn with_field(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(column.into(), value.to_string());
        self
    }

    fn cell(&self, column: &str) -> Result<&str> {
        self.fields.get(column).map(String::as_str).ok_or_else(|| {
            ChartError::schema(format!(
                "row '{}' is missing column '{column}'",
                self.question_id
            ))
        })
    }
}

/// A timing observation for one (question, system).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub question_id: String,
    pub category: Category,
    pub system: System,
    pub seconds: f64,
}

// ============================================================================
// Category table
// ============================================================================

/// Fixed renaming table from source category codes to display names.
///
/// The insertion order of the pairs is kept and doubles as the default
/// display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct CategoryTable {
    entries: Vec<(String, Category)>,
    index: FxHashMap<String, usize>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: map `code` to the display name `display`.
    ///
    /// Re-mapping a code replaces the earlier display name in place.
    pub fn with(mut self, code: impl Into<String>, display: impl Into<String>) -> Self {
        self.insert(code, display);
        self
    }

    pub fn insert(&mut self, code: impl Into<String>, display: impl Into<String>) {
        let code = code.into();
        let display = Category::new(display);
        match self.index.get(&code) {
            Some(&i) => self.entries[i].1 = display,
            None => {
                self.index.insert(code.clone(), self.entries.len());
                self.entries.push((code, display));
            }
        }
    }

    /// Display name for `code`, or a schema error when the code is unknown.
    pub fn display(&self, code: &str) -> Result<&Category> {
        self.index
            .get(code)
            .map(|&i| &self.entries[i].1)
            .ok_or_else(|| {
                ChartError::schema(format!("unknown category code '{code}'"))
            })
    }

    /// Display names in table order.
    pub fn categories(&self) -> Vec<Category> {
        self.entries.iter().map(|(_, c)| c.clone()).collect()
    }

    /// Whether `category` is the display name of some code.
    pub fn contains_display(&self, category: &str) -> bool {
        self.entries.iter().any(|(_, c)| c.as_str() == category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Into<String>, D: Into<String>> FromIterator<(C, D)> for CategoryTable {
    fn from_iter<I: IntoIterator<Item = (C, D)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (code, display) in iter {
            table.insert(code, display);
        }
        table
    }
}

impl From<Vec<(String, String)>> for CategoryTable {
    fn from(pairs: Vec<(String, String)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<CategoryTable> for Vec<(String, String)> {
    fn from(table: CategoryTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(code, display)| (code, display.as_str().to_string()))
            .collect()
    }
}

// ============================================================================
// System columns
// ============================================================================

/// A raw column holding one system's correct counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemColumn {
    /// Column name in the raw rows (e.g. `"linkqAnswerCorrect"`).
    pub column: String,
    /// Display name of the system (e.g. `"LinkQ"`).
    pub system: System,
}

impl SystemColumn {
    pub fn new(column: impl Into<String>, system: impl Into<System>) -> Self {
        Self {
            column: column.into(),
            system: system.into(),
        }
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Turns raw rows into [`EvaluationRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    categories: CategoryTable,
    systems: Vec<SystemColumn>,
    trials: u32,
}

impl RecordNormalizer {
    pub fn new(categories: CategoryTable, systems: Vec<SystemColumn>, trials: u32) -> Self {
        Self {
            categories,
            systems,
            trials,
        }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn systems(&self) -> Vec<System> {
        self.systems.iter().map(|c| c.system.clone()).collect()
    }

    /// Unpivot `rows` into one record per (row, system), row-major.
    ///
    /// Fails on an unknown category code, a missing or non-integer cell, a
    /// count above the trial count, or a question id seen twice.
    pub fn normalize(&self, rows: &[RawRow]) -> Result<Vec<EvaluationRecord>> {
        let mut out = Vec::with_capacity(rows.len() * self.systems.len());
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        for row in rows {
            if !seen.insert(row.question_id.as_str()) {
                return Err(ChartError::schema(format!(
                    "question '{}' appears more than once",
                    row.question_id
                )));
            }
            let category = self.categories.display(&row.raw_category)?;

            for col in &self.systems {
                let raw = row.cell(&col.column)?;
                let correct_count: u32 = raw.trim().parse().map_err(|_| {
                    ChartError::schema(format!(
                        "row '{}' column '{}': expected a correct count, got '{raw}'",
                        row.question_id, col.column
                    ))
                })?;
                if correct_count > self.trials {
                    return Err(ChartError::schema(format!(
                        "row '{}' column '{}': {correct_count} correct exceeds {} trials",
                        row.question_id, col.column, self.trials
                    )));
                }
                out.push(EvaluationRecord {
                    question_id: row.question_id.clone(),
                    category: category.clone(),
                    system: col.system.clone(),
                    correct_count,
                });
            }
        }

        debug_assert_eq!(out.len(), rows.len() * self.systems.len());
        Ok(out)
    }

    /// Map one system's timing rows (seconds in `column`) into
    /// [`TimingRecord`]s, using the same category table.
    pub fn normalize_timings(
        &self,
        system: &System,
        rows: &[RawRow],
        column: &str,
    ) -> Result<Vec<TimingRecord>> {
        rows.iter()
            .map(|row| {
                let category = self.categories.display(&row.raw_category)?.clone();
                let raw = row.cell(column)?;
                let seconds: f64 = raw.trim().parse().map_err(|_| {
                    ChartError::schema(format!(
                        "row '{}' column '{column}': expected seconds, got '{raw}'",
                        row.question_id
                    ))
                })?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(ChartError::schema(format!(
                        "row '{}' column '{column}': {seconds} is not a valid duration",
                        row.question_id
                    )));
                }
                Ok(TimingRecord {
                    question_id: row.question_id.clone(),
                    category,
                    system: system.clone(),
                    seconds,
                })
            })
            .collect()
    }
}
