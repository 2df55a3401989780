//! Percentage normalization and label formatting.

use rustc_hash::FxHashMap;

use crate::aggregate::AggregateTable;
use crate::denominator::QuestionCounts;
use crate::errors::{ChartError, Result};
use crate::types::{Category, CorrectnessBucket, PercentCell, System};

/// Tolerance used when checking that a bar sums to 100%.
pub const TOTAL_TOLERANCE: f64 = 1e-6;

/// Convert every aggregate cell into a percentage of its category's questions.
///
/// Fails when a category has no valid denominator, or when a (category,
/// system) pair counted more records than the category has questions.
pub fn to_percentages(table: &AggregateTable, counts: &QuestionCounts) -> Result<Vec<PercentCell>> {
    let domain = table.domain();
    let mut out = Vec::with_capacity(table.cells().len());

    for category in &domain.categories {
        let questions = counts.get(category)?;
        for system in &domain.systems {
            let Some(pair) = table.pair(category, system) else {
                continue;
            };
            let counted: usize = pair.iter().map(|c| c.count).sum();
            if counted > questions {
                return Err(ChartError::denominator(format!(
                    "({category}, {system}) has {counted} records but the category has only {questions} questions"
                )));
            }
            #[cfg(feature = "tracing")]
            {
                if counted < questions {
                    tracing::warn!(
                        category = category.as_str(),
                        system = system.as_str(),
                        counted,
                        questions,
                        "pair covers fewer questions than the category holds"
                    );
                }
            }

            out.extend(pair.iter().map(|cell| PercentCell {
                category: cell.category.clone(),
                system: cell.system.clone(),
                bucket: cell.bucket,
                count: cell.count,
                questions,
                percentage: 100.0 * cell.count as f64 / questions as f64,
            }));
        }
    }

    Ok(out)
}

/// Check that every (category, system) sums to 100% over its buckets.
///
/// Cells whose bucket is in `excluded` are ignored, and pairs that lose a
/// bucket to exclusion are allowed to fall short of 100; they may never
/// exceed it.
pub fn verify_totals(
    cells: &[PercentCell],
    excluded: &[CorrectnessBucket],
    tolerance: f64,
) -> Result<()> {
    let mut sums: FxHashMap<(&Category, &System), f64> = FxHashMap::default();
    let mut order: Vec<(&Category, &System)> = Vec::new();
    for cell in cells {
        if excluded.contains(&cell.bucket) {
            continue;
        }
        let key = (&cell.category, &cell.system);
        let sum = sums.entry(key).or_insert_with(|| {
            order.push(key);
            0.0
        });
        *sum += cell.percentage;
    }

    for key in order {
        let total = sums[&key];
        let ok = if excluded.is_empty() {
            (total - 100.0).abs() <= tolerance
        } else {
            total <= 100.0 + tolerance
        };
        if !ok {
            return Err(ChartError::denominator(format!(
                "({}, {}) sums to {total}%, expected 100%",
                key.0, key.1
            )));
        }
    }
    Ok(())
}

/// Round half to even and append `%`: `12.5 → "12%"`, `13.5 → "14%"`.
pub fn percent_label(value: f64) -> String {
    format!("{}%", value.round_ties_even() as i64)
}

/// `"count/questions"`, e.g. `"7/10"`.
pub fn fraction_label(cell: &PercentCell) -> String {
    format!("{}/{}", cell.count, cell.questions)
}
