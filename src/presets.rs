//! Ready-made configuration for the question-type benchmark charts.
//!
//! Every function builds a fresh value; nothing here is shared or mutable.

use crate::layout::Series;
use crate::normalize::{CategoryTable, SystemColumn};
use crate::palette::Palette;
use crate::pipeline::spec::ChartSpec;
use crate::timing::BoxConfig;
use crate::types::{BucketScheme, Category, CorrectnessBucket, System};

/// Attempts per question and system.
pub const TRIALS: u32 = 3;

/// Raw column holding per-question response time.
pub const TIMING_COLUMN: &str = "Total Seconds";

pub const LINKQ: &str = "LinkQ";
pub const GPT4: &str = "GPT-4";

const QUESTION_TYPES: [(&str, &str); 5] = [
    ("comparative", "Comparative"),
    ("yesno", "Yes/No"),
    ("generic", "Generic"),
    ("multihop", "MultiHop"),
    ("intersection", "Intersection"),
];

/// Source `complexityType` codes → display names, in display order.
pub fn question_type_table() -> CategoryTable {
    QUESTION_TYPES.iter().copied().collect()
}

pub fn question_type_order() -> Vec<Category> {
    QUESTION_TYPES.iter().map(|(_, d)| Category::new(*d)).collect()
}

/// Correct-count columns of the aggregated results, left to right.
pub fn system_columns() -> Vec<SystemColumn> {
    vec![
        SystemColumn::new("linkqAnswerCorrect", LINKQ),
        SystemColumn::new("plainLLMAnswerCorrect", GPT4),
    ]
}

pub fn systems() -> Vec<System> {
    vec![System::new(LINKQ), System::new(GPT4)]
}

fn count(correct: u32) -> CorrectnessBucket {
    CorrectnessBucket::Count {
        correct,
        trials: TRIALS,
    }
}

/// One color per system.
pub fn algorithm_palette() -> Palette {
    Palette::new()
        .with_system_color(LINKQ, "#1f78b4")
        .with_system_color(GPT4, "#fdbf6f")
}

/// Shades per (system, k/3); darker is more often correct.
pub fn correctness_palette() -> Palette {
    Palette::new()
        .with_color(LINKQ, count(0), "#999999")
        .with_color(LINKQ, count(1), "#c8ddec")
        .with_color(LINKQ, count(2), "#72aad0")
        .with_color(LINKQ, count(3), "#1f78b4")
        .with_color(GPT4, count(0), "#999999")
        .with_color(GPT4, count(1), "#fff4e5")
        .with_color(GPT4, count(2), "#ffdeb3")
        .with_color(GPT4, count(3), "#fdbf6f")
}

/// Grouped chart of questions answered correctly at least once.
pub fn accuracy_spec() -> ChartSpec {
    let correct = CorrectnessBucket::Binary { correct: true };
    ChartSpec::grouped(
        question_type_table(),
        system_columns(),
        BucketScheme::AnyCorrect { trials: TRIALS },
    )
    .with_series(vec![Series::new(LINKQ, correct), Series::new(GPT4, correct)])
    .with_palette(algorithm_palette())
}

/// Grouped chart of every k/3 bucket, systems interleaved from 3/3 down.
pub fn correctness_spec() -> ChartSpec {
    let series = (1..=TRIALS)
        .rev()
        .flat_map(|k| [Series::new(LINKQ, count(k)), Series::new(GPT4, count(k))])
        .collect();
    ChartSpec::grouped(
        question_type_table(),
        system_columns(),
        BucketScheme::PerTrial { trials: TRIALS },
    )
    .with_series(series)
    .with_palette(correctness_palette())
}

/// Side-by-side stacked chart: 3/3, 2/3, 1/3 bottom to top, 0/3 left out.
pub fn correctness_stacked_spec() -> ChartSpec {
    ChartSpec::stacked(
        question_type_table(),
        system_columns(),
        BucketScheme::PerTrial { trials: TRIALS },
    )
    .with_stack_order(vec![count(3), count(2), count(1)])
    .with_width(0.35)
    .with_palette(correctness_palette())
}

/// Box chart of response times by question type.
pub fn timing_box_config() -> BoxConfig {
    BoxConfig::new(question_type_order(), systems(), algorithm_palette())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::validation::ValidationEngine;

    #[test]
    fn test_table_maps_every_code() {
        let table = question_type_table();
        assert_eq!(table.len(), 5);
        assert_eq!(table.display("yesno").unwrap().as_str(), "Yes/No");
        assert_eq!(table.categories(), question_type_order());
    }

    #[test]
    fn test_preset_specs_validate_cleanly() {
        let engine = ValidationEngine::with_defaults();
        for spec in [accuracy_spec(), correctness_spec()] {
            let report = engine.validate(&spec);
            assert!(report.is_empty(), "{:?}", report.diagnostics);
        }

        // Only the documented 0/3 exclusion is reported.
        let report = engine.validate(&correctness_stacked_spec());
        assert!(report.is_valid());
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("0/3"));
    }

    #[test]
    fn test_correctness_series_interleave() {
        let labels: Vec<String> = correctness_spec()
            .series_order
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            labels,
            vec!["LinkQ 3/3", "GPT-4 3/3", "LinkQ 2/3", "GPT-4 2/3", "LinkQ 1/3", "GPT-4 1/3"]
        );
    }

    #[test]
    fn test_presets_are_fresh_values() {
        let mut a = correctness_palette();
        a = a.with_system_color(LINKQ, "#000000");
        let b = correctness_palette();
        assert_ne!(a, b);
        assert_eq!(b.color(&System::new(LINKQ), &count(3)), Some("#1f78b4"));
    }

    #[test]
    fn test_timing_config() {
        let config = timing_box_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.systems, systems());
    }
}
