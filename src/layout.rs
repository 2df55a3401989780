//! Layout engines: side-by-side stacked bars and dodged grouped bars.
//!
//! Both engines turn [`PercentCell`]s into fully positioned bars. Renderers
//! only draw what they are given; no count or percentage arithmetic is left
//! for them.
//!
//! # Stacked layout
//!
//! For category index `c`, system index `s` out of `n` systems and bar width
//! `w`, the bar sits at `x = c + (s − (n − 1) / 2) × w`. Segments follow the
//! declared stack order bottom to top, and each bar owns its own bottom
//! accumulator:
//!
//! ```text
//! bottom[0] = 0
//! bottom[i] = bottom[i-1] + height[i-1]
//! ```
//!
//! Buckets that appear in the cells but not in the stack order are left out
//! of the bars and reported in [`StackedChart::excluded_buckets`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};
use crate::palette::{Palette, SeriesStyle};
use crate::percent::{fraction_label, percent_label};
use crate::types::{first_duplicate, Category, CorrectnessBucket, PercentCell, System};

/// Default width of one system's bar in a stacked chart.
pub const DEFAULT_STACK_WIDTH: f64 = 0.35;

/// Default width of a whole category slot in a grouped chart.
pub const DEFAULT_GROUP_WIDTH: f64 = 0.8;

type CellKey<'a> = (&'a Category, &'a System, &'a CorrectnessBucket);

/// Index cells by (category, system, bucket), rejecting duplicates.
fn index_cells(cells: &[PercentCell]) -> Result<FxHashMap<CellKey<'_>, &PercentCell>> {
    let mut index = FxHashMap::with_capacity_and_hasher(cells.len(), Default::default());
    for cell in cells {
        let key = (&cell.category, &cell.system, &cell.bucket);
        if index.insert(key, cell).is_some() {
            return Err(ChartError::schema(format!(
                "duplicate cell for ({}, {}, {})",
                cell.category, cell.system, cell.bucket
            )));
        }
    }
    Ok(index)
}

/// Reject cells outside the chart's categories or systems and collect, in
/// first-seen order, the buckets that `drawn` leaves out.
fn check_cells(
    cells: &[PercentCell],
    categories: &[Category],
    systems: &[System],
    drawn: impl Fn(&CorrectnessBucket) -> bool,
) -> Result<Vec<CorrectnessBucket>> {
    let mut excluded: Vec<CorrectnessBucket> = Vec::new();
    for cell in cells {
        if !categories.contains(&cell.category) {
            return Err(ChartError::domain_gap(format!(
                "category '{}' is not in the chart's category order",
                cell.category
            )));
        }
        if !systems.contains(&cell.system) {
            return Err(ChartError::domain_gap(format!(
                "system '{}' is not in the chart's system order",
                cell.system
            )));
        }
        if !drawn(&cell.bucket) && !excluded.contains(&cell.bucket) {
            excluded.push(cell.bucket);
        }
    }

    #[cfg(feature = "tracing")]
    {
        if !excluded.is_empty() {
            let labels: Vec<String> = excluded.iter().map(|b| b.label()).collect();
            tracing::debug!(excluded = ?labels, "buckets not drawn in the chart");
        }
    }

    Ok(excluded)
}

fn check_width(width: f64, what: &str) -> Result<()> {
    if !(width > 0.0 && width <= 1.0) {
        return Err(ChartError::invalid_config(format!(
            "{what} must be in (0, 1], got {width}"
        )));
    }
    Ok(())
}

fn check_labels<T: Eq + std::hash::Hash + std::fmt::Display>(items: &[T], what: &str) -> Result<()> {
    if items.is_empty() {
        return Err(ChartError::invalid_config(format!("{what} order is empty")));
    }
    if let Some(dup) = first_duplicate(items) {
        return Err(ChartError::invalid_config(format!(
            "'{dup}' appears twice in the {what} order"
        )));
    }
    Ok(())
}

/// Offset of member `index` of `count` dodged bars of width `width`.
fn dodge(index: usize, count: usize, width: f64) -> f64 {
    (index as f64 - (count as f64 - 1.0) / 2.0) * width
}

// ============================================================================
// Stacked layout
// ============================================================================

/// Configuration of a side-by-side stacked chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Categories in display order (left to right).
    pub categories: Vec<Category>,
    /// Systems in left-to-right order within a category.
    pub systems: Vec<System>,
    /// Buckets in bottom-to-top order within a bar.
    pub stack_order: Vec<CorrectnessBucket>,
    /// Width of one system's bar.
    pub width: f64,
    pub palette: Palette,
}

impl StackConfig {
    pub fn new(
        categories: Vec<Category>,
        systems: Vec<System>,
        stack_order: Vec<CorrectnessBucket>,
        palette: Palette,
    ) -> Self {
        Self {
            categories,
            systems,
            stack_order,
            width: DEFAULT_STACK_WIDTH,
            palette,
        }
    }

    /// Builder method: set bar width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_labels(&self.categories, "category")?;
        check_labels(&self.systems, "system")?;
        check_labels(&self.stack_order, "stack")?;
        check_width(self.width, "bar width")?;
        self.palette.validate()
    }
}

/// One stacked segment of a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub bucket: CorrectnessBucket,
    pub height: f64,
    /// Sum of the heights of the segments below this one.
    pub bottom: f64,
    pub color: String,
    pub label: String,
}

impl Segment {
    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }
}

/// One system's bar within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedBar {
    pub category: Category,
    pub system: System,
    pub x: f64,
    pub width: f64,
    /// Segments bottom to top, in stack order.
    pub segments: Vec<Segment>,
    /// Total stacked height.
    pub total: f64,
    /// Total formatted for a label above the bar.
    pub total_label: String,
}

/// A laid-out stacked chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedChart {
    pub categories: Vec<Category>,
    pub systems: Vec<System>,
    pub stack_order: Vec<CorrectnessBucket>,
    /// Buckets present in the data but deliberately left out of the stacks;
    /// when non-empty, bar totals may be below 100%.
    pub excluded_buckets: Vec<CorrectnessBucket>,
    /// Tick position of each category, aligned with `categories`.
    pub x_ticks: Vec<f64>,
    /// Bars category-major, then system.
    pub bars: Vec<StackedBar>,
    /// Legend entries: each system's buckets in stack order.
    pub legend: Vec<SeriesStyle>,
}

impl StackedChart {
    pub fn bar(&self, category: &Category, system: &System) -> Option<&StackedBar> {
        self.bars
            .iter()
            .find(|b| &b.category == category && &b.system == system)
    }
}

/// Lay out side-by-side stacked bars.
pub fn lay_out_stacked(config: &StackConfig, cells: &[PercentCell]) -> Result<StackedChart> {
    config.validate()?;
    let index = index_cells(cells)?;

    let excluded = check_cells(cells, &config.categories, &config.systems, |b| {
        config.stack_order.contains(b)
    })?;

    let mut legend = Vec::with_capacity(config.systems.len() * config.stack_order.len());
    for system in &config.systems {
        for bucket in &config.stack_order {
            legend.push(config.palette.style(system, bucket)?);
        }
    }

    let n_systems = config.systems.len();
    let mut bars = Vec::with_capacity(config.categories.len() * n_systems);
    for (ci, category) in config.categories.iter().enumerate() {
        for (si, system) in config.systems.iter().enumerate() {
            let style_base = si * config.stack_order.len();
            let mut bottom = 0.0;
            let mut segments = Vec::with_capacity(config.stack_order.len());

            for (bi, bucket) in config.stack_order.iter().enumerate() {
                let cell = index.get(&(category, system, bucket)).ok_or_else(|| {
                    ChartError::domain_gap(format!(
                        "no cell for ({category}, {system}, {bucket}); aggregates must cover every stacked bucket"
                    ))
                })?;
                let style = &legend[style_base + bi];
                segments.push(Segment {
                    bucket: *bucket,
                    height: cell.percentage,
                    bottom,
                    color: style.color.clone(),
                    label: style.label.clone(),
                });
                bottom += cell.percentage;
            }

            bars.push(StackedBar {
                category: category.clone(),
                system: system.clone(),
                x: ci as f64 + dodge(si, n_systems, config.width),
                width: config.width,
                segments,
                total: bottom,
                total_label: percent_label(bottom),
            });
        }
    }

    Ok(StackedChart {
        categories: config.categories.clone(),
        systems: config.systems.clone(),
        stack_order: config.stack_order.clone(),
        excluded_buckets: excluded,
        x_ticks: (0..config.categories.len()).map(|i| i as f64).collect(),
        bars,
        legend,
    })
}

// ============================================================================
// Grouped layout
// ============================================================================

/// A (system, bucket) pair drawn as one dodged bar per category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Series {
    pub system: System,
    pub bucket: CorrectnessBucket,
}

impl Series {
    pub fn new(system: impl Into<System>, bucket: CorrectnessBucket) -> Self {
        Self {
            system: system.into(),
            bucket,
        }
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.system, self.bucket)
    }
}

/// Configuration of a grouped (dodged) chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub categories: Vec<Category>,
    /// Series in left-to-right order within a category slot.
    pub series: Vec<Series>,
    /// Systems the cells may carry; defaults to the systems of the series.
    pub systems: Vec<System>,
    /// Width of a whole category slot, split evenly among the series.
    pub group_width: f64,
    pub palette: Palette,
}

impl GroupConfig {
    pub fn new(categories: Vec<Category>, series: Vec<Series>, palette: Palette) -> Self {
        let mut systems: Vec<System> = Vec::new();
        for s in &series {
            if !systems.contains(&s.system) {
                systems.push(s.system.clone());
            }
        }
        Self {
            categories,
            series,
            systems,
            group_width: DEFAULT_GROUP_WIDTH,
            palette,
        }
    }

    /// Builder method: declare systems that have cells but may not be drawn
    pub fn with_systems(mut self, systems: Vec<System>) -> Self {
        self.systems = systems;
        self
    }

    /// Builder method: set slot width
    pub fn with_group_width(mut self, width: f64) -> Self {
        self.group_width = width;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_labels(&self.categories, "category")?;
        check_labels(&self.series, "series")?;
        check_labels(&self.systems, "system")?;
        if let Some(s) = self.series.iter().find(|s| !self.systems.contains(&s.system)) {
            return Err(ChartError::invalid_config(format!(
                "series '{s}' uses an undeclared system"
            )));
        }
        check_width(self.group_width, "group width")?;
        self.palette.validate()
    }

    /// Width of a single bar.
    pub fn bar_width(&self) -> f64 {
        self.group_width / self.series.len().max(1) as f64
    }
}

/// One bar of a grouped chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedBar {
    pub category: Category,
    pub system: System,
    pub bucket: CorrectnessBucket,
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    /// Legend label of the series.
    pub label: String,
    /// Height formatted as a rounded percentage.
    pub value_label: String,
    /// `"count/questions"`
    pub fraction_label: String,
}

/// A laid-out grouped chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedChart {
    pub categories: Vec<Category>,
    /// Series styles in hue order; doubles as the legend.
    pub series: Vec<SeriesStyle>,
    /// Buckets of the data that no series draws; bar sums per category fall
    /// short of 100% by their share.
    pub excluded_buckets: Vec<CorrectnessBucket>,
    pub x_ticks: Vec<f64>,
    /// Bars category-major, then series.
    pub bars: Vec<GroupedBar>,
}

/// Lay out dodged bars, one per (category, series).
pub fn lay_out_grouped(config: &GroupConfig, cells: &[PercentCell]) -> Result<GroupedChart> {
    config.validate()?;
    let index = index_cells(cells)?;
    let excluded = check_cells(cells, &config.categories, &config.systems, |b| {
        config.series.iter().any(|s| &s.bucket == b)
    })?;

    let styles = config
        .series
        .iter()
        .map(|s| config.palette.style(&s.system, &s.bucket))
        .collect::<Result<Vec<_>>>()?;

    let n = config.series.len();
    let bar_width = config.bar_width();
    let mut bars = Vec::with_capacity(config.categories.len() * n);
    for (ci, category) in config.categories.iter().enumerate() {
        for (k, (series, style)) in config.series.iter().zip(&styles).enumerate() {
            let cell = index
                .get(&(category, &series.system, &series.bucket))
                .ok_or_else(|| {
                    ChartError::domain_gap(format!("no cell for ({category}, {series})"))
                })?;
            bars.push(GroupedBar {
                category: category.clone(),
                system: series.system.clone(),
                bucket: series.bucket,
                x: ci as f64 + dodge(k, n, bar_width),
                width: bar_width,
                height: cell.percentage,
                color: style.color.clone(),
                label: style.label.clone(),
                value_label: percent_label(cell.percentage),
                fraction_label: fraction_label(cell),
            });
        }
    }

    Ok(GroupedChart {
        categories: config.categories.clone(),
        series: styles,
        excluded_buckets: excluded,
        x_ticks: (0..config.categories.len()).map(|i| i as f64).collect(),
        bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three(correct: u32) -> CorrectnessBucket {
        CorrectnessBucket::Count { correct, trials: 3 }
    }

    fn cell(category: &str, system: &str, bucket: CorrectnessBucket, count: usize) -> PercentCell {
        PercentCell {
            category: category.into(),
            system: system.into(),
            bucket,
            count,
            questions: 4,
            percentage: 100.0 * count as f64 / 4.0,
        }
    }

    fn full_cells() -> Vec<PercentCell> {
        let mut cells = Vec::new();
        for (cat, sys, counts) in [
            ("A", "S1", [0, 1, 1, 2]),
            ("A", "S2", [1, 1, 1, 1]),
            ("B", "S1", [0, 0, 0, 4]),
            ("B", "S2", [2, 0, 2, 0]),
        ] {
            for (k, n) in counts.iter().enumerate() {
                cells.push(cell(cat, sys, three(k as u32), *n));
            }
        }
        cells
    }

    fn palette() -> Palette {
        Palette::new()
            .with_system_color("S1", "#1f78b4")
            .with_system_color("S2", "#fdbf6f")
    }

    fn stack_config(order: Vec<CorrectnessBucket>) -> StackConfig {
        StackConfig::new(
            vec!["A".into(), "B".into()],
            vec!["S1".into(), "S2".into()],
            order,
            palette(),
        )
    }

    #[test]
    fn test_bottoms_accumulate_in_declared_order() {
        let config = stack_config(vec![three(3), three(2), three(1), three(0)]);
        let chart = lay_out_stacked(&config, &full_cells()).unwrap();
        let bar = chart.bar(&"A".into(), &"S1".into()).unwrap();

        let heights: Vec<f64> = bar.segments.iter().map(|s| s.height).collect();
        let bottoms: Vec<f64> = bar.segments.iter().map(|s| s.bottom).collect();
        assert_eq!(heights, vec![50.0, 25.0, 25.0, 0.0]);
        assert_eq!(bottoms, vec![0.0, 50.0, 75.0, 100.0]);
        assert_eq!(bar.total, 100.0);
        assert_eq!(bar.total_label, "100%");
        assert!(chart.excluded_buckets.is_empty());
    }

    #[test]
    fn test_bars_never_share_accumulators() {
        let config = stack_config(vec![three(3), three(2)]);
        let chart = lay_out_stacked(&config, &full_cells()).unwrap();
        for bar in &chart.bars {
            assert_eq!(bar.segments[0].bottom, 0.0);
            assert_eq!(bar.total, bar.segments.iter().map(|s| s.height).sum::<f64>());
        }
    }

    #[test]
    fn test_x_positions_center_systems_on_category() {
        let config = stack_config(vec![three(3)]).with_width(0.35);
        let chart = lay_out_stacked(&config, &full_cells()).unwrap();
        let expected = [-0.175, 0.175, 0.825, 1.175];
        for (bar, e) in chart.bars.iter().zip(expected) {
            assert!((bar.x - e).abs() < 1e-12, "{} != {e}", bar.x);
        }
        assert_eq!(chart.x_ticks, vec![0.0, 1.0]);
    }

    #[test]
    fn test_excluded_bucket_omitted_without_shifting_others() {
        let with_zero = stack_config(vec![three(3), three(2), three(1), three(0)]);
        let without_zero = stack_config(vec![three(3), three(2), three(1)]);
        let full = lay_out_stacked(&with_zero, &full_cells()).unwrap();
        let partial = lay_out_stacked(&without_zero, &full_cells()).unwrap();

        assert_eq!(partial.excluded_buckets, vec![three(0)]);
        for (a, b) in full.bars.iter().zip(&partial.bars) {
            assert_eq!(b.segments.len(), 3);
            assert_eq!(&a.segments[..3], &b.segments[..]);
        }
        let b_s2 = partial.bar(&"B".into(), &"S2".into()).unwrap();
        assert_eq!(b_s2.total, 50.0);
    }

    #[test]
    fn test_legend_follows_stack_order() {
        let config = stack_config(vec![three(3), three(2), three(1)]);
        let chart = lay_out_stacked(&config, &full_cells()).unwrap();
        let labels: Vec<&str> = chart.legend.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["S1 3/3", "S1 2/3", "S1 1/3", "S2 3/3", "S2 2/3", "S2 1/3"]
        );
        let bar = chart.bar(&"B".into(), &"S2".into()).unwrap();
        let seg_labels: Vec<&str> = bar.segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(seg_labels, vec!["S2 3/3", "S2 2/3", "S2 1/3"]);
    }

    #[test]
    fn test_missing_stacked_cell_is_domain_gap() {
        let cells: Vec<PercentCell> = full_cells()
            .into_iter()
            .filter(|c| !(c.category.as_str() == "B" && c.bucket == three(2)))
            .collect();
        let config = stack_config(vec![three(3), three(2)]);
        let err = lay_out_stacked(&config, &cells).unwrap_err();
        assert!(matches!(err, ChartError::DomainGap { .. }));
    }

    #[test]
    fn test_unknown_category_in_cells_rejected() {
        let mut cells = full_cells();
        cells.push(cell("C", "S1", three(3), 1));
        let config = stack_config(vec![three(3)]);
        assert!(lay_out_stacked(&config, &cells).is_err());
    }

    #[test]
    fn test_duplicate_cells_rejected() {
        let mut cells = full_cells();
        cells.push(cells[0].clone());
        let config = stack_config(vec![three(3)]);
        let err = lay_out_stacked(&config, &cells).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_palette_color() {
        let config = StackConfig::new(
            vec!["A".into(), "B".into()],
            vec!["S1".into(), "S2".into()],
            vec![three(3)],
            Palette::new().with_system_color("S1", "#1f78b4"),
        );
        let err = lay_out_stacked(&config, &full_cells()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidConfig { .. }));
    }

    #[test]
    fn test_invalid_stack_config() {
        let dup = stack_config(vec![three(3), three(3)]);
        assert!(lay_out_stacked(&dup, &full_cells()).is_err());
        let wide = stack_config(vec![three(3)]).with_width(1.5);
        assert!(lay_out_stacked(&wide, &full_cells()).is_err());
    }

    #[test]
    fn test_grouped_dodges_series() {
        let config = GroupConfig::new(
            vec!["A".into(), "B".into()],
            vec![
                Series::new("S1", three(3)),
                Series::new("S2", three(3)),
                Series::new("S1", three(2)),
                Series::new("S2", three(2)),
            ],
            palette(),
        );
        let chart = lay_out_grouped(&config, &full_cells()).unwrap();
        assert_eq!(chart.bars.len(), 8);
        assert!((config.bar_width() - 0.2).abs() < 1e-12);

        let xs: Vec<f64> = chart.bars[..4].iter().map(|b| b.x).collect();
        let expected = [-0.3, -0.1, 0.1, 0.3];
        for (x, e) in xs.iter().zip(expected) {
            assert!((x - e).abs() < 1e-12, "{x} != {e}");
        }

        let first = &chart.bars[0];
        assert_eq!(first.height, 50.0);
        assert_eq!(first.value_label, "50%");
        assert_eq!(first.fraction_label, "2/4");
        assert_eq!(first.label, "S1 3/3");
        assert_eq!(chart.series.len(), 4);
        assert_eq!(chart.excluded_buckets, vec![three(0), three(1)]);
    }

    #[test]
    fn test_grouped_missing_series_cell() {
        let config = GroupConfig::new(
            vec!["A".into(), "B".into()],
            vec![Series::new("S3", three(3))],
            palette().with_system_color("S3", "#999999"),
        )
        .with_systems(vec!["S1".into(), "S2".into(), "S3".into()]);
        let err = lay_out_grouped(&config, &full_cells()).unwrap_err();
        assert!(err.to_string().contains("S3 3/3"));
    }

    #[test]
    fn test_grouped_rejects_foreign_cells() {
        let series = vec![Series::new("S1", three(3)), Series::new("S2", three(3))];

        // Category B has cells but no slot.
        let config = GroupConfig::new(vec!["A".into()], series.clone(), palette());
        let err = lay_out_grouped(&config, &full_cells()).unwrap_err();
        assert!(matches!(err, ChartError::DomainGap { .. }));
        assert!(err.to_string().contains("'B'"));

        // S2 has cells but is neither drawn nor declared.
        let config = GroupConfig::new(
            vec!["A".into(), "B".into()],
            vec![Series::new("S1", three(3))],
            palette(),
        );
        let err = lay_out_grouped(&config, &full_cells()).unwrap_err();
        assert!(matches!(err, ChartError::DomainGap { .. }));
        assert!(err.to_string().contains("'S2'"));

        // Declaring S2 without a series for it is fine.
        let config = config.with_systems(vec!["S1".into(), "S2".into()]);
        let chart = lay_out_grouped(&config, &full_cells()).unwrap();
        assert_eq!(chart.bars.len(), 2);
    }

    #[test]
    fn test_grouped_reports_excluded_buckets() {
        let config = GroupConfig::new(
            vec!["A".into(), "B".into()],
            vec![Series::new("S1", three(3)), Series::new("S2", three(2))],
            palette(),
        );
        let chart = lay_out_grouped(&config, &full_cells()).unwrap();
        assert_eq!(chart.excluded_buckets, vec![three(0), three(1)]);
    }

    #[test]
    fn test_binary_stack_legend_labels_are_distinct() {
        let correct = CorrectnessBucket::Binary { correct: true };
        let incorrect = CorrectnessBucket::Binary { correct: false };
        let cells: Vec<PercentCell> = [(incorrect, 1), (correct, 3)]
            .into_iter()
            .map(|(bucket, count)| cell("A", "S1", bucket, count))
            .collect();
        let config = StackConfig::new(
            vec!["A".into()],
            vec!["S1".into()],
            vec![correct, incorrect],
            Palette::new()
                .with_color("S1", correct, "#1f78b4")
                .with_color("S1", incorrect, "#999999"),
        );
        let chart = lay_out_stacked(&config, &cells).unwrap();

        let legend: Vec<(&str, &str)> = chart
            .legend
            .iter()
            .map(|s| (s.label.as_str(), s.color.as_str()))
            .collect();
        assert_eq!(
            legend,
            vec![("S1 Correct", "#1f78b4"), ("S1 Incorrect", "#999999")]
        );
        let segments: Vec<&str> = chart.bars[0].segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(segments, vec!["S1 Correct", "S1 Incorrect"]);
    }
}
