//! Box-plot statistics and placement for per-question response times.
//!
//! Quartiles use linear interpolation between closest ranks. Whiskers reach
//! the most extreme observation within 1.5 × IQR of the box; anything beyond
//! is an outlier.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};
use crate::layout::DEFAULT_GROUP_WIDTH;
use crate::normalize::TimingRecord;
use crate::palette::Palette;
use crate::types::{first_duplicate, Category, System};

/// Whisker reach in multiples of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Five-number summary plus outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub n: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Summarize `values`; `None` when there are no observations.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = WHISKER_IQR * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

        let inside = || sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        // Whiskers never end inside the box.
        let whisker_low = inside().next().map_or(q1, |v| v.min(q1));
        let whisker_high = inside().last().map_or(q3, |v| v.max(q3));
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            n: sorted.len(),
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Linear-interpolation quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Configuration of a box chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxConfig {
    pub categories: Vec<Category>,
    pub systems: Vec<System>,
    pub group_width: f64,
    /// System-wide colors are used; bucket-specific entries are ignored.
    pub palette: Palette,
}

impl BoxConfig {
    pub fn new(categories: Vec<Category>, systems: Vec<System>, palette: Palette) -> Self {
        Self {
            categories,
            systems,
            group_width: DEFAULT_GROUP_WIDTH,
            palette,
        }
    }

    /// Builder method: set slot width
    pub fn with_group_width(mut self, width: f64) -> Self {
        self.group_width = width;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() || self.systems.is_empty() {
            return Err(ChartError::invalid_config(
                "box chart needs at least one category and one system",
            ));
        }
        if let Some(dup) = first_duplicate(&self.categories) {
            return Err(ChartError::invalid_config(format!(
                "category '{dup}' is declared twice"
            )));
        }
        if let Some(dup) = first_duplicate(&self.systems) {
            return Err(ChartError::invalid_config(format!(
                "system '{dup}' is declared twice"
            )));
        }
        if !(self.group_width > 0.0 && self.group_width <= 1.0) {
            return Err(ChartError::invalid_config(format!(
                "group width must be in (0, 1], got {}",
                self.group_width
            )));
        }
        self.palette.validate()
    }
}

/// One placed box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBox {
    pub category: Category,
    pub system: System,
    pub x: f64,
    pub width: f64,
    pub color: String,
    /// `None` when the (category, system) has no timings.
    pub stats: Option<BoxStats>,
}

/// Legend entry of a box chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStyle {
    pub system: System,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxChart {
    pub categories: Vec<Category>,
    pub systems: Vec<System>,
    pub x_ticks: Vec<f64>,
    /// Boxes category-major, then system.
    pub boxes: Vec<PlacedBox>,
    pub legend: Vec<SystemStyle>,
}

/// Compute box statistics and positions for every (category, system).
pub fn lay_out_boxes(config: &BoxConfig, records: &[TimingRecord]) -> Result<BoxChart> {
    config.validate()?;

    let legend = config
        .systems
        .iter()
        .map(|system| {
            let color = config.palette.system_color(system).ok_or_else(|| {
                ChartError::invalid_config(format!("no palette color for system '{system}'"))
            })?;
            Ok(SystemStyle {
                system: system.clone(),
                color: color.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut groups: FxHashMap<(&Category, &System), Vec<f64>> = FxHashMap::default();
    for record in records {
        if !config.categories.contains(&record.category) {
            return Err(ChartError::domain_gap(format!(
                "question '{}': category '{}' is not in the declared domain",
                record.question_id, record.category
            )));
        }
        if !config.systems.contains(&record.system) {
            return Err(ChartError::domain_gap(format!(
                "question '{}': system '{}' is not in the declared domain",
                record.question_id, record.system
            )));
        }
        if !record.seconds.is_finite() {
            return Err(ChartError::schema(format!(
                "question '{}' has a non-finite time",
                record.question_id
            )));
        }
        groups
            .entry((&record.category, &record.system))
            .or_default()
            .push(record.seconds);
    }

    let n = config.systems.len();
    let width = config.group_width / n as f64;
    let mut boxes = Vec::with_capacity(config.categories.len() * n);
    for (ci, category) in config.categories.iter().enumerate() {
        for (si, (system, style)) in config.systems.iter().zip(&legend).enumerate() {
            let stats = groups
                .get(&(category, system))
                .and_then(|v| BoxStats::from_values(v));
            boxes.push(PlacedBox {
                category: category.clone(),
                system: system.clone(),
                x: ci as f64 + (si as f64 - (n as f64 - 1.0) / 2.0) * width,
                width,
                color: style.color.clone(),
                stats,
            });
        }
    }

    Ok(BoxChart {
        categories: config.categories.clone(),
        systems: config.systems.clone(),
        x_ticks: (0..config.categories.len()).map(|i| i as f64).collect(),
        boxes,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(id: &str, category: &str, system: &str, seconds: f64) -> TimingRecord {
        TimingRecord {
            question_id: id.to_string(),
            category: category.into(),
            system: system.into(),
            seconds,
        }
    }

    fn config() -> BoxConfig {
        BoxConfig::new(
            vec!["A".into(), "B".into()],
            vec!["S1".into(), "S2".into()],
            Palette::new()
                .with_system_color("S1", "#1f78b4")
                .with_system_color("S2", "#ff7f00"),
        )
    }

    #[test]
    fn test_quartiles_interpolate() {
        let stats = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.n, 4);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_outliers_beyond_whiskers() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.whisker_high, 5.0);
        assert_eq!(stats.whisker_low, 1.0);
    }

    #[test]
    fn test_single_value() {
        let stats = BoxStats::from_values(&[7.0]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (7.0, 7.0, 7.0));
        assert_eq!(stats.iqr(), 0.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_boxes_placed_per_pair() {
        let records = vec![
            timing("q1", "A", "S1", 10.0),
            timing("q2", "A", "S1", 20.0),
            timing("q1", "A", "S2", 5.0),
            timing("q3", "B", "S1", 8.0),
        ];
        let chart = lay_out_boxes(&config(), &records).unwrap();
        assert_eq!(chart.boxes.len(), 4);

        let first = &chart.boxes[0];
        assert!((first.x + 0.2).abs() < 1e-12);
        assert!((first.width - 0.4).abs() < 1e-12);
        assert_eq!(first.color, "#1f78b4");
        assert_eq!(first.stats.as_ref().unwrap().median, 15.0);

        // (B, S2) has no timings.
        assert!(chart.boxes[3].stats.is_none());
        assert_eq!(chart.legend.len(), 2);
    }

    #[test]
    fn test_unknown_system_rejected() {
        let records = vec![timing("q1", "A", "S9", 1.0)];
        let err = lay_out_boxes(&config(), &records).unwrap_err();
        assert!(matches!(err, ChartError::DomainGap { .. }));
    }

    #[test]
    fn test_missing_system_color() {
        let config = BoxConfig::new(vec!["A".into()], vec!["S1".into()], Palette::new());
        assert!(lay_out_boxes(&config, &[]).is_err());
    }
}
