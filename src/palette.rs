//! Color and label lookup keyed by (system, bucket).
//!
//! A [`Palette`] is an immutable value handed to the layout engines. Entries
//! may target one bucket of a system or, with `bucket: None`, every bucket of
//! that system; the bucket-specific entry wins.

use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};
use crate::types::{CorrectnessBucket, System};

/// One palette entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub system: System,
    #[serde(default)]
    pub bucket: Option<CorrectnessBucket>,
    /// `#rrggbb`
    pub color: String,
}

/// A resolved (system, bucket) → color/label pair, as emitted to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStyle {
    pub system: System,
    pub bucket: CorrectnessBucket,
    pub color: String,
    pub label: String,
}

/// Immutable color table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: color for one (system, bucket)
    pub fn with_color(
        mut self,
        system: impl Into<System>,
        bucket: CorrectnessBucket,
        color: impl Into<String>,
    ) -> Self {
        self.entries.push(PaletteEntry {
            system: system.into(),
            bucket: Some(bucket),
            color: color.into(),
        });
        self
    }

    /// Builder method: color for every bucket of `system`
    pub fn with_system_color(mut self, system: impl Into<System>, color: impl Into<String>) -> Self {
        self.entries.push(PaletteEntry {
            system: system.into(),
            bucket: None,
            color: color.into(),
        });
        self
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Reject colors that are not `#rrggbb`.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            if !is_hex_color(&entry.color) {
                return Err(ChartError::invalid_config(format!(
                    "palette color '{}' for '{}' is not #rrggbb",
                    entry.color, entry.system
                )));
            }
        }
        Ok(())
    }

    /// Color for (system, bucket). Later entries override earlier ones.
    pub fn color(&self, system: &System, bucket: &CorrectnessBucket) -> Option<&str> {
        let exact = self
            .entries
            .iter()
            .rev()
            .find(|e| &e.system == system && e.bucket.as_ref() == Some(bucket));
        let fallback = || {
            self.entries
                .iter()
                .rev()
                .find(|e| &e.system == system && e.bucket.is_none())
        };
        exact.or_else(fallback).map(|e| e.color.as_str())
    }

    /// System-wide color, ignoring bucket-specific entries.
    pub fn system_color(&self, system: &System) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| &e.system == system && e.bucket.is_none())
            .map(|e| e.color.as_str())
    }

    /// Legend label: `"LinkQ 3/3"`, `"LinkQ Correct"`.
    pub fn label(system: &System, bucket: &CorrectnessBucket) -> String {
        format!("{system} {bucket}")
    }

    /// Resolve color and label, failing when no color is configured.
    pub fn style(&self, system: &System, bucket: &CorrectnessBucket) -> Result<SeriesStyle> {
        let color = self.color(system, bucket).ok_or_else(|| {
            ChartError::invalid_config(format!("no palette color for '{system} {bucket}'"))
        })?;
        Ok(SeriesStyle {
            system: system.clone(),
            bucket: *bucket,
            color: color.to_string(),
            label: Self::label(system, bucket),
        })
    }
}

/// `#rrggbb`
pub(crate) fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three(correct: u32) -> CorrectnessBucket {
        CorrectnessBucket::Count { correct, trials: 3 }
    }

    #[test]
    fn test_bucket_specific_wins_over_system_color() {
        let palette = Palette::new()
            .with_system_color("LinkQ", "#1f78b4")
            .with_color("LinkQ", three(1), "#c8ddec");
        let linkq = System::new("LinkQ");
        assert_eq!(palette.color(&linkq, &three(1)), Some("#c8ddec"));
        assert_eq!(palette.color(&linkq, &three(3)), Some("#1f78b4"));
        assert_eq!(palette.color(&System::new("GPT-4"), &three(3)), None);
        assert_eq!(palette.system_color(&linkq), Some("#1f78b4"));
    }

    #[test]
    fn test_style_labels() {
        let palette = Palette::new().with_color("GPT-4", three(2), "#ffdeb3");
        let style = palette.style(&System::new("GPT-4"), &three(2)).unwrap();
        assert_eq!(style.label, "GPT-4 2/3");
        assert_eq!(style.color, "#ffdeb3");
        assert!(palette.style(&System::new("GPT-4"), &three(1)).is_err());

        let linkq = System::new("LinkQ");
        let correct = CorrectnessBucket::Binary { correct: true };
        let incorrect = CorrectnessBucket::Binary { correct: false };
        assert_eq!(Palette::label(&linkq, &correct), "LinkQ Correct");
        assert_eq!(Palette::label(&linkq, &incorrect), "LinkQ Incorrect");
    }

    #[test]
    fn test_validate_colors() {
        assert!(Palette::new().with_system_color("A", "#00ff00").validate().is_ok());
        assert!(Palette::new().with_system_color("A", "green").validate().is_err());
        assert!(Palette::new().with_system_color("A", "#00ff0").validate().is_err());
    }
}
