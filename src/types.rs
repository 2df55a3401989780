//! Core types for evalstack
//!
//! This module defines the labels, buckets, records and cells that flow
//! through the aggregation pipeline, plus the declared [`ChartDomain`] every
//! aggregate is materialized against.

use std::borrow::Borrow;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};

// ============================================================================
// Labels
// ============================================================================

/// Display name of a question category (e.g. `"MultiHop"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for Category {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Display name of a compared answering system (e.g. `"LinkQ"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct System(String);

impl System {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for System {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for System {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Correctness buckets
// ============================================================================

/// A discretized correctness outcome derived from a correct count.
///
/// Serialized as its label (`"2/3"`, `"Correct"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CorrectnessBucket {
    /// `correct` out of `trials` attempts succeeded.
    Count { correct: u32, trials: u32 },
    /// At least one attempt succeeded (or none did).
    Binary { correct: bool },
}

impl CorrectnessBucket {
    /// Label used in legends, palettes and stack orders.
    ///
    /// `Count` buckets render as `"2/3"`; binary buckets as `"Correct"` or
    /// `"Incorrect"`.
    pub fn label(&self) -> String {
        match self {
            Self::Count { correct, trials } => format!("{correct}/{trials}"),
            Self::Binary { correct: true } => "Correct".to_string(),
            Self::Binary { correct: false } => "Incorrect".to_string(),
        }
    }

    /// Parse a label produced by [`CorrectnessBucket::label`].
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Correct" => Some(Self::Binary { correct: true }),
            "Incorrect" => Some(Self::Binary { correct: false }),
            other => {
                let (k, n) = other.split_once('/')?;
                let correct = k.trim().parse().ok()?;
                let trials = n.trim().parse().ok()?;
                (correct <= trials).then_some(Self::Count { correct, trials })
            }
        }
    }
}

impl TryFrom<String> for CorrectnessBucket {
    type Error = String;

    fn try_from(label: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&label).ok_or_else(|| {
            format!("invalid bucket '{label}': expected 'k/n', 'Correct' or 'Incorrect'")
        })
    }
}

impl From<CorrectnessBucket> for String {
    fn from(bucket: CorrectnessBucket) -> Self {
        bucket.label()
    }
}

impl fmt::Display for CorrectnessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Maps a correct count onto a bucket and declares the full bucket domain.
///
/// The aggregator is generic over this trait so callers can plug in their own
/// discretization; [`BucketScheme`] covers the two common cases.
pub trait Bucketing {
    /// Bucket for a single record's correct count.
    fn bucket_for(&self, correct_count: u32) -> Result<CorrectnessBucket>;

    /// Every bucket this scheme can produce, in canonical order.
    fn domain(&self) -> Vec<CorrectnessBucket>;
}

/// Built-in bucketing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum BucketScheme {
    /// One bucket per possible correct count: `0/t, 1/t, ..., t/t`.
    PerTrial { trials: u32 },
    /// Collapse to correct (`count > 0`) versus incorrect.
    AnyCorrect { trials: u32 },
}

impl BucketScheme {
    pub fn trials(&self) -> u32 {
        match self {
            Self::PerTrial { trials } | Self::AnyCorrect { trials } => *trials,
        }
    }
}

impl Bucketing for BucketScheme {
    fn bucket_for(&self, correct_count: u32) -> Result<CorrectnessBucket> {
        let trials = self.trials();
        if correct_count > trials {
            return Err(ChartError::domain_gap(format!(
                "correct count {correct_count} exceeds {trials} trials"
            )));
        }
        Ok(match self {
            Self::PerTrial { trials } => CorrectnessBucket::Count {
                correct: correct_count,
                trials: *trials,
            },
            Self::AnyCorrect { .. } => CorrectnessBucket::Binary {
                correct: correct_count > 0,
            },
        })
    }

    fn domain(&self) -> Vec<CorrectnessBucket> {
        match self {
            Self::PerTrial { trials } => (0..=*trials)
                .map(|correct| CorrectnessBucket::Count {
                    correct,
                    trials: *trials,
                })
                .collect(),
            Self::AnyCorrect { .. } => vec![
                CorrectnessBucket::Binary { correct: false },
                CorrectnessBucket::Binary { correct: true },
            ],
        }
    }
}

// ============================================================================
// Records & cells
// ============================================================================

/// One (question, system) outcome after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question_id: String,
    pub category: Category,
    pub system: System,
    /// Number of successful trials, in `0..=trials`.
    pub correct_count: u32,
}

impl EvaluationRecord {
    pub fn new(
        question_id: impl Into<String>,
        category: impl Into<Category>,
        system: impl Into<System>,
        correct_count: u32,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            category: category.into(),
            system: system.into(),
            correct_count,
        }
    }
}

/// Number of records that fell into one (category, system, bucket) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCell {
    pub category: Category,
    pub system: System,
    pub bucket: CorrectnessBucket,
    pub count: usize,
}

/// An [`AggregateCell`] expressed as a share of the category's questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentCell {
    pub category: Category,
    pub system: System,
    pub bucket: CorrectnessBucket,
    pub count: usize,
    /// Denominator the percentage was computed against.
    pub questions: usize,
    /// `100 × count / questions`
    pub percentage: f64,
}

// ============================================================================
// Domain
// ============================================================================

/// The declared categories, systems and buckets of one chart.
///
/// Order matters: categories are listed in display order and systems in
/// left-to-right order. Aggregates are materialized over the full
/// cross-product of these three lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDomain {
    pub categories: Vec<Category>,
    pub systems: Vec<System>,
    pub buckets: Vec<CorrectnessBucket>,
}

impl ChartDomain {
    pub fn new(
        categories: Vec<Category>,
        systems: Vec<System>,
        buckets: Vec<CorrectnessBucket>,
    ) -> Self {
        Self {
            categories,
            systems,
            buckets,
        }
    }

    /// Domain whose buckets come from a [`Bucketing`] implementation.
    pub fn with_bucketing<B: Bucketing + ?Sized>(
        categories: Vec<Category>,
        systems: Vec<System>,
        bucketing: &B,
    ) -> Self {
        Self::new(categories, systems, bucketing.domain())
    }

    /// Number of (category, system, bucket) triples.
    pub fn len(&self) -> usize {
        self.categories.len() * self.systems.len() * self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reject empty axes and repeated labels.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(ChartError::invalid_config("category domain is empty"));
        }
        if self.systems.is_empty() {
            return Err(ChartError::invalid_config("system domain is empty"));
        }
        if self.buckets.is_empty() {
            return Err(ChartError::invalid_config("bucket domain is empty"));
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
        if let Some(dup) = first_duplicate(&self.buckets) {
            return Err(ChartError::invalid_config(format!(
                "bucket '{dup}' is declared twice"
            )));
        }
        Ok(())
    }
}

/// First element that appears more than once, in list order.
pub(crate) fn first_duplicate<T: Eq + std::hash::Hash>(items: &[T]) -> Option<&T> {
    let mut seen = FxHashSet::default();
    items.iter().find(|item| !seen.insert(*item))
}
