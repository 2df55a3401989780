//! Per-category question counts used as percentage denominators.
//!
//! Inferring the denominator as `total rows ÷ number of categories` is only
//! right when every category has the same number of questions. This module
//! keeps the count explicit per category and validates it on the way in.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::errors::{ChartError, Result};
use crate::types::{Category, EvaluationRecord, System};

/// Validated number of questions in each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestionCounts {
    counts: BTreeMap<Category, usize>,
}

impl QuestionCounts {
    /// Explicit counts. Each value must be finite, integral and positive.
    pub fn from_values<I, C>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, f64)>,
        C: Into<Category>,
    {
        let mut counts = BTreeMap::new();
        for (category, value) in values {
            let category = category.into();
            if !value.is_finite() || value.fract() != 0.0 || value <= 0.0 {
                return Err(ChartError::denominator(format!(
                    "category '{category}' has {value} questions; expected a positive whole number"
                )));
            }
            counts.insert(category, value as usize);
        }
        Ok(Self { counts })
    }

    /// Count distinct question ids per category.
    ///
    /// Every declared system must have answered the same number of questions
    /// in a category. A system with no records there counts as zero and
    /// fails the check like any other mismatch.
    pub fn from_records(records: &[EvaluationRecord], systems: &[System]) -> Result<Self> {
        let mut per_pair: FxHashMap<(&Category, &System), FxHashSet<&str>> = FxHashMap::default();
        let mut categories: BTreeSet<&Category> = BTreeSet::new();
        for r in records {
            categories.insert(&r.category);
            per_pair
                .entry((&r.category, &r.system))
                .or_default()
                .insert(r.question_id.as_str());
        }

        let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
        for category in categories {
            let sizes: Vec<(&System, usize)> = systems
                .iter()
                .map(|system| {
                    let n = per_pair.get(&(category, system)).map_or(0, FxHashSet::len);
                    (system, n)
                })
                .collect();
            let Some(&(_, expected)) = sizes.iter().max_by_key(|(_, n)| *n) else {
                return Err(ChartError::denominator(
                    "no systems declared to count questions for",
                ));
            };
            if let Some((system, n)) = sizes.iter().find(|(_, n)| *n != expected) {
                return Err(ChartError::denominator(format!(
                    "category '{category}' has {expected} questions for one system but {n} for '{system}'"
                )));
            }
            counts.insert(category.clone(), expected);
        }
        Ok(Self { counts })
    }

    /// The "total ÷ categories" inference, checked.
    ///
    /// Returns the same count for every category only when the categories
    /// really are the same size; uneven sizes raise a denominator error
    /// instead of silently averaging.
    pub fn uniform(records: &[EvaluationRecord]) -> Result<Self> {
        let mut ids: BTreeMap<&Category, FxHashSet<&str>> = BTreeMap::new();
        for r in records {
            ids.entry(&r.category)
                .or_default()
                .insert(r.question_id.as_str());
        }
        if ids.is_empty() {
            return Err(ChartError::denominator("no records to infer a denominator from"));
        }

        let total: usize = ids.values().map(FxHashSet::len).sum();
        let n_categories = ids.len();
        if total % n_categories != 0 {
            return Err(ChartError::denominator(format!(
                "{total} questions do not split evenly over {n_categories} categories"
            )));
        }
        let per_category = total / n_categories;
        if let Some((category, set)) = ids.iter().find(|(_, set)| set.len() != per_category) {
            let sizes: Vec<String> = ids
                .iter()
                .map(|(c, s)| format!("{c}: {}", s.len()))
                .collect();
            return Err(ChartError::denominator(format!(
                "categories are unevenly sized ({}); '{category}' has {} questions, not {per_category}",
                sizes.join(", "),
                set.len()
            )));
        }

        Ok(Self {
            counts: ids
                .into_keys()
                .map(|c| (c.clone(), per_category))
                .collect(),
        })
    }

    /// Denominator for `category`.
    pub fn get(&self, category: &Category) -> Result<usize> {
        match self.counts.get(category) {
            Some(&n) if n > 0 => Ok(n),
            Some(_) => Err(ChartError::denominator(format!(
                "category '{category}' has 0 questions"
            ))),
            None => Err(ChartError::denominator(format!(
                "no question count for category '{category}'"
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, usize)> {
        self.counts.iter().map(|(c, n)| (c, *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
