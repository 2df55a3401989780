//! Bucketed aggregation with explicit cross-product materialization.
//!
//! Downstream stacking needs a value, possibly zero, for every segment of
//! every bar. Grouping that only emits observed combinations cannot give
//! that, so the aggregator counts into a dense array sized by the declared
//! [`ChartDomain`] and then reifies every (category, system, bucket) triple.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::errors::{ChartError, Result};
use crate::types::{
    AggregateCell, Bucketing, Category, ChartDomain, CorrectnessBucket, EvaluationRecord, System,
};

/// Dense aggregate over a full [`ChartDomain`].
///
/// Cells are stored category-major, then system, then bucket, each axis in
/// declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    domain: ChartDomain,
    cells: Vec<AggregateCell>,
}

impl AggregateTable {
    pub fn domain(&self) -> &ChartDomain {
        &self.domain
    }

    pub fn cells(&self) -> &[AggregateCell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<AggregateCell> {
        self.cells
    }

    /// Count for one triple; `None` only when the triple is outside the domain.
    pub fn count(
        &self,
        category: &Category,
        system: &System,
        bucket: &CorrectnessBucket,
    ) -> Option<usize> {
        let c = self.domain.categories.iter().position(|x| x == category)?;
        let s = self.domain.systems.iter().position(|x| x == system)?;
        let b = self.domain.buckets.iter().position(|x| x == bucket)?;
        Some(self.cells[self.offset(c, s, b)].count)
    }

    /// Cells of one (category, system) pair, in bucket order.
    pub fn pair(&self, category: &Category, system: &System) -> Option<&[AggregateCell]> {
        let c = self.domain.categories.iter().position(|x| x == category)?;
        let s = self.domain.systems.iter().position(|x| x == system)?;
        let start = self.offset(c, s, 0);
        Some(&self.cells[start..start + self.domain.buckets.len()])
    }

    fn offset(&self, c: usize, s: usize, b: usize) -> usize {
        let nb = self.domain.buckets.len();
        (c * self.domain.systems.len() + s) * nb + b
    }
}

/// Count `records` into every (category, system, bucket) of `domain`.
///
/// Records whose category, system or bucket lies outside the domain are a
/// [`ChartError::DomainGap`]: undercounting them silently would skew the
/// chart.
pub fn aggregate<B: Bucketing + ?Sized>(
    records: &[EvaluationRecord],
    bucketing: &B,
    domain: &ChartDomain,
) -> Result<AggregateTable> {
    domain.validate()?;

    let cat_idx = index_of(&domain.categories);
    let sys_idx = index_of(&domain.systems);
    let bucket_idx = index_of(&domain.buckets);

    let nc = domain.categories.len();
    let ns = domain.systems.len();
    let nb = domain.buckets.len();
    let mut counts = vec![0usize; nc * ns * nb];

    for record in records {
        let c = *cat_idx.get(&record.category).ok_or_else(|| {
            ChartError::domain_gap(format!(
                "question '{}': category '{}' is not in the declared domain",
                record.question_id, record.category
            ))
        })?;
        let s = *sys_idx.get(&record.system).ok_or_else(|| {
            ChartError::domain_gap(format!(
                "question '{}': system '{}' is not in the declared domain",
                record.question_id, record.system
            ))
        })?;
        let bucket = bucketing.bucket_for(record.correct_count)?;
        let b = *bucket_idx.get(&bucket).ok_or_else(|| {
            ChartError::domain_gap(format!(
                "question '{}': bucket '{bucket}' is not in the declared domain",
                record.question_id
            ))
        })?;
        counts[(c * ns + s) * nb + b] += 1;
    }

    let mut cells = Vec::with_capacity(counts.len());
    for category in &domain.categories {
        for system in &domain.systems {
            for bucket in &domain.buckets {
                cells.push(AggregateCell {
                    category: category.clone(),
                    system: system.clone(),
                    bucket: *bucket,
                    count: counts[cells.len()],
                });
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        records = records.len(),
        cells = cells.len(),
        "aggregated records over declared domain"
    );

    Ok(AggregateTable {
        domain: domain.clone(),
        cells,
    })
}

fn index_of<T: Eq + std::hash::Hash>(items: &[T]) -> FxHashMap<&T, usize> {
    items.iter().enumerate().map(|(i, item)| (item, i)).collect()
}
