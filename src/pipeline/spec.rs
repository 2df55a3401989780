//! The JSON chart description ([`ChartSpec`]) and its derived views.
//!
//! A [`ChartSpec`] declares everything one chart needs: the category renaming
//! table and display order, the system columns, the bucket scheme, the stack
//! or series order, the palette and how denominators are obtained. These
//! types are the input to the [`super::validation::ValidationEngine`].
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "kind": "stacked",
//!   "categories": [["multihop", "MultiHop"], ["yesno", "Yes/No"]],
//!   "systems": [{ "column": "linkqAnswerCorrect", "system": "LinkQ" }],
//!   "buckets": { "scheme": "per_trial", "trials": 3 },
//!   "stack_order": ["3/3", "2/3", "1/3"],
//!   "palette": [{ "system": "LinkQ", "color": "#1f78b4" }],
//!   "width": 0.35,
//!   "strict": false
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::denominator::QuestionCounts;
use crate::errors::Result;
use crate::layout::{GroupConfig, Series, StackConfig, DEFAULT_GROUP_WIDTH, DEFAULT_STACK_WIDTH};
use crate::normalize::{CategoryTable, RecordNormalizer, SystemColumn};
use crate::palette::Palette;
use crate::types::{BucketScheme, Bucketing, Category, ChartDomain, CorrectnessBucket, EvaluationRecord, System};

/// The only spec version understood by this crate.
pub const SPEC_VERSION: u32 = 1;

/// Which layout engine draws the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Side-by-side stacked bars, one per (category, system).
    Stacked,
    /// Dodged bars, one per (category, series).
    Grouped,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stacked => "stacked",
            Self::Grouped => "grouped",
        }
    }

    /// Bar width used when the spec leaves `width` unset.
    pub fn default_width(&self) -> f64 {
        match self {
            Self::Stacked => DEFAULT_STACK_WIDTH,
            Self::Grouped => DEFAULT_GROUP_WIDTH,
        }
    }
}

/// Where percentage denominators come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenominatorSource {
    /// `questions_per_category` in the spec.
    Explicit,
    /// Total questions ÷ categories, rejected when categories are uneven.
    Uniform,
    /// Distinct question ids per category in the normalized records.
    Records,
}

/// A chart request: data mapping, bucketing, ordering and styling (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Format version; only [`SPEC_VERSION`] is accepted.
    pub v: u32,

    pub kind: ChartKind,

    /// Source category code → display name.
    pub categories: CategoryTable,

    /// Display order of categories. Defaults to the table order.
    #[serde(default)]
    pub category_order: Option<Vec<String>>,

    /// System columns, in left-to-right order.
    pub systems: Vec<SystemColumn>,

    pub buckets: BucketScheme,

    /// Bottom-to-top bucket order of a stacked chart.
    #[serde(default)]
    pub stack_order: Vec<CorrectnessBucket>,

    /// Left-to-right series of a grouped chart.
    #[serde(default)]
    pub series_order: Vec<Series>,

    #[serde(default)]
    pub palette: Palette,

    /// Stacked: width of one bar. Grouped: width of a category slot.
    #[serde(default)]
    pub width: Option<f64>,

    /// Explicit number of questions per category display name.
    #[serde(default)]
    pub questions_per_category: Option<BTreeMap<String, f64>>,

    /// Infer one denominator for every category from the total.
    #[serde(default)]
    pub assume_uniform: bool,

    /// Runtime execution limits.
    #[serde(default)]
    pub runtime: RuntimeSpec,

    /// Treat unrecognized keys as errors instead of warnings.
    #[serde(default)]
    pub strict: bool,

    /// Unrecognized keys, reported by validation.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl ChartSpec {
    fn with_kind(
        kind: ChartKind,
        categories: CategoryTable,
        systems: Vec<SystemColumn>,
        buckets: BucketScheme,
    ) -> Self {
        Self {
            v: SPEC_VERSION,
            kind,
            categories,
            category_order: None,
            systems,
            buckets,
            stack_order: Vec::new(),
            series_order: Vec::new(),
            palette: Palette::default(),
            width: None,
            questions_per_category: None,
            assume_uniform: false,
            runtime: RuntimeSpec::default(),
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }

    /// Start a stacked chart spec.
    pub fn stacked(categories: CategoryTable, systems: Vec<SystemColumn>, buckets: BucketScheme) -> Self {
        Self::with_kind(ChartKind::Stacked, categories, systems, buckets)
    }

    /// Start a grouped chart spec.
    pub fn grouped(categories: CategoryTable, systems: Vec<SystemColumn>, buckets: BucketScheme) -> Self {
        Self::with_kind(ChartKind::Grouped, categories, systems, buckets)
    }

    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder method: set category display order
    pub fn with_category_order<S: Into<String>>(mut self, order: impl IntoIterator<Item = S>) -> Self {
        self.category_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method: set stack order (bottom to top)
    pub fn with_stack_order(mut self, order: Vec<CorrectnessBucket>) -> Self {
        self.stack_order = order;
        self
    }

    /// Builder method: set series order (left to right)
    pub fn with_series(mut self, series: Vec<Series>) -> Self {
        self.series_order = series;
        self
    }

    /// Builder method: set palette
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Builder method: set bar or slot width
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Builder method: set explicit questions per category
    pub fn with_questions_per_category<S: Into<String>>(
        mut self,
        counts: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        self.questions_per_category = Some(counts.into_iter().map(|(c, n)| (c.into(), n)).collect());
        self
    }

    /// Builder method: infer a uniform denominator
    pub fn with_assume_uniform(mut self, assume_uniform: bool) -> Self {
        self.assume_uniform = assume_uniform;
        self
    }

    /// Builder method: set runtime limits
    pub fn with_runtime(mut self, runtime: RuntimeSpec) -> Self {
        self.runtime = runtime;
        self
    }

    /// Builder method: treat unknown fields as errors
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Categories in display order.
    ///
    /// Without an explicit order, the table's display names are used in
    /// table order, each once.
    pub fn category_order(&self) -> Vec<Category> {
        match &self.category_order {
            Some(order) => order.iter().map(|c| Category::new(c.as_str())).collect(),
            None => {
                let mut out: Vec<Category> = Vec::with_capacity(self.categories.len());
                for category in self.categories.categories() {
                    if !out.contains(&category) {
                        out.push(category);
                    }
                }
                out
            }
        }
    }

    /// Systems in left-to-right order.
    pub fn system_order(&self) -> Vec<System> {
        self.systems.iter().map(|s| s.system.clone()).collect()
    }

    /// Declared (category, system, bucket) domain of the chart.
    pub fn domain(&self) -> ChartDomain {
        ChartDomain::with_bucketing(self.category_order(), self.system_order(), &self.buckets)
    }

    /// Buckets of the domain the chart never draws: missing from the stack
    /// order, or from every series.
    pub fn excluded_buckets(&self) -> Vec<CorrectnessBucket> {
        let drawn = |b: &CorrectnessBucket| match self.kind {
            ChartKind::Stacked => self.stack_order.contains(b),
            ChartKind::Grouped => self.series_order.iter().any(|s| &s.bucket == b),
        };
        self.buckets
            .domain()
            .into_iter()
            .filter(|b| !drawn(b))
            .collect()
    }

    pub fn effective_width(&self) -> f64 {
        self.width.unwrap_or_else(|| self.kind.default_width())
    }

    pub fn denominator_source(&self) -> DenominatorSource {
        if self.questions_per_category.is_some() {
            DenominatorSource::Explicit
        } else if self.assume_uniform {
            DenominatorSource::Uniform
        } else {
            DenominatorSource::Records
        }
    }

    /// Record normalizer for this spec's categories and system columns.
    pub fn normalizer(&self) -> RecordNormalizer {
        RecordNormalizer::new(self.categories.clone(), self.systems.clone(), self.buckets.trials())
    }

    /// Resolve per-category denominators for `records`.
    pub fn question_counts(&self, records: &[EvaluationRecord]) -> Result<QuestionCounts> {
        match (&self.questions_per_category, self.denominator_source()) {
            (Some(explicit), DenominatorSource::Explicit) => {
                QuestionCounts::from_values(explicit.iter().map(|(c, n)| (c.as_str(), *n)))
            }
            (_, DenominatorSource::Uniform) => QuestionCounts::uniform(records),
            _ => QuestionCounts::from_records(records, &self.system_order()),
        }
    }

    pub fn stack_config(&self) -> StackConfig {
        StackConfig::new(
            self.category_order(),
            self.system_order(),
            self.stack_order.clone(),
            self.palette.clone(),
        )
        .with_width(self.effective_width())
    }

    pub fn group_config(&self) -> GroupConfig {
        GroupConfig::new(self.category_order(), self.series_order.clone(), self.palette.clone())
            .with_systems(self.system_order())
            .with_group_width(self.effective_width())
    }
}

// ─── Runtime ──────────────────────────────────────────────────────────────

/// Threading for batch runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Thread cap for [`run_batch`](super::runner::run_batch); unset means
    /// one thread per logical core.
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Run charts one after another. Wins over `max_threads`.
    #[serde(default)]
    pub single_thread: bool,

    /// Unrecognized keys, reported by validation.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl RuntimeSpec {
    /// Thread count to pin, or `None` for the global pool.
    pub fn effective_threads(&self) -> Option<usize> {
        if self.single_thread {
            Some(1)
        } else {
            self.max_threads
        }
    }

    /// A dedicated pool when a thread count is pinned.
    pub fn build_thread_pool(
        &self,
    ) -> std::result::Result<Option<rayon::ThreadPool>, rayon::ThreadPoolBuildError> {
        self.effective_threads()
            .map(|n| rayon::ThreadPoolBuilder::new().num_threads(n).build())
            .transpose()
    }

    /// Run `f` so that its `par_iter()` calls honour the thread cap.
    pub fn scoped<R: Send>(
        &self,
        f: impl FnOnce() -> R + Send,
    ) -> std::result::Result<R, rayon::ThreadPoolBuildError> {
        Ok(match self.build_thread_pool()? {
            Some(pool) => pool.install(f),
            None => f(),
        })
    }
}
