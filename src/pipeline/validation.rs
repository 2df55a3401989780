//! Static checks on a [`ChartSpec`](super::spec::ChartSpec).
//!
//! Every rule runs, even after an error, and the findings land in one
//! [`ValidationReport`]. Nothing here looks at row data: a spec that passes
//! can still fail at run time on unknown codes or uneven categories.
//!
//! ```rust,ignore
//! let report = ValidationEngine::with_defaults().validate(&spec);
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! ```

use std::collections::HashMap;

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::error_code::ErrorCode;
use super::errors::ChartSpecError;
use super::spec::*;
use crate::palette::is_hex_color;
use crate::types::{Bucketing, CorrectnessBucket, System};

// ─── Severity ───────────────────────────────────────────────────────────────

/// Errors block the pipeline; warnings are logged and kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding attached to a [`ChartSpecError`].
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: ChartSpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: ChartSpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: ChartSpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Findings of one validation pass, in rule order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ChartSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ChartSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// No errors; warnings allowed.
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// One check over a [`ChartSpec`].
///
/// Implementations hold no state; the engine may be shared between threads.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"palette_coverage"`).
    fn name(&self) -> &str;

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Ordered list of [`ValidationRule`]s.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// All built-in rules, cheapest and most fundamental first.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(VersionRule));
        engine.add_rule(Box::new(OrdersRule));
        engine.add_rule(Box::new(CategoryNamesRule));
        engine.add_rule(Box::new(KindRequirementsRule));
        engine.add_rule(Box::new(BucketDomainRule));
        engine.add_rule(Box::new(SeriesSystemsRule));
        engine.add_rule(Box::new(WidthRule));
        engine.add_rule(Box::new(PaletteCoverageRule));
        engine.add_rule(Box::new(DenominatorRule));
        engine.add_rule(Box::new(ExclusionRule));
        engine.add_rule(Box::new(RuntimeLimitsRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    /// Append a rule; it runs after the existing ones.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in execution order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, spec: &ChartSpec) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rules = self.rules.len(),
            diagnostics = report.len(),
            valid = report.is_valid(),
            "validated chart spec"
        );

        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Escape a JSON pointer reference token (`~` → `~0`, `/` → `~1`).
fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Indices of labels that already appeared earlier in `items`.
fn duplicate_indices<T: Eq + std::hash::Hash>(items: &[T]) -> Vec<usize> {
    let mut seen = FxHashSet::default();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| !seen.insert(*item))
        .map(|(i, _)| i)
        .collect()
}

/// (path, system, bucket) of every bar segment the chart will draw.
fn drawn_pairs(spec: &ChartSpec) -> Vec<(String, System, CorrectnessBucket)> {
    match spec.kind {
        ChartKind::Stacked => spec
            .systems
            .iter()
            .flat_map(|col| {
                spec.stack_order
                    .iter()
                    .enumerate()
                    .map(move |(i, b)| (format!("/stack_order/{i}"), col.system.clone(), *b))
            })
            .collect(),
        ChartKind::Grouped => spec
            .series_order
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("/series_order/{i}"), s.system.clone(), s.bucket))
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. Spec version ────────────────────────────────────────────────────────

struct VersionRule;

impl ValidationRule for VersionRule {
    fn name(&self) -> &str {
        "version"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        if spec.v == SPEC_VERSION {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            ChartSpecError::new(
                ErrorCode::UnsupportedVersion,
                "/v",
                format!("unsupported spec version {}", spec.v),
            )
            .with_hint(format!("Set \"v\": {SPEC_VERSION}")),
        )]
    }
}

// ─── 2. Orders are non-empty and duplicate-free ─────────────────────────────

struct OrdersRule;

impl ValidationRule for OrdersRule {
    fn name(&self) -> &str {
        "orders"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        if spec.categories.is_empty() {
            out.push(ValidationDiagnostic::error(
                ChartSpecError::new(
                    ErrorCode::MissingOrder,
                    "/categories",
                    "the category table is empty",
                )
                .with_hint("Map each source category code to a display name"),
            ));
        }
        if spec.systems.is_empty() {
            out.push(ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::MissingOrder,
                "/systems",
                "no system columns declared",
            )));
        }

        let names = spec.system_order();
        for i in duplicate_indices(&names) {
            out.push(ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::DuplicateEntry,
                format!("/systems/{i}/system"),
                format!("system '{}' is declared twice", names[i]),
            )));
        }
        let columns: Vec<&str> = spec.systems.iter().map(|s| s.column.as_str()).collect();
        for i in duplicate_indices(&columns) {
            out.push(ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::DuplicateEntry,
                format!("/systems/{i}/column"),
                format!("column '{}' is read twice", columns[i]),
            )));
        }

        if let Some(order) = &spec.category_order {
            if order.is_empty() {
                out.push(ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::MissingOrder,
                        "/category_order",
                        "category_order is empty",
                    )
                    .with_hint("Remove category_order to use the table order"),
                ));
            }
            for i in duplicate_indices(order) {
                out.push(ValidationDiagnostic::error(ChartSpecError::new(
                    ErrorCode::DuplicateEntry,
                    format!("/category_order/{i}"),
                    format!("category '{}' appears twice", order[i]),
                )));
            }
        }

        for i in duplicate_indices(&spec.stack_order) {
            out.push(ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::DuplicateEntry,
                format!("/stack_order/{i}"),
                format!("bucket '{}' is stacked twice", spec.stack_order[i]),
            )));
        }
        for i in duplicate_indices(&spec.series_order) {
            out.push(ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::DuplicateEntry,
                format!("/series_order/{i}"),
                format!("series '{}' appears twice", spec.series_order[i]),
            )));
        }

        out
    }
}

// ─── 3. Category order names exist in the renaming table ────────────────────

struct CategoryNamesRule;

impl ValidationRule for CategoryNamesRule {
    fn name(&self) -> &str {
        "category_names"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let Some(order) = &spec.category_order else {
            return vec![];
        };
        let mut out = Vec::new();

        for (i, name) in order.iter().enumerate() {
            if !spec.categories.contains_display(name) {
                out.push(ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::DomainGap,
                        format!("/category_order/{i}"),
                        format!("category '{name}' is not a display name in the category table"),
                    )
                    .with_hint("Category order uses display names, not source codes"),
                ));
            }
        }

        let mut reported = FxHashSet::default();
        for category in spec.categories.categories() {
            if !order.iter().any(|c| c == category.as_str()) && reported.insert(category.clone()) {
                out.push(ValidationDiagnostic::warning(
                    ChartSpecError::new(
                        ErrorCode::DomainGap,
                        "/category_order",
                        format!("category '{category}' is in the table but not in the order"),
                    )
                    .with_hint("Rows of this category will fail with domain_gap"),
                ));
            }
        }

        out
    }
}

// ─── 4. Kind requirements ───────────────────────────────────────────────────

struct KindRequirementsRule;

impl ValidationRule for KindRequirementsRule {
    fn name(&self) -> &str {
        "kind_requirements"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();
        match spec.kind {
            ChartKind::Stacked => {
                if spec.stack_order.is_empty() {
                    out.push(ValidationDiagnostic::error(
                        ChartSpecError::new(
                            ErrorCode::MissingOrder,
                            "/stack_order",
                            "a stacked chart needs a stack order",
                        )
                        .with_hint("List the buckets bottom to top, e.g. [\"3/3\", \"2/3\", \"1/3\"]"),
                    ));
                }
                if !spec.series_order.is_empty() {
                    out.push(ValidationDiagnostic::warning(ChartSpecError::new(
                        ErrorCode::InvalidCombo,
                        "/series_order",
                        "series_order is ignored by stacked charts",
                    )));
                }
            }
            ChartKind::Grouped => {
                if spec.series_order.is_empty() {
                    out.push(ValidationDiagnostic::error(
                        ChartSpecError::new(
                            ErrorCode::MissingOrder,
                            "/series_order",
                            "a grouped chart needs a series order",
                        )
                        .with_hint("List (system, bucket) pairs left to right"),
                    ));
                }
                if !spec.stack_order.is_empty() {
                    out.push(ValidationDiagnostic::warning(ChartSpecError::new(
                        ErrorCode::InvalidCombo,
                        "/stack_order",
                        "stack_order is ignored by grouped charts",
                    )));
                }
            }
        }
        out
    }
}

// ─── 5. Stacked / series buckets lie inside the bucket domain ───────────────

struct BucketDomainRule;

impl ValidationRule for BucketDomainRule {
    fn name(&self) -> &str {
        "bucket_domain"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        if spec.buckets.trials() == 0 {
            return vec![ValidationDiagnostic::error(ChartSpecError::new(
                ErrorCode::InvalidValue,
                "/buckets/trials",
                "trials must be greater than 0",
            ))];
        }

        let domain = spec.buckets.domain();
        let labels: Vec<String> = domain.iter().map(|b| b.label()).collect();
        let hint = format!("The bucket scheme produces: {}", labels.join(", "));

        let stacked = spec
            .stack_order
            .iter()
            .enumerate()
            .map(|(i, b)| (format!("/stack_order/{i}"), b));
        let series = spec
            .series_order
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("/series_order/{i}/bucket"), &s.bucket));

        stacked
            .chain(series)
            .filter(|(_, b)| !domain.contains(*b))
            .map(|(path, b)| {
                ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::DomainGap,
                        path,
                        format!("bucket '{b}' is outside the bucket domain"),
                    )
                    .with_hint(hint.clone()),
                )
            })
            .collect()
    }
}

// ─── 6. Series systems are declared ─────────────────────────────────────────

struct SeriesSystemsRule;

impl ValidationRule for SeriesSystemsRule {
    fn name(&self) -> &str {
        "series_systems"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let systems = spec.system_order();
        spec.series_order
            .iter()
            .enumerate()
            .filter(|(_, s)| !systems.contains(&s.system))
            .map(|(i, s)| {
                ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::DomainGap,
                        format!("/series_order/{i}/system"),
                        format!("series system '{}' is not a declared system", s.system),
                    )
                    .with_hint("Add a system column for it or remove the series"),
                )
            })
            .collect()
    }
}

// ─── 7. Width bounds ────────────────────────────────────────────────────────

struct WidthRule;

impl ValidationRule for WidthRule {
    fn name(&self) -> &str {
        "width"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let Some(width) = spec.width else {
            return vec![];
        };
        if !(width.is_finite() && width > 0.0 && width <= 1.0) {
            return vec![ValidationDiagnostic::error(
                ChartSpecError::new(
                    ErrorCode::InvalidValue,
                    "/width",
                    format!("width must be in (0, 1], got {width}"),
                )
                .with_hint("Category slots are 1.0 wide"),
            )];
        }

        let span = width * spec.systems.len() as f64;
        if spec.kind == ChartKind::Stacked && span > 1.0 {
            return vec![ValidationDiagnostic::warning(
                ChartSpecError::new(
                    ErrorCode::InvalidValue,
                    "/width",
                    format!(
                        "{} bars of width {width} span {span:.2}; neighbouring categories overlap",
                        spec.systems.len()
                    ),
                )
                .with_hint(format!(
                    "Use a width of at most {:.3}",
                    1.0 / spec.systems.len() as f64
                )),
            )];
        }
        vec![]
    }
}

// ─── 8. Palette coverage ────────────────────────────────────────────────────

struct PaletteCoverageRule;

impl ValidationRule for PaletteCoverageRule {
    fn name(&self) -> &str {
        "palette_coverage"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        for (i, entry) in spec.palette.entries().iter().enumerate() {
            if !is_hex_color(&entry.color) {
                out.push(ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::InvalidValue,
                        format!("/palette/{i}/color"),
                        format!("color '{}' is not #rrggbb", entry.color),
                    )
                    .with_hint("Use a hex color such as \"#1f78b4\""),
                ));
            }
        }

        for (path, system, bucket) in drawn_pairs(spec) {
            if spec.palette.color(&system, &bucket).is_none() {
                out.push(ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::MissingColor,
                        path,
                        format!("no palette color for '{system} {bucket}'"),
                    )
                    .with_hint(format!(
                        "Add {{\"system\": \"{system}\", \"bucket\": \"{bucket}\", \"color\": ...}} to the palette"
                    )),
                ));
            }
        }

        out
    }
}

// ─── 9. Denominators ────────────────────────────────────────────────────────

struct DenominatorRule;

impl ValidationRule for DenominatorRule {
    fn name(&self) -> &str {
        "denominators"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let Some(explicit) = &spec.questions_per_category else {
            return vec![];
        };
        let mut out = Vec::new();

        if spec.assume_uniform {
            out.push(ValidationDiagnostic::error(
                ChartSpecError::new(
                    ErrorCode::InvalidCombo,
                    "/assume_uniform",
                    "assume_uniform cannot be combined with questions_per_category",
                )
                .with_hint("Keep the explicit counts and drop assume_uniform"),
            ));
        }

        for (name, &value) in explicit {
            if !value.is_finite() || value.fract() != 0.0 || value <= 0.0 {
                out.push(ValidationDiagnostic::error(ChartSpecError::new(
                    ErrorCode::InvalidDenominator,
                    format!("/questions_per_category/{}", escape_token(name)),
                    format!("'{name}' has {value} questions; expected a positive whole number"),
                )));
            }
        }

        let order = spec.category_order();
        for category in &order {
            if !explicit.contains_key(category.as_str()) {
                out.push(ValidationDiagnostic::error(
                    ChartSpecError::new(
                        ErrorCode::InvalidDenominator,
                        "/questions_per_category",
                        format!("no question count for category '{category}'"),
                    )
                    .with_hint("Give every drawn category a count"),
                ));
            }
        }
        for name in explicit.keys() {
            if !order.iter().any(|c| c.as_str() == name) {
                out.push(ValidationDiagnostic::warning(ChartSpecError::new(
                    ErrorCode::DomainGap,
                    format!("/questions_per_category/{}", escape_token(name)),
                    format!("'{name}' is not a drawn category; its count is unused"),
                )));
            }
        }

        out
    }
}

// ─── 10. Exclusion warning ──────────────────────────────────────────────────

struct ExclusionRule;

impl ValidationRule for ExclusionRule {
    fn name(&self) -> &str {
        "exclusion"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        if spec.kind != ChartKind::Stacked || spec.stack_order.is_empty() {
            return vec![];
        }
        let excluded = spec.excluded_buckets();
        if excluded.is_empty() {
            return vec![];
        }
        let labels: Vec<String> = excluded.iter().map(|b| b.label()).collect();
        vec![ValidationDiagnostic::warning(ChartSpecError::new(
            ErrorCode::InvalidCombo,
            "/stack_order",
            format!(
                "stack order leaves out {}; bar totals may be below 100%",
                labels.join(", ")
            ),
        ))]
    }
}

// ─── 11. Runtime limits must be positive when set ───────────────────────────

struct RuntimeLimitsRule;

impl ValidationRule for RuntimeLimitsRule {
    fn name(&self) -> &str {
        "runtime_limits"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        if spec.runtime.max_threads == Some(0) {
            vec![ValidationDiagnostic::error(
                ChartSpecError::new(
                    ErrorCode::InvalidValue,
                    "/runtime/max_threads",
                    "max_threads must be greater than 0",
                )
                .with_hint("Remove max_threads to use all cores, or set single_thread"),
            )]
        } else {
            vec![]
        }
    }
}

// ─── 12. Unknown fields (strict → error, non-strict → warning) ─────────────

struct UnknownFieldsRule;

impl UnknownFieldsRule {
    /// Collect unknown-field diagnostics at the given JSON pointer `path`
    /// from the extra fields captured by `#[serde(flatten)]`.
    fn check_unknowns(
        path: &str,
        unknowns: &HashMap<String, serde_json::Value>,
        strict: bool,
    ) -> Vec<ValidationDiagnostic> {
        let mut keys: Vec<&String> = unknowns.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let diag_fn = if strict {
                    ValidationDiagnostic::error
                } else {
                    ValidationDiagnostic::warning
                };
                diag_fn(
                    ChartSpecError::new(
                        ErrorCode::UnknownField,
                        format!("{path}/{}", escape_token(key)),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, spec: &ChartSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Self::check_unknowns("", &spec.unknown_fields, spec.strict);
        out.extend(Self::check_unknowns(
            "/runtime",
            &spec.runtime.unknown_fields,
            spec.strict,
        ));
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(json: &str) -> ChartSpec {
        serde_json::from_str(json).unwrap()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::with_defaults()
    }

    fn codes(report: &ValidationReport) -> Vec<(Severity, ErrorCode, String)> {
        report
            .diagnostics
            .iter()
            .map(|d| (d.severity, d.error.code, d.error.path.clone()))
            .collect()
    }

    const STACKED: &str = r##"{
        "v": 1,
        "kind": "stacked",
        "categories": [["a", "Alpha"], ["b", "Beta"]],
        "systems": [
            { "column": "s1", "system": "S1" },
            { "column": "s2", "system": "S2" }
        ],
        "buckets": { "scheme": "per_trial", "trials": 2 },
        "stack_order": ["2/2", "1/2", "0/2"],
        "palette": [
            { "system": "S1", "color": "#1f78b4" },
            { "system": "S2", "color": "#fdbf6f" }
        ],
        "width": 0.35
    }"##;

    const GROUPED: &str = r##"{
        "v": 1,
        "kind": "grouped",
        "categories": [["a", "Alpha"], ["b", "Beta"]],
        "systems": [
            { "column": "s1", "system": "S1" },
            { "column": "s2", "system": "S2" }
        ],
        "buckets": { "scheme": "any_correct", "trials": 3 },
        "series_order": [
            { "system": "S1", "bucket": "Correct" },
            { "system": "S2", "bucket": "Correct" }
        ],
        "palette": [
            { "system": "S1", "color": "#1f78b4" },
            { "system": "S2", "color": "#fdbf6f" }
        ]
    }"##;

    // ─── Valid specs ────────────────────────────────────────────────────

    #[test]
    fn test_complete_stacked_spec_is_valid() {
        let report = engine().validate(&spec(STACKED));
        assert!(report.is_valid(), "{:?}", codes(&report));
        assert!(report.is_empty());
    }

    #[test]
    fn test_complete_grouped_spec_is_valid() {
        let report = engine().validate(&spec(GROUPED));
        assert!(report.is_empty(), "{:?}", codes(&report));
    }

    #[test]
    fn test_default_rule_names() {
        let engine = engine();
        let names = engine.rule_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "version");
        assert_eq!(names[11], "unknown_fields");
    }

    // ─── Errors ─────────────────────────────────────────────────────────

    #[test]
    fn test_unsupported_version() {
        let report = engine().validate(&spec(&STACKED.replacen("\"v\": 1", "\"v\": 2", 1)));
        assert!(report.has_errors());
        let err = report.errors().next().unwrap();
        assert_eq!(err.code, ErrorCode::UnsupportedVersion);
        assert_eq!(err.path, "/v");
    }

    #[test]
    fn test_stacked_without_stack_order() {
        let mut s = spec(STACKED);
        s.stack_order.clear();
        let report = engine().validate(&s);
        let err = report.errors().next().unwrap();
        assert_eq!(err.code, ErrorCode::MissingOrder);
        assert_eq!(err.path, "/stack_order");
    }

    #[test]
    fn test_grouped_without_series() {
        let mut s = spec(GROUPED);
        s.series_order.clear();
        let report = engine().validate(&s);
        assert!(report.errors().any(|e| e.path == "/series_order"));
    }

    #[test]
    fn test_duplicate_stack_bucket() {
        let report = engine().validate(&spec(&STACKED.replace("\"0/2\"]", "\"2/2\"]")));
        let dup: Vec<_> = report
            .errors()
            .filter(|e| e.code == ErrorCode::DuplicateEntry)
            .collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].path, "/stack_order/2");
    }

    #[test]
    fn test_stack_bucket_outside_domain() {
        let report = engine().validate(&spec(&STACKED.replace("\"0/2\"]", "\"0/3\"]")));
        let err = report
            .errors()
            .find(|e| e.code == ErrorCode::DomainGap)
            .unwrap();
        assert_eq!(err.path, "/stack_order/2");
        assert!(err.hint.as_deref().unwrap().contains("0/2, 1/2, 2/2"));
    }

    #[test]
    fn test_series_system_undeclared() {
        let json = GROUPED.replacen(
            "{ \"system\": \"S2\", \"bucket\": \"Correct\" }",
            "{ \"system\": \"S3\", \"bucket\": \"Correct\" }",
            1,
        );
        let report = engine().validate(&spec(&json));
        assert!(report
            .errors()
            .any(|e| e.path == "/series_order/1/system" && e.code == ErrorCode::DomainGap));
        // S3 also has no color.
        assert!(report.errors().any(|e| e.code == ErrorCode::MissingColor));
    }

    #[test]
    fn test_category_order_uses_display_names() {
        let mut s = spec(STACKED);
        s.category_order = Some(vec!["a".into(), "Beta".into()]);
        let report = engine().validate(&s);
        assert!(report.errors().any(|e| e.path == "/category_order/0"));
        // Alpha is in the table but not drawn.
        assert!(report
            .warnings()
            .any(|w| w.message.contains("'Alpha'")));
    }

    #[test]
    fn test_missing_palette_color() {
        let mut s = spec(STACKED);
        s.palette = crate::palette::Palette::new()
            .with_system_color("S1", "#1f78b4")
            .with_color("S2", CorrectnessBucket::Count { correct: 2, trials: 2 }, "#fdbf6f");
        let report = engine().validate(&s);
        let missing: Vec<_> = report
            .errors()
            .filter(|e| e.code == ErrorCode::MissingColor)
            .map(|e| e.path.clone())
            .collect();
        assert_eq!(missing, vec!["/stack_order/1", "/stack_order/2"]);
    }

    #[test]
    fn test_bad_hex_color() {
        let report = engine().validate(&spec(&STACKED.replace("#fdbf6f", "orange")));
        assert!(report.errors().any(|e| e.path == "/palette/1/color"));
    }

    #[test]
    fn test_width_out_of_range() {
        let mut s = spec(STACKED);
        s.width = Some(0.0);
        let report = engine().validate(&s);
        assert!(report.errors().any(|e| e.path == "/width"));
    }

    #[test]
    fn test_explicit_denominators_must_cover_categories() {
        let s = spec(STACKED).with_questions_per_category([("Alpha", 2.0), ("Gamma", 1.5)]);
        let report = engine().validate(&s);
        let found = codes(&report);
        assert!(found.contains(&(
            Severity::Error,
            ErrorCode::InvalidDenominator,
            "/questions_per_category".to_string()
        )));
        assert!(found.contains(&(
            Severity::Error,
            ErrorCode::InvalidDenominator,
            "/questions_per_category/Gamma".to_string()
        )));
        assert!(found.contains(&(
            Severity::Warning,
            ErrorCode::DomainGap,
            "/questions_per_category/Gamma".to_string()
        )));
    }

    #[test]
    fn test_uniform_and_explicit_conflict() {
        let s = spec(STACKED)
            .with_questions_per_category([("Alpha", 2.0), ("Beta", 2.0)])
            .with_assume_uniform(true);
        let report = engine().validate(&s);
        let err = report.errors().next().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidCombo);
    }

    #[test]
    fn test_zero_max_threads() {
        let json = STACKED.replacen("\"width\": 0.35", "\"width\": 0.35, \"runtime\": { \"max_threads\": 0 }", 1);
        let report = engine().validate(&spec(&json));
        assert!(report.errors().any(|e| e.path == "/runtime/max_threads"));
    }

    // ─── Warnings ───────────────────────────────────────────────────────

    #[test]
    fn test_exclusion_warning() {
        let report = engine().validate(&spec(&STACKED.replace(", \"0/2\"]", "]")));
        assert!(report.is_valid());
        let w: Vec<_> = report.warnings().collect();
        assert_eq!(w.len(), 1);
        assert!(w[0].message.contains("0/2"));
    }

    #[test]
    fn test_overlap_warning() {
        let mut s = spec(STACKED);
        s.width = Some(0.6);
        let report = engine().validate(&s);
        assert!(report.is_valid());
        assert!(report.warnings().any(|w| w.path == "/width"));
    }

    #[test]
    fn test_unknown_field_warning_then_error_when_strict() {
        let json = STACKED.replacen("\"v\": 1,", "\"v\": 1, \"titel\": \"x\",", 1);
        let report = engine().validate(&spec(&json));
        assert!(report.is_valid());
        assert_eq!(report.warnings().next().unwrap().path, "/titel");

        let strict = json.replacen("\"v\": 1,", "\"v\": 1, \"strict\": true,", 1);
        let report = engine().validate(&spec(&strict));
        assert!(report.has_errors());
        assert_eq!(report.errors().next().unwrap().code, ErrorCode::UnknownField);
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_token("Yes/No"), "Yes~1No");
        assert_eq!(escape_token("a~b"), "a~0b");
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = engine().validate(&spec(&STACKED.replacen("\"v\": 1", "\"v\": 9", 1)));
        let value = serde_json::to_value(&report).unwrap();
        let first = &value["diagnostics"][0];
        assert_eq!(first["severity"], "error");
        assert_eq!(first["code"], "unsupported_version");
        assert_eq!(first["path"], "/v");
    }
}
