//! Trial tallying: per-attempt verdict rows → per-question correct counts.
//!
//! Each system is run several times over the same question list, producing
//! one row per attempt. The runs of all systems are expected to line up row
//! for row; the tally walks them in lock-step and counts the `YES` verdicts
//! of every system per question.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ChartError, Result};
use crate::normalize::RawRow;

/// A graded attempt: did the system answer correctly?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
}

impl Verdict {
    /// Parse a grader verdict.
    ///
    /// Only the first line counts; it is trimmed and upper-cased and must be
    /// `YES` or `NO`. Graders often append an explanation on later lines.
    pub fn parse(raw: &str) -> Result<Self> {
        let first = raw.lines().next().unwrap_or("").trim().to_uppercase();
        match first.as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            _ => Err(ChartError::schema(format!(
                "unexpected verdict '{first}' (expected YES or NO)"
            ))),
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// One attempt of one system at one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRow {
    pub question_id: String,
    pub raw_category: String,
    /// Raw grader output; see [`Verdict::parse`].
    pub verdict: String,
}

impl TrialRow {
    pub fn new(
        question_id: impl Into<String>,
        raw_category: impl Into<String>,
        verdict: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            raw_category: raw_category.into(),
            verdict: verdict.into(),
        }
    }
}

/// All attempts of one system, keyed by the raw column name the tallied
/// counts will be written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRun {
    pub column: String,
    pub rows: Vec<TrialRow>,
}

impl SystemRun {
    pub fn new(column: impl Into<String>, rows: Vec<TrialRow>) -> Self {
        Self {
            column: column.into(),
            rows,
        }
    }
}

/// Correct counts of every system for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTally {
    pub question_id: String,
    pub raw_category: String,
    /// Correct attempts per system, in run order.
    pub correct: Vec<u32>,
    /// Attempts seen for this question.
    pub total: u32,
}

/// Result of tallying all runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialTally {
    pub columns: Vec<String>,
    /// Questions in first-seen order.
    pub questions: Vec<QuestionTally>,
}

impl TrialTally {
    /// Wide raw rows (`column → correct count`) ready for the normalizer.
    pub fn to_raw_rows(&self) -> Vec<RawRow> {
        self.questions
            .iter()
            .map(|q| {
                self.columns
                    .iter()
                    .zip(&q.correct)
                    .fold(RawRow::new(&q.question_id, &q.raw_category), |row, (col, n)| {
                        row.with_field(col.as_str(), n)
                    })
            })
            .collect()
    }

    /// Per system, how many questions were answered correctly at least once.
    pub fn at_least_one_correct(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let n = self.questions.iter().filter(|q| q.correct[i] > 0).count();
                (col.clone(), n)
            })
            .collect()
    }

    /// `"k/n"` label of one system's count for one question.
    pub fn fraction_label(question: &QuestionTally, system_index: usize) -> Option<String> {
        question
            .correct
            .get(system_index)
            .map(|k| format!("{k}/{}", question.total))
    }
}

/// Tally aligned runs.
///
/// All runs must have the same length and agree on the question id (and
/// category) at every index. When `trials` is given, every question must
/// have been attempted exactly that many times.
pub fn tally_trials(runs: &[SystemRun], trials: Option<u32>) -> Result<TrialTally> {
    let first = runs
        .first()
        .ok_or_else(|| ChartError::schema("no system runs to tally"))?;

    for run in &runs[1..] {
        if run.rows.len() != first.rows.len() {
            return Err(ChartError::schema(format!(
                "run '{}' has {} rows but run '{}' has {}",
                run.column,
                run.rows.len(),
                first.column,
                first.rows.len()
            )));
        }
    }

    let mut questions: Vec<QuestionTally> = Vec::new();
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();

    for (i, lead) in first.rows.iter().enumerate() {
        for run in &runs[1..] {
            let row = &run.rows[i];
            if row.question_id != lead.question_id {
                return Err(ChartError::schema(format!(
                    "question id at index {i} differs between '{}' ({}) and '{}' ({})",
                    first.column, lead.question_id, run.column, row.question_id
                )));
            }
            if row.raw_category != lead.raw_category {
                return Err(ChartError::schema(format!(
                    "question '{}' is '{}' in '{}' but '{}' in '{}'",
                    lead.question_id, lead.raw_category, first.column, row.raw_category, run.column
                )));
            }
        }

        let slot = *index.entry(lead.question_id.as_str()).or_insert_with(|| {
            questions.push(QuestionTally {
                question_id: lead.question_id.clone(),
                raw_category: lead.raw_category.clone(),
                correct: vec![0; runs.len()],
                total: 0,
            });
            questions.len() - 1
        });

        let tally = &mut questions[slot];
        for (s, run) in runs.iter().enumerate() {
            let verdict = Verdict::parse(&run.rows[i].verdict).map_err(|e| {
                ChartError::schema(format!(
                    "run '{}' row {i} (question '{}'): {}",
                    run.column,
                    lead.question_id,
                    e.message()
                ))
            })?;
            if verdict.is_correct() {
                tally.correct[s] += 1;
            }
        }
        tally.total += 1;
    }

    if let Some(expected) = trials {
        if let Some(q) = questions.iter().find(|q| q.total != expected) {
            return Err(ChartError::schema(format!(
                "question '{}' has {} attempts, expected {expected}",
                q.question_id, q.total
            )));
        }
    }

    Ok(TrialTally {
        columns: runs.iter().map(|r| r.column.clone()).collect(),
        questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(column: &str, verdicts: &[(&str, &str)]) -> SystemRun {
        SystemRun::new(
            column,
            verdicts
                .iter()
                .map(|(id, v)| TrialRow::new(*id, "yesno", *v))
                .collect(),
        )
    }

    #[test]
    fn test_verdict_parse_first_line() {
        assert_eq!(Verdict::parse(" yes \nbecause...").unwrap(), Verdict::Yes);
        assert_eq!(Verdict::parse("No").unwrap(), Verdict::No);
        assert!(Verdict::parse("maybe").is_err());
        assert!(Verdict::parse("").is_err());
    }

    #[test]
    fn test_tally_counts_per_question() {
        let linkq = run("linkq", &[("q1", "YES"), ("q1", "NO"), ("q1", "YES"), ("q2", "NO")]);
        let plain = run("plain", &[("q1", "NO"), ("q1", "NO"), ("q1", "YES"), ("q2", "YES")]);
        let tally = tally_trials(&[linkq, plain], None).unwrap();

        assert_eq!(tally.questions.len(), 2);
        assert_eq!(tally.questions[0].correct, vec![2, 1]);
        assert_eq!(tally.questions[0].total, 3);
        assert_eq!(tally.questions[1].correct, vec![0, 1]);
        assert_eq!(
            TrialTally::fraction_label(&tally.questions[0], 0).as_deref(),
            Some("2/3")
        );
        assert_eq!(
            tally.at_least_one_correct(),
            vec![("linkq".to_string(), 1), ("plain".to_string(), 2)]
        );
    }

    #[test]
    fn test_tally_to_raw_rows() {
        let linkq = run("linkq", &[("q1", "YES")]);
        let plain = run("plain", &[("q1", "NO")]);
        let rows = tally_trials(&[linkq, plain], Some(1)).unwrap().to_raw_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields["linkq"], "1");
        assert_eq!(rows[0].fields["plain"], "0");
        assert_eq!(rows[0].raw_category, "yesno");
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = run("a", &[("q1", "YES"), ("q1", "YES")]);
        let b = run("b", &[("q1", "YES")]);
        let err = tally_trials(&[a, b], None).unwrap_err();
        assert!(err.to_string().contains("rows"));
    }

    #[test]
    fn test_id_mismatch_rejected() {
        let a = run("a", &[("q1", "YES")]);
        let b = run("b", &[("q2", "YES")]);
        let err = tally_trials(&[a, b], None).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn test_bad_verdict_names_row() {
        let a = run("a", &[("q1", "YES"), ("q1", "perhaps")]);
        let err = tally_trials(&[a], None).unwrap_err();
        assert!(err.to_string().contains("row 1"));
        assert!(err.to_string().contains("PERHAPS"));
    }

    #[test]
    fn test_expected_trials_enforced() {
        let a = run("a", &[("q1", "YES"), ("q1", "YES"), ("q2", "NO")]);
        let err = tally_trials(&[a], Some(2)).unwrap_err();
        assert!(err.to_string().contains("'q2' has 1 attempts"));
    }

    #[test]
    fn test_no_runs() {
        assert!(tally_trials(&[], None).is_err());
    }
}
