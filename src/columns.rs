//! Column classification and role resolution for ledger headers.
//!
//! A ledger's header mixes four base columns (Name, SubmissionTime, Feedback,
//! Overall) with a variable set of per-question grade columns. This module
//! owns the pure classifier ([`classify_question()`]), the canonical ordering
//! of question columns ([`question_columns()`]), and [`LedgerLayout`], which
//! maps each role to a header position once per ledger so downstream code
//! never re-runs name heuristics per row.
//!
//! The `columns` command at the bottom of the file prints the classification
//! of a ledger's header.

use std::{collections::HashSet, path::Path, sync::LazyLock};

use anyhow::{Context, Result};
use log::info;
use regex::Regex;

use crate::{
    cli::ColumnsArgs,
    error::{LedgerError, LedgerResult},
    io_utils,
    ledger::Ledger,
    table,
};

pub const NAME: &str = "Name";
pub const SUBMISSION_TIME: &str = "SubmissionTime";
pub const FEEDBACK: &str = "Feedback";
pub const OVERALL: &str = "Overall";

/// Base header in canonical order.
pub const BASE_COLUMNS: [&str; 4] = [NAME, SUBMISSION_TIME, FEEDBACK, OVERALL];

const NAME_ALIASES: &[&str] = &["Name", "Student", "Full Name", "Student Name"];
const ID_ALIASES: &[&str] = &["ID", "StudentID", "Student Id", "Student Number", "Username"];
const OVERALL_ALIASES: &[&str] = &["Overall", "Overall grade", "Grade"];
const FEEDBACK_ALIASES: &[&str] = &["Feedback", "Comments", "Comment", "Instructor Comments"];
const SUBMISSION_ALIASES: &[&str] = &["SubmissionTime", "Submission Time", "Submitted"];

static NUMBERED_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:question|q)\s*[_\-]?\s*([0-9]+)").expect("question pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionClass {
    Numbered(u32),
    Unordered,
    NotAQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Name,
    SubmissionTime,
    Feedback,
    Overall,
    Question(u32),
    UnnumberedQuestion,
    Other,
}

impl ColumnKind {
    pub fn is_base(&self) -> bool {
        matches!(
            self,
            ColumnKind::Name | ColumnKind::SubmissionTime | ColumnKind::Feedback | ColumnKind::Overall
        )
    }

    pub fn label(&self) -> String {
        match self {
            ColumnKind::Name => "name".to_string(),
            ColumnKind::SubmissionTime => "submission-time".to_string(),
            ColumnKind::Feedback => "feedback".to_string(),
            ColumnKind::Overall => "overall".to_string(),
            ColumnKind::Question(n) => format!("question {n}"),
            ColumnKind::UnnumberedQuestion => "question (unnumbered)".to_string(),
            ColumnKind::Other => "other".to_string(),
        }
    }
}

/// Classifies a header name by the question heuristic alone.
///
/// A numeral must directly follow a `q` or `question` token, optionally
/// separated by whitespace, `_` or `-`. Names that only contain a `q`
/// somewhere are unnumbered questions.
pub fn classify_question(name: &str) -> QuestionClass {
    let numbered = NUMBERED_QUESTION
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok());
    match numbered {
        Some(number) => QuestionClass::Numbered(number),
        None if name.to_lowercase().contains('q') => QuestionClass::Unordered,
        None => QuestionClass::NotAQuestion,
    }
}

pub fn classify_column(name: &str) -> ColumnKind {
    let trimmed = name.trim();
    for (base, kind) in BASE_COLUMNS.iter().zip([
        ColumnKind::Name,
        ColumnKind::SubmissionTime,
        ColumnKind::Feedback,
        ColumnKind::Overall,
    ]) {
        if trimmed.eq_ignore_ascii_case(base) {
            return kind;
        }
    }
    match classify_question(trimmed) {
        QuestionClass::Numbered(n) => ColumnKind::Question(n),
        QuestionClass::Unordered => ColumnKind::UnnumberedQuestion,
        QuestionClass::NotAQuestion => ColumnKind::Other,
    }
}

/// Question number of a column, if it is a numbered question column.
pub fn question_number(name: &str) -> Option<u32> {
    match classify_column(name) {
        ColumnKind::Question(n) => Some(n),
        _ => None,
    }
}

/// Returns the question columns of `headers` in canonical order: numbered
/// columns ascending (stable on ties), then unnumbered ones in input order.
pub fn question_columns<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    question_positions(headers, &HashSet::new())
        .into_iter()
        .map(|idx| headers[idx].as_ref().to_string())
        .collect()
}

fn question_positions<S: AsRef<str>>(headers: &[S], excluded: &HashSet<usize>) -> Vec<usize> {
    let mut numbered = Vec::new();
    let mut unordered = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if excluded.contains(&idx) {
            continue;
        }
        match classify_column(header.as_ref()) {
            ColumnKind::Question(n) => numbered.push((idx, n)),
            ColumnKind::UnnumberedQuestion => unordered.push(idx),
            _ => {}
        }
    }
    numbered.sort_by_key(|(_, n)| *n);
    numbered
        .into_iter()
        .map(|(idx, _)| idx)
        .chain(unordered)
        .collect()
}

/// Header positions of each role in one ledger, resolved once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLayout {
    pub name: usize,
    pub id: Option<usize>,
    pub overall: Option<usize>,
    pub feedback: Option<usize>,
    pub submission_time: Option<usize>,
    /// Question column positions in canonical order.
    pub questions: Vec<usize>,
}

impl LedgerLayout {
    pub fn resolve(headers: &[String], path: &Path) -> LedgerResult<Self> {
        let mut claimed = HashSet::new();
        let name = choose_column(headers, NAME_ALIASES, &mut claimed).ok_or_else(|| {
            LedgerError::MalformedHeader {
                path: path.to_path_buf(),
                headers: headers.to_vec(),
            }
        })?;
        let id = choose_column(headers, ID_ALIASES, &mut claimed);
        let overall = choose_column(headers, OVERALL_ALIASES, &mut claimed);
        let feedback = choose_column(headers, FEEDBACK_ALIASES, &mut claimed);
        let submission_time = choose_column(headers, SUBMISSION_ALIASES, &mut claimed);
        let questions = question_positions(headers, &claimed);
        Ok(LedgerLayout {
            name,
            id,
            overall,
            feedback,
            submission_time,
            questions,
        })
    }
}

/// Exact case-insensitive match over the candidates first, then substring
/// match for aliases longer than two characters. Columns already claimed by
/// another role are skipped.
fn choose_column(
    headers: &[String],
    candidates: &[&str],
    claimed: &mut HashSet<usize>,
) -> Option<usize> {
    let lowered = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect::<Vec<_>>();
    let found = candidates
        .iter()
        .find_map(|candidate| {
            let candidate = candidate.to_lowercase();
            lowered
                .iter()
                .enumerate()
                .find(|(idx, header)| !claimed.contains(idx) && **header == candidate)
                .map(|(idx, _)| idx)
        })
        .or_else(|| {
            // Short aliases such as `ID` only ever match exactly.
            candidates.iter().filter(|c| c.len() > 2).find_map(|candidate| {
                let candidate = candidate.to_lowercase();
                lowered
                    .iter()
                    .enumerate()
                    .find(|(idx, header)| !claimed.contains(idx) && header.contains(&candidate))
                    .map(|(idx, _)| idx)
            })
        })?;
    claimed.insert(found);
    Some(found)
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let ledger = Ledger::load(&args.input, delimiter)
        .with_context(|| format!("Loading ledger {:?}", args.input))?;
    let order = question_columns(ledger.headers());

    let rows = ledger
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let position = order
                .iter()
                .position(|q| q == header)
                .map(|p| (p + 1).to_string())
                .unwrap_or_default();
            vec![
                (idx + 1).to_string(),
                header.clone(),
                classify_column(header).label(),
                position,
            ]
        })
        .collect::<Vec<_>>();
    let headers = vec![
        "#".to_string(),
        "column".to_string(),
        "kind".to_string(),
        "question order".to_string(),
    ];
    table::print_table(&headers, &rows);
    info!(
        "Listed {} column(s) ({} question column(s)) from {:?}",
        ledger.headers().len(),
        order.len(),
        args.input
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn classify_question_handles_naming_variants() {
        assert_eq!(classify_question("Q1"), QuestionClass::Numbered(1));
        assert_eq!(classify_question("question_10"), QuestionClass::Numbered(10));
        assert_eq!(classify_question("Q_2"), QuestionClass::Numbered(2));
        assert_eq!(classify_question("Question 3"), QuestionClass::Numbered(3));
        assert_eq!(classify_question("q-4"), QuestionClass::Numbered(4));
        assert_eq!(classify_question("Score3"), QuestionClass::NotAQuestion);
        assert_eq!(classify_question("Quiz"), QuestionClass::Unordered);
        assert_eq!(classify_question("Bonus question"), QuestionClass::Unordered);
    }

    #[test]
    fn classify_question_treats_overflowing_numbers_as_unnumbered() {
        assert_eq!(
            classify_question("Q99999999999999999999"),
            QuestionClass::Unordered
        );
    }

    #[test]
    fn base_columns_are_never_questions() {
        assert_eq!(classify_column("Name"), ColumnKind::Name);
        assert_eq!(classify_column("overall"), ColumnKind::Overall);
        assert_eq!(classify_column("SubmissionTime"), ColumnKind::SubmissionTime);
        assert_eq!(classify_column("Feedback"), ColumnKind::Feedback);
        assert!(question_columns(&BASE_COLUMNS).is_empty());
    }

    #[test]
    fn question_columns_sort_numbered_then_unnumbered() {
        let headers = strings(&[
            "Name", "Q10", "Quiz", "Q2", "Overall", "question 1", "Equation", "Score3",
        ]);
        assert_eq!(
            question_columns(&headers),
            strings(&["question 1", "Q2", "Q10", "Quiz", "Equation"])
        );
    }

    #[test]
    fn question_columns_keep_input_order_on_ties() {
        let headers = strings(&["q1", "Q1", "Question1"]);
        assert_eq!(question_columns(&headers), headers);
    }

    #[test]
    fn layout_resolves_aliases_and_excludes_roles_from_questions() {
        let headers = strings(&["Student Name", "Username", "Grade", "Comments", "Q2", "Q1"]);
        let layout = LedgerLayout::resolve(&headers, Path::new("grades1.csv")).unwrap();
        assert_eq!(layout.name, 0);
        assert_eq!(layout.id, Some(1));
        assert_eq!(layout.overall, Some(2));
        assert_eq!(layout.feedback, Some(3));
        assert_eq!(layout.submission_time, None);
        assert_eq!(layout.questions, vec![5, 4]);
    }

    #[test]
    fn short_aliases_never_match_by_substring() {
        let headers = strings(&["Name", "Provided late", "Student Number (old)"]);
        let layout = LedgerLayout::resolve(&headers, Path::new("grades1.csv")).unwrap();
        assert_eq!(layout.id, Some(2));
    }

    #[test]
    fn layout_without_name_column_is_malformed() {
        let headers = strings(&["Overall", "Q1"]);
        let err = LedgerLayout::resolve(&headers, Path::new("grades3.csv")).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedHeader { .. }));
        assert!(err.to_string().contains("grades3.csv"));
    }
}
