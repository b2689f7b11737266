//! Abstract report tables and feedback sections for an external renderer.
//!
//! Nothing here escapes text for any target format. Each cell is tagged
//! instead: [`Cell::Verbatim`] still needs escaping, [`Cell::PreEncoded`] is
//! already target markup (grade symbols from [`crate::grade`]). Reports
//! serialize to JSON for hand-off and render as aligned text for the terminal.

use std::{fmt::Write as _, path::Path, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::{
    aggregate::{Aggregate, StudentTimeline, Submission},
    columns::LedgerLayout,
    error::LedgerResult,
    grade,
    identity::UNNAMED,
    ledger::Ledger,
    table,
};

pub const NO_SUBMISSION: &str = "(no submission)";
pub const NO_FEEDBACK: &str = "(no feedback)";
pub const ASSIGNMENT_HEADER: &str = "PS";

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "kebab-case")]
pub enum Cell {
    Verbatim(String),
    PreEncoded(String),
}

impl Cell {
    pub fn verbatim(text: impl Into<String>) -> Self {
        Cell::Verbatim(text.into())
    }

    /// Runs a grade value through the symbol codec.
    pub fn grade(raw: &str) -> Self {
        let encoded = grade::encode(raw.trim());
        if encoded.pre_encoded {
            Cell::PreEncoded(encoded.display.into_owned())
        } else {
            Cell::Verbatim(encoded.display.into_owned())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Cell::Verbatim(text) | Cell::PreEncoded(text) => text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn render_text(&self) -> String {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.text().to_string()).collect())
            .collect::<Vec<Vec<String>>>();
        table::render_table(&self.headers, &rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "kebab-case")]
pub enum Inline {
    Text(String),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Paragraph(pub Vec<Inline>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "paragraphs", rename_all = "kebab-case")]
pub enum FeedbackBlock {
    NoSubmission,
    NoFeedback,
    Paragraphs(Vec<Paragraph>),
}

impl FeedbackBlock {
    /// Splits free text on blank lines into paragraphs; single line breaks
    /// inside a paragraph become [`Inline::LineBreak`].
    pub fn from_text(text: Option<&str>) -> Self {
        let normalized = text.unwrap_or_default().replace("\r\n", "\n").replace('\r', "\n");
        let paragraphs = PARAGRAPH_BREAK
            .split(&normalized)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                let mut inlines = Vec::new();
                for (idx, line) in p.split('\n').enumerate() {
                    if idx > 0 {
                        inlines.push(Inline::LineBreak);
                    }
                    inlines.push(Inline::Text(line.to_string()));
                }
                Paragraph(inlines)
            })
            .collect::<Vec<_>>();
        if paragraphs.is_empty() {
            FeedbackBlock::NoFeedback
        } else {
            FeedbackBlock::Paragraphs(paragraphs)
        }
    }

    fn render_text(&self, out: &mut String) {
        match self {
            FeedbackBlock::NoSubmission => {
                let _ = writeln!(out, "{NO_SUBMISSION}");
            }
            FeedbackBlock::NoFeedback => {
                let _ = writeln!(out, "{NO_FEEDBACK}");
            }
            FeedbackBlock::Paragraphs(paragraphs) => {
                for (idx, Paragraph(inlines)) in paragraphs.iter().enumerate() {
                    if idx > 0 {
                        out.push('\n');
                    }
                    for inline in inlines {
                        match inline {
                            Inline::Text(text) => out.push_str(text),
                            Inline::LineBreak => out.push('\n'),
                        }
                    }
                    out.push('\n');
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFeedback {
    pub student: String,
    pub feedback: FeedbackBlock,
}

/// Per-assignment report: one grades table and one feedback entry per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentReport {
    pub assignment: u32,
    pub grades: Table,
    pub feedback: Vec<StudentFeedback>,
}

impl AssignmentReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Grades");
        out.push_str(&self.grades.render_text());
        let _ = writeln!(out, "\nFeedback");
        for entry in &self.feedback {
            let _ = writeln!(out, "\n{}", entry.student);
            entry.feedback.render_text(&mut out);
        }
        out
    }
}

pub fn assignment_report(number: u32, ledger: &Ledger, source: &Path) -> LedgerResult<AssignmentReport> {
    let layout = LedgerLayout::resolve(ledger.headers(), source)?;
    let headers = ledger.headers();

    let mut grade_columns = Vec::new();
    grade_columns.extend(layout.overall);
    grade_columns.extend(layout.questions.iter().copied());

    let mut table = Table {
        headers: std::iter::once(layout.name)
            .chain(grade_columns.iter().copied())
            .map(|idx| headers[idx].clone())
            .collect(),
        rows: Vec::with_capacity(ledger.row_count()),
    };
    let mut feedback = Vec::with_capacity(ledger.row_count());

    for row in ledger.rows() {
        let name = row
            .get(layout.name)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED)
            .to_string();
        let mut cells = vec![Cell::verbatim(name.clone())];
        cells.extend(
            grade_columns
                .iter()
                .map(|&idx| Cell::grade(row.get(idx).map(String::as_str).unwrap_or(""))),
        );
        table.rows.push(cells);
        feedback.push(StudentFeedback {
            student: name,
            feedback: FeedbackBlock::from_text(
                layout.feedback.and_then(|idx| row.get(idx)).map(String::as_str),
            ),
        });
    }

    Ok(AssignmentReport {
        assignment: number,
        grades: table,
        feedback,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentFeedback {
    pub assignment: u32,
    pub feedback: FeedbackBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSection {
    pub name: String,
    pub id: Option<String>,
    pub marks: Table,
    pub feedback: Vec<AssignmentFeedback>,
}

/// Cross-term report: one section per student in aggregate order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermReport {
    pub assignments: Vec<u32>,
    pub students: Vec<StudentSection>,
}

impl TermReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (idx, section) in self.students.iter().enumerate() {
            if idx > 0 {
                let _ = writeln!(out, "\n{}\n", "=".repeat(40));
            }
            match &section.id {
                Some(id) => {
                    let _ = writeln!(out, "{} [{}]", section.name, id);
                }
                None => {
                    let _ = writeln!(out, "{}", section.name);
                }
            }
            let _ = writeln!(out, "\nMarks");
            out.push_str(&section.marks.render_text());
            let _ = writeln!(out, "\nFeedback");
            for entry in &section.feedback {
                let _ = writeln!(out, "\nProblem Sheet {}", entry.assignment);
                entry.feedback.render_text(&mut out);
            }
        }
        out
    }
}

pub fn term_report(aggregate: &Aggregate) -> TermReport {
    TermReport {
        assignments: aggregate.assignments.clone(),
        students: aggregate
            .students
            .iter()
            .map(|student| student_section(aggregate, student))
            .collect(),
    }
}

fn student_section(aggregate: &Aggregate, student: &StudentTimeline) -> StudentSection {
    let with_overall = student.has_overall();
    let mut headers = vec![ASSIGNMENT_HEADER.to_string()];
    if with_overall {
        headers.push("Overall".to_string());
    }
    headers.extend(aggregate.question_columns.iter().cloned());

    let mut rows = Vec::with_capacity(aggregate.assignments.len());
    let mut feedback = Vec::with_capacity(aggregate.assignments.len());
    for &number in &aggregate.assignments {
        let mut cells = vec![Cell::verbatim(number.to_string())];
        match student.submission(number) {
            Submission::Present(record) => {
                if with_overall {
                    cells.push(
                        record
                            .overall
                            .as_deref()
                            .map_or_else(|| Cell::verbatim(""), Cell::grade),
                    );
                }
                cells.extend(aggregate.question_columns.iter().map(|column| {
                    record
                        .question(column)
                        .map_or_else(|| Cell::verbatim(""), Cell::grade)
                }));
                feedback.push(AssignmentFeedback {
                    assignment: number,
                    feedback: FeedbackBlock::from_text(record.feedback.as_deref()),
                });
            }
            Submission::Missing => {
                cells.resize(headers.len(), Cell::verbatim(""));
                feedback.push(AssignmentFeedback {
                    assignment: number,
                    feedback: FeedbackBlock::NoSubmission,
                });
            }
        }
        rows.push(cells);
    }

    StudentSection {
        name: student.identity.label().to_string(),
        id: student.identity.id.clone(),
        marks: Table { headers, rows },
        feedback,
    }
}
