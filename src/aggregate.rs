//! Cross-file aggregation of assignment ledgers into per-student timelines.
//!
//! Ledgers are collected keyed by assignment number and only combined in
//! [`Aggregator::finish()`], which walks them in ascending order. The
//! question-column union, the retained display names, and the student order
//! therefore depend only on the data, never on the order files were scanned.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    columns::LedgerLayout,
    course::{self, LedgerFile},
    error::{LedgerError, LedgerResult},
    identity::{IdentityKey, IdentityResolver, StudentIdentity},
    ledger::Ledger,
};

/// One student's row from one assignment ledger, projected onto roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// `None` when the ledger has no Overall column at all.
    pub overall: Option<String>,
    /// `None` when the ledger has no feedback column at all.
    pub feedback: Option<String>,
    pub submission_time: Option<String>,
    /// (column name as spelled in the ledger, value) in canonical order.
    pub questions: Vec<(String, String)>,
}

impl AssignmentRecord {
    fn from_row(headers: &[String], row: &[String], layout: &LedgerLayout) -> Self {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        AssignmentRecord {
            overall: layout.overall.map(cell),
            feedback: layout.feedback.map(cell),
            submission_time: layout.submission_time.map(cell),
            questions: layout
                .questions
                .iter()
                .map(|&idx| (headers[idx].clone(), cell(idx)))
                .collect(),
        }
    }

    /// Value of a question column, matched case-insensitively.
    pub fn question(&self, column: &str) -> Option<&str> {
        self.questions
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.questions
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, value)| value.as_str())
    }
}

/// Whether a student has a record for an assignment. A present record with
/// blank fields is still `Present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission<'a> {
    Missing,
    Present(&'a AssignmentRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentTimeline {
    pub identity: StudentIdentity,
    pub assignments: BTreeMap<u32, AssignmentRecord>,
}

impl StudentTimeline {
    pub fn submission(&self, number: u32) -> Submission<'_> {
        match self.assignments.get(&number) {
            Some(record) => Submission::Present(record),
            None => Submission::Missing,
        }
    }

    pub fn has_overall(&self) -> bool {
        self.assignments.values().any(|record| record.overall.is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Every assignment number that contributed a ledger, ascending.
    pub assignments: Vec<u32>,
    /// Union of question columns, in order of first appearance by assignment.
    pub question_columns: Vec<String>,
    /// Students sorted by case-insensitive display name.
    pub students: Vec<StudentTimeline>,
}

impl Aggregate {
    pub fn student(&self, key: &IdentityKey) -> Option<&StudentTimeline> {
        self.students.iter().find(|s| &s.identity.key == key)
    }
}

struct PendingLedger {
    source: PathBuf,
    layout: LedgerLayout,
    ledger: Ledger,
}

#[derive(Default)]
pub struct Aggregator {
    pending: BTreeMap<u32, PendingLedger>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one assignment's ledger. Fails with `MalformedHeader` when the
    /// ledger has no Name column; the aggregator is left unchanged. Returns
    /// `false` when the assignment number was already provided.
    pub fn add_ledger(&mut self, number: u32, source: &Path, ledger: Ledger) -> LedgerResult<bool> {
        let layout = LedgerLayout::resolve(ledger.headers(), source)?;
        if let Some(existing) = self.pending.get(&number) {
            warn!(
                "Ignoring {:?}: assignment {} already provided by {:?}",
                source, number, existing.source
            );
            return Ok(false);
        }
        self.pending.insert(
            number,
            PendingLedger {
                source: source.to_path_buf(),
                layout,
                ledger,
            },
        );
        Ok(true)
    }

    /// Question-column union over the ledgers queued so far.
    pub fn question_union(&self) -> Vec<String> {
        let mut union: Vec<String> = Vec::new();
        for pending in self.pending.values() {
            for &idx in &pending.layout.questions {
                let column = &pending.ledger.headers()[idx];
                if !union.iter().any(|seen| seen.eq_ignore_ascii_case(column)) {
                    union.push(column.clone());
                }
            }
        }
        union
    }

    pub fn finish(self) -> Aggregate {
        let question_columns = self.question_union();
        let mut resolver = IdentityResolver::new();
        let mut timelines: HashMap<IdentityKey, BTreeMap<u32, AssignmentRecord>> = HashMap::new();

        for (&number, pending) in &self.pending {
            let source = pending
                .source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| pending.source.display().to_string());
            let layout = &pending.layout;
            let headers = pending.ledger.headers();
            for (row_idx, row) in pending.ledger.rows().iter().enumerate() {
                let raw_name = row.get(layout.name).map(String::as_str).unwrap_or("");
                let raw_id = layout
                    .id
                    .and_then(|idx| row.get(idx))
                    .map(String::as_str)
                    .unwrap_or("");
                let identity = resolver.resolve(raw_name, raw_id, &source, row_idx);
                // Colliding identities within one ledger: the later row wins.
                timelines
                    .entry(identity.key)
                    .or_default()
                    .insert(number, AssignmentRecord::from_row(headers, row, layout));
            }
        }

        let mut students = timelines
            .into_iter()
            .filter_map(|(key, assignments)| {
                resolver.get(&key).cloned().map(|identity| StudentTimeline {
                    identity,
                    assignments,
                })
            })
            .collect::<Vec<_>>();
        students.sort_by(|a, b| {
            a.identity
                .label()
                .to_lowercase()
                .cmp(&b.identity.label().to_lowercase())
                .then_with(|| a.identity.key.cmp(&b.identity.key))
        });

        Aggregate {
            assignments: self.pending.keys().copied().collect(),
            question_columns,
            students,
        }
    }
}

/// Builds an aggregate from (assignment number, source, ledger) triples in any
/// order.
pub fn aggregate_ledgers<I>(ledgers: I) -> LedgerResult<Aggregate>
where
    I: IntoIterator<Item = (u32, PathBuf, Ledger)>,
{
    let mut aggregator = Aggregator::new();
    for (number, source, ledger) in ledgers {
        aggregator.add_ledger(number, &source, ledger)?;
    }
    Ok(aggregator.finish())
}

#[derive(Debug)]
pub struct LedgerFailure {
    pub path: PathBuf,
    pub error: LedgerError,
}

#[derive(Debug)]
pub struct AggregateRun {
    pub aggregate: Aggregate,
    pub sources: Vec<LedgerFile>,
    pub failures: Vec<LedgerFailure>,
}

/// Aggregates every `grades<N>.csv` in `course_dir`. A ledger that cannot be
/// read or has no Name column is reported in `failures` and skipped; only an
/// empty course fails outright.
pub fn aggregate_directory(course_dir: &Path, delimiter: u8) -> LedgerResult<AggregateRun> {
    let files = course::discover_ledgers(course_dir)?;
    let mut aggregator = Aggregator::new();
    let mut sources = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    for file in files {
        let loaded = Ledger::load(&file.path, delimiter)
            .and_then(|ledger| aggregator.add_ledger(file.number, &file.path, ledger));
        match loaded {
            Ok(_) => sources.push(file),
            Err(error) => {
                warn!("Skipping {:?}: {error}", file.path);
                failures.push(LedgerFailure {
                    path: file.path,
                    error,
                });
            }
        }
    }

    let aggregate = aggregator.finish();
    info!(
        "Aggregated {} student(s) across {} ledger(s) ({} skipped)",
        aggregate.students.len(),
        sources.len(),
        failures.len()
    );
    Ok(AggregateRun {
        aggregate,
        sources,
        failures,
    })
}
