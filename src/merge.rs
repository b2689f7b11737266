//! Update-or-insert of per-student fields into one assignment ledger.
//!
//! [`apply_update()`] is the pure in-memory merge: it grows the header when
//! the update names columns the ledger lacks, finds the student's row by a
//! trimmed case-insensitive Name match, and overwrites only the supplied
//! fields. [`record_update()`] wraps it with load-or-create and an atomic
//! save; [`record_batch()`] repeats that per student so one failure never
//! stops the rest of a batch.

use std::path::Path;

use log::{debug, info, warn};

use crate::{
    columns::{self, BASE_COLUMNS, FEEDBACK, NAME, OVERALL, SUBMISSION_TIME},
    error::{LedgerError, LedgerResult},
    ledger::Ledger,
};

/// A partial mapping of column name to new value. Base column names are
/// stored in their canonical spelling whatever case they were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    fields: Vec<(String, String)>,
}

impl FieldUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        let mut update = FieldUpdate::default();
        update.insert(NAME, name);
        update
    }

    /// Builds an update from raw (column, value) pairs, e.g. one row of an
    /// import file. Fails when no non-blank Name value is present.
    pub fn from_pairs<I, K, V>(pairs: I, source: &Path) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut update = FieldUpdate::default();
        for (column, value) in pairs {
            update.insert(column, value);
        }
        match update.name() {
            Some(name) if !name.trim().is_empty() => Ok(update),
            _ => Err(LedgerError::MissingName {
                path: source.to_path_buf(),
            }),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = canonical_column(column.into());
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn overall(self, value: impl Into<String>) -> Self {
        self.set(OVERALL, value)
    }

    pub fn feedback(self, value: impl Into<String>) -> Self {
        self.set(FEEDBACK, value)
    }

    pub fn submission_time(self, value: impl Into<String>) -> Self {
        self.set(SUBMISSION_TIME, value)
    }

    pub fn question(self, number: u32, value: impl Into<String>) -> Self {
        self.set(format!("Q{number}"), value)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

fn canonical_column(column: String) -> String {
    let trimmed = column.trim();
    BASE_COLUMNS
        .iter()
        .find(|base| base.eq_ignore_ascii_case(trimmed))
        .map(|base| base.to_string())
        .unwrap_or(column)
}

/// One student's marking result, independent of where the answers came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeEntry {
    pub name: String,
    /// Per-question grades in order; the first answer is Q1.
    pub answers: Vec<String>,
    pub overall: Option<String>,
    pub feedback: Option<String>,
    pub submission_time: Option<String>,
}

impl GradeEntry {
    /// Fields left as `None` are not part of the update and keep whatever
    /// the ledger already holds.
    pub fn into_update(self) -> FieldUpdate {
        let mut update = FieldUpdate::new(self.name);
        for (number, answer) in (1u32..).zip(self.answers) {
            update = update.question(number, answer);
        }
        if let Some(overall) = self.overall {
            update = update.overall(overall);
        }
        if let Some(feedback) = self.feedback {
            update = update.feedback(feedback);
        }
        if let Some(time) = self.submission_time {
            update = update.submission_time(time);
        }
        update
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub row: usize,
    pub created_row: bool,
    pub added_columns: Vec<String>,
}

/// Merges `update` into `ledger`. `source` only labels errors.
pub fn apply_update(
    ledger: &mut Ledger,
    update: &FieldUpdate,
    source: &Path,
) -> LedgerResult<MergeOutcome> {
    let name = update
        .name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| LedgerError::MissingName {
            path: source.to_path_buf(),
        })?;

    let mut added_columns = ensure_base_columns(ledger);
    added_columns.extend(insert_question_columns(ledger, update));
    for (column, _) in update.fields() {
        if ledger.find_column(column).is_none() {
            ledger.push_column(column.clone());
            added_columns.push(column.clone());
        }
    }

    let name_column = ledger
        .find_column(NAME)
        .ok_or_else(|| LedgerError::MalformedHeader {
            path: source.to_path_buf(),
            headers: ledger.headers().to_vec(),
        })?;
    let (row, created_row) = match ledger.find_row(name_column, name) {
        Some(row) => (row, false),
        None => (ledger.push_row(Vec::new()), true),
    };
    ledger.set(row, name_column, name);
    for (column, value) in update.fields() {
        if column == NAME {
            continue;
        }
        if let Some(idx) = ledger.find_column(column) {
            ledger.set(row, idx, value.clone());
        }
    }

    debug!(
        "Merged {} field(s) for '{}' into row {} of {:?} (new row: {}, new columns: {:?})",
        update.fields().len(),
        name,
        row,
        source,
        created_row,
        added_columns
    );
    Ok(MergeOutcome {
        row,
        created_row,
        added_columns,
    })
}

/// Inserts any missing base column right after its canonical predecessor, or
/// at the front for Name. A base column spelled in another case counts as
/// present and keeps its spelling.
fn ensure_base_columns(ledger: &mut Ledger) -> Vec<String> {
    let mut added = Vec::new();
    for (idx, base) in BASE_COLUMNS.iter().enumerate() {
        if ledger.find_column(base).is_some() {
            continue;
        }
        let position = idx
            .checked_sub(1)
            .and_then(|prev| ledger.find_column(BASE_COLUMNS[prev]))
            .map_or(0, |prev| prev + 1);
        ledger.insert_column(position, *base);
        added.push(base.to_string());
    }
    added
}

/// Inserts new numbered question columns so numbered questions stay in
/// ascending order: after the last question numbered at or below the new
/// one, else before the first higher one, else right after Overall.
fn insert_question_columns(ledger: &mut Ledger, update: &FieldUpdate) -> Vec<String> {
    let mut incoming = update
        .fields()
        .iter()
        .filter(|(column, _)| ledger.find_column(column).is_none())
        .filter_map(|(column, _)| columns::question_number(column).map(|n| (column, n)))
        .collect::<Vec<_>>();
    incoming.sort_by_key(|(_, number)| *number);

    let mut added = Vec::with_capacity(incoming.len());
    for (column, number) in incoming {
        let numbered = ledger
            .headers()
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| columns::question_number(header).map(|n| (idx, n)))
            .collect::<Vec<_>>();
        let after_lower = numbered
            .iter()
            .filter(|(_, n)| *n <= number)
            .map(|(idx, _)| idx + 1)
            .max();
        let before_higher = numbered
            .iter()
            .filter(|(_, n)| *n > number)
            .map(|(idx, _)| *idx)
            .min();
        let position = after_lower.or(before_higher).unwrap_or_else(|| {
            ledger
                .find_column(OVERALL)
                .map_or(ledger.headers().len(), |idx| idx + 1)
        });
        ledger.insert_column(position, column.clone());
        added.push(column.clone());
    }
    added
}

/// Loads (or creates) the ledger at `path`, merges `update`, and atomically
/// replaces the file.
pub fn record_update(path: &Path, delimiter: u8, update: &FieldUpdate) -> LedgerResult<MergeOutcome> {
    let mut ledger = Ledger::load_or_new(path, delimiter)?;
    let created_ledger = ledger.is_uninitialized();
    let outcome = apply_update(&mut ledger, update, path)?;
    ledger.save(path, delimiter)?;
    info!(
        "{} '{}' in {:?}{}",
        if outcome.created_row { "Added" } else { "Updated" },
        update.name().unwrap_or_default().trim(),
        path,
        if created_ledger { " (new ledger)" } else { "" }
    );
    Ok(outcome)
}

#[derive(Debug)]
pub struct BatchFailure {
    pub student: String,
    pub error: LedgerError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub applied: Vec<(String, MergeOutcome)>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies each update as its own atomic write; failures are collected and
/// the remaining students are still processed.
pub fn record_batch(path: &Path, delimiter: u8, updates: &[FieldUpdate]) -> BatchReport {
    let mut report = BatchReport::default();
    for update in updates {
        let student = update.name().unwrap_or_default().trim().to_string();
        match record_update(path, delimiter, update) {
            Ok(outcome) => report.applied.push((student, outcome)),
            Err(error) => {
                warn!("Skipping '{student}': {error}");
                report.failures.push(BatchFailure { student, error });
            }
        }
    }
    report
}
