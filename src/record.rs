use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::Local;
use log::{debug, info, warn};

use crate::{
    cli::{ImportArgs, RecordArgs},
    columns::NAME,
    course,
    error::LedgerError,
    io_utils,
    merge::{self, FieldUpdate, GradeEntry},
    printable_delimiter,
};

const SUBMISSION_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn execute_record(args: &RecordArgs) -> Result<()> {
    let (number, path) = resolve_ledger_path(&args.course, args.assignment)?;
    let delimiter = io_utils::resolve_input_delimiter(&path, args.delimiter);

    let feedback = match &args.feedback_file {
        Some(file) => Some(
            fs::read_to_string(file)
                .with_context(|| format!("Reading feedback from {file:?}"))?,
        ),
        None => args.feedback.clone(),
    };
    let submission_time = if args.stamp_now {
        Some(Local::now().format(SUBMISSION_STAMP_FORMAT).to_string())
    } else {
        args.submission_time.clone()
    };

    let mut update = GradeEntry {
        name: args.name.clone(),
        answers: args.questions.clone(),
        overall: args.overall.clone(),
        feedback,
        submission_time,
    }
    .into_update();
    for (column, value) in &args.fields {
        update.insert(column.clone(), value.clone());
    }

    let outcome = merge::record_update(&path, delimiter, &update)
        .with_context(|| format!("Recording assignment {number} for '{}'", args.name.trim()))?;
    if !outcome.added_columns.is_empty() {
        info!("Added column(s) {:?} to {:?}", outcome.added_columns, path);
    }
    Ok(())
}

pub fn execute_import(args: &ImportArgs) -> Result<()> {
    let (number, path) = resolve_ledger_path(&args.course, args.assignment)?;
    let delimiter = io_utils::resolve_input_delimiter(&path, args.delimiter);
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input, args.input_delimiter);
    info!(
        "Importing '{}' (delimiter '{}') into assignment {number}",
        args.input.display(),
        printable_delimiter(input_delimiter)
    );

    let updates = read_updates(&args.input, input_delimiter)?;
    let mut rejected = updates.rejected;
    let report = merge::record_batch(&path, delimiter, &updates.accepted);
    rejected += report.failures.len();

    info!(
        "Imported {} of {} row(s) into {:?}",
        report.applied.len(),
        updates.total,
        path
    );
    if rejected > 0 {
        bail!(
            "{rejected} of {} row(s) from {:?} could not be recorded",
            updates.total,
            args.input
        );
    }
    Ok(())
}

struct ImportRows {
    accepted: Vec<FieldUpdate>,
    rejected: usize,
    total: usize,
}

/// Reads one update per row. Blank cells are left out of the update so they
/// never clear existing values; rows without a name are counted as rejected.
fn read_updates(input: &Path, delimiter: u8) -> Result<ImportRows> {
    let mut reader = io_utils::open_csv_reader_from_path(input, delimiter)
        .with_context(|| format!("Opening import file {input:?}"))?;
    let headers = reader
        .headers()
        .map_err(|err| LedgerError::csv(input, err))
        .with_context(|| format!("Reading header of {input:?}"))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = ImportRows {
        accepted: Vec::new(),
        rejected: 0,
        total: 0,
    };
    for (idx, record) in reader.records().enumerate() {
        let record = record
            .map_err(|err| LedgerError::csv(input, err))
            .with_context(|| format!("Reading row {} of {input:?}", idx + 2))?;
        rows.total += 1;
        let pairs = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, value)| {
                header.eq_ignore_ascii_case(NAME) || !value.trim().is_empty()
            })
            .map(|(header, value)| (header.clone(), value.to_string()));
        match FieldUpdate::from_pairs(pairs, input) {
            Ok(update) => rows.accepted.push(update),
            Err(err) => {
                warn!("Skipping row {}: {err}", idx + 2);
                rows.rejected += 1;
            }
        }
    }
    debug!(
        "Read {} update(s) from {:?} ({} rejected)",
        rows.accepted.len(),
        input,
        rows.rejected
    );
    Ok(rows)
}

/// Picks the ledger file for an assignment, preferring an existing file
/// whatever its spelling, else `grades<N>.csv` in the course directory.
fn resolve_ledger_path(course_dir: &Path, assignment: Option<u32>) -> Result<(u32, PathBuf)> {
    if !course_dir.is_dir() {
        bail!("Course directory {course_dir:?} does not exist");
    }
    let existing = match course::discover_ledgers(course_dir) {
        Ok(files) => files,
        Err(LedgerError::MissingLedger { .. }) => Vec::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("Scanning course directory {course_dir:?}"));
        }
    };
    let number = assignment
        .or_else(|| existing.last().map(|file| file.number))
        .unwrap_or(1);
    let path = existing
        .into_iter()
        .find(|file| file.number == number)
        .map(|file| file.path)
        .unwrap_or_else(|| course::ledger_path(course_dir, number));
    debug!("Assignment {number} uses ledger {:?}", path);
    Ok((number, path))
}
