//! I/O utilities for ledger reading, writing, and delimiter resolution.
//!
//! All ledger file I/O in gradeledger flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Reader/writer construction**: `open_csv_reader`, `open_csv_writer`.
//! - **Atomic replace**: [`write_atomically()`] stages the full content in a
//!   sibling temporary file and renames it over the target, so an interrupted
//!   write leaves the previous version in place.
//! - **stdout**: the `-` path convention routes output through standard out.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use tempfile::NamedTempFile;

use crate::error::{LedgerError, LedgerResult};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Builds a reader that tolerates ragged rows; ledgers edited by hand often
/// have trailing cells missing.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> LedgerResult<csv::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|err| LedgerError::io(path, err))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn csv_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

/// Opens a writer on `path`, or stdout when `path` is `None` or `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

/// Writes the content produced by `fill` to a temporary file next to `path`
/// and renames it into place once everything has been flushed.
pub fn write_atomically<F>(path: &Path, fill: F) -> LedgerResult<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> LedgerResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|err| LedgerError::io(path, err))?;
    {
        let mut writer = BufWriter::new(&mut staged);
        fill(&mut writer)?;
        writer.flush().map_err(|err| LedgerError::io(path, err))?;
    }
    staged
        .as_file()
        .sync_all()
        .map_err(|err| LedgerError::io(path, err))?;
    staged
        .persist(path)
        .map_err(|err| LedgerError::io(path, err.error))?;
    Ok(())
}
