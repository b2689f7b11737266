//! In-memory ledger: an explicit ordered header plus rows aligned to it.
//!
//! Rows are stored positionally, one `String` per header column, so a row can
//! never be sparse. Header growth goes through [`Ledger::insert_column()`],
//! which fills the new position on every existing row in the same step.

use std::{
    collections::HashSet,
    io::{Read, Write},
    path::Path,
};

use log::{debug, warn};

use crate::{
    error::{LedgerError, LedgerResult},
    io_utils,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = Ledger::new();
        for header in headers {
            ledger.push_column(header);
        }
        ledger
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A ledger with no header has never been written to.
    pub fn is_uninitialized(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Exact match first, then an ASCII case-insensitive one, so `name` and
    /// `OVERALL` resolve to the ledger's own spelling of a column.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.column_index(name).or_else(|| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        })
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn value_by_name(&self, row: usize, column: &str) -> Option<&str> {
        self.value(row, self.column_index(column)?)
    }

    /// Inserts `name` at `index` (clamped to the header length) and fills an
    /// empty value on every row. Returns the column's position; an existing
    /// column is left where it is.
    pub fn insert_column(&mut self, index: usize, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(existing) = self.column_index(&name) {
            return existing;
        }
        let index = index.min(self.headers.len());
        debug!("Inserting column '{name}' at position {index}");
        self.headers.insert(index, name);
        for row in &mut self.rows {
            row.insert(index, String::new());
        }
        index
    }

    pub fn push_column(&mut self, name: impl Into<String>) -> usize {
        let end = self.headers.len();
        self.insert_column(end, name)
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut values: Vec<String>) -> usize {
        values.resize(self.headers.len(), String::new());
        self.rows.push(values);
        self.rows.len() - 1
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Case-insensitive, trimmed lookup of a row by the value in `column`.
    pub fn find_row(&self, column: usize, needle: &str) -> Option<usize> {
        let needle = needle.trim().to_lowercase();
        self.rows.iter().position(|row| {
            row.get(column)
                .is_some_and(|value| value.trim().to_lowercase() == needle)
        })
    }

    pub fn load(path: &Path, delimiter: u8) -> LedgerResult<Self> {
        let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        Self::read_from(reader, path)
    }

    /// Loads `path`, or returns an uninitialized ledger when it does not exist.
    pub fn load_or_new(path: &Path, delimiter: u8) -> LedgerResult<Self> {
        match path.try_exists() {
            Ok(true) => Self::load(path, delimiter),
            Ok(false) => Ok(Ledger::new()),
            Err(err) => Err(LedgerError::io(path, err)),
        }
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8, source: &Path) -> LedgerResult<Self> {
        Self::read_from(io_utils::open_csv_reader(reader, delimiter), source)
    }

    fn read_from<R: Read>(mut reader: csv::Reader<R>, source: &Path) -> LedgerResult<Self> {
        let raw_headers = reader
            .headers()
            .map_err(|err| LedgerError::csv(source, err))?
            .clone();

        // A repeated column could not be written back without losing one copy.
        let mut seen = HashSet::new();
        let mut headers = Vec::with_capacity(raw_headers.len());
        for header in raw_headers.iter() {
            if !seen.insert(header) {
                return Err(LedgerError::DuplicateColumn {
                    path: source.to_path_buf(),
                    column: header.to_string(),
                });
            }
            headers.push(header.to_string());
        }

        let mut rows = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|err| LedgerError::csv(source, err))?;
            if record.len() > raw_headers.len() {
                warn!(
                    "Row {} in {:?} has {} cell(s) beyond the header; dropping them",
                    row_idx + 2,
                    source,
                    record.len() - raw_headers.len()
                );
            }
            let row = (0..headers.len())
                .map(|idx| record.get(idx).unwrap_or("").to_string())
                .collect::<Vec<_>>();
            rows.push(row);
        }
        Ok(Ledger { headers, rows })
    }

    pub fn write_to<W: Write>(&self, writer: W, delimiter: u8) -> csv::Result<()> {
        let mut writer = io_utils::csv_writer(writer, delimiter);
        if !self.headers.is_empty() {
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Replaces the file at `path` with this ledger in one atomic step.
    pub fn save(&self, path: &Path, delimiter: u8) -> LedgerResult<()> {
        io_utils::write_atomically(path, |out| {
            self.write_to(out, delimiter)
                .map_err(|err| LedgerError::csv(path, err))
        })
    }
}
