//! Raw wide-format tables as handed over by the file collaborator.
//!
//! A [`WideTable`] is a rectangular grid of string cells with one header row.
//! One axis carries identifiers (instruments or sectors) and the other carries
//! dates; which is which is described by [`TableLayout`].

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Orientation of a wide table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableLayout {
    /// One row per identifier, date headers across the columns.
    #[default]
    IdentifiersAsRows,
    /// One row per date, identifiers across the columns.
    DatesAsRows,
}

/// A rectangular table of raw string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl WideTable {
    /// Create a table, checking that every row matches the header width.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyTable`] when there are no headers and
    /// [`DataError::RaggedRow`] when a row has the wrong number of cells.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let name = name.into();
        if headers.is_empty() {
            return Err(DataError::EmptyTable(name));
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != headers.len() {
                return Err(DataError::RaggedRow {
                    row,
                    expected: headers.len(),
                    actual: cells.len(),
                });
            }
        }
        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Read a table from CSV; the first record is the header.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(name, headers, rows)
    }

    /// Read a table from a CSV file, naming it after the file stem.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(name, file)
    }

    /// Table name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header cells.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Position of a header, matched exactly.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Swap rows and columns.
    ///
    /// The first header cell stays the corner label, the first column becomes
    /// the new header row, and every remaining original column becomes a row
    /// keyed by its original header.
    pub fn transpose(&self) -> Self {
        let mut headers = Vec::with_capacity(self.rows.len() + 1);
        headers.push(self.headers[0].clone());
        headers.extend(self.rows.iter().map(|row| row[0].clone()));

        let rows = (1..self.headers.len())
            .map(|j| {
                std::iter::once(self.headers[j].clone())
                    .chain(self.rows.iter().map(|row| row[j].clone()))
                    .collect()
            })
            .collect();

        Self {
            name: self.name.clone(),
            headers,
            rows,
        }
    }

    /// Return the table in identifiers-as-rows orientation.
    pub fn oriented(&self, layout: TableLayout) -> Self {
        match layout {
            TableLayout::IdentifiersAsRows => self.clone(),
            TableLayout::DatesAsRows => self.transpose(),
        }
    }

    /// Drop every row whose label in `column` equals `sentinel`.
    ///
    /// Synthetic aggregate rows are identified by label, never by position.
    pub fn without_label(&self, column: usize, sentinel: &str) -> Self {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .filter(|row| row[column].trim() != sentinel)
            .cloned()
            .collect();

        let dropped = self.rows.len() - rows.len();
        if dropped > 0 {
            tracing::debug!(table = %self.name, dropped, sentinel, "Dropped aggregate rows");
        }

        Self {
            name: self.name.clone(),
            headers: self.headers.clone(),
            rows,
        }
    }
}
