use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Settings for reading and writing delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvFormat {
    pub fn tab_separated() -> Self {
        Self { delimiter: b'\t' }
    }

    fn reader<R: Read>(&self, reader: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader)
    }

    fn writer<W: Write>(&self, writer: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer)
    }
}

/// A generic table: a header of column labels and rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Assembles a table whose rows are already known to match the header.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    /// Appends a row, which must have one cell per column.
    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) -> Result<()> {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(Error::LengthMismatch {
                axis: "columns",
                shape: (self.rows.len(), self.columns.len()),
                labels: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates over the cells of the named column.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Reads a table from delimited text whose first record is the header.
    pub fn read_from<R: Read>(reader: R, format: &CsvFormat) -> Result<Self> {
        let mut reader = format.reader(reader);
        let columns = reader.headers()?.iter().map(str::to_owned).collect();
        let rows = reader
            .records()
            .map(|record| Ok(record?.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>>>()?;
        Ok(Self { columns, rows })
    }

    /// Writes the header and every row as delimited text.
    pub fn write_to<W: Write>(&self, writer: W, format: &CsvFormat) -> Result<()> {
        // A header-less file reads back as a table without columns.
        if self.columns.is_empty() {
            return Ok(());
        }
        let mut writer = format.writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::read_with(path, &CsvFormat::default())
    }

    pub fn read_with(path: &Path, format: &CsvFormat) -> Result<Self> {
        let table = Self::read_from(BufReader::new(File::open(path)?), format)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "read table"
        );
        Ok(table)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.write_with(path, &CsvFormat::default())
    }

    pub fn write_with(&self, path: &Path, format: &CsvFormat) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path)?), format)?;
        tracing::debug!(
            path = %path.display(),
            rows = self.len(),
            columns = self.columns.len(),
            "wrote table"
        );
        Ok(())
    }
}
