use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::scores::ScoreMatrix;
use crate::table::{CsvFormat, Table};

/// The concrete table type an object keeps as its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameKind {
    #[default]
    Table,
    Scores,
}

impl FrameKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Scores => "ScoreMatrix",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tabular data of one of the [`FrameKind`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Table(Table),
    Scores(ScoreMatrix),
}

impl Default for Frame {
    fn default() -> Self {
        Self::Table(Table::default())
    }
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Table(_) => FrameKind::Table,
            Self::Scores(_) => FrameKind::Scores,
        }
    }

    /// Interprets a freshly read table as a frame of `kind`.
    pub fn coerce(table: Table, kind: FrameKind) -> Result<Self> {
        Ok(match kind {
            FrameKind::Table => Self::Table(table),
            FrameKind::Scores => Self::Scores(ScoreMatrix::from_table(&table)?),
        })
    }

    pub fn write_to<W: Write>(&self, writer: W, format: &CsvFormat) -> Result<()> {
        match self {
            Self::Table(table) => table.write_to(writer, format),
            Self::Scores(scores) => scores.to_table()?.write_to(writer, format),
        }
    }
}

impl From<Table> for Frame {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<ScoreMatrix> for Frame {
    fn from(scores: ScoreMatrix) -> Self {
        Self::Scores(scores)
    }
}
