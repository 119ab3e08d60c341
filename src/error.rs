use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("number of {axis} of matrix of shape {shape:?} is not the number of labels {labels}")]
    LengthMismatch {
        axis: &'static str,
        shape: (usize, usize),
        labels: usize,
    },

    #[error("true label {label:?} of sample {sample_id:?} is not one of the class labels")]
    UnknownLabel { label: String, sample_id: String },

    #[error("frame of kind {found} is not a {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{operation} is not implemented for {type_name}")]
    NotImplemented {
        operation: &'static str,
        type_name: &'static str,
    },

    #[error("missing index column {column:?}")]
    MissingColumn { column: &'static str },

    #[error("invalid score {value:?} at row {row}, column {column:?}")]
    InvalidScore {
        value: String,
        row: usize,
        column: String,
    },

    #[error("value {value} of {key:?} is not a date/time")]
    InvalidTimestamp { key: String, value: String },

    #[error("path {} has no file name", .path.display())]
    InvalidPath { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}
