//! Evaluation helpers for classifiers: turning a score matrix into a
//! confusion matrix and per-sample accuracy, and persisting run metadata and
//! tabular data as paired files.

pub mod error;
pub mod metrics;
pub mod persist;
pub mod scores;
pub mod table;

pub use error::{Error, Result};
pub use metrics::{AccuracyFrame, AccuracyRow, ConfusionMatrix};
pub use persist::{
    DataProperty, Frame, FrameKind, FrameRecord, MetaValue, Metadata, MetadataPolicy,
    MetadataRecord, MetadataStore, Persistable, TabularRecord, TabularStore,
};
pub use scores::ScoreMatrix;
pub use table::{CsvFormat, Table};
