use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use indexmap::IndexSet;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use crate::error::Result;
use crate::table::Table;

/// An m × m matrix of score mass indexed by (true class, predicted class).
///
/// Each *column* is normalized to sum to 1: the entry at (t, p) is the share of
/// all mass assigned to predicted class `p` that came from samples whose true
/// class is `t`. This reads as "when the model predicts `p`, what were the
/// samples really?". It is not the more common per-true-class normalization,
/// so rows do not sum to 1. Columns of classes that received no mass are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: IndexSet<String>,
    matrix: Array2<f64>,
}

impl ConfusionMatrix {
    pub(crate) fn new(labels: IndexSet<String>, matrix: Array2<f64>) -> Self {
        debug_assert_eq!(matrix.dim(), (labels.len(), labels.len()));
        Self { labels, matrix }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }

    /// The raw matrix, rows are true classes and columns predicted classes.
    #[inline]
    pub fn values(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn get(&self, true_label: &str, predicted: &str) -> Option<f64> {
        let r = self.labels.get_index_of(true_label)?;
        let c = self.labels.get_index_of(predicted)?;
        Some(self.matrix[[r, c]])
    }

    /// Share of the mass predicted as `label` that truly belongs to `label`.
    pub fn precision(&self, label: &str) -> Option<f64> {
        self.get(label, label)
    }

    pub fn column_sums(&self) -> Array1<f64> {
        self.matrix.sum_axis(Axis(0))
    }

    /// The matrix as a table with a leading `label` column holding the true class.
    pub fn to_table(&self) -> Table {
        let columns = std::iter::once("label")
            .chain(self.labels())
            .map(str::to_owned)
            .collect();
        let rows = self
            .labels()
            .zip(self.matrix.rows())
            .map(|(label, row)| {
                std::iter::once(label.to_owned())
                    .chain(row.iter().map(f64::to_string))
                    .collect()
            })
            .collect();
        Table::from_parts(columns, rows)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.to_table().write(path)
    }
}

/// Header of a written [`AccuracyFrame`], in [`AccuracyRow`] field order.
pub const ACCURACY_COLUMNS: [&str; 5] = [
    "label",
    "sample_id",
    "prediction",
    "score",
    "score_for_prediction",
];

/// One evaluated sample of an [`AccuracyFrame`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRow {
    #[serde(rename = "label")]
    pub true_label: String,
    pub sample_id: String,
    #[serde(rename = "prediction")]
    pub predicted_label: String,
    /// Score of the true class, scaled by 100.
    #[serde(rename = "score")]
    pub score_for_true_label: f64,
    /// Highest score of the row, scaled by 100.
    #[serde(rename = "score_for_prediction")]
    pub score_for_predicted_label: f64,
}

impl AccuracyRow {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.true_label == self.predicted_label
    }
}

/// Per-sample predictions in the order the samples were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyFrame(Vec<AccuracyRow>);

impl AccuracyFrame {
    pub(crate) fn new(rows: Vec<AccuracyRow>) -> Self {
        Self(rows)
    }

    #[inline]
    pub fn rows(&self) -> &[AccuracyRow] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fraction of samples whose prediction is their true label.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.0.iter().filter(|row| row.is_hit()).count();
        hits as f64 / self.0.len() as f64
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        // the header goes out even when there are no rows
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(File::create(path)?));
        writer.write_record(ACCURACY_COLUMNS)?;
        for row in &self.0 {
            writer.serialize(row)?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), rows = self.len(), "wrote accuracy frame");
        Ok(())
    }
}
