use std::path::Path;

use indexmap::IndexSet;
use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Error, Result};
use crate::metrics::{AccuracyFrame, AccuracyRow, ConfusionMatrix};
use crate::table::{CsvFormat, Table};

/// Name of the persisted column holding each sample's true label.
pub const LABEL_COLUMN: &str = "label";
/// Name of the persisted column holding each sample's identifier.
pub const SAMPLE_ID_COLUMN: &str = "sample_id";

/// An n × m matrix of classifier scores: one row per evaluated sample, one
/// column per candidate class.
///
/// Rows are keyed by the pair (true label, sample id) and columns by the
/// class labels. Scores are used as given, nothing is normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    true_labels: Vec<String>,
    sample_ids: Vec<String>,
    class_labels: Vec<String>,
    scores: Array2<f64>,
}

impl ScoreMatrix {
    /// Wraps the raw output of a classifier with its row and column labels.
    ///
    /// Lengths are not checked here; [`confusion`](Self::confusion) and
    /// [`accuracy`](Self::accuracy) fail with [`Error::LengthMismatch`] if the
    /// labels do not fit the matrix.
    pub fn build<L, C, I>(
        true_labels: impl IntoIterator<Item = L>,
        class_labels: impl IntoIterator<Item = C>,
        scores: Array2<f64>,
        sample_ids: impl IntoIterator<Item = I>,
    ) -> Self
    where
        L: Into<String>,
        C: Into<String>,
        I: ToString,
    {
        Self {
            true_labels: true_labels.into_iter().map(Into::into).collect(),
            sample_ids: sample_ids.into_iter().map(|id| id.to_string()).collect(),
            class_labels: class_labels.into_iter().map(Into::into).collect(),
            scores,
        }
    }

    #[inline]
    pub fn true_labels(&self) -> &[String] {
        &self.true_labels
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    #[inline]
    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    #[inline]
    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// (rows, columns) of the score matrix.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.scores.dim()
    }

    fn check_shape(&self) -> Result<()> {
        let shape = self.shape();
        for labels in [self.true_labels.len(), self.sample_ids.len()] {
            if labels != shape.0 {
                return Err(Error::LengthMismatch {
                    axis: "rows",
                    shape,
                    labels,
                });
            }
        }
        if self.class_labels.len() != shape.1 {
            return Err(Error::LengthMismatch {
                axis: "columns",
                shape,
                labels: self.class_labels.len(),
            });
        }
        Ok(())
    }

    fn unknown_label(&self, row: usize) -> Error {
        Error::UnknownLabel {
            label: self.true_labels[row].clone(),
            sample_id: self.sample_ids[row].clone(),
        }
    }

    /// Sums the scores of every sample into an m × m matrix keyed by
    /// (true class, predicted class), then divides each column by its total.
    ///
    /// Normalization is per *predicted* class, see [`ConfusionMatrix`].
    pub fn confusion(&self) -> Result<ConfusionMatrix> {
        self.check_shape()?;

        let mut labels = IndexSet::with_capacity(self.class_labels.len());
        let columns: Vec<usize> = self
            .class_labels
            .iter()
            .map(|label| labels.insert_full(label.clone()).0)
            .collect();

        let mut matrix = Array2::<f64>::zeros((labels.len(), labels.len()));
        for (r, row) in self.scores.rows().into_iter().enumerate() {
            let t = labels
                .get_index_of(self.true_labels[r].as_str())
                .ok_or_else(|| self.unknown_label(r))?;
            for (&c, &score) in columns.iter().zip(row) {
                matrix[[t, c]] += score;
            }
        }

        let totals = matrix.sum_axis(Axis(0));
        for (label, total) in labels.iter().zip(&totals) {
            if *total == 0.0 {
                tracing::warn!(label = %label, "no score mass predicted for class");
            }
        }
        matrix /= &totals;

        Ok(ConfusionMatrix::new(labels, matrix))
    }

    /// Takes the highest-scoring class of each sample as its prediction.
    ///
    /// Ties go to the first class in column order and NaN scores are skipped.
    /// Both reported scores are scaled by 100.
    pub fn accuracy(&self) -> Result<AccuracyFrame> {
        self.check_shape()?;

        let rows = self
            .scores
            .rows()
            .into_iter()
            .enumerate()
            .map(|(r, row)| {
                let truth = self
                    .class_labels
                    .iter()
                    .position(|label| *label == self.true_labels[r])
                    .ok_or_else(|| self.unknown_label(r))?;
                let (predicted, best) = argmax(row).unwrap_or((truth, f64::NAN));
                Ok(AccuracyRow {
                    true_label: self.true_labels[r].clone(),
                    sample_id: self.sample_ids[r].clone(),
                    predicted_label: self.class_labels[predicted].clone(),
                    score_for_true_label: row[truth] * 100.0,
                    score_for_predicted_label: best * 100.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AccuracyFrame::new(rows))
    }

    /// Rebuilds a score matrix from a table with `label` and `sample_id`
    /// columns; every other column is a class.
    pub fn from_table(table: &Table) -> Result<Self> {
        let label_idx = table.column_index(LABEL_COLUMN).ok_or(Error::MissingColumn {
            column: LABEL_COLUMN,
        })?;
        let id_idx = table
            .column_index(SAMPLE_ID_COLUMN)
            .ok_or(Error::MissingColumn {
                column: SAMPLE_ID_COLUMN,
            })?;
        let class_columns: Vec<usize> = (0..table.columns().len())
            .filter(|&c| c != label_idx && c != id_idx)
            .collect();

        let mut scores = Array2::zeros((table.len(), class_columns.len()));
        for (r, row) in table.rows().iter().enumerate() {
            for (j, &c) in class_columns.iter().enumerate() {
                scores[[r, j]] = parse_score(&row[c]).ok_or_else(|| Error::InvalidScore {
                    value: row[c].clone(),
                    row: r,
                    column: table.columns()[c].clone(),
                })?;
            }
        }

        Ok(Self {
            true_labels: table.rows().iter().map(|row| row[label_idx].clone()).collect(),
            sample_ids: table.rows().iter().map(|row| row[id_idx].clone()).collect(),
            class_labels: class_columns
                .iter()
                .map(|&c| table.columns()[c].clone())
                .collect(),
            scores,
        })
    }

    /// The matrix as a table led by the `label` and `sample_id` columns.
    pub fn to_table(&self) -> Result<Table> {
        self.check_shape()?;
        let columns = [LABEL_COLUMN, SAMPLE_ID_COLUMN]
            .into_iter()
            .map(str::to_owned)
            .chain(self.class_labels.iter().cloned())
            .collect();
        let rows = self
            .true_labels
            .iter()
            .zip(&self.sample_ids)
            .zip(self.scores.rows())
            .map(|((label, id), row)| {
                [label.clone(), id.clone()]
                    .into_iter()
                    .chain(row.iter().map(f64::to_string))
                    .collect()
            })
            .collect();
        Ok(Table::from_parts(columns, rows))
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::read_with(path, &CsvFormat::default())
    }

    pub fn read_with(path: &Path, format: &CsvFormat) -> Result<Self> {
        Self::from_table(&Table::read_with(path, format)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.write_with(path, &CsvFormat::default())
    }

    pub fn write_with(&self, path: &Path, format: &CsvFormat) -> Result<()> {
        self.to_table()?.write_with(path, format)
    }
}

/// Position and value of the first maximum, ignoring NaN.
fn argmax(row: ArrayView1<f64>) -> Option<(usize, f64)> {
    row.iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Empty cells are missing scores.
fn parse_score(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn pets() -> ScoreMatrix {
        ScoreMatrix::build(
            ["cat", "dog", "cat"],
            ["cat", "dog"],
            array![[0.9, 0.1], [0.2, 0.8], [0.4, 0.6]],
            [1, 2, 3],
        )
    }

    #[test]
    fn accuracy_picks_row_maximum() {
        let frame = pets().accuracy().unwrap();
        assert_eq!(frame.len(), 3);

        let first = &frame.rows()[0];
        assert_eq!(first.sample_id, "1");
        assert_eq!(first.predicted_label, "cat");
        assert_abs_diff_eq!(first.score_for_true_label, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.score_for_predicted_label, 90.0, epsilon = 1e-9);

        let third = &frame.rows()[2];
        assert_eq!(third.sample_id, "3");
        assert_eq!(third.predicted_label, "dog");
        assert_abs_diff_eq!(third.score_for_true_label, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(third.score_for_predicted_label, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn confusion_normalizes_per_predicted_class() {
        let cm = pets().confusion().unwrap();
        assert_abs_diff_eq!(cm.get("cat", "cat").unwrap(), 1.3 / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.get("dog", "cat").unwrap(), 0.2 / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.get("cat", "dog").unwrap(), 0.7 / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cm.get("dog", "dog").unwrap(), 0.8 / 1.5, epsilon = 1e-12);

        for total in cm.column_sums().iter() {
            assert_abs_diff_eq!(*total, 1.0, epsilon = 1e-12);
        }
        // rows are not normalized
        let cat_row: f64 = cm.values().row(0).sum();
        assert!((cat_row - 1.0).abs() > 0.1);
    }

    #[test]
    fn confusion_includes_unobserved_true_classes() {
        let sm = ScoreMatrix::build(
            ["a", "a"],
            ["a", "b", "c"],
            array![[0.5, 0.5, 0.0], [1.0, 0.0, 0.0]],
            ["x", "y"],
        );
        let cm = sm.confusion().unwrap();
        assert_eq!(cm.values().dim(), (3, 3));
        assert_eq!(cm.get("b", "a"), Some(0.0));
        assert_eq!(cm.get("a", "b"), Some(1.0));
        assert!(cm.get("a", "c").unwrap().is_nan());
    }

    #[test]
    fn confusion_rejects_row_mismatch() {
        let sm = ScoreMatrix::build(["cat", "dog"], ["cat", "dog"], array![[1.0, 0.0]], [1, 2]);
        let err = sm.confusion().unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                axis: "rows",
                shape: (1, 2),
                labels: 2
            }
        ));
    }

    #[test]
    fn confusion_rejects_column_mismatch() {
        let sm = ScoreMatrix::build(["cat"], ["cat", "dog", "eel"], array![[1.0, 0.0]], [1]);
        let err = sm.confusion().unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                axis: "columns",
                labels: 3,
                ..
            }
        ));
    }

    #[test]
    fn unknown_true_label_is_an_error() {
        let sm = ScoreMatrix::build(["cow"], ["cat", "dog"], array![[0.3, 0.7]], [7]);
        assert!(matches!(
            sm.accuracy().unwrap_err(),
            Error::UnknownLabel { ref label, ref sample_id } if label == "cow" && sample_id == "7"
        ));
        assert!(matches!(sm.confusion().unwrap_err(), Error::UnknownLabel { .. }));
    }

    #[test]
    fn ties_go_to_first_column() {
        let sm = ScoreMatrix::build(["b"], ["a", "b"], array![[0.5, 0.5]], [1]);
        let frame = sm.accuracy().unwrap();
        assert_eq!(frame.rows()[0].predicted_label, "a");
    }

    #[test]
    fn argmax_skips_nan() {
        let row = array![f64::NAN, 0.2, 0.7, 0.7];
        assert_eq!(argmax(row.view()), Some((2, 0.7)));
        assert_eq!(argmax(array![f64::NAN].view()), None);
    }

    #[test]
    fn table_leads_with_index_columns() {
        let table = pets().to_table().unwrap();
        assert_eq!(table.columns(), ["label", "sample_id", "cat", "dog"]);
        assert_eq!(table.rows()[1], ["dog", "2", "0.2", "0.8"]);
        assert_eq!(ScoreMatrix::from_table(&table).unwrap(), pets());
    }

    #[test]
    fn from_table_requires_index_columns() {
        let table = Table::new(["label", "cat"]);
        assert!(matches!(
            ScoreMatrix::from_table(&table).unwrap_err(),
            Error::MissingColumn { column: "sample_id" }
        ));
    }

    #[test]
    fn from_table_reports_bad_scores() {
        let mut table = Table::new(["label", "sample_id", "cat"]);
        table.push_row(["cat", "1", "high"]).unwrap();
        assert!(matches!(
            ScoreMatrix::from_table(&table).unwrap_err(),
            Error::InvalidScore { row: 0, .. }
        ));
    }

    #[test]
    fn empty_cells_read_as_nan() {
        assert!(parse_score("").unwrap().is_nan());
        assert!(parse_score("NaN").unwrap().is_nan());
        assert_eq!(parse_score(" 0.25 "), Some(0.25));
    }
}
