use approx::assert_abs_diff_eq;
use ndarray::array;
use rnb_eval::{CsvFormat, ScoreMatrix, Table};

fn zoo() -> ScoreMatrix {
    ScoreMatrix::build(
        ["cat", "dog", "cat", "eel"],
        ["cat", "dog", "eel"],
        array![
            [0.7, 0.2, 0.1],
            [0.1, 0.6, 0.3],
            [0.3, 0.3, 0.4],
            [0.0, 0.1, 0.9]
        ],
        ["s1", "s2", "s3", "s4"],
    )
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.csv");

    let matrix = zoo();
    matrix.write(&path).unwrap();
    assert_eq!(ScoreMatrix::read(&path).unwrap(), matrix);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("label,sample_id,cat,dog,eel\n"));
}

#[test]
fn tab_separated_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.tsv");
    let format = CsvFormat::tab_separated();

    zoo().write_with(&path, &format).unwrap();
    assert_eq!(ScoreMatrix::read_with(&path, &format).unwrap(), zoo());
}

#[test]
fn reads_index_columns_anywhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.csv");
    std::fs::write(&path, "cat,sample_id,dog,label\n0.25,a,0.75,dog\n").unwrap();

    let matrix = ScoreMatrix::read(&path).unwrap();
    assert_eq!(matrix.class_labels(), ["cat", "dog"]);
    assert_eq!(matrix.true_labels(), ["dog"]);
    assert_eq!(matrix.sample_ids(), ["a"]);
    assert_eq!(matrix.scores(), &array![[0.25, 0.75]]);
}

#[test]
fn accuracy_keeps_sample_order_and_row_maximum() {
    let matrix = zoo();
    let frame = matrix.accuracy().unwrap();

    let ids: Vec<&str> = frame.rows().iter().map(|r| r.sample_id.as_str()).collect();
    assert_eq!(ids, ["s1", "s2", "s3", "s4"]);

    for (row, scores) in frame.rows().iter().zip(matrix.scores().rows()) {
        for &score in scores {
            assert!(row.score_for_predicted_label >= score * 100.0);
        }
    }
    let predicted: Vec<&str> = frame
        .rows()
        .iter()
        .map(|r| r.predicted_label.as_str())
        .collect();
    assert_eq!(predicted, ["cat", "dog", "eel", "eel"]);
    assert_abs_diff_eq!(frame.hit_rate(), 0.75);
}

#[test]
fn confusion_columns_sum_to_one() {
    let cm = zoo().confusion().unwrap();
    assert_eq!(cm.labels().collect::<Vec<_>>(), ["cat", "dog", "eel"]);
    for total in cm.column_sums().iter() {
        assert_abs_diff_eq!(*total, 1.0, epsilon = 1e-12);
    }
    // cat column mass: 0.7 + 0.3 from cats, 0.1 from the dog
    assert_abs_diff_eq!(cm.precision("cat").unwrap(), 1.0 / 1.1, epsilon = 1e-12);
}

#[test]
fn reports_are_written_as_delimited_text() {
    let dir = tempfile::tempdir().unwrap();
    let accuracy_path = dir.path().join("accuracy.csv");
    let confusion_path = dir.path().join("confusion.csv");

    let matrix = zoo();
    matrix.accuracy().unwrap().write(&accuracy_path).unwrap();
    matrix.confusion().unwrap().write(&confusion_path).unwrap();

    let accuracy = Table::read(&accuracy_path).unwrap();
    assert_eq!(
        accuracy.columns(),
        ["label", "sample_id", "prediction", "score", "score_for_prediction"]
    );
    assert_eq!(accuracy.len(), 4);

    let confusion = Table::read(&confusion_path).unwrap();
    assert_eq!(confusion.columns(), ["label", "cat", "dog", "eel"]);
    assert_eq!(
        confusion.column("label").unwrap().collect::<Vec<_>>(),
        ["cat", "dog", "eel"]
    );
}
