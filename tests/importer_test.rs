// ==========================================
// 分区数据导入集成测试
// ==========================================
// 测试目标: CSV 文件 → 数据库 → 评分流水线
// ==========================================

mod test_helpers;

use ml_tracking::classifier::Hyperparameters;
use ml_tracking::importer::{DatasetImporter, ImportError, ImportSummary};
use std::io::Write;
use std::path::Path;
use test_helpers::{count_rows, create_test_db, create_test_state};

fn write_csv(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp csv");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CSV: &str = "\
dataset_id,sample_index,feature_1,feature_2,feature_3,feature_4,feature_5,feature_6,feature_7,feature_8,feature_9,feature_10,feature_11,feature_12,feature_13,class
1,1,0,0,,,,,,,,,,,,0
1,2,1,1,,,,,,,,,,,,1
1,3,0,1,,,,,,,,,,,,0
1,4,1,0,,,,,,,,,,,,1
2,5,0.2,0.8,,,,,,,,,,,,0
3,6,0.9,0.1,,,,,,,,,,,,
";

#[test]
fn test_import_file_then_score() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = create_test_state(&db_path).unwrap();
    let csv = write_csv(CSV, ".csv");

    let importer = DatasetImporter::new(state.dataset_repo.clone());
    let summary = importer.import_file(csv.path()).unwrap();
    assert_eq!(summary, ImportSummary { rows: 6, samples: 6, targets: 6 });
    assert_eq!(count_rows(&db_path, "datasets").unwrap(), 3);

    state
        .model_api
        .set_model("LogisticRegression", &Hyperparameters::new())
        .unwrap();
    assert_eq!(state.pipeline.run_partition("training").unwrap(), 1.0);
    assert_eq!(state.pipeline.run_partition("testing").unwrap(), 1.0);
}

#[test]
fn test_import_rejects_missing_and_non_csv_files() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = create_test_state(&db_path).unwrap();
    let importer = DatasetImporter::new(state.dataset_repo.clone());

    assert!(matches!(
        importer.import_file(Path::new("/nonexistent/data.csv")),
        Err(ImportError::FileNotFound(_))
    ));

    let txt = write_csv(CSV, ".txt");
    assert!(matches!(
        importer.import_file(txt.path()),
        Err(ImportError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_failed_import_writes_nothing() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = create_test_state(&db_path).unwrap();
    let csv = write_csv("dataset_id,sample_index,feature_1,class\n1,1,0.5,0\n1,2,0.7,maybe\n", ".csv");

    let err = DatasetImporter::new(state.dataset_repo.clone())
        .import_file(csv.path())
        .unwrap_err();
    assert!(err.to_string().contains("行 3"));
    assert_eq!(count_rows(&db_path, "samples").unwrap(), 0);
}
