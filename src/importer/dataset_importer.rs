// ==========================================
// 实验跟踪流水线 - 分区数据导入器
// ==========================================
// 输入: CSV,表头 dataset_id,sample_index,feature_1..feature_13,class
// 规则: 特征/标签单元格为空 → NULL;特征列缺失 → 整列 NULL
// 规则: 三个分区数据集 (1 training / 2 testing / 3 production) 自动补齐
// 写入: 数据集、样本、标签同一事务;target_index = sample_index
// ==========================================

use crate::domain::dataset::{Dataset, Sample, Target};
use crate::domain::types::{Partition, FEATURE_COLUMNS, FEATURE_COUNT, PARTITION_COLUMN};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::DatasetRepository;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

const SAMPLE_INDEX_COLUMN: &str = "sample_index";
const CLASS_COLUMN: &str = "class";

/// 导入汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub samples: usize,
    pub targets: usize,
}

// ==========================================
// DatasetImporter
// ==========================================
pub struct DatasetImporter {
    dataset_repo: Arc<DatasetRepository>,
}

impl DatasetImporter {
    pub fn new(dataset_repo: Arc<DatasetRepository>) -> Self {
        Self { dataset_repo }
    }

    /// 导入 CSV 文件
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => {}
            other => {
                return Err(ImportError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        }

        let file = std::fs::File::open(path)
            .map_err(|e| ImportError::CsvParseError(format!("{}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), "开始导入分区数据");
        self.import_reader(file)
    }

    /// 从任意输入流导入
    pub fn import_reader<R: Read>(&self, reader: R) -> ImportResult<ImportSummary> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let layout = ColumnLayout::from_headers(csv.headers()?)?;

        let mut samples = Vec::new();
        let mut targets = Vec::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            // 表头占第 1 行
            let row = idx + 2;
            let (sample, target) = layout.parse_row(&record, row)?;
            samples.push(sample);
            targets.push(target);
        }

        let datasets: Vec<Dataset> = Partition::ALL.iter().map(|p| Dataset::for_partition(*p)).collect();
        let (sample_count, target_count) =
            self.dataset_repo
                .insert_partition_batch(&datasets, &samples, &targets)?;

        let summary = ImportSummary {
            rows: samples.len(),
            samples: sample_count,
            targets: target_count,
        };
        tracing::info!(
            rows = summary.rows,
            samples = summary.samples,
            targets = summary.targets,
            "分区数据导入完成"
        );
        Ok(summary)
    }
}

// ==========================================
// 列布局
// ==========================================
struct ColumnLayout {
    dataset_id: usize,
    sample_index: usize,
    features: [Option<usize>; FEATURE_COUNT],
    class: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> ImportResult<Self> {
        let positions: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
        let require = |name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };

        let mut features = [None; FEATURE_COUNT];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS.iter()) {
            *slot = positions.get(name).copied();
        }

        Ok(Self {
            dataset_id: require(PARTITION_COLUMN)?,
            sample_index: require(SAMPLE_INDEX_COLUMN)?,
            features,
            class: positions.get(CLASS_COLUMN).copied(),
        })
    }

    fn parse_row(&self, record: &StringRecord, row: usize) -> ImportResult<(Sample, Target)> {
        let dataset_id = parse_int(record, self.dataset_id, PARTITION_COLUMN, row)?
            .ok_or_else(|| conversion_error(row, PARTITION_COLUMN, "不能为空"))?;
        if Partition::from_tag(dataset_id).is_none() {
            return Err(ImportError::UnknownPartition { row, dataset_id });
        }

        let sample_index = parse_int(record, self.sample_index, SAMPLE_INDEX_COLUMN, row)?
            .ok_or_else(|| conversion_error(row, SAMPLE_INDEX_COLUMN, "不能为空"))?;

        let mut values = [None; FEATURE_COUNT];
        for (i, column) in self.features.iter().enumerate() {
            if let Some(col) = column {
                values[i] = parse_float(record, *col, FEATURE_COLUMNS[i], row)?;
            }
        }

        let class = match self.class {
            Some(col) => parse_int(record, col, CLASS_COLUMN, row)?,
            None => None,
        };

        Ok((
            Sample::new(dataset_id, sample_index, &values),
            Target::for_sample(sample_index, class),
        ))
    }
}

fn cell<'a>(record: &'a StringRecord, col: usize) -> Option<&'a str> {
    record.get(col).filter(|s| !s.is_empty())
}

fn parse_float(record: &StringRecord, col: usize, field: &str, row: usize) -> ImportResult<Option<f64>> {
    match cell(record, col) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| conversion_error(row, field, &format!("无法解析为数值: {}", raw))),
    }
}

/// 整数解析;接受无小数部分的浮点写法 (如 "1.0")
fn parse_int(record: &StringRecord, col: usize, field: &str, row: usize) -> ImportResult<Option<i64>> {
    match cell(record, col) {
        None => Ok(None),
        Some(raw) => {
            if let Ok(v) = raw.parse::<i64>() {
                return Ok(Some(v));
            }
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v.fract() == 0.0 => {
                    // i64::MAX as f64 舍入为 2^63,上界取开区间
                    if v < i64::MIN as f64 || v >= i64::MAX as f64 {
                        return Err(conversion_error(row, field, &format!("整数超出范围: {}", raw)));
                    }
                    Ok(Some(v as i64))
                }
                _ => Err(conversion_error(row, field, &format!("无法解析为整数: {}", raw))),
            }
        }
    }
}

fn conversion_error(row: usize, field: &str, message: &str) -> ImportError {
    ImportError::TypeConversionError {
        row,
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::RepositoryError;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (Arc<Mutex<Connection>>, DatasetImporter) {
        let conn = Arc::new(Mutex::new(crate::db::open_in_memory().unwrap()));
        let importer = DatasetImporter::new(Arc::new(DatasetRepository::new(conn.clone())));
        (conn, importer)
    }

    #[test]
    fn test_import_with_partial_features_and_empty_cells() {
        let (conn, importer) = setup();
        let csv = "dataset_id,sample_index,feature_1,feature_2,class\n\
                   1,1,0.5,1.5,0\n\
                   1,2,,2.5,1\n\
                   3,3,1.0,1.0,\n";

        let summary = importer.import_reader(csv.as_bytes()).unwrap();
        assert_eq!(summary, ImportSummary { rows: 3, samples: 3, targets: 3 });

        let guard = conn.lock().unwrap();
        let datasets: i64 = guard.query_row("SELECT COUNT(*) FROM datasets", [], |r| r.get(0)).unwrap();
        assert_eq!(datasets, 3);
        let f1: Option<f64> = guard
            .query_row("SELECT feature_1 FROM samples WHERE sample_index = 2", [], |r| r.get(0))
            .unwrap();
        assert_eq!(f1, None);
        let class: Option<i64> = guard
            .query_row("SELECT class FROM targets WHERE sample_index = 3", [], |r| r.get(0))
            .unwrap();
        assert_eq!(class, None);
    }

    #[test]
    fn test_bad_cell_names_row_and_column() {
        let (_conn, importer) = setup();
        let csv = "dataset_id,sample_index,feature_1,class\n1,1,0.5,0\n1,2,abc,1\n";

        match importer.import_reader(csv.as_bytes()) {
            Err(ImportError::TypeConversionError { row, field, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(field, "feature_1");
            }
            other => panic!("Expected TypeConversionError, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_integer_is_rejected() {
        let (conn, importer) = setup();
        let csv = "dataset_id,sample_index,class\n1,1,0\n1,1e300,1\n";

        let err = importer.import_reader(csv.as_bytes()).unwrap_err();
        match err {
            ImportError::TypeConversionError { row, field, message } => {
                assert_eq!(row, 3);
                assert_eq!(field, "sample_index");
                assert!(message.contains("1e300"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let samples: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM samples", [], |r| r.get(0))
            .unwrap();
        assert_eq!(samples, 0);

        // 无小数部分的浮点仍按整数接受
        let summary = importer
            .import_reader("dataset_id,sample_index,class\n1.0,2,1.0\n".as_bytes())
            .unwrap();
        assert_eq!(summary.rows, 1);
    }

    #[test]
    fn test_unknown_partition_and_missing_column() {
        let (_conn, importer) = setup();
        let csv = "dataset_id,sample_index,class\n4,1,0\n";
        assert!(matches!(
            importer.import_reader(csv.as_bytes()),
            Err(ImportError::UnknownPartition { row: 2, dataset_id: 4 })
        ));

        let csv = "dataset_id,feature_1\n1,0.5\n";
        assert!(matches!(
            importer.import_reader(csv.as_bytes()),
            Err(ImportError::MissingColumn(col)) if col == "sample_index"
        ));
    }

    #[test]
    fn test_duplicate_sample_index_rolls_back() {
        let (conn, importer) = setup();
        let csv = "dataset_id,sample_index,class\n1,1,0\n2,1,1\n";
        assert!(matches!(
            importer.import_reader(csv.as_bytes()),
            Err(ImportError::Repository(RepositoryError::UniqueConstraintViolation(_)))
        ));
        let samples: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM samples", [], |r| r.get(0))
            .unwrap();
        assert_eq!(samples, 0);
    }
}
