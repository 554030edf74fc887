use crate::error::DatasetError;
use crate::storage::{FileEntry, FileSystem};

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// In-memory filesystem keyed by absolute file path.
#[derive(Debug, Default)]
pub(crate) struct MemoryFileSystem {
    files: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryFileSystem {
    /// Add a file.
    pub(crate) fn insert(&self, path: &str, data: Bytes) {
        self.files.lock().unwrap().insert(path.to_string(), data);
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, DatasetError> {
        let files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Ok(vec![FileEntry {
                path: path.to_string(),
                is_dir: false,
            }]);
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut entries: Vec<FileEntry> = Vec::new();
        for key in files.keys().filter(|key| key.starts_with(&prefix)) {
            let rest = &key[prefix.len()..];
            let (child, is_dir) = match rest.split_once('/') {
                Some((dir, _)) => (dir, true),
                None => (rest, false),
            };
            let child = format!("{}{}", prefix, child);
            if !entries.iter().any(|entry| entry.path == child) {
                entries.push(FileEntry {
                    path: child,
                    is_dir,
                });
            }
        }
        if entries.is_empty() {
            return Err(DatasetError::PathNotFound {
                path: path.to_string(),
            });
        }
        Ok(entries)
    }

    async fn read(&self, path: &str) -> Result<Bytes, DatasetError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| DatasetError::PathNotFound {
                path: path.to_string(),
            })
    }
}

/// Encode a record batch as a parquet file.
pub(crate) fn parquet_bytes(batch: &RecordBatch) -> Bytes {
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
    buffer.into()
}

/// Write a record batch as a parquet file, creating parent directories.
pub(crate) fn write_parquet(path: &Path, batch: &RecordBatch) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, parquet_bytes(batch)).unwrap();
}

/// Ranking rows as written by the pipeline: one per (asin, risk_rank).
pub(crate) fn ranking_batch(rows: &[(&str, i32)]) -> RecordBatch {
    let asin: Vec<&str> = rows.iter().map(|(asin, _)| *asin).collect();
    let rank: Vec<i32> = rows.iter().map(|(_, rank)| *rank).collect();
    let n_reviews: Vec<i64> = rows.iter().map(|(_, rank)| 10 * *rank as i64).collect();
    let n_neg: Vec<i64> = rows.iter().map(|(_, rank)| *rank as i64).collect();
    let pct_neg: Vec<f64> = rows.iter().map(|_| 0.1).collect();
    let avg_prob_neg: Vec<Option<f64>> = rows.iter().map(|_| Some(0.75)).collect();
    RecordBatch::try_from_iter(vec![
        ("asin", Arc::new(StringArray::from(asin)) as ArrayRef),
        ("risk_rank", Arc::new(Int32Array::from(rank)) as ArrayRef),
        ("n_reviews", Arc::new(Int64Array::from(n_reviews)) as ArrayRef),
        ("n_neg", Arc::new(Int64Array::from(n_neg)) as ArrayRef),
        ("pct_neg", Arc::new(Float64Array::from(pct_neg)) as ArrayRef),
        (
            "avg_prob_neg",
            Arc::new(Float64Array::from(avg_prob_neg)) as ArrayRef,
        ),
    ])
    .unwrap()
}

/// Cause rows pivoted to one count column per label.
pub(crate) fn causes_batch(labels: &[&str], rows: &[(&str, Vec<i64>)]) -> RecordBatch {
    let asin: Vec<&str> = rows.iter().map(|(asin, _)| *asin).collect();
    let mut columns = vec![("asin".to_string(), Arc::new(StringArray::from(asin)) as ArrayRef)];
    for (i, label) in labels.iter().enumerate() {
        let counts: Vec<i64> = rows.iter().map(|(_, counts)| counts[i]).collect();
        columns.push((
            label.to_string(),
            Arc::new(Int64Array::from(counts)) as ArrayRef,
        ));
    }
    RecordBatch::try_from_iter(columns).unwrap()
}

/// Evidence rows: (review_id, asin, cause, overall, reviewText).
pub(crate) fn evidence_batch(rows: &[(&str, &str, &str, i64, &str)]) -> RecordBatch {
    let review_id: Vec<&str> = rows.iter().map(|row| row.0).collect();
    let asin: Vec<&str> = rows.iter().map(|row| row.1).collect();
    let cause: Vec<&str> = rows.iter().map(|row| row.2).collect();
    let overall: Vec<i64> = rows.iter().map(|row| row.3).collect();
    let text: Vec<&str> = rows.iter().map(|row| row.4).collect();
    RecordBatch::try_from_iter(vec![
        ("review_id", Arc::new(StringArray::from(review_id)) as ArrayRef),
        ("asin", Arc::new(StringArray::from(asin)) as ArrayRef),
        ("cause", Arc::new(StringArray::from(cause)) as ArrayRef),
        ("overall", Arc::new(Int64Array::from(overall)) as ArrayRef),
        ("reviewText", Arc::new(StringArray::from(text)) as ArrayRef),
    ])
    .unwrap()
}
