//! Dataset reader.
//!
//! Loads every parquet file below a dataset path (or one of its `dt=<period>` partitions) into a
//! single [Table].

use crate::error::DatasetError;
use crate::storage::{FileEntry, FileSystem, StorageClient, PARTITION_KEY};
use crate::table::Table;
use crate::types::Value;

use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Reads partitioned parquet datasets through a [StorageClient].
#[derive(Clone, Debug)]
pub struct DatasetReader {
    storage: StorageClient,
}

impl DatasetReader {
    /// Create a reader over the given storage.
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }

    /// Read a dataset, or the partition of a dataset for a period.
    ///
    /// Rows of files below `key=value` directories receive those keys as columns if the files
    /// lack them. When a period is given, every row is guaranteed a `dt` column.
    ///
    /// # Arguments
    ///
    /// * `base`: Dataset base path
    /// * `period`: Optional `YYYY-MM` period selecting a partition
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn read(&self, base: &str, period: Option<&str>) -> Result<Table, DatasetError> {
        let location = self.storage.resolve(base, period)?;
        tracing::info!(
            "Reading from {} ({})",
            location.path,
            location.filesystem.name()
        );
        let files = discover_files(location.filesystem.as_ref(), &location.path).await?;
        let mut table = Table::empty();
        for file in files {
            let data = location.filesystem.read(&file.path).await?;
            let mut part = tokio::task::spawn_blocking(move || decode_parquet(data)).await??;
            for (key, value) in partition_values(&location.path, &file.path) {
                part.fill_column(&key, Value::from(value));
            }
            table.append(part);
        }
        if let Some(period) = period {
            table.fill_column(PARTITION_KEY, Value::from(period));
        }
        tracing::debug!("Read {} rows from {}", table.num_rows(), location.path);
        Ok(table)
    }

    /// Read a dataset, returning an empty table on any fault.
    ///
    /// The fault is logged; callers cannot tell it apart from a dataset with no rows.
    pub async fn read_or_empty(&self, base: &str, period: Option<&str>) -> Table {
        match self.read(base, period).await {
            Ok(table) => table,
            Err(err) => {
                log_read_error(base, &err);
                Table::empty()
            }
        }
    }
}

/// Log a read fault. Missing partitions are expected and only warned about.
pub(crate) fn log_read_error(base: &str, error: &DatasetError) {
    if error.is_not_found() {
        tracing::warn!("No data at {}: {}", base, error);
    } else {
        tracing::error!("Error reading data at {}: {}", base, error);
    }
}

/// Returns true for names that data writers use for markers and checksums.
fn is_hidden(path: &str) -> bool {
    let name = path.trim_end_matches('/').rsplit('/').next().unwrap_or(path);
    name.starts_with('_') || name.starts_with('.')
}

/// Recursively find the data files below a path, in lexicographic order.
async fn discover_files(
    filesystem: &dyn FileSystem,
    root: &str,
) -> Result<Vec<FileEntry>, DatasetError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_string()];
    while let Some(dir) = pending.pop() {
        for entry in filesystem.list(&dir).await? {
            if entry.path != dir && is_hidden(&entry.path) {
                continue;
            }
            if entry.is_dir {
                pending.push(entry.path);
            } else {
                files.push(entry);
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Extract `key=value` directory segments between the root and a file.
fn partition_values(root: &str, file: &str) -> Vec<(String, String)> {
    let relative = file
        .strip_prefix(root.trim_end_matches('/'))
        .unwrap_or_default();
    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    // The last segment is the file name.
    segments.pop();
    segments
        .into_iter()
        .filter_map(|segment| segment.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Decode a whole parquet file.
fn decode_parquet(data: Bytes) -> Result<Table, DatasetError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let mut table = Table::new(columns, vec![]);
    for batch in builder.build()? {
        table.append(Table::from_record_batch(&batch?)?);
    }
    Ok(table)
}
