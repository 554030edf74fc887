use crate::error::DatasetError;
use crate::storage::{FileEntry, FileSystem};

use async_trait::async_trait;
use bytes::Bytes;

/// Local disk filesystem.
///
/// Implements [FileSystem] on top of the operating system's filesystem.
#[derive(Debug, Default)]
pub struct LocalFileSystem {}

impl LocalFileSystem {
    /// Create a new local filesystem.
    pub fn new() -> Self {
        Self {}
    }
}

/// Map a not found I/O error to [DatasetError::PathNotFound].
fn map_io_error(path: &str, error: std::io::Error) -> DatasetError {
    if error.kind() == std::io::ErrorKind::NotFound {
        DatasetError::PathNotFound {
            path: path.to_string(),
        }
    } else {
        DatasetError::Io(error)
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    fn name(&self) -> &'static str {
        "local"
    }

    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, DatasetError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|err| map_io_error(path, err))?;
        if !metadata.is_dir() {
            return Ok(vec![FileEntry {
                path: path.to_string(),
                is_dir: false,
            }]);
        }
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|err| map_io_error(path, err))?;
        while let Some(entry) = dir.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(FileEntry {
                path: entry.path().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        Ok(entries)
    }

    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn read(&self, path: &str) -> Result<Bytes, DatasetError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| map_io_error(path, err))?;
        Ok(data.into())
    }
}
