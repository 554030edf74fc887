//! A minimal WebHDFS client supporting directory listing and whole-file reads.

use crate::error::DatasetError;
use crate::storage::{FileEntry, FileSystem};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

/// `LISTSTATUS` response body.
#[derive(Debug, Deserialize)]
struct ListStatusResponse {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus")]
    file_status: Vec<FileStatus>,
}

/// A single entry of a `LISTSTATUS` response.
#[derive(Debug, Deserialize)]
struct FileStatus {
    #[serde(rename = "pathSuffix")]
    path_suffix: String,
    #[serde(rename = "type")]
    file_type: String,
}

/// Error body returned by the namenode.
#[derive(Debug, Deserialize)]
struct RemoteExceptionResponse {
    #[serde(rename = "RemoteException")]
    remote_exception: RemoteException,
}

#[derive(Debug, Deserialize)]
struct RemoteException {
    exception: String,
    #[serde(default)]
    message: String,
}

/// HDFS filesystem accessed through the namenode's WebHDFS REST API.
///
/// Implements [FileSystem] for HDFS.
#[derive(Debug)]
pub struct WebHdfsFileSystem {
    client: reqwest::Client,
    /// Namenode HTTP endpoint
    base: Url,
    /// Optional `user.name` query parameter
    user: Option<String>,
}

impl WebHdfsFileSystem {
    /// Create a WebHDFS client. No request is sent until [WebHdfsFileSystem::probe].
    ///
    /// # Arguments
    ///
    /// * `host`: Namenode host
    /// * `port`: Namenode HTTP port
    /// * `user`: Optional user name
    pub fn new(host: &str, port: u16, user: Option<String>) -> Result<Self, DatasetError> {
        let base = Url::parse(&format!("http://{}:{}/", host, port))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            user,
        })
    }

    /// Check that the namenode answers by fetching the status of the root directory.
    #[tracing::instrument(level = "DEBUG", skip(self))]
    pub async fn probe(&self) -> Result<(), DatasetError> {
        let url = self.url("/", "GETFILESTATUS")?;
        let response = self.client.get(url).send().await?;
        check_status("/", response).await.map(|_| ())
    }

    /// Build the URL of a WebHDFS operation on a path.
    ///
    /// Paths given as `hdfs://authority/path` URLs are reduced to their path component.
    fn url(&self, path: &str, op: &str) -> Result<Url, DatasetError> {
        let path = hdfs_path(path)?;
        let mut url = self.base.clone();
        url.set_path(&format!("/webhdfs/v1{}", path));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            if let Some(user) = &self.user {
                query.append_pair("user.name", user);
            }
        }
        Ok(url)
    }
}

/// Return the absolute HDFS path for a plain path or an `hdfs://` URL.
fn hdfs_path(path: &str) -> Result<String, DatasetError> {
    if path.starts_with("hdfs://") {
        let url = Url::parse(path)?;
        return Ok(url.path().to_string());
    }
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("/{}", path))
    }
}

/// Turn a `LISTSTATUS` response into entries with full paths.
///
/// Listing a file yields one status with an empty suffix, which stands for the path itself.
fn entries_from_listing(path: &str, listing: ListStatusResponse) -> Vec<FileEntry> {
    let parent = path.trim_end_matches('/');
    listing
        .file_statuses
        .file_status
        .into_iter()
        .map(|status| {
            let is_dir = status.file_type == "DIRECTORY";
            let path = if status.path_suffix.is_empty() {
                path.to_string()
            } else {
                format!("{}/{}", parent, status.path_suffix)
            };
            FileEntry { path, is_dir }
        })
        .collect()
}

/// Map an error response from the namenode to a [DatasetError].
fn remote_error(path: &str, status: u16, body: &[u8]) -> DatasetError {
    let exception = serde_json::from_slice::<RemoteExceptionResponse>(body)
        .map(|response| response.remote_exception)
        .unwrap_or_else(|_| RemoteException {
            exception: "UnknownException".to_string(),
            message: String::from_utf8_lossy(body).into_owned(),
        });
    if status == 404 || exception.exception == "FileNotFoundException" {
        DatasetError::PathNotFound {
            path: path.to_string(),
        }
    } else {
        DatasetError::WebHdfs {
            status,
            exception: exception.exception,
            message: exception.message,
        }
    }
}

/// Return the response if successful, otherwise the mapped remote error.
async fn check_status(
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, DatasetError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.bytes().await?;
        Err(remote_error(path, status.as_u16(), &body))
    }
}

#[async_trait]
impl FileSystem for WebHdfsFileSystem {
    fn name(&self) -> &'static str {
        "hdfs"
    }

    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, DatasetError> {
        let url = self.url(path, "LISTSTATUS")?;
        let response = self.client.get(url).send().await?;
        let listing: ListStatusResponse = check_status(path, response).await?.json().await?;
        Ok(entries_from_listing(path, listing))
    }

    #[tracing::instrument(level = "DEBUG", skip(self))]
    async fn read(&self, path: &str) -> Result<Bytes, DatasetError> {
        // The namenode redirects OPEN to a datanode; reqwest follows the redirect.
        let url = self.url(path, "OPEN")?;
        let response = self.client.get(url).send().await?;
        Ok(check_status(path, response).await?.bytes().await?)
    }
}
