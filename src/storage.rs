//! Storage location and filesystem abstraction.
//!
//! Datasets live either on the local disk or on HDFS. Both are reached through the
//! [FileSystem] trait, and a single [StorageClient] built at startup decides which one a dataset
//! path resolves to.

use crate::cli::CommandLineArgs;
use crate::error::DatasetError;
use crate::storage_local::LocalFileSystem;
use crate::storage_webhdfs::WebHdfsFileSystem;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;
use strum_macros::Display;

/// Name of the partition key used in `key=value` directory segments.
pub const PARTITION_KEY: &str = "dt";

/// An entry returned when listing a directory.
#[derive(Clone, Debug, PartialEq)]
pub struct FileEntry {
    /// Full path of the entry
    pub path: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// Filesystem trait.
///
/// Defines the read-only interface each storage backend provides to the dataset reader.
#[async_trait]
pub trait FileSystem: Debug + Send + Sync {
    /// Short name of the backend, for logging.
    fn name(&self) -> &'static str;

    /// List the direct children of a directory.
    ///
    /// Listing a file returns a single entry for the file itself. A path that does not exist
    /// results in [DatasetError::PathNotFound].
    ///
    /// # Arguments
    ///
    /// * `path`: Directory or file to list
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, DatasetError>;

    /// Read the whole content of a file.
    ///
    /// # Arguments
    ///
    /// * `path`: File to read
    async fn read(&self, path: &str) -> Result<Bytes, DatasetError>;
}

/// Physical storage backend selected at startup.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum StorageMode {
    /// Local disk
    Local,
    /// HDFS via WebHDFS
    Hdfs,
}

/// A dataset path resolved against a concrete filesystem.
#[derive(Clone, Debug)]
pub struct Location {
    /// Path to read from
    pub path: String,
    /// Filesystem holding the path
    pub filesystem: Arc<dyn FileSystem>,
}

/// Storage locator.
///
/// Holds the one filesystem binding of the process. In HDFS mode the binding may be unset if
/// connecting failed at startup; it is never retried.
#[derive(Clone, Debug)]
pub struct StorageClient {
    mode: StorageMode,
    filesystem: Option<Arc<dyn FileSystem>>,
}

impl StorageClient {
    /// Create a storage client from command line arguments.
    ///
    /// In HDFS mode the namenode is probed once. A failed probe is logged and leaves the client
    /// without a filesystem.
    ///
    /// # Arguments
    ///
    /// * `args`: Command line arguments
    pub async fn connect(args: &CommandLineArgs) -> Self {
        if !args.use_hdfs {
            tracing::info!("Reading datasets from local disk under {}", args.local_data_dir);
            return Self::new(StorageMode::Local, Some(Arc::new(LocalFileSystem::new())));
        }
        tracing::info!(
            "Connecting to HDFS at {}:{}",
            args.hdfs_host,
            args.hdfs_port
        );
        let connected = match WebHdfsFileSystem::new(
            &args.hdfs_host,
            args.hdfs_port,
            args.hdfs_user.clone(),
        ) {
            Ok(hdfs) => hdfs.probe().await.map(|_| hdfs),
            Err(err) => Err(err),
        };
        match connected {
            Ok(hdfs) => {
                tracing::info!("Connected to HDFS");
                Self::new(StorageMode::Hdfs, Some(Arc::new(hdfs)))
            }
            Err(err) => {
                tracing::error!("Failed to connect to HDFS: {}", err);
                Self::new(StorageMode::Hdfs, None)
            }
        }
    }

    /// Create a storage client with an explicit, possibly unset, filesystem.
    pub fn new(mode: StorageMode, filesystem: Option<Arc<dyn FileSystem>>) -> Self {
        Self { mode, filesystem }
    }

    /// Storage mode of this client.
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Resolve a dataset base path and optional period to a [Location].
    ///
    /// # Arguments
    ///
    /// * `base`: Dataset base path
    /// * `period`: Optional period selecting a `dt=<period>` partition
    pub fn resolve(&self, base: &str, period: Option<&str>) -> Result<Location, DatasetError> {
        let path = target_path(base, period);
        let filesystem = self
            .filesystem
            .clone()
            .ok_or(DatasetError::StorageUnavailable)?;
        tracing::debug!("Resolved {} on {}", path, filesystem.name());
        Ok(Location { path, filesystem })
    }
}

/// Return the path of a dataset, or of one of its partitions when a period is given.
pub fn target_path(base: &str, period: Option<&str>) -> String {
    match period {
        Some(period) => format!(
            "{}/{}={}",
            base.trim_end_matches('/'),
            PARTITION_KEY,
            period
        ),
        None => base.to_string(),
    }
}

/// Base paths of the three datasets served by the API.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetPaths {
    /// Monthly risk ranking (gold)
    pub ranking: String,
    /// Monthly cause map (gold)
    pub causes: String,
    /// Cleaned reviews used as evidence (silver)
    pub evidence: String,
}

impl DatasetPaths {
    /// Derive dataset paths from the storage mode selected in the arguments.
    pub fn from_args(args: &CommandLineArgs) -> Self {
        let (gold, silver) = if args.use_hdfs {
            (
                args.hdfs_gold_root.trim_end_matches('/').to_string(),
                args.hdfs_silver_root.trim_end_matches('/').to_string(),
            )
        } else {
            let root = args.local_data_dir.trim_end_matches('/');
            (format!("{}/gold/results", root), format!("{}/silver", root))
        };
        Self {
            ranking: format!("{}/ranking_riesgo_mensual", gold),
            causes: format!("{}/mapa_causas_mensual", gold),
            evidence: silver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryFileSystem;

    use clap::Parser;

    #[test]
    fn target_path_with_period() {
        assert_eq!(
            "/gold/ranking/dt=2023-09",
            target_path("/gold/ranking", Some("2023-09"))
        );
    }

    #[test]
    fn target_path_trailing_slash() {
        assert_eq!(
            "/silver/reviews/dt=2023-09",
            target_path("/silver/reviews/", Some("2023-09"))
        );
    }

    #[test]
    fn target_path_without_period() {
        assert_eq!("/gold/ranking", target_path("/gold/ranking", None));
    }

    #[test]
    fn resolve_unset_filesystem() {
        let client = StorageClient::new(StorageMode::Hdfs, None);
        let err = client.resolve("/gold/ranking", Some("2023-09")).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn resolve_injected_filesystem() {
        let client = StorageClient::new(
            StorageMode::Local,
            Some(Arc::new(MemoryFileSystem::default())),
        );
        let location = client.resolve("/gold/ranking", Some("2023-09")).unwrap();
        assert_eq!("/gold/ranking/dt=2023-09", location.path);
        assert_eq!("memory", location.filesystem.name());
    }

    #[tokio::test]
    async fn connect_local() {
        let args = CommandLineArgs::parse_from(["return-risk"]);
        let client = StorageClient::connect(&args).await;
        assert_eq!(StorageMode::Local, client.mode());
        assert!(client.resolve("local_data", None).is_ok());
    }

    #[tokio::test]
    async fn connect_hdfs_unreachable() {
        // Nothing listens on port 1, so the probe fails and the handle stays unset.
        let args = CommandLineArgs::parse_from([
            "return-risk",
            "--use-hdfs",
            "--hdfs-host",
            "127.0.0.1",
            "--hdfs-port",
            "1",
        ]);
        let client = StorageClient::connect(&args).await;
        assert_eq!(StorageMode::Hdfs, client.mode());
        let err = client.resolve("/gold", Some("2023-09")).unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn dataset_paths_local() {
        let args = CommandLineArgs::parse_from(["return-risk", "--local-data-dir", "/srv/data/"]);
        let paths = DatasetPaths::from_args(&args);
        assert_eq!("/srv/data/gold/results/ranking_riesgo_mensual", paths.ranking);
        assert_eq!("/srv/data/gold/results/mapa_causas_mensual", paths.causes);
        assert_eq!("/srv/data/silver", paths.evidence);
    }

    #[test]
    fn dataset_paths_hdfs() {
        let args = CommandLineArgs::parse_from(["return-risk", "--use-hdfs"]);
        let paths = DatasetPaths::from_args(&args);
        assert_eq!(
            "/datalake/gold/results/ranking_riesgo_mensual",
            paths.ranking
        );
        assert_eq!(
            "/datalake/silver/amazon/electronics/reviews_clean_2023",
            paths.evidence
        );
    }
}
