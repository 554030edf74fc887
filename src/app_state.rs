use crate::cli::CommandLineArgs;
use crate::models::CauseLabels;
use crate::reader::DatasetReader;
use crate::services::KpiService;
use crate::storage::{DatasetPaths, StorageClient};

use std::sync::Arc;

/// Shared application state passed to each request handler.
#[derive(Debug)]
pub struct AppState {
    /// KPI query service.
    pub service: KpiService,
}

impl AppState {
    /// Create and return an [AppState].
    ///
    /// Connects to the storage backend selected by the arguments. A failed HDFS connection is
    /// logged and leaves the service answering with storage-unavailable errors.
    pub async fn new(args: &CommandLineArgs) -> Self {
        let storage = StorageClient::connect(args).await;
        let service = KpiService::new(
            DatasetReader::new(storage),
            DatasetPaths::from_args(args),
            CauseLabels::new(args.cause_labels.iter().cloned()),
        );
        Self { service }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
