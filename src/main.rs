//! This file defines the return-risk binary entry point.

use return_risk::app;
use return_risk::cli;
use return_risk::metrics;
use return_risk::server;
use return_risk::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    ::tracing::debug!("{:?}", args);
    metrics::register_metrics();
    let service = app::service(&args).await;
    server::serve(&args, service).await;
}
