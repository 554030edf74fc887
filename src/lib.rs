//! This crate provides a read-only HTTP API over the monthly return risk KPIs of an Amazon
//! electronics review pipeline. The pipeline writes its results as partitioned Parquet datasets,
//! either to HDFS or to a local directory, and this service answers three queries over them:
//!
//! * The ranking of the products most at risk of being returned in a month.
//! * The map of negative review causes of a product in a month.
//! * Example negative reviews backing one of those causes.
//!
//! Datasets are partitioned by month in `dt=YYYY-MM` directories. Each request reads the
//! partition of the requested month and filters it in memory.
//!
//! The service is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON response data.
//! * [Parquet](parquet) and [Arrow](arrow) decode the datasets.
//! * [reqwest] talks to the HDFS namenode over the WebHDFS REST API.

pub mod app;
pub mod app_state;
pub mod cli;
pub mod error;
pub mod formatters;
pub mod metrics;
pub mod models;
pub mod reader;
pub mod server;
pub mod services;
pub mod storage;
pub mod storage_local;
pub mod storage_webhdfs;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_query;
