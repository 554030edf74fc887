//! Command Line Interface (CLI) arguments.

use clap::Parser;

/// Return risk API command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the API should listen
    #[arg(long, default_value = "0.0.0.0", env = "RETURN_RISK_HOST")]
    pub host: String,
    /// The port to which the API should bind
    #[arg(long, default_value_t = 8080, env = "RETURN_RISK_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "RETURN_RISK_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/return-risk/certs/cert.pem",
        env = "RETURN_RISK_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/return-risk/certs/key.pem",
        env = "RETURN_RISK_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for requests to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "RETURN_RISK_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Read datasets from HDFS (via WebHDFS) instead of the local disk.
    #[arg(long, default_value_t = false, env = "USE_HDFS")]
    pub use_hdfs: bool,
    /// HDFS namenode host
    #[arg(long, default_value = "localhost", env = "HDFS_HOST")]
    pub hdfs_host: String,
    /// HDFS namenode WebHDFS port
    #[arg(long, default_value_t = 9870, env = "HDFS_PORT")]
    pub hdfs_port: u16,
    /// Optional user name sent to WebHDFS
    #[arg(long, env = "HDFS_USER")]
    pub hdfs_user: Option<String>,
    /// Root of the gold (pre-aggregated KPI) datasets on HDFS
    #[arg(
        long,
        default_value = "/datalake/gold/results",
        env = "RETURN_RISK_HDFS_GOLD_ROOT"
    )]
    pub hdfs_gold_root: String,
    /// Root of the silver (cleaned review) dataset on HDFS
    #[arg(
        long,
        default_value = "/datalake/silver/amazon/electronics/reviews_clean_2023",
        env = "RETURN_RISK_HDFS_SILVER_ROOT"
    )]
    pub hdfs_silver_root: String,
    /// Local directory holding `gold/results` and `silver` when HDFS is not used
    #[arg(long, default_value = "local_data", env = "RETURN_RISK_LOCAL_DATA_DIR")]
    pub local_data_dir: String,
    /// Cause labels known to the cause map, in canonical order
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "no_funciona,no_compatible,baja_calidad",
        env = "RETURN_RISK_CAUSE_LABELS"
    )]
    pub cause_labels: Vec<String>,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
