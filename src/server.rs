//! Web server

use crate::cli;

use std::{net::SocketAddr, path::PathBuf, process::exit, str::FromStr, time::Duration};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;

/// Serve the return risk API
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &cli::CommandLineArgs, service: crate::app::Service) {
    let addr = SocketAddr::from_str(&format!("{}:{}", args.host, args.port))
        .expect("invalid host name, IP address or port number");

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    tracing::info!(
        "Listening on {} ({})",
        addr,
        if args.https { "https" } else { "http" }
    );
    if args.https {
        let tls_config = tls_config(args).await;
        // run HTTPS server with hyper
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .unwrap();
    } else {
        // run HTTP server with hyper
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
            .unwrap();
    }
}

/// Expand `~` in a TLS file path and check that the file exists. Exits on failure.
fn tls_file(path: &str, description: &str) -> PathBuf {
    let abs_path = expanduser(path)
        .expect("Failed to expand ~ to user name. Please provide an absolute path instead.");
    match abs_path.canonicalize() {
        Ok(abs_path) => abs_path,
        Err(_) => {
            tracing::error!(
                "TLS {} file expected at '{}' but not found.",
                description,
                abs_path.display()
            );
            exit(1)
        }
    }
}

/// Load the TLS certificate and key named in the arguments.
async fn tls_config(args: &cli::CommandLineArgs) -> RustlsConfig {
    let abs_cert_file = tls_file(&args.cert_file, "certificate");
    let abs_key_file = tls_file(&args.key_file, "key");
    RustlsConfig::from_pem_file(abs_cert_file, abs_key_file)
        .await
        .expect("Failed to load TLS certificate files")
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
    // Force shutdown if graceful shutdown takes longer than the timeout
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}
