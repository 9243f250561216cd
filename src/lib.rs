//! SftpNav - interactive SFTP browser
//!
//! Browse a remote directory tree and copy files or whole directories in
//! both directions over SFTP.

// Use mimalloc as the global allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod app;
pub mod config;
pub mod navigator;
pub mod path;
pub mod sftp;
pub mod ssh;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use navigator::StdConsole;

/// Initialize logging
///
/// Logs go to stderr and default to `warn` so they stay out of the menus.
/// Set `RUST_LOG` for more.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run() {
    init_logging();

    tracing::info!("Starting SftpNav...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            eprintln!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let config = app::load_config().await?;
        app::run_session(config, Arc::new(StdConsole::new())).await
    });

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
