//! echo-relay: A TCP echo server
//!
//! Every byte a client sends is written back to that same client, in order,
//! until the client closes its side or the connection fails.
//!
//! Features:
//! - One task per connection, no connection cap
//! - Dual-stack listening on IPv6 addresses
//! - Configuration via CLI arguments or TOML file

mod config;
mod echo;
mod error;
mod server;

use config::{Config, DEFAULT_LOG_LEVEL};
use error::BindError;
use server::Listener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            // No configured level yet, so report at the default one.
            init_logging(DEFAULT_LOG_LEVEL);
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    // Initialize logging
    init_logging(&config.log_level);

    info!(
        host = %config.host,
        port = config.port,
        workers = config.workers,
        "Starting echo-relay server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if config.workers > 0 {
        builder.worker_threads(config.workers);
    }
    let runtime = builder.enable_all().build()?;

    if let Err(e) = runtime.block_on(serve(config)) {
        error!(error = %e, kind = ?e.kind(), "Failed to start listener");
        return Err(e.into());
    }

    Ok(())
}

/// Install the fmt subscriber. `RUST_LOG` overrides `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Bind the configured address and run the accept loop.
async fn serve(config: Config) -> Result<(), BindError> {
    let addr = config.listen_addr()?;
    let listener = Listener::bind(addr)?;
    info!(address = %listener.local_addr(), "Echo server listening");

    listener.run().await;
    Ok(())
}
