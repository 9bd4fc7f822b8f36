//! Custom response proxy.
//!
//! Every request is answered by the configured response generator instead
//! of being forwarded to an upstream server.
//!
//! ```text
//!   Client Request ──▶ net + http ──▶ CustomResponseHandler ──▶ generator
//!                                            │
//!   Client Response ◀── ChannelSink ◀────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use custom_response_proxy::config::load_config;
use custom_response_proxy::lifecycle::Startup;
use custom_response_proxy::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "custom-response-proxy")]
#[command(about = "HTTP proxy that answers requests from a configured custom response", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "proxy.toml")]
    config: PathBuf,

    /// Reload the [response] section when the file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "custom-response-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        watch = cli.watch,
        "Configuration loaded"
    );

    Startup {
        config,
        watch: cli.watch.then_some(cli.config),
    }
    .run()
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
