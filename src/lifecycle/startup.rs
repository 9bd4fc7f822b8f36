//! Startup orchestration.
//!
//! # Order
//! 1. Build the generator from the validated `[response]`
//! 2. Start the metrics endpoint and optional config watcher
//! 3. Bind the listener last, so traffic only arrives when ready

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigWatcher, ProxyConfig};
use crate::handler::{error::MISSING_GENERATOR, StaticResponseGenerator};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{}", MISSING_GENERATOR)]
    MissingGenerator,

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start config watcher: {0}")]
    Watcher(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Everything needed to start serving.
pub struct Startup {
    pub config: ProxyConfig,
    /// Config file to watch for response changes, if any.
    pub watch: Option<PathBuf>,
}

impl Startup {
    /// Run until a termination signal arrives.
    pub async fn run(self) -> Result<(), StartupError> {
        let shutdown = Shutdown::new();
        spawn_signal_listener(shutdown.clone());
        self.run_until(shutdown).await
    }

    /// Run until `shutdown` is triggered.
    pub async fn run_until(self, shutdown: Shutdown) -> Result<(), StartupError> {
        let config = self.config;
        let response = config
            .response
            .clone()
            .ok_or(StartupError::MissingGenerator)?;
        let generator = Arc::new(StaticResponseGenerator::new(response));

        if config.observability.metrics_enabled {
            match config.observability.metrics_address.parse() {
                Ok(addr) => {
                    if let Err(e) = metrics::init_metrics(addr) {
                        tracing::error!(error = %e, "Failed to start metrics endpoint");
                    }
                }
                Err(_) => tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                ),
            }
        }

        // Dropping the watcher stops it, so it lives as long as the server.
        let _watcher = match &self.watch {
            Some(path) => Some(ConfigWatcher::new(path, Arc::clone(&generator)).spawn()?),
            None => None,
        };

        let address = config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;

        let server = HttpServer::new(config, generator);
        server
            .run(listener, shutdown.subscribe())
            .await
            .map_err(StartupError::Serve)
    }
}
