//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use custom_response_proxy::config::ProxyConfig;
use custom_response_proxy::handler::ResponseGenerator;
use custom_response_proxy::http::HttpServer;
use custom_response_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start an `HttpServer` answering from `generator`.
pub async fn start_server(generator: Arc<dyn ResponseGenerator>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ProxyConfig::default();
    config.listener.bind_address = addr.to_string();
    config.observability.metrics_enabled = false;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, generator);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
