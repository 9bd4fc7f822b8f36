//! Proxy request handling that answers from a user-supplied response
//! generator instead of forwarding upstream.

pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use handler::{CustomResponseHandler, CustomResponseOptions, GeneratedResponse};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
