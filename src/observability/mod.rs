//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and the HTTP layer produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (outcome counters, latency histogram)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID and connection ID are attached to every handler log line
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
