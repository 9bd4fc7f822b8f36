//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → TargetDescriptor + CustomResponseHandler (handler/)
//!     → sink.rs (assemble response, hand back to Axum)
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod sink;

pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use sink::ChannelSink;
