//! Custom response handling subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request target (target.rs)
//!     → CustomResponseHandler::run (custom_response.rs)
//!     → ResponseGenerator::generate (generator.rs)
//!     → closed check via Lifecycle (base.rs)
//!     → normalize GeneratedResponse (response.rs, encoding.rs)
//!     → ResponseSink: status, headers, terminating write (base.rs)
//!     → failures funnel to Lifecycle::fail (error.rs)
//! ```
//!
//! # Design Decisions
//! - The handler depends on narrow traits, never on the transport
//! - Per-request state lives on the handler value, nothing is global
//! - No timeouts here; a generator that never resolves stalls its request

pub mod base;
pub mod custom_response;
pub mod encoding;
pub mod error;
pub mod generator;
pub mod response;
pub mod target;

pub use base::{Lifecycle, ResponseSink};
pub use custom_response::{CustomResponseHandler, CustomResponseOptions, RunState};
pub use encoding::TextEncoding;
pub use error::{BoxError, HandlerError};
pub use generator::{from_fn, GeneratorResult, ResponseGenerator, StaticResponseGenerator};
pub use response::{GeneratedResponse, ResponseBody, ResponseHeaders};
pub use target::{TargetDescriptor, TargetError};
