//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted client exchange (axum)
//!     → connection.rs (ID, closed flag, outcome channel)
//!     → CustomResponseHandler runs in its own task
//!     → outcome delivered back to the waiting request future
//! ```
//!
//! # Design Decisions
//! - The closed flag is owned here; handlers only read it
//! - Disconnects surface as the request future being dropped

pub mod connection;

pub use connection::{
    outcome_channel, CloseGuard, ConnectionId, ConnectionLifecycle, OutcomeReceiver,
    OutcomeSender, RequestOutcome,
};
