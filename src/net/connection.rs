//! Per-connection lifecycle for custom responses.
//!
//! # Responsibilities
//! - Give each client exchange a unique ID for tracing
//! - Own the closed flag and flip it when the client goes away
//! - Carry the handler's response or failure back to the HTTP layer

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use tokio::sync::mpsc;

use crate::handler::{HandlerError, Lifecycle};

/// Only uniqueness matters, so relaxed ordering is enough.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a client exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a handler hands back to the HTTP layer.
#[derive(Debug)]
pub enum RequestOutcome {
    Respond(Response<Body>),
    Failed(HandlerError),
}

pub type OutcomeSender = mpsc::UnboundedSender<RequestOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<RequestOutcome>;

pub fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

/// [`Lifecycle`] backed by a live client connection.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    id: ConnectionId,
    request_id: String,
    closed: Arc<AtomicBool>,
    outcomes: OutcomeSender,
}

impl ConnectionLifecycle {
    pub fn new(request_id: impl Into<String>, outcomes: OutcomeSender) -> Self {
        Self {
            id: ConnectionId::next(),
            request_id: request_id.into(),
            closed: Arc::new(AtomicBool::new(false)),
            outcomes,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Guard that marks the connection closed when dropped.
    ///
    /// The HTTP layer holds it inside the request future, which the server
    /// drops when the client disconnects.
    pub fn close_guard(&self) -> CloseGuard {
        CloseGuard {
            id: self.id,
            closed: Arc::clone(&self.closed),
        }
    }
}

impl Lifecycle for ConnectionLifecycle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn log(&self, message: &str) {
        tracing::debug!(
            connection_id = %self.id,
            request_id = %self.request_id,
            "{message}"
        );
    }

    fn fail(&self, error: HandlerError) {
        tracing::warn!(
            connection_id = %self.id,
            request_id = %self.request_id,
            kind = error.kind(),
            error = %error,
            "Custom response failed"
        );
        if self.outcomes.send(RequestOutcome::Failed(error)).is_err() {
            tracing::trace!(connection_id = %self.id, "Failure dropped, client already gone");
        }
    }
}

/// Flips the closed flag of a [`ConnectionLifecycle`] on drop.
#[derive(Debug)]
pub struct CloseGuard {
    id: ConnectionId,
    closed: Arc<AtomicBool>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
