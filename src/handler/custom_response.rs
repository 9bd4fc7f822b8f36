//! Answers a proxied request from a user generator instead of an upstream.
//!
//! # Flow
//! ```text
//! Idle → GeneratorPending ─┬─ closed ──────────────▶ Abandoned
//!                          └─ resolved → Validating ─┬─ error ─▶ Failed
//!                                                    └─ Writing ─┬─ error ─▶ Failed
//!                                                                └─ ok ────▶ Sent
//! ```
//!
//! The closed flag is checked once, immediately after the generator
//! resolves, and again only to decide whether a failure is reported.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, Method};

use crate::handler::base::{Lifecycle, ResponseSink};
use crate::handler::error::{HandlerError, EMPTY_GENERATOR_RESULT, MISSING_GENERATOR};
use crate::handler::generator::{GeneratorResult, ResponseGenerator};
use crate::handler::response::{ResponseBody, DEFAULT_STATUS};
use crate::handler::target::TargetDescriptor;

/// Where a handler is in its single pass over a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    GeneratorPending,
    /// Connection closed while the generator was running.
    Abandoned,
    Validating,
    Writing,
    Failed,
    Sent,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Abandoned | RunState::Failed | RunState::Sent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::GeneratorPending => "generator_pending",
            RunState::Abandoned => "abandoned",
            RunState::Validating => "validating",
            RunState::Writing => "writing",
            RunState::Failed => "failed",
            RunState::Sent => "sent",
        }
    }
}

/// Construction bundle for [`CustomResponseHandler`].
pub struct CustomResponseOptions<L, S> {
    pub lifecycle: L,
    pub request_method: Method,
    pub response: S,
    pub target: TargetDescriptor,
    pub custom_response_function: Option<Arc<dyn ResponseGenerator>>,
}

/// One request's custom-response pass.
pub struct CustomResponseHandler<L, S> {
    lifecycle: L,
    request_method: Method,
    response: S,
    target: TargetDescriptor,
    generator: Arc<dyn ResponseGenerator>,
    response_sent: Arc<AtomicBool>,
    state: RunState,
}

impl<L: Lifecycle, S: ResponseSink> CustomResponseHandler<L, S> {
    /// Fails when no generator is configured.
    pub fn new(options: CustomResponseOptions<L, S>) -> Result<Self, HandlerError> {
        let generator = options
            .custom_response_function
            .ok_or_else(|| HandlerError::Configuration(MISSING_GENERATOR.to_string()))?;

        Ok(Self {
            lifecycle: options.lifecycle,
            request_method: options.request_method,
            response: options.response,
            target: options.target,
            generator,
            response_sent: Arc::new(AtomicBool::new(false)),
            state: RunState::Idle,
        })
    }

    /// Set just before the terminating write is issued.
    ///
    /// Framework code must not write to the client once this is `true`.
    pub fn response_sent_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.response_sent)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    pub fn response(&self) -> &S {
        &self.response
    }

    /// Process the request. Calls after the first return the current state
    /// without doing anything.
    pub async fn run(&mut self) -> RunState {
        if self.state != RunState::Idle {
            return self.state;
        }

        self.target.method = Some(self.request_method.clone());
        self.target.headers = HeaderMap::new();

        self.state = RunState::GeneratorPending;
        let generated = self.generator.generate().await;

        if self.lifecycle.is_closed() {
            self.state = RunState::Abandoned;
            return self.state;
        }

        match self.respond(generated).await {
            Ok(status) => {
                self.state = RunState::Sent;
                self.lifecycle
                    .log(&format!("Custom response sent to source ({status})"));
            }
            Err(err) => {
                self.state = RunState::Failed;
                if !self.lifecycle.is_closed() {
                    self.lifecycle
                        .log(&format!("Custom response function failed: {}", err.chain()));
                    self.lifecycle.fail(err);
                }
            }
        }
        self.state
    }

    /// Validate and write. Returns the status actually written.
    async fn respond(&mut self, generated: GeneratorResult) -> Result<u16, HandlerError> {
        let generated = generated.map_err(HandlerError::Generator)?;

        self.state = RunState::Validating;
        let generated = generated
            .ok_or_else(|| HandlerError::Configuration(EMPTY_GENERATOR_RESULT.to_string()))?;

        // 0 counts as unset.
        let status = generated
            .status_code
            .filter(|status| *status != 0)
            .unwrap_or(DEFAULT_STATUS);
        let length = generated.body.as_ref().map(ResponseBody::len);
        self.lifecycle.log(&format!(
            "Received custom user response ({status}, length: {}, encoding: {})",
            display_or_none(length),
            display_or_none(generated.encoding.as_deref()),
        ));

        self.response.set_status(status)?;
        for (name, value) in generated.headers.iter() {
            self.response.set_header(name, value)?;
        }

        self.state = RunState::Writing;
        if self.response_sent.swap(true, Ordering::AcqRel) {
            return Err(HandlerError::Transport("response already sent".to_string()));
        }
        self.response.end(generated.body, generated.encoding).await?;

        Ok(status)
    }
}

fn display_or_none<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}
