//! Per-request error taxonomy for custom responses.

use thiserror::Error;

/// Boxed error returned by user generators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message used when the handler is built without a generator.
pub const MISSING_GENERATOR: &str = "The \"customResponseFunction\" option is required";

/// Message used when the generator resolves without a response object.
pub const EMPTY_GENERATOR_RESULT: &str =
    "The user-provided \"customResponseFunction\" must return an object.";

/// Errors that can terminate a custom response.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler or generator misconfigured. Never retried.
    #[error("{0}")]
    Configuration(String),

    /// The generator's computation failed.
    #[error(transparent)]
    Generator(BoxError),

    /// Writing to the client connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Body could not be encoded with the requested text encoding.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl HandlerError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::Configuration(_) => "configuration",
            HandlerError::Generator(_) => "generator",
            HandlerError::Transport(_) => "transport",
            HandlerError::Encoding(_) => "encoding",
        }
    }

    /// Render the error together with every source below it.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            source = err.source();
        }
        rendered
    }
}
