use thiserror::Error;

use crate::session::Phase;

/// Errors produced by the session controller and its client components.
#[derive(Error, Debug)]
pub enum StoryError {
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed at the serde level.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error with status code and response body.
    ///
    /// Returned by [`Backend`](crate::backend::Backend) implementations when
    /// the provider returns a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// HTTP status code (e.g. 429, 500, 503).
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The text stream ended without ever resolving to the required
    /// three-field turn shape.
    #[error("story output never resolved to a valid turn: {0}")]
    MalformedOutput(String),

    /// The image call succeeded but the response carried no image attachment.
    #[error("image response contained no image attachment")]
    NoImageProduced,

    /// A session operation was invoked from a phase that forbids it.
    /// Rejected synchronously; no state change, no network call.
    #[error("cannot {operation} while session is {phase:?}")]
    InvalidTransition {
        /// The operation that was attempted (e.g. `"continue"`).
        operation: &'static str,
        /// The phase the session was in at the time.
        phase: Phase,
    },

    /// Caller-supplied input failed validation (blank topic, blank action,
    /// empty image prompt).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A newer turn superseded this one while it was in flight; its
    /// results were discarded without touching session state.
    #[error("turn was superseded by a newer turn")]
    Superseded,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for StoryError {
    fn from(err: anyhow::Error) -> Self {
        StoryError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoryError>;
