//! Error types for the feed pipeline.

use std::sync::Arc;
use thiserror::Error;

/// Errors raised while talking to the FlareSolverr service.
#[derive(Debug, Error)]
pub enum BypassError {
    /// The solver could not be reached or the connection dropped.
    #[error("FlareSolverr HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The solver answered with something that is not a JSON envelope.
    #[error("FlareSolverr returned a non-JSON reply: {body}")]
    InvalidEnvelope { body: String },

    /// Envelope status was not `ok`, or it carried no response body.
    #[error("Flaresolverr request failed: {envelope}")]
    Rejected { envelope: serde_json::Value },
}

/// Errors that abort a feed request.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid user id: {0:?}")]
    InvalidIdentity(String),

    /// Shared between every caller waiting on the same in-flight fetch.
    #[error(transparent)]
    Bypass(Arc<BypassError>),

    #[error("payload has no user info")]
    MissingMetadata,
}

impl From<Arc<BypassError>> for FeedError {
    fn from(err: Arc<BypassError>) -> Self {
        Self::Bypass(err)
    }
}

impl From<BypassError> for FeedError {
    fn from(err: BypassError) -> Self {
        Self::Bypass(Arc::new(err))
    }
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
