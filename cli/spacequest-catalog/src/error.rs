//! Error handling for catalog API operations.

use thiserror::Error;

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The catalog answered with a non-success status.
    #[error("catalog request failed: {status} {status_text}")]
    Http { status: u16, status_text: String },
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("catalog request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The body matched neither the envelope nor the bare array shape.
    #[error("unexpected catalog response shape: {0}")]
    Shape(String),
    /// The caller fired the cancellation token before the request completed.
    ///
    /// This is not a user facing failure and must be filtered out before
    /// anything is displayed.
    #[error("catalog request was cancelled")]
    Cancelled,
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0}")]
    Other(String),
}

impl CatalogClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogClientError::Cancelled)
    }

    /// The HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogClientError::Http { status, .. } => Some(*status),
            CatalogClientError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
