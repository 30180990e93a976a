//! Fetch failures. All of them are transient from the dashboard's point of view.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed backend response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid backend url: {0}")]
    Url(String),
}

impl FetchError {
    /// HTTP status when the backend answered with a non-success code.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
