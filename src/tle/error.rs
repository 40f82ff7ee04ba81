use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("element set request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("element set source returned HTTP {0}")]
    Status(u16),
    #[error("element set request timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed element set response: {0}")]
    MalformedResponse(String),
}
