//! Error types for the dataset client.

use earthpick_core::DatasetError;

/// Errors that can occur while fetching the country dataset.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
