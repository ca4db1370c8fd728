//! Errors produced while reading the country dataset.

/// Errors that can occur when parsing or validating the country dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to parse country dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("country #{position} has an empty name")]
    EmptyName { position: usize },

    #[error("country '{name}' has non-finite coordinates")]
    NonFinite { name: String },
}

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
