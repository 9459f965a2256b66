use std::path::PathBuf;

/// Errors from reading or writing job records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize job record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt job record at {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}
