use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TredError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cipher suite: {0}")]
    InvalidCipherSuite(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid worker count: {0}")]
    InvalidWorkerCount(usize),

    #[error("authentication failure")]
    Authentication,

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("cannot derive output name for {}: {reason}", path.display())]
    Naming { path: PathBuf, reason: String },

    #[error("failed to traverse {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("worker pool is closed")]
    PoolClosed,

    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, TredError>;
