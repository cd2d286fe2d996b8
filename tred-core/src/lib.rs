#![forbid(unsafe_code)]

pub mod batch;
pub mod error;
pub mod job;
pub mod naming;
pub mod progress;
pub mod report;
pub mod settings;

pub mod util {
    pub mod hash_forward;
}

pub mod crypto {
    pub mod aead;
    pub mod engine;
    pub mod keygen;
}

pub mod walk {
    pub mod filter;
}

pub mod pool;

// Re-exports: stable API surface
pub use batch::{BatchSummary, run};
pub use crypto::aead::TredEngine;
pub use crypto::engine::{CipherEngine, CipherSuite, Sealed};
pub use error::{Result, TredError};
pub use job::{Job, Operation};
pub use pool::observer::JobObserver;
pub use pool::{Pool, PoolSummary};
pub use report::{Report, ReportCollector};
pub use settings::{Settings, WalkPolicy};
pub use walk::filter::{Traversal, WalkEntry};
