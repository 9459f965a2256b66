//! Durable job storage.
//!
//! A job record is always rewritten whole. Exactly one runner writes a given
//! job after creation, so stores need no per-record locking.

pub mod error;
pub mod repositories;

pub use error::StoreError;
pub use repositories::{FileJobStore, JobStore, MemoryJobStore};

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
