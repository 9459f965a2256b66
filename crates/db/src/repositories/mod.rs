//! Job store implementations.
//!
//! [`FileJobStore`] is the production store; [`MemoryJobStore`] backs tests.

mod file;
mod memory;

pub use file::FileJobStore;
pub use memory::MemoryJobStore;

use async_trait::async_trait;
use vidsum_core::job::Job;
use vidsum_core::types::JobId;

use crate::StoreResult;

/// Keyed persistence for job records.
///
/// `save` replaces the whole record atomically from a reader's point of
/// view; there are no partial-field updates.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist `job`, overwriting any previous version with the same id.
    async fn save(&self, job: &Job) -> StoreResult<()>;

    /// Load the current record, or `None` if the id is unknown.
    async fn load(&self, id: JobId) -> StoreResult<Option<Job>>;

    /// Whether the store can currently accept writes.
    async fn is_healthy(&self) -> bool {
        true
    }
}
