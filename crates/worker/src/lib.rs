//! Background execution of summarization jobs.
//!
//! [`runner::JobRunner`] drives one job through the stage state machine;
//! [`pool::WorkerPool`] runs many of them on a fixed number of tasks fed by
//! a bounded queue.

pub mod pool;
pub mod runner;

pub use pool::{SubmitError, WorkerPool};
pub use runner::JobRunner;
