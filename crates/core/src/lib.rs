//! Domain types for the video summarization service.
//!
//! Holds the persisted [`job::Job`] record and its status state machine,
//! input URL validation, and the shared [`error::CoreError`]. Nothing in
//! this crate performs I/O.

pub mod error;
pub mod job;
pub mod types;
pub mod youtube;
