//! Test utilities for the note size cache
//!
//! This crate provides a mock host collection, fixture builders and a
//! timing helper for testing the cache layer.

pub mod builders;
pub mod mocks;
pub mod performance;

// Re-export commonly used types
pub use builders::{BACK_FIELD, FRONT_FIELD, Fixture, NoteBuilder, default_fixture};
pub use mocks::MockCollection;
pub use performance::{TimedRun, time_iterations};
