//! Mock implementations for testing

mod collection;

pub use collection::MockCollection;
