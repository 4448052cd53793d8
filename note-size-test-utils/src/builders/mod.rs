//! Builders and fixtures for test scenarios

mod fixtures;

pub use fixtures::{BACK_FIELD, FRONT_FIELD, Fixture, NoteBuilder, default_fixture};
