//! Note Size CLI Library
//!
//! Host adapter and presentation helpers behind the `note-size` binary.
//! The binary reads an exported collection (a JSON file next to its media
//! directory) and answers size queries through the core cache layer.

pub mod collection;
pub mod config;
pub mod output;
pub mod paths;
pub mod progress;
pub mod terminal;
