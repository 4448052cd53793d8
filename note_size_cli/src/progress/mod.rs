//! Progress reporting for the CLI
//!
//! The warm-up thread reports through [`provider::ChannelProvider`]; an async
//! task drains the channel and draws the bars.

pub mod provider;
pub mod renderer;

pub use provider::{ChannelProvider, create_progress_infrastructure};
pub use renderer::{ProgressRenderer, render_progress};
