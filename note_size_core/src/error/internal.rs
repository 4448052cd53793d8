//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// A background worker died without reporting a result
    #[error("Background task '{task}' failed: {message}")]
    BackgroundTask { task: String, message: String },

    /// A warm-up is already in progress
    #[error("Cache warm-up is already running")]
    WarmUpRunning,
}

impl InternalError {
    /// Create a background task error
    pub fn background_task(task: &str, message: &str) -> Self {
        Self::BackgroundTask {
            task: task.to_string(),
            message: message.to_string(),
        }
    }
}
