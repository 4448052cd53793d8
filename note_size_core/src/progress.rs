//! Progress reporting abstractions for long-running cache work
//!
//! The cache layer reports progress without knowing who renders it. A UI
//! that must only be touched from its own thread plugs in a
//! [`ChannelProvider`] and drains the receiver on that thread.

use std::sync::Mutex;
use std::sync::mpsc;

/// Receiver of warm-up progress; called from the warm-up thread
pub trait ProgressProvider: Send + Sync {
    fn report(&self, update: ProgressUpdate);

    /// Called once by the background warm-up when its walk ends
    fn complete(&self);
}

/// Which part of the warm-up walk is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUpStage {
    Notes,
    Cards,
}

/// Update emitted every `progress_stride` items and at stage boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Warm-up walk progress
    WarmUp {
        stage: WarmUpStage,
        current: usize,
        total: usize,
    },

    /// Free-form line such as "Resolving cards"
    Status { message: String },
}

/// Discards every update, for callers nobody is watching
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _update: ProgressUpdate) {}

    fn complete(&self) {}
}

/// Forwards updates over a std channel to the thread owning the receiver
pub struct ChannelProvider {
    tx: Mutex<Option<mpsc::Sender<ProgressUpdate>>>,
}

impl ChannelProvider {
    /// Create a provider together with the receiving end
    pub fn channel() -> (Self, mpsc::Receiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }
}

impl ProgressProvider for ChannelProvider {
    fn report(&self, update: ProgressUpdate) {
        // A dropped receiver just means nobody is watching any more
        if let Ok(guard) = self.tx.lock()
            && let Some(tx) = guard.as_ref()
        {
            let _ = tx.send(update);
        }
    }

    fn complete(&self) {
        // Dropping the sender lets the receiving loop finish
        if let Ok(mut guard) = self.tx.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_provider_forwards_until_complete() {
        let (provider, rx) = ChannelProvider::channel();

        provider.report(ProgressUpdate::Status {
            message: "warming".to_string(),
        });
        provider.complete();
        provider.report(ProgressUpdate::Status {
            message: "ignored".to_string(),
        });

        let received: Vec<_> = rx.iter().collect();
        assert_eq!(
            received,
            vec![ProgressUpdate::Status {
                message: "warming".to_string()
            }]
        );
    }

    #[test]
    fn test_channel_provider_survives_dropped_receiver() {
        let (provider, rx) = ChannelProvider::channel();
        drop(rx);
        provider.report(ProgressUpdate::WarmUp {
            stage: WarmUpStage::Notes,
            current: 1,
            total: 2,
        });
    }
}
