//! Background warm-up of every cache
//!
//! The walk touches every note (all size types, size strings, referenced
//! files and their types), builds the collection-wide file aggregates and
//! then resolves every card. Caches are marked initialized only when the
//! walk completes; a cancelled or failed walk leaves them partially
//! populated and not initialized.

use crate::cache::manager::CacheManager;
use crate::collection::Collection;
use crate::config::CacheConfig;
use crate::error::{Error, InternalError, Result};
use crate::progress::{ProgressProvider, ProgressUpdate, WarmUpStage};
use crate::types::SizeType;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WARMUP_THREAD_NAME: &str = "note-size-warmup";

/// Cooperative cancellation flag, checked once per note or card
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How a warm-up walk that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUpOutcome {
    Completed,
    Cancelled,
}

/// Lifecycle of a background warm-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUpState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Drives the warm-up walk over one collection
#[derive(Clone)]
pub struct CacheInitializer {
    manager: Arc<CacheManager>,
    collection: Arc<dyn Collection>,
    progress_stride: usize,
}

impl CacheInitializer {
    pub fn new(
        manager: Arc<CacheManager>,
        collection: Arc<dyn Collection>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            manager,
            collection,
            progress_stride: config.progress_stride.max(1),
        }
    }

    /// Run the walk on the calling thread
    pub fn run(
        &self,
        token: &CancellationToken,
        progress: &dyn ProgressProvider,
    ) -> Result<WarmUpOutcome> {
        let start = Instant::now();
        self.manager.set_all_initialized(false);

        progress.report(ProgressUpdate::Status {
            message: "Calculating note sizes".to_string(),
        });
        if self.walk_notes(token, progress)? == WarmUpOutcome::Cancelled {
            return Ok(self.cancelled());
        }

        self.manager.updated_files_calculator().build_index(true)?;
        self.manager.used_files_calculator().get_used_files_size(true)?;

        progress.report(ProgressUpdate::Status {
            message: "Resolving cards".to_string(),
        });
        if self.walk_cards(token, progress)? == WarmUpOutcome::Cancelled {
            return Ok(self.cancelled());
        }

        self.manager.set_all_initialized(true);
        info!(
            "Cache warm-up completed in {:.2?} ({} entries)",
            start.elapsed(),
            self.manager.aggregate_size()
        );
        Ok(WarmUpOutcome::Completed)
    }

    /// Run the walk on a dedicated background thread
    pub fn spawn(&self, progress: Arc<dyn ProgressProvider>) -> Result<WarmUpHandle> {
        let token = CancellationToken::new();
        let state = Arc::new(Mutex::new(WarmUpState::Running));

        let initializer = self.clone();
        let worker_token = token.clone();
        let worker_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name(WARMUP_THREAD_NAME.to_string())
            .spawn(move || {
                let result = initializer.run(&worker_token, progress.as_ref());
                let final_state = match &result {
                    Ok(WarmUpOutcome::Completed) => WarmUpState::Completed,
                    Ok(WarmUpOutcome::Cancelled) => WarmUpState::Cancelled,
                    Err(e) => {
                        error!("Cache warm-up failed: {e:?}");
                        progress.report(ProgressUpdate::Status {
                            message: format!("Cache warm-up failed: {e}"),
                        });
                        WarmUpState::Failed
                    }
                };
                *worker_state.lock() = final_state;
                progress.complete();
                result
            })?;

        info!("Started cache warm-up in background");
        Ok(WarmUpHandle {
            token,
            state,
            thread: Some(thread),
        })
    }

    fn walk_notes(
        &self,
        token: &CancellationToken,
        progress: &dyn ProgressProvider,
    ) -> Result<WarmUpOutcome> {
        let note_ids = self.collection.all_note_ids()?;
        let total = note_ids.len();
        debug!("Warming up {total} note(s)");

        let size_str_cache = self.manager.size_str_cache();
        let size_calculator = self.manager.size_calculator();
        let file_type_helper = self.manager.file_type_helper();

        for (index, note_id) in note_ids.into_iter().enumerate() {
            if token.is_cancelled() {
                return Ok(WarmUpOutcome::Cancelled);
            }

            let note = match self.collection.get_note(note_id) {
                Ok(note) => note,
                Err(e) if e.is_not_found() => {
                    warn!("Note {note_id} disappeared during warm-up, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for size_type in SizeType::ALL {
                size_str_cache.calculate_note_size_str(&note, size_type, true);
            }
            for file in size_calculator.calculate_note_files(&note, true) {
                file_type_helper.get_file_type(&file, true);
            }

            self.report(progress, WarmUpStage::Notes, index + 1, total);
        }
        Ok(WarmUpOutcome::Completed)
    }

    fn walk_cards(
        &self,
        token: &CancellationToken,
        progress: &dyn ProgressProvider,
    ) -> Result<WarmUpOutcome> {
        let card_ids = self.collection.all_card_ids()?;
        let total = card_ids.len();
        debug!("Warming up {total} card(s)");

        let item_id_cache = self.manager.item_id_cache();
        for (index, card_id) in card_ids.into_iter().enumerate() {
            if token.is_cancelled() {
                return Ok(WarmUpOutcome::Cancelled);
            }

            match item_id_cache.get_note_id_by_card_id(card_id) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    warn!("Card {card_id} disappeared during warm-up, skipping");
                }
                Err(e) => return Err(e),
            }

            self.report(progress, WarmUpStage::Cards, index + 1, total);
        }
        Ok(WarmUpOutcome::Completed)
    }

    fn report(
        &self,
        progress: &dyn ProgressProvider,
        stage: WarmUpStage,
        current: usize,
        total: usize,
    ) {
        if current % self.progress_stride == 0 || current == total {
            progress.report(ProgressUpdate::WarmUp {
                stage,
                current,
                total,
            });
        }
    }

    fn cancelled(&self) -> WarmUpOutcome {
        info!("Cache warm-up cancelled");
        WarmUpOutcome::Cancelled
    }
}

/// Handle on a running background warm-up
pub struct WarmUpHandle {
    token: CancellationToken,
    state: Arc<Mutex<WarmUpState>>,
    thread: Option<JoinHandle<Result<WarmUpOutcome>>>,
}

impl WarmUpHandle {
    /// Ask the walk to stop at the next note or card
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .is_none_or(|thread| thread.is_finished())
    }

    pub fn state(&self) -> WarmUpState {
        *self.state.lock()
    }

    /// Wait for the walk to end; a panicking walk is reported as failed
    pub fn join(mut self) -> Result<WarmUpOutcome> {
        let Some(thread) = self.thread.take() else {
            return Err(InternalError::background_task(WARMUP_THREAD_NAME, "already joined").into());
        };

        match thread.join() {
            Ok(result) => result,
            Err(payload) => {
                *self.state.lock() = WarmUpState::Failed;
                let message = panic_message(payload.as_ref());
                error!("Cache warm-up panicked: {message}");
                Err(Error::from(InternalError::background_task(
                    WARMUP_THREAD_NAME,
                    &message,
                )))
            }
        }
    }
}

impl Drop for WarmUpHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.token.cancel();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
