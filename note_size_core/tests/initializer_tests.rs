//! Background warm-up: completion, cancellation and failure

use note_size_core::cache::{
    Cache, CacheInitializer, CacheManager, CancellationToken, WarmUpOutcome, WarmUpState,
};
use note_size_core::progress::{
    ChannelProvider, NullProvider, ProgressProvider, ProgressUpdate, WarmUpStage,
};
use note_size_core::{CacheConfig, Collection, SizeType};
use note_size_test_utils::{MockCollection, NoteBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn collection_with_notes(count: i64) -> Arc<MockCollection> {
    let collection = Arc::new(MockCollection::new());
    collection.add_media_file("shared.jpg", b"0123456789");
    for id in 1..=count {
        NoteBuilder::new()
            .field(&format!("note number {id}"))
            .image("shared.jpg")
            .card(id * 10)
            .card(id * 10 + 1)
            .insert(&collection, id);
    }
    collection
}

fn initializer_for(
    collection: &Arc<MockCollection>,
    stride: usize,
) -> (Arc<CacheManager>, CacheInitializer) {
    let dyn_collection: Arc<dyn Collection> = collection.clone();
    let manager = Arc::new(CacheManager::new(Arc::clone(&dyn_collection), 1));
    let config = CacheConfig {
        progress_stride: stride,
        ..CacheConfig::default()
    };
    let initializer = CacheInitializer::new(Arc::clone(&manager), dyn_collection, &config);
    (manager, initializer)
}

/// Cancels the walk once a given number of updates went by
struct CancelAfter {
    token: CancellationToken,
    remaining: AtomicUsize,
}

impl ProgressProvider for CancelAfter {
    fn report(&self, update: ProgressUpdate) {
        if matches!(update, ProgressUpdate::WarmUp { .. })
            && self.remaining.fetch_sub(1, Ordering::SeqCst) == 1
        {
            self.token.cancel();
        }
    }

    fn complete(&self) {}
}

/// Panics on the first note-stage update
struct Exploding;

impl ProgressProvider for Exploding {
    fn report(&self, update: ProgressUpdate) {
        if let ProgressUpdate::WarmUp { .. } = update {
            panic!("renderer crashed");
        }
    }

    fn complete(&self) {}
}

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn test_completed_walk_populates_and_initializes() {
        let collection = collection_with_notes(5);
        let (manager, initializer) = initializer_for(&collection, 1);

        let outcome = initializer
            .run(&CancellationToken::new(), &NullProvider)
            .unwrap();

        assert_eq!(outcome, WarmUpOutcome::Completed);
        assert!(manager.is_initialized());
        assert_eq!(manager.item_id_cache().cache_size(), 10);
        assert_eq!(manager.file_type_helper().cache_size(), 1);
        assert_eq!(manager.size_str_cache().cache_size(), 15);
        assert_eq!(manager.used_files_calculator().cache_size(), 1);
        assert_eq!(manager.updated_files_calculator().cache_size(), 1);

        let lookups = collection.note_lookups();
        for id in 1..=5 {
            manager
                .size_calculator()
                .get_note_size(note_size_core::NoteId(id), SizeType::Total, true)
                .unwrap();
        }
        assert_eq!(collection.note_lookups(), lookups);
    }

    #[test]
    fn test_progress_throttled_by_stride() {
        let collection = collection_with_notes(10);
        let (_manager, initializer) = initializer_for(&collection, 4);
        let (provider, rx) = ChannelProvider::channel();

        initializer
            .run(&CancellationToken::new(), &provider)
            .unwrap();
        provider.complete();

        let note_updates: Vec<usize> = rx
            .iter()
            .filter_map(|update| match update {
                ProgressUpdate::WarmUp {
                    stage: WarmUpStage::Notes,
                    current,
                    total,
                } => {
                    assert_eq!(total, 10);
                    Some(current)
                }
                _ => None,
            })
            .collect();
        assert_eq!(note_updates, vec![4, 8, 10]);
    }

    #[test]
    fn test_cancelled_walk_is_not_initialized() {
        let collection = collection_with_notes(20);
        let (manager, initializer) = initializer_for(&collection, 1);
        let token = CancellationToken::new();
        let provider = CancelAfter {
            token: token.clone(),
            remaining: AtomicUsize::new(3),
        };

        let outcome = initializer.run(&token, &provider).unwrap();

        assert_eq!(outcome, WarmUpOutcome::Cancelled);
        assert!(!manager.is_initialized());
        assert_eq!(manager.size_str_cache().cache_size(), 9);
        assert_eq!(manager.item_id_cache().cache_size(), 0);
    }

    #[test]
    fn test_host_failure_fails_walk() {
        let collection = collection_with_notes(3);
        let (manager, initializer) = initializer_for(&collection, 1);
        collection.set_failing(true);

        let result = initializer.run(&CancellationToken::new(), &NullProvider);

        assert!(result.is_err());
        assert!(!manager.is_initialized());
    }
}

#[cfg(test)]
mod background_tests {
    use super::*;

    #[test]
    fn test_spawned_walk_completes() {
        let collection = collection_with_notes(50);
        let (manager, initializer) = initializer_for(&collection, 10);
        let (provider, rx) = ChannelProvider::channel();

        let handle = initializer.spawn(Arc::new(provider)).unwrap();
        let updates: Vec<ProgressUpdate> = rx.iter().collect();
        let outcome = handle.join().unwrap();

        assert_eq!(outcome, WarmUpOutcome::Completed);
        assert!(manager.is_initialized());
        assert!(updates.contains(&ProgressUpdate::WarmUp {
            stage: WarmUpStage::Cards,
            current: 100,
            total: 100,
        }));
    }

    #[test]
    fn test_spawned_walk_reports_final_state() {
        let collection = collection_with_notes(2);
        let (_manager, initializer) = initializer_for(&collection, 1);
        let (provider, rx) = ChannelProvider::channel();

        let handle = initializer.spawn(Arc::new(provider)).unwrap();
        // The sender is dropped once the walk has recorded its state
        for _ in rx.iter() {}
        assert_eq!(handle.state(), WarmUpState::Completed);
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_before_start_of_walk() {
        let collection = collection_with_notes(200);
        let (manager, initializer) = initializer_for(&collection, 1);
        let token = CancellationToken::new();
        token.cancel();

        let outcome = initializer.run(&token, &NullProvider).unwrap();
        assert_eq!(outcome, WarmUpOutcome::Cancelled);
        assert_eq!(manager.aggregate_size(), 0);
    }

    #[test]
    fn test_panicking_walk_reported_as_failure() {
        let collection = collection_with_notes(3);
        let (manager, initializer) = initializer_for(&collection, 1);

        let handle = initializer.spawn(Arc::new(Exploding)).unwrap();
        let error = handle.join().unwrap_err();

        assert!(error.to_string().contains("renderer crashed"));
        assert!(!manager.is_initialized());
    }
}
