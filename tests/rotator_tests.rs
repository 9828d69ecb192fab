use rotating_bloom_rs::{
    BitStorage, BloomFilter, CancellationToken, FilterError, FilterFactory,
    InMemoryFilterFactory, InMemoryStorage, Result, Rotator, RotatorConfig,
    RotatorConfigBuilder,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

fn manual_config() -> RotatorConfig {
    RotatorConfigBuilder::default()
        .enabled(false)
        .period(Duration::from_secs(3))
        .build()
        .expect("Failed to build rotator config")
}

// Helper function to create a rotator that only rotates on demand
fn create_manual_rotator(m: usize, k: usize) -> Rotator {
    Rotator::new(
        manual_config(),
        InMemoryFilterFactory::with_params(m, k),
        &CancellationToken::new(),
    )
    .expect("Failed to create rotator")
}

// Helper function to generate consistent test data
fn generate_test_items(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("test_item_{:06}", i).into_bytes())
        .collect()
}

#[cfg(test)]
mod membership_tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let rotator = create_manual_rotator(10_000, 5);
        let items = generate_test_items(500);

        for item in &items {
            rotator.add(item).unwrap();
        }
        for item in &items {
            assert!(rotator.exist(item).unwrap(), "No false negatives allowed");
        }
    }

    #[test]
    fn test_no_false_negatives_under_load() {
        let rotator = create_manual_rotator(2_000, 3);
        rotator.add("anchor").unwrap();

        // Saturate the filter with other values
        for item in generate_test_items(5_000) {
            rotator.add(item).unwrap();
            assert!(rotator.exist("anchor").unwrap());
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let once = create_manual_rotator(1_000, 4);
        let many = create_manual_rotator(1_000, 4);

        once.add("hello").unwrap();
        for _ in 0..10 {
            many.add("hello").unwrap();
        }

        assert_eq!(once.exist("hello").unwrap(), many.exist("hello").unwrap());
        many.rotate().unwrap();
        assert!(many.exist("hello").unwrap());
        many.rotate().unwrap();
        assert!(!many.exist("hello").unwrap());
    }

    #[test]
    fn test_symmetric_fan_out() {
        let rotator = create_manual_rotator(100, 3);
        rotator.add("hello").unwrap();

        let pair = rotator.pair();
        assert!(pair.current().exist("hello").unwrap());
        assert!(pair.next().exist("hello").unwrap());
    }

    #[test]
    fn test_next_is_never_consulted() {
        let rotator = create_manual_rotator(100, 3);
        rotator.pair().next().add("only-next").unwrap();
        assert!(!rotator.exist("only-next").unwrap());

        // ...until it is promoted
        rotator.rotate().unwrap();
        assert!(rotator.exist("only-next").unwrap());
    }
}

#[cfg(test)]
mod windowing_tests {
    use super::*;

    #[test]
    fn test_rotation_scenario() {
        let rotator = create_manual_rotator(100, 3);

        assert!(!rotator.exist("hello").unwrap());
        rotator.add("hello").unwrap();
        assert!(rotator.exist("hello").unwrap());

        rotator.rotate().unwrap();

        let pair = rotator.pair();
        assert!(pair.current().exist("hello").unwrap());
        assert!(!pair.next().exist("hello").unwrap());
    }

    #[test]
    fn test_element_ages_out_after_two_rotations() {
        let rotator = create_manual_rotator(1_000, 3);
        rotator.add("hello").unwrap();

        rotator.rotate().unwrap();
        assert!(rotator.exist("hello").unwrap(), "alive after one rotation");

        rotator.rotate().unwrap();
        assert!(!rotator.exist("hello").unwrap(), "gone after two rotations");
    }

    #[test]
    fn test_readding_extends_window() {
        let rotator = create_manual_rotator(1_000, 3);
        rotator.add("hello").unwrap();
        rotator.rotate().unwrap();

        rotator.add("hello").unwrap();
        rotator.rotate().unwrap();
        assert!(rotator.exist("hello").unwrap());

        rotator.rotate().unwrap();
        assert!(!rotator.exist("hello").unwrap());
    }

    #[test]
    fn test_generation_counts_rotations() {
        let rotator = create_manual_rotator(100, 3);
        assert_eq!(rotator.generation(), 0);
        for expected in 1..=5 {
            assert_eq!(rotator.rotate().unwrap(), expected);
            assert_eq!(rotator.pair().generation(), expected);
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    /// Storage that refuses writes once `budget` calls are used up.
    struct BudgetStorage {
        inner: InMemoryStorage,
        budget: Arc<AtomicUsize>,
    }

    impl BitStorage for BudgetStorage {
        fn set_bits(&self, indices: &[usize]) -> Result<()> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(FilterError::StorageError("timeout".into()));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.set_bits(indices)
        }

        fn check_bits(&self, indices: &[usize]) -> Result<bool> {
            self.inner.check_bits(indices)
        }
    }

    #[test]
    fn test_partial_write_is_left_in_place() {
        // shared by both generations: one write goes through
        let budget = Arc::new(AtomicUsize::new(1));
        let factory = {
            let budget = Arc::clone(&budget);
            move || -> Result<BloomFilter> {
                BloomFilter::new(
                    BudgetStorage {
                        inner: InMemoryStorage::new(100)?,
                        budget: Arc::clone(&budget),
                    },
                    100,
                    3,
                )
            }
        };
        let rotator =
            Rotator::new(manual_config(), factory, &CancellationToken::new())
                .unwrap();

        // current accepts the write, next does not
        let err = rotator.add("hello").unwrap_err();
        assert!(matches!(err, FilterError::StorageError(msg) if msg == "timeout"));

        let pair = rotator.pair();
        assert!(pair.current().exist("hello").unwrap());
        assert!(!pair.next().exist("hello").unwrap());
    }

    #[test]
    fn test_factory_failure_during_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = {
            let calls = Arc::clone(&calls);
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    InMemoryFilterFactory::with_params(100, 3).create()
                } else {
                    Err(FilterError::StorageError("connection refused".into()))
                }
            }
        };
        let result =
            Rotator::new(manual_config(), factory, &CancellationToken::new());
        assert!(matches!(result, Err(FilterError::StorageError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_adds_and_rotations() {
        let rotator = Arc::new(create_manual_rotator(100_000, 4));
        let num_threads = 8;
        let items_per_thread = 500;

        let writers: Vec<_> = (0..num_threads)
            .map(|t| {
                let rotator = Arc::clone(&rotator);
                thread::spawn(move || {
                    for i in 0..items_per_thread {
                        let item = format!("thread_{t}_item_{i}");
                        rotator.add(&item).unwrap();
                        // answer depends on how rotations interleave
                        rotator.exist(&item).unwrap();
                    }
                })
            })
            .collect();

        let rotations = {
            let rotator = Arc::clone(&rotator);
            thread::spawn(move || {
                for _ in 0..20 {
                    rotator.rotate().unwrap();
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };

        for handle in writers {
            handle.join().unwrap();
        }
        rotations.join().unwrap();

        // every rotation is applied exactly once
        assert_eq!(rotator.generation(), 20);
    }

    #[test]
    fn test_concurrent_manual_rotations_are_atomic() {
        let rotator = Arc::new(create_manual_rotator(1_000, 3));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                thread::spawn(move || {
                    for _ in 0..10 {
                        rotator.rotate().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(rotator.generation(), 100);
    }

    #[test]
    fn test_items_survive_single_concurrent_rotation() {
        let rotator = Arc::new(create_manual_rotator(100_000, 4));
        let items = generate_test_items(1_000);
        for item in &items {
            rotator.add(item).unwrap();
        }

        let reader = {
            let rotator = Arc::clone(&rotator);
            let items = items.clone();
            thread::spawn(move || {
                for item in &items {
                    assert!(rotator.exist(item).unwrap());
                }
            })
        };
        rotator.rotate().unwrap();
        reader.join().unwrap();

        for item in &items {
            assert!(rotator.exist(item).unwrap());
        }
    }
}

#[cfg(test)]
mod background_tests {
    use super::*;

    fn background_config(period: Duration) -> RotatorConfig {
        RotatorConfigBuilder::default()
            .enabled(true)
            .period(period)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_background_task_rotates() {
        let rotator = Rotator::new(
            background_config(Duration::from_millis(50)),
            InMemoryFilterFactory::with_params(1_000, 3),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(rotator.is_running());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(rotator.generation() >= 2, "got {}", rotator.generation());
    }

    #[tokio::test]
    async fn test_cancellation_stops_rotation() {
        let scope = CancellationToken::new();
        let rotator = Rotator::new(
            background_config(Duration::from_millis(20)),
            InMemoryFilterFactory::with_params(1_000, 3),
            &scope,
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scope.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!rotator.is_running());

        let frozen = rotator.generation();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rotator.generation(), frozen);

        // calls keep working on the last active pair
        rotator.add("after-stop").unwrap();
        assert!(rotator.exist("after-stop").unwrap());
    }

    #[tokio::test]
    async fn test_failed_background_rotation_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory = {
            let calls = Arc::clone(&calls);
            move || {
                // the two initial filters succeed, every rotation fails
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    InMemoryFilterFactory::with_params(100, 3).create()
                } else {
                    Err(FilterError::StorageError("unreachable".into()))
                }
            }
        };
        let rotator = Rotator::new(
            background_config(Duration::from_millis(20)),
            factory,
            &CancellationToken::new(),
        )
        .unwrap();
        rotator.add("hello").unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(calls.load(Ordering::SeqCst) > 2, "rotation was attempted");
        assert!(rotator.is_running(), "task survives failed rotations");
        assert_eq!(rotator.generation(), 0);
        assert!(rotator.exist("hello").unwrap());
    }

    #[tokio::test]
    async fn test_disabled_rotation_spawns_nothing() {
        let rotator = create_manual_rotator(100, 3);
        assert!(!rotator.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rotator.generation(), 0);
    }
}
