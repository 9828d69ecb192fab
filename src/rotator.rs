//! Two-generation rotating filter.
//!
//! A [`Rotator`] keeps a `current` and a `next` [`BloomFilter`]. Additions go
//! to both, lookups consult only `current`. Every `period` the `next` filter
//! is promoted to `current` and a fresh filter becomes `next`, so an element
//! stays visible for between one and two periods after its last addition.
//!
//! The active pair is published through an [`ArcSwap`]: callers load a
//! snapshot without locking and rotation installs a new pair without waiting
//! for them. A displaced pair is freed when the last snapshot is dropped.
use crate::bloom::BloomFilter;
use crate::config::RotatorConfig;
use crate::error::{FilterError, Result};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Builds fresh, empty filter generations.
///
/// Implemented for any `Fn() -> Result<BloomFilter>` closure.
pub trait FilterFactory: Send + Sync {
    fn create(&self) -> Result<BloomFilter>;
}

impl<F> FilterFactory for F
where
    F: Fn() -> Result<BloomFilter> + Send + Sync,
{
    fn create(&self) -> Result<BloomFilter> {
        self()
    }
}

/// Immutable snapshot of the two live filter generations.
#[derive(Debug)]
pub struct FilterPair {
    current: Arc<BloomFilter>,
    next: Arc<BloomFilter>,
    generation: u64,
}

impl FilterPair {
    /// Filter consulted for membership answers.
    pub fn current(&self) -> &BloomFilter {
        &self.current
    }

    /// Filter warming up for the following cycle.
    pub fn next(&self) -> &BloomFilter {
        &self.next
    }

    /// Number of rotations that led to this pair.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn rotated(&self, fresh: Arc<BloomFilter>) -> Self {
        Self {
            current: Arc::clone(&self.next),
            next: fresh,
            generation: self.generation + 1,
        }
    }
}

struct Shared {
    pair: ArcSwap<FilterPair>,
    factory: Box<dyn FilterFactory>,
}

impl Shared {
    fn rotate(&self) -> Result<u64> {
        // Build before touching the pair, a failed build leaves it as is.
        let fresh = Arc::new(self.factory.create()?);
        let previous = self.pair.rcu(|pair| pair.rotated(Arc::clone(&fresh)));
        Ok(previous.generation + 1)
    }
}

pub struct Rotator {
    shared: Arc<Shared>,
    config: RotatorConfig,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Rotator {
    /// Creates the initial pair from two factory calls and, when
    /// `config.enabled`, spawns the rotation task on the current tokio
    /// runtime.
    ///
    /// The task stops when `shutdown` (or any of its parents) is cancelled,
    /// when [`Rotator::stop`] is called, or when the rotator is dropped.
    pub fn new(
        config: RotatorConfig,
        factory: impl FilterFactory + 'static,
        shutdown: &CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        let current = Arc::new(factory.create()?);
        let next = Arc::new(factory.create()?);
        let shared = Arc::new(Shared {
            pair: ArcSwap::from_pointee(FilterPair {
                current,
                next,
                generation: 0,
            }),
            factory: Box::new(factory),
        });

        let shutdown = shutdown.child_token();
        let task = if config.enabled {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| FilterError::RuntimeUnavailable(e.to_string()))?;
            Some(runtime.spawn(run_rotation(
                Arc::clone(&shared),
                config.period,
                shutdown.clone(),
            )))
        } else {
            None
        };

        debug!(
            enabled = config.enabled,
            period = ?config.period,
            "rotator created"
        );

        Ok(Self {
            shared,
            config,
            shutdown,
            task,
        })
    }

    /// Adds `item` to both generations of the active pair.
    ///
    /// The two writes are not atomic together. On error the item may be
    /// present in one generation only; treat it as "membership not
    /// guaranteed".
    pub fn add(&self, item: impl AsRef<[u8]>) -> Result<()> {
        let item = item.as_ref();
        let pair = self.shared.pair.load();
        pair.current.add(item)?;
        pair.next.add(item)
    }

    /// Checks `item` against the `current` generation only.
    pub fn exist(&self, item: impl AsRef<[u8]>) -> Result<bool> {
        self.shared.pair.load().current.exist(item)
    }

    /// Promotes `next` to `current` and installs a fresh `next`.
    ///
    /// Returns the generation of the newly active pair. If building the
    /// fresh filter fails the active pair is left untouched.
    pub fn rotate(&self) -> Result<u64> {
        let generation = self.shared.rotate()?;
        debug!(generation, "filters rotated");
        Ok(generation)
    }

    /// Stops background rotation. Calls in flight are not affected.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Whether the background rotation task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Snapshot of the active pair.
    pub fn pair(&self) -> Arc<FilterPair> {
        self.shared.pair.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.shared.pair.load().generation
    }

    pub fn config(&self) -> &RotatorConfig {
        &self.config
    }
}

impl Drop for Rotator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Rotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rotator {{ enabled: {}, period: {:?}, generation: {} }}",
            self.config.enabled,
            self.config.period,
            self.generation()
        )
    }
}

async fn run_rotation(
    shared: Arc<Shared>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(?period, "rotation task started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                // The factory may do blocking I/O.
                let shared = Arc::clone(&shared);
                match tokio::task::spawn_blocking(move || shared.rotate()).await {
                    Ok(Ok(generation)) => debug!(generation, "filters rotated"),
                    Ok(Err(e)) => warn!(error = %e, "rotation skipped"),
                    Err(e) => error!(error = %e, "rotation worker failed"),
                }
            }
        }
    }

    info!("rotation task stopped");
}
