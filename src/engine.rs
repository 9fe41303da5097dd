use crate::{next_state, GenerationSource, Grid, SimulationConfig};
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{
    ops::Deref,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A completed generation, as published to readers.
#[derive(Debug)]
pub struct Generation {
    /// 0 for the seeded grid, then incremented by one per published tick.
    index: u64,
    grid: Grid,
}

impl Generation {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

impl Deref for Generation {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        &self.grid
    }
}

/// Asks a running [`SimulationEngine::run`] loop to finish.
///
/// The request is checked at tick boundaries, so a generation that is being
/// computed is still published before the loop returns.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }
}

/// Drives the automaton forward and publishes every completed generation.
///
/// # Overview
///
/// The engine owns a single slot holding the current [`Generation`] behind an
/// [`Arc`]. A tick reads that slot once, computes a whole new [`Grid`] from it
/// without holding any lock, and then replaces the slot in one swap. Readers
/// clone the `Arc` in constant time, so they always see one complete
/// generation and never wait for a computation to finish. Superseded
/// generations are freed when the last reader drops its snapshot.
///
/// The engine is the only writer. Concurrent calls to [`SimulationEngine::tick`]
/// are serialized so that generation indices stay sequential.
///
/// # Example
///
/// ```rust
/// use life3d::{GenerationSource, SimulationConfig, SimulationEngine};
///
/// let config = SimulationConfig {
///     seed: Some(7),
///     ..SimulationConfig::with_edge(16)
/// };
/// let engine = SimulationEngine::new(&config).unwrap();
/// assert_eq!(engine.current_generation().index(), 0);
///
/// engine.tick().unwrap();
/// let snapshot = engine.current_generation();
/// assert_eq!(snapshot.index(), 1);
/// assert_eq!(snapshot.edge(), engine.edge_length());
/// ```
pub struct SimulationEngine {
    published: watch::Sender<Arc<Generation>>,
    /// Held for the whole tick so that two writers never compute from the same input.
    tick_lock: Mutex<()>,
    tick_interval: Duration,
    workers: usize,
    stop: Arc<watch::Sender<bool>>,
}

impl SimulationEngine {
    /// Creates an engine whose generation 0 is a random grid.
    ///
    /// The grid is seeded from `config.seed` if present, from the OS otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the grid cannot be allocated.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = if let Some(seed) = config.seed {
            ChaCha8Rng::seed_from_u64(seed)
        } else {
            ChaCha8Rng::from_os_rng()
        };
        let grid = Grid::random(config.edge, &mut rng)?;
        Self::from_grid(grid, config)
    }

    /// Creates an engine whose generation 0 is `grid`.
    ///
    /// The edge length is taken from `grid`; `config.edge` and `config.seed` are ignored.
    pub fn from_grid(grid: Grid, config: &SimulationConfig) -> Result<Self> {
        SimulationConfig {
            edge: grid.edge(),
            ..config.clone()
        }
        .validate()?;

        let (published, _) = watch::channel(Arc::new(Generation { index: 0, grid }));
        let (stop, _) = watch::channel(false);
        Ok(Self {
            published,
            tick_lock: Mutex::new(()),
            tick_interval: config.tick_interval,
            workers: config.workers,
            stop: Arc::new(stop),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Computes and publishes one generation, returning its index.
    ///
    /// # Errors
    ///
    /// Returns an error if the new grid cannot be allocated. The previously
    /// published generation stays visible in that case.
    pub fn tick(&self) -> Result<u64> {
        // the guard orders writers only, a panic in a previous tick left nothing half-done
        let _guard = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = self.current_generation();
        let timer = Instant::now();
        let grid = previous
            .grid
            .next_generation_parallel(next_state, self.workers)
            .with_context(|| format!("failed to compute generation {}", previous.index + 1))?;
        let index = previous.index + 1;
        self.published.send_replace(Arc::new(Generation { index, grid }));
        debug!(
            generation = index,
            elapsed_ms = timer.elapsed().as_secs_f64() * 1e3,
            "published generation"
        );
        Ok(index)
    }

    /// Returns a receiver that is notified whenever a generation is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Generation>> {
        self.published.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Ticks forever: compute, publish, sleep for the tick interval.
    ///
    /// The computation runs on the blocking thread pool, so this future can
    /// share a runtime with readers without starving them. The loop only
    /// returns once a [`StopHandle`] asks it to, which is checked before each
    /// tick and while sleeping. An engine that has been stopped stays stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if a tick fails or panics. The last generation
    /// published before the failure stays visible.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let mut stop = self.stop.subscribe();
        info!(
            edge = self.edge_length(),
            interval_ms = self.tick_interval.as_millis() as u64,
            workers = self.workers,
            "simulation started"
        );

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let engine = Arc::clone(&self);
            let timer = Instant::now();
            let index = tokio::task::spawn_blocking(move || engine.tick())
                .await
                .context("generation task panicked")??;
            let elapsed = timer.elapsed();
            if elapsed > self.tick_interval {
                warn!(
                    generation = index,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "generation took longer than the tick interval"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick_interval) => {}
                _ = stop.changed() => {}
            }
        }

        info!(
            generation = self.current_generation().index(),
            "simulation stopped"
        );
        Ok(())
    }
}

impl GenerationSource for SimulationEngine {
    fn current_generation(&self) -> Arc<Generation> {
        Arc::clone(&self.published.borrow())
    }

    fn edge_length(&self) -> usize {
        self.published.borrow().grid.edge()
    }
}
