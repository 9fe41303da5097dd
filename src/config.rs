use std::time::Duration;
use thiserror::Error;

/// Edge length used when none is given.
pub const DEFAULT_EDGE: usize = 200;
/// Largest accepted edge length: 2^30 cells, one byte each, per generation.
pub const MAX_EDGE: usize = 1024;
/// Pause between two generations.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Reasons to refuse starting a simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid edge must be positive")]
    ZeroEdge,

    #[error("grid edge {edge} exceeds the limit of {max}")]
    EdgeTooLarge { edge: usize, max: usize },

    #[error("tick interval must be non-zero")]
    ZeroTickInterval,

    #[error("at least one worker thread is required")]
    ZeroWorkers,
}

/// Startup parameters of a [`SimulationEngine`](crate::SimulationEngine).
///
/// They are read once when the engine is created; the grid size cannot be
/// changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Side length of the cubic grid.
    pub edge: usize,
    /// Wall-clock pause after each published generation.
    pub tick_interval: Duration,
    /// Threads used to compute one generation.
    pub workers: usize,
    /// Seed for the initial random grid; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            edge: DEFAULT_EDGE,
            tick_interval: DEFAULT_TICK_INTERVAL,
            workers: 1,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Default configuration with the given edge length.
    pub fn with_edge(edge: usize) -> Self {
        Self {
            edge,
            ..Self::default()
        }
    }

    /// Checks that the configuration describes a grid worth allocating.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edge == 0 {
            return Err(ConfigError::ZeroEdge);
        }
        if self.edge > MAX_EDGE {
            return Err(ConfigError::EdgeTooLarge {
                edge: self.edge,
                max: MAX_EDGE,
            });
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}
