#![warn(clippy::all)]

mod config;
mod engine;
mod grid;
mod projection;
mod rule;
mod traits;

pub use config::{ConfigError, SimulationConfig, DEFAULT_EDGE, DEFAULT_TICK_INTERVAL, MAX_EDGE};
pub use engine::{Generation, SimulationEngine, StopHandle};
pub use grid::Grid;
pub use projection::{Point, PointCloud};
pub use rule::{next_state, CellState};
pub use traits::GenerationSource;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
