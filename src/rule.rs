/// State of a single cell of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Dead = 0,
    Alive = 1,
}

impl CellState {
    #[inline]
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }
}

impl From<bool> for CellState {
    fn from(alive: bool) -> Self {
        if alive {
            CellState::Alive
        } else {
            CellState::Dead
        }
    }
}

/// Smallest live neighbor count that sustains a cell or gives birth to one.
const STABLE_MIN: u8 = 4;
/// Largest live neighbor count that sustains a cell or gives birth to one.
const STABLE_MAX: u8 = 5;

/// The fixed transition rule of the automaton.
///
/// A live cell survives only with 4 or 5 live neighbors, otherwise it dies
/// of isolation or overcrowding. A dead cell becomes alive with exactly
/// 4 or 5 live neighbors. Every other combination keeps the current state.
///
/// The function is pure: the caller must pass neighbor counts taken from the
/// previous generation only.
#[inline]
pub fn next_state(current: CellState, live_neighbors: u8) -> CellState {
    let stable = (STABLE_MIN..=STABLE_MAX).contains(&live_neighbors);
    match (current, stable) {
        (CellState::Alive, false) => CellState::Dead,
        (CellState::Dead, true) => CellState::Alive,
        (state, _) => state,
    }
}
