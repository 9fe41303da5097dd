use crate::CellState;
use anyhow::{anyhow, Result};
use rand::Rng;
use std::fmt;

/// One generation of the automaton: a dense cube of `edge³` cells.
///
/// # Overview
///
/// Cells are stored in a flat vector, one byte per cell, with `z` varying
/// fastest: the cell `(x, y, z)` lives at `(x * edge + y) * edge + z`.
/// A slab of consecutive `x` planes is therefore a contiguous slice, which is
/// what [`Grid::next_generation_parallel`] splits between threads.
///
/// A `Grid` is never mutated after construction by anything a reader can
/// observe: computing the next generation always builds a new value.
///
/// # Boundary
///
/// The cube is open: positions outside `0..edge` on any axis are absent and
/// never count as neighbors. There is no wraparound and no reflection, so
/// corner cells can see at most 7 live neighbors, edge cells 11 and face
/// cells 17.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    /// Side length of the cube.
    edge: usize,
    /// States of all cells, see the layout above.
    cells: Vec<CellState>,
}

impl Grid {
    /// Number of cells in a cube with side `edge`, or an error if it overflows.
    fn volume(edge: usize) -> Result<usize> {
        if edge == 0 {
            return Err(anyhow!("grid edge must be positive"));
        }
        edge.checked_mul(edge)
            .and_then(|x| x.checked_mul(edge))
            .ok_or_else(|| anyhow!("grid edge {} is too large", edge))
    }

    /// Allocates storage for `edge³` dead cells, reporting allocation failure
    /// as an error instead of aborting.
    fn alloc_cells(edge: usize) -> Result<Vec<CellState>> {
        let len = Self::volume(edge)?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| anyhow!("cannot allocate {}^3 cells: {}", edge, e))?;
        cells.resize(len, CellState::Dead);
        Ok(cells)
    }

    /// Creates a grid where every cell is dead.
    pub fn dead(edge: usize) -> Result<Self> {
        Ok(Self {
            edge,
            cells: Self::alloc_cells(edge)?,
        })
    }

    /// Creates a grid whose cells are given by `f(x, y, z)`.
    pub fn from_fn(
        edge: usize,
        mut f: impl FnMut(usize, usize, usize) -> CellState,
    ) -> Result<Self> {
        let mut grid = Self::dead(edge)?;
        for (idx, cell) in grid.cells.iter_mut().enumerate() {
            let (x, y, z) = Self::coords_in(edge, idx);
            *cell = f(x, y, z);
        }
        Ok(grid)
    }

    /// Creates a grid where each cell is independently alive with probability 1/2.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` is zero or the cells cannot be allocated.
    pub fn random<R: Rng + ?Sized>(edge: usize, rng: &mut R) -> Result<Self> {
        Self::from_fn(edge, |_, _, _| rng.random_bool(0.5).into())
    }

    /// Returns the side length of the cube.
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.edge + y) * self.edge + z
    }

    #[inline]
    fn coords_in(edge: usize, idx: usize) -> (usize, usize, usize) {
        let plane = edge * edge;
        (idx / plane, idx / edge % edge, idx % edge)
    }

    #[inline]
    fn assert_in_bounds(&self, x: usize, y: usize, z: usize) {
        assert!(
            x < self.edge && y < self.edge && z < self.edge,
            "coordinate ({}, {}, {}) is out of bounds for a grid with edge {}",
            x,
            y,
            z,
            self.edge
        );
    }

    /// Returns the state of the cell at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not below [`Grid::edge`].
    pub fn get(&self, x: usize, y: usize, z: usize) -> CellState {
        self.assert_in_bounds(x, y, z);
        self.cells[self.index(x, y, z)]
    }

    /// Returns the state of the cell at `(x, y, z)`, or `None` if it is outside the grid.
    pub fn try_get(&self, x: usize, y: usize, z: usize) -> Option<CellState> {
        (x < self.edge && y < self.edge && z < self.edge).then(|| self.cells[self.index(x, y, z)])
    }

    /// Returns a copy of the grid with the cell at `(x, y, z)` set to `state`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not below [`Grid::edge`].
    pub fn with_cell(&self, x: usize, y: usize, z: usize, state: CellState) -> Self {
        self.assert_in_bounds(x, y, z);
        let mut grid = self.clone();
        let idx = grid.index(x, y, z);
        grid.cells[idx] = state;
        grid
    }

    /// Counts live cells among the 26 neighbors of `(x, y, z)` that lie inside the grid.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not below [`Grid::edge`].
    pub fn count_live_neighbors(&self, x: usize, y: usize, z: usize) -> u8 {
        self.assert_in_bounds(x, y, z);
        let last = self.edge - 1;
        let mut count = 0;
        for nx in x.saturating_sub(1)..=(x + 1).min(last) {
            for ny in y.saturating_sub(1)..=(y + 1).min(last) {
                for nz in z.saturating_sub(1)..=(z + 1).min(last) {
                    if (nx, ny, nz) != (x, y, z) && self.cells[self.index(nx, ny, nz)].is_alive() {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Writes the next state of the cells starting at flat index `offset` into `dst`.
    fn fill_next<F>(&self, offset: usize, dst: &mut [CellState], rule: &F)
    where
        F: Fn(CellState, u8) -> CellState,
    {
        for (i, cell) in dst.iter_mut().enumerate() {
            let idx = offset + i;
            let (x, y, z) = Self::coords_in(self.edge, idx);
            *cell = rule(self.cells[idx], self.count_live_neighbors(x, y, z));
        }
    }

    /// Builds the next generation by applying `rule` to every cell.
    ///
    /// Neighbor counts are always taken from `self`, so every cell is updated
    /// from the previous generation only. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the new cells cannot be allocated.
    pub fn next_generation<F>(&self, rule: F) -> Result<Self>
    where
        F: Fn(CellState, u8) -> CellState,
    {
        let mut cells = Self::alloc_cells(self.edge)?;
        self.fill_next(0, &mut cells, &rule);
        Ok(Self {
            edge: self.edge,
            cells,
        })
    }

    /// Same as [`Grid::next_generation`], but splits the cube into slabs of
    /// `x` planes computed on up to `workers` scoped threads.
    ///
    /// The result does not depend on `workers`.
    pub fn next_generation_parallel<F>(&self, rule: F, workers: usize) -> Result<Self>
    where
        F: Fn(CellState, u8) -> CellState + Sync,
    {
        let workers = workers.clamp(1, self.edge);
        if workers == 1 {
            return self.next_generation(rule);
        }

        let mut cells = Self::alloc_cells(self.edge)?;
        let slab_len = self.edge.div_ceil(workers) * self.edge * self.edge;
        let rule = &rule;
        std::thread::scope(|s| {
            for (i, slab) in cells.chunks_mut(slab_len).enumerate() {
                s.spawn(move || self.fill_next(i * slab_len, slab, rule));
            }
        });
        Ok(Self {
            edge: self.edge,
            cells,
        })
    }

    /// Returns the number of live cells.
    pub fn population(&self) -> u64 {
        self.cells.iter().filter(|c| c.is_alive()).count() as u64
    }

    /// Iterates over the coordinates of live cells in `x`, `y`, `z` order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive())
            .map(|(idx, _)| Self::coords_in(self.edge, idx))
    }

    /// Returns the approximate heap memory usage of the grid in bytes.
    pub fn bytes_total(&self) -> usize {
        self.cells.capacity() * size_of::<CellState>()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("edge", &self.edge)
            .field("population", &self.population())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::next_state;
    use rand::SeedableRng;
    use CellState::{Alive, Dead};
    const SEED: u64 = 42;

    fn random_grid(edge: usize) -> Grid {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(SEED);
        Grid::random(edge, &mut rng).unwrap()
    }

    /// Neighbor count computed the slow way, straight from the definition.
    fn brute_neighbors(grid: &Grid, x: usize, y: usize, z: usize) -> u8 {
        let mut count = 0;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                for dz in -1i64..=1 {
                    if (dx, dy, dz) == (0, 0, 0) {
                        continue;
                    }
                    let (nx, ny, nz) = (x as i64 + dx, y as i64 + dy, z as i64 + dz);
                    if nx < 0 || ny < 0 || nz < 0 {
                        continue;
                    }
                    if grid.try_get(nx as usize, ny as usize, nz as usize) == Some(Alive) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_zero_edge_rejected() {
        assert!(Grid::dead(0).is_err());
    }

    #[test]
    fn test_overflowing_edge_rejected() {
        assert!(Grid::dead(usize::MAX).is_err());
    }

    #[test]
    fn test_layout() {
        let grid = Grid::dead(4).unwrap().with_cell(1, 2, 3, Alive);
        assert_eq!(grid.get(1, 2, 3), Alive);
        assert_eq!(grid.get(3, 2, 1), Dead);
        assert_eq!(grid.population(), 1);
        assert_eq!(grid.live_cells().collect::<Vec<_>>(), vec![(1, 2, 3)]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds_panics() {
        let grid = Grid::dead(3).unwrap();
        grid.get(0, 3, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_neighbors_out_of_bounds_panics() {
        let grid = Grid::dead(3).unwrap();
        grid.count_live_neighbors(3, 0, 0);
    }

    #[test]
    fn test_try_get() {
        let grid = Grid::dead(2).unwrap();
        assert_eq!(grid.try_get(1, 1, 1), Some(Dead));
        assert_eq!(grid.try_get(2, 0, 0), None);
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = random_grid(9);
        let b = random_grid(9);
        assert_eq!(a, b);
        // 729 fair coin flips: anything outside this band is not a fair coin
        let population = a.population();
        assert!(population > 250 && population < 480, "population {}", population);
    }

    #[test]
    fn test_neighbor_bounds_full_grid() {
        let grid = Grid::from_fn(3, |_, _, _| Alive).unwrap();
        assert_eq!(grid.count_live_neighbors(1, 1, 1), 26);
        assert_eq!(grid.count_live_neighbors(0, 0, 0), 7);
        assert_eq!(grid.count_live_neighbors(2, 2, 2), 7);
        assert_eq!(grid.count_live_neighbors(0, 0, 1), 11);
        assert_eq!(grid.count_live_neighbors(0, 1, 1), 17);
    }

    #[test]
    fn test_neighbor_bounds_random() {
        let grid = random_grid(10);
        for x in 0..10 {
            for y in 0..10 {
                for z in 0..10 {
                    let count = grid.count_live_neighbors(x, y, z);
                    assert!(count <= 26);
                    assert_eq!(count, brute_neighbors(&grid, x, y, z), "at ({x}, {y}, {z})");
                }
            }
        }
    }

    #[test]
    fn test_zero_face_counts_as_neighbor() {
        let grid = Grid::dead(3).unwrap().with_cell(0, 0, 0, Alive);
        assert_eq!(grid.count_live_neighbors(1, 1, 1), 1);
        assert_eq!(grid.count_live_neighbors(0, 1, 0), 1);
        assert_eq!(grid.count_live_neighbors(2, 2, 2), 0);
    }

    #[test]
    fn test_no_wraparound() {
        let grid = Grid::dead(5).unwrap().with_cell(4, 4, 4, Alive);
        assert_eq!(grid.count_live_neighbors(0, 0, 0), 0);
        assert_eq!(grid.count_live_neighbors(0, 4, 4), 0);
    }

    #[test]
    fn test_neighbor_count_is_deterministic() {
        let grid = random_grid(6);
        let first = grid.next_generation(next_state).unwrap();
        for _ in 0..3 {
            assert_eq!(grid.next_generation(next_state).unwrap(), first);
        }
    }

    #[test]
    fn test_synchronous_update_2x2x2() {
        // every cell neighbors the other 7
        let initial_alive = [(0, 0, 0), (0, 0, 1), (0, 1, 0), (1, 0, 0)];
        let grid = Grid::from_fn(2, |x, y, z| initial_alive.contains(&(x, y, z)).into()).unwrap();
        let next = grid.next_generation(next_state).unwrap();

        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    let expected = next_state(grid.get(x, y, z), grid.count_live_neighbors(x, y, z));
                    assert_eq!(next.get(x, y, z), expected);
                    // live cells see 3 live neighbors and die, dead ones see 4 and are born
                    assert_ne!(next.get(x, y, z), grid.get(x, y, z));
                }
            }
        }
        // the input must not be touched
        assert_eq!(grid.population(), 4);
    }

    #[test]
    fn test_all_dead_is_stable() {
        for edge in [1, 2, 5, 8] {
            let mut grid = Grid::dead(edge).unwrap();
            for _ in 0..4 {
                grid = grid.next_generation(next_state).unwrap();
                assert_eq!(grid.population(), 0);
            }
        }
    }

    #[test]
    fn test_full_block() {
        let block = 2..=4;
        let grid = Grid::from_fn(7, |x, y, z| {
            (block.contains(&x) && block.contains(&y) && block.contains(&z)).into()
        })
        .unwrap();
        let next = grid.next_generation(next_state).unwrap();

        assert_eq!(grid.count_live_neighbors(3, 3, 3), 26);
        assert_eq!(next.get(3, 3, 3), Dead);

        // centre of a face of the block sees 9 live cells and stays dead
        assert_eq!(grid.count_live_neighbors(1, 3, 3), 9);
        assert_eq!(next.get(1, 3, 3), Dead);

        // cells facing a corner of the block see 4 and are born
        assert_eq!(grid.count_live_neighbors(1, 2, 2), 4);
        assert_eq!(next.get(1, 2, 2), Alive);

        for x in 0..7 {
            for y in 0..7 {
                for z in 0..7 {
                    let count = grid.count_live_neighbors(x, y, z);
                    let expected = if (4..=5).contains(&count) { Alive } else { Dead };
                    assert_eq!(next.get(x, y, z), expected, "at ({x}, {y}, {z})");
                }
            }
        }
        // the whole block dies, four cells are born in front of each of its six faces
        assert_eq!(next.population(), 24);
    }

    #[test]
    fn test_parallel_matches_serial() {
        for edge in [1, 3, 7, 16] {
            let grid = random_grid(edge);
            let serial = grid.next_generation(next_state).unwrap();
            for workers in [2, 3, 4, 64] {
                let parallel = grid.next_generation_parallel(next_state, workers).unwrap();
                assert_eq!(serial, parallel, "edge {} workers {}", edge, workers);
            }
        }
    }

    #[test]
    fn test_bytes_total() {
        let grid = Grid::dead(10).unwrap();
        assert!(grid.bytes_total() >= 1000);
    }
}
