use crate::Generation;
use std::sync::Arc;
use tokio::sync::watch;

/// Read side of a simulation, as seen by a renderer.
pub trait GenerationSource {
    /// Returns the latest published generation.
    ///
    /// This only clones a reference: it takes constant time and never waits
    /// for a generation that is being computed. The returned snapshot stays
    /// valid and unchanged for as long as the caller holds it, so a whole
    /// frame should be drawn from a single call.
    fn current_generation(&self) -> Arc<Generation>;

    /// Returns the side length of the grid, used to map cells into a
    /// normalized display volume.
    fn edge_length(&self) -> usize;
}

impl GenerationSource for watch::Receiver<Arc<Generation>> {
    fn current_generation(&self) -> Arc<Generation> {
        Arc::clone(&self.borrow())
    }

    fn edge_length(&self) -> usize {
        self.borrow().grid().edge()
    }
}
