use crate::Grid;

/// A live cell placed in the normalized display volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Position, roughly within `[-0.5, 0.5]` on every axis.
    pub position: [f32; 3],
    /// RGB color in `[0, 1)`, a gradient along the three axes.
    pub color: [f32; 3],
}

impl Point {
    /// Projects the cell `(x, y, z)` of a grid with side `edge`.
    pub fn for_cell(x: usize, y: usize, z: usize, edge: usize) -> Self {
        let n = edge as f32;
        let position = [x, y, z].map(|c| (1.0 + c as f32 - n / 2.0) / n);
        let color = [x, y, z].map(|c| c as f32 / n);
        Self { position, color }
    }
}

/// The points a renderer draws for one generation.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    points: Vec<Point>,
}

impl PointCloud {
    /// Projects every live cell of `grid`.
    pub fn from_grid(grid: &Grid) -> Self {
        let edge = grid.edge();
        let points = grid
            .live_cells()
            .map(|(x, y, z)| Point::for_cell(x, y, z, edge))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
