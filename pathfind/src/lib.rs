//! A* shortest-path search on a square grid of cells, plus the editing rules of the
//! interactive visualizer built on top of it.
//!
//! - [`grid`]: cells, their states and orthogonal neighbors
//! - [`find`]: the A* search, stepwise ([`PathFinder`]) or in one go ([`find_path`])
//! - [`board`]: placing start, end and walls, and running searches on the result

pub mod board;
pub mod find;
pub mod grid;

pub use board::Board;
pub use find::{
    find_path, manhattan, CancelToken, Frontier, NoopObserver, PathFinder, PathFinderState,
    PathResult, StepEvent, StepObserver,
};
pub use grid::{Cell, CellState, CellStorage, Grid, Point};
