use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

/// What a cell currently represents, both for the user and for the search
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CellState {
    #[default]
    Empty,
    Wall,
    Start,
    End,
    // discovered by the search but not finalized yet
    Open,
    // finalized by the search
    Closed,
    Path,
}

impl CellState {
    /// The character used for this state in the text grid format
    pub fn glyph(&self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Wall => '#',
            CellState::Start => 'S',
            CellState::End => 'E',
            CellState::Open => 'o',
            CellState::Closed => 'x',
            CellState::Path => '*',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<CellState> {
        match glyph {
            '.' => Some(CellState::Empty),
            '#' => Some(CellState::Wall),
            'S' => Some(CellState::Start),
            'E' => Some(CellState::End),
            'o' => Some(CellState::Open),
            'x' => Some(CellState::Closed),
            '*' => Some(CellState::Path),
            _ => None,
        }
    }
}

impl Display for CellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

impl FromStr for CellState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(glyph), None) => {
                CellState::from_glyph(glyph).ok_or_else(|| anyhow!("Invalid cell state: {}", s))
            }
            _ => Err(anyhow!("Invalid cell state: {}", s)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Number of orthogonal moves between two points on an empty grid
    pub fn manhattan(&self, other: Point) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// A single square of the grid
#[derive(Clone, Debug)]
pub struct Cell {
    point: Point,
    state: CellState,
    // side length in pixels, only of interest to renderers
    width: usize,
    neighbors: Vec<Point>,
}

impl Cell {
    fn new(point: Point, width: usize) -> Self {
        Self {
            point,
            state: CellState::Empty,
            width,
            neighbors: Vec::new(),
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn set_state(&mut self, state: CellState) {
        self.state = state;
    }

    pub fn state_is(&self, kind: CellState) -> bool {
        self.state == kind
    }

    /// The neighbors computed by the last [`Grid::update_neighbors`]
    pub fn neighbors(&self) -> &[Point] {
        &self.neighbors
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Top-left corner of the cell in pixels, as (x, y)
    pub fn pixel_origin(&self) -> (usize, usize) {
        (self.point.col * self.width, self.point.row * self.width)
    }
}

/// A square grid of cells, `rows` cells on each side, spanning `size` pixels
#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, size: usize) -> Self {
        let width = if rows == 0 { 0 } else { size / rows };
        let cells = (0..rows)
            .flat_map(|row| (0..rows).map(move |col| Cell::new(Point::new(row, col), width)))
            .collect();

        Self { rows, size, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_width(&self) -> usize {
        if self.rows == 0 {
            0
        } else {
            self.size / self.rows
        }
    }

    /// Check if the provided point lies inside the grid
    pub fn is_valid(&self, point: Point) -> bool {
        point.row < self.rows && point.col < self.rows
    }

    fn index(&self, point: Point) -> usize {
        point.row * self.rows + point.col
    }

    /// Panics if the point is outside the grid, see [`Grid::is_valid`]
    pub fn get(&self, point: Point) -> &Cell {
        &self.cells[self.index(point)]
    }

    /// Panics if the point is outside the grid, see [`Grid::is_valid`]
    pub fn get_mut(&mut self, point: Point) -> &mut Cell {
        let index = self.index(point);
        &mut self.cells[index]
    }

    pub fn set_state(&mut self, point: Point, state: CellState) {
        self.get_mut(point).set_state(state);
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| c.state_is(state)).count()
    }

    /// Returns the traversable neighbors of the given point, computed from the current walls.
    /// Only orthogonal points inside the grid are considered, there is no wraparound.
    pub fn neighbors_of(&self, point: Point) -> Vec<Point> {
        let mut points = Vec::with_capacity(4);

        if point.row + 1 < self.rows {
            points.push(Point {
                row: point.row + 1,
                col: point.col,
            });
        }
        if point.row > 0 {
            points.push(Point {
                row: point.row - 1,
                col: point.col,
            });
        }
        if point.col + 1 < self.rows {
            points.push(Point {
                row: point.row,
                col: point.col + 1,
            });
        }
        if point.col > 0 {
            points.push(Point {
                row: point.row,
                col: point.col - 1,
            });
        }

        points.retain(|p| !self.get(*p).state_is(CellState::Wall));

        points
    }

    /// Rebuild the cached neighbor list of every cell. Walls may have changed since the
    /// last call, so this has to run right before each search.
    pub fn update_neighbors(&mut self) {
        for index in 0..self.cells.len() {
            let neighbors = self.neighbors_of(self.cells[index].point);
            self.cells[index].neighbors = neighbors;
        }
    }

    /// Map a pixel position (relative to the top-left corner of the grid) to a cell
    pub fn cell_at_pixel(&self, x: f32, y: f32) -> Option<Point> {
        let width = self.cell_width();
        // also rejects NaN
        if width == 0 || !(x >= 0.0 && y >= 0.0) {
            return None;
        }

        let point = Point {
            row: y as usize / width,
            col: x as usize / width,
        };

        self.is_valid(point).then_some(point)
    }

    /// Create a per-cell storage with the same dimensions as this grid
    pub fn create_storage<T: Copy>(&self, value: T) -> CellStorage<T> {
        CellStorage {
            rows: self.rows,
            values: vec![value; self.cells.len()],
        }
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.rows.max(1)) {
            for cell in row {
                write!(f, "{}", cell.state)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl FromStr for Grid {
    type Err = anyhow::Error;

    /// Parses the text format written by `Display`, one pixel per cell
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let rows = lines.len();
        if rows == 0 {
            bail!("Grid is empty");
        }

        let mut grid = Grid::new(rows, rows);
        for (row, line) in lines.iter().enumerate() {
            let glyphs: Vec<char> = line.chars().collect();
            if glyphs.len() != rows {
                bail!(
                    "Row {} has {} cells but the grid must be square ({} cells)",
                    row,
                    glyphs.len(),
                    rows
                );
            }

            for (col, glyph) in glyphs.into_iter().enumerate() {
                let state = CellState::from_glyph(glyph)
                    .ok_or_else(|| anyhow!("Invalid cell '{}' at {}:{}", glyph, row, col))?;
                grid.set_state(Point::new(row, col), state);
            }
        }

        Ok(grid)
    }
}

/// Per-cell values for a single search, stored row-major in one vec
#[derive(Clone, Debug)]
pub struct CellStorage<T> {
    rows: usize,
    values: Vec<T>,
}

impl<T: Copy> CellStorage<T> {
    pub fn get(&self, point: Point) -> T {
        self.values[point.row * self.rows + point.col]
    }

    pub fn get_mut(&mut self, point: Point) -> &mut T {
        &mut self.values[point.row * self.rows + point.col]
    }
}
