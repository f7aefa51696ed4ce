use anyhow::bail;
use log::debug;

use crate::{
    find::{find_path, CancelToken, PathFinder, StepEvent},
    grid::{CellState, Grid, Point},
};

/// The grid the user edits, together with the chosen start and end cells.
///
/// Enforces that there is at most one start and one end, and that neither of them is
/// overwritten by a wall.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    start: Option<Point>,
    end: Option<Point>,
}

impl Board {
    pub fn new(rows: usize, size: usize) -> Self {
        Self {
            grid: Grid::new(rows, size),
            start: None,
            end: None,
        }
    }

    /// Wrap an existing grid, picking up its start and end cells
    pub fn from_grid(grid: Grid) -> Result<Self, anyhow::Error> {
        let mut start = None;
        let mut end = None;

        for cell in grid.cells() {
            let slot = match cell.state() {
                CellState::Start => &mut start,
                CellState::End => &mut end,
                _ => continue,
            };
            if let Some(previous) = slot {
                bail!(
                    "Grid has more than one {:?} cell: {} and {}",
                    cell.state(),
                    previous,
                    cell.point()
                );
            }
            *slot = Some(cell.point());
        }

        Ok(Self { grid, start, end })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct access to the grid, e.g. to advance a [`PathFinder`]
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn end(&self) -> Option<Point> {
        self.end
    }

    /// Place the start, then the end, then walls. Start and end are never overwritten.
    pub fn primary_action(&mut self, point: Point) {
        if !self.grid.is_valid(point) {
            return;
        }

        if self.start.is_none() && self.end != Some(point) {
            debug!("start set to {}", point);
            self.start = Some(point);
            self.grid.set_state(point, CellState::Start);
        } else if self.end.is_none() && self.start != Some(point) {
            debug!("end set to {}", point);
            self.end = Some(point);
            self.grid.set_state(point, CellState::End);
        } else if self.start != Some(point) && self.end != Some(point) {
            self.grid.set_state(point, CellState::Wall);
        }
    }

    /// Reset a cell to empty, giving up its start or end role
    pub fn secondary_action(&mut self, point: Point) {
        if !self.grid.is_valid(point) {
            return;
        }

        self.grid.set_state(point, CellState::Empty);

        if self.start == Some(point) {
            self.start = None;
        } else if self.end == Some(point) {
            self.end = None;
        }
    }

    /// [`Board::primary_action`] on the cell under a pixel, ignored outside the grid
    pub fn primary_at_pixel(&mut self, x: f32, y: f32) {
        if let Some(point) = self.grid.cell_at_pixel(x, y) {
            self.primary_action(point);
        }
    }

    /// [`Board::secondary_action`] on the cell under a pixel, ignored outside the grid
    pub fn secondary_at_pixel(&mut self, x: f32, y: f32) {
        if let Some(point) = self.grid.cell_at_pixel(x, y) {
            self.secondary_action(point);
        }
    }

    pub fn can_run(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Recompute the neighbors of every cell and create a search that can be stepped
    /// through. `None` unless both start and end are set.
    pub fn prepare_search(&mut self) -> Option<PathFinder> {
        let (start, end) = (self.start?, self.end?);

        self.grid.update_neighbors();
        Some(PathFinder::new(&self.grid, start, end))
    }

    /// Search a path between start and end, see [`find_path`].
    /// `None` unless both start and end are set.
    pub fn run(
        &mut self,
        on_step: impl FnMut(&Grid, &StepEvent),
        cancel: &CancelToken,
    ) -> Option<bool> {
        let (start, end) = (self.start?, self.end?);

        self.grid.update_neighbors();
        Some(find_path(&mut self.grid, start, end, on_step, cancel))
    }

    /// Remove everything a previous search left on the grid, keeping walls, start and end
    pub fn clear_search(&mut self) {
        for cell in self.grid.cells_mut() {
            if matches!(
                cell.state(),
                CellState::Open | CellState::Closed | CellState::Path
            ) {
                cell.set_state(CellState::Empty);
            }
        }

        if let Some(start) = self.start {
            self.grid.set_state(start, CellState::Start);
        }
        if let Some(end) = self.end {
            self.grid.set_state(end, CellState::End);
        }
    }

    /// Start over with an empty grid of the same dimensions
    pub fn reset(&mut self) {
        debug!("reset board");
        self.grid = Grid::new(self.grid.rows(), self.grid.size());
        self.start = None;
        self.end = None;
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::find::NoopObserver;

    #[test]
    fn test_primary_places_start_end_then_walls() {
        let mut board = Board::new(5, 50);

        board.primary_action(Point::new(0, 0));
        board.primary_action(Point::new(4, 4));
        board.primary_action(Point::new(2, 2));
        board.primary_action(Point::new(2, 3));

        assert_eq!(board.start(), Some(Point::new(0, 0)));
        assert_eq!(board.end(), Some(Point::new(4, 4)));
        assert!(board.grid().get(Point::new(0, 0)).state_is(CellState::Start));
        assert!(board.grid().get(Point::new(4, 4)).state_is(CellState::End));
        assert_eq!(board.grid().count(CellState::Wall), 2);
    }

    #[test]
    fn test_primary_never_overwrites_special_cells() {
        let mut board = Board::new(5, 50);

        board.primary_action(Point::new(1, 1));
        // cannot become the end as well
        board.primary_action(Point::new(1, 1));
        assert_eq!(board.end(), None);
        assert!(board.grid().get(Point::new(1, 1)).state_is(CellState::Start));

        board.primary_action(Point::new(3, 3));
        board.primary_action(Point::new(1, 1));
        board.primary_action(Point::new(3, 3));

        assert!(board.grid().get(Point::new(1, 1)).state_is(CellState::Start));
        assert!(board.grid().get(Point::new(3, 3)).state_is(CellState::End));
        assert_eq!(board.grid().count(CellState::Wall), 0);
    }

    #[test]
    fn test_secondary_unassigns_roles() {
        let mut board = Board::new(5, 50);
        board.primary_action(Point::new(0, 0));
        board.primary_action(Point::new(4, 4));
        board.primary_action(Point::new(2, 2));

        board.secondary_action(Point::new(2, 2));
        assert!(board.grid().get(Point::new(2, 2)).state_is(CellState::Empty));

        board.secondary_action(Point::new(0, 0));
        assert_eq!(board.start(), None);
        assert_eq!(board.end(), Some(Point::new(4, 4)));
        assert!(!board.can_run());

        // the next primary action places the start again, not a wall
        board.primary_action(Point::new(1, 1));
        assert_eq!(board.start(), Some(Point::new(1, 1)));

        board.secondary_action(Point::new(4, 4));
        assert_eq!(board.end(), None);
        board.primary_action(Point::new(0, 4));
        assert_eq!(board.end(), Some(Point::new(0, 4)));
    }

    #[test]
    fn test_end_cannot_become_start() {
        let mut board = Board::new(3, 3);
        board.primary_action(Point::new(0, 0));
        board.primary_action(Point::new(2, 2));

        board.secondary_action(Point::new(0, 0));
        // end is still assigned so it is left alone
        board.primary_action(Point::new(2, 2));
        assert_eq!(board.start(), None);
        assert!(board.grid().get(Point::new(2, 2)).state_is(CellState::End));
    }

    #[test]
    fn test_out_of_bounds_actions_are_ignored() {
        let mut board = Board::new(4, 40);
        board.primary_action(Point::new(4, 0));
        board.secondary_action(Point::new(0, 9));
        board.primary_at_pixel(40.0, 0.0);
        board.secondary_at_pixel(-3.0, 5.0);

        assert_eq!(board.start(), None);
        assert_eq!(board.grid().count(CellState::Empty), 16);
    }

    #[test]
    fn test_pixel_actions() {
        let mut board = Board::new(4, 40);

        board.primary_at_pixel(5.0, 5.0);
        board.primary_at_pixel(35.0, 25.0);
        board.primary_at_pixel(15.0, 5.0);

        assert_eq!(board.start(), Some(Point::new(0, 0)));
        assert_eq!(board.end(), Some(Point::new(2, 3)));
        assert!(board.grid().get(Point::new(0, 1)).state_is(CellState::Wall));

        board.secondary_at_pixel(19.0, 9.0);
        assert!(board.grid().get(Point::new(0, 1)).state_is(CellState::Empty));
    }

    #[test]
    fn test_run_requires_start_and_end() {
        let mut board = Board::new(3, 3);
        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), None);
        assert!(board.prepare_search().is_none());

        board.primary_action(Point::new(0, 0));
        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), None);

        board.primary_action(Point::new(2, 2));
        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), Some(true));
    }

    #[test]
    fn test_run_sees_walls_placed_since_last_run() {
        let mut board = Board::new(3, 3);
        board.primary_action(Point::new(0, 0));
        board.primary_action(Point::new(0, 2));

        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), Some(true));

        for row in 0..3 {
            board.primary_action(Point::new(row, 1));
        }
        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), Some(false));
    }

    #[test]
    fn test_prepare_search_steps() {
        let mut board = Board::from_grid("S..\n.#.\n..E".parse().unwrap()).unwrap();

        let mut finder = board.prepare_search().unwrap();
        let state = finder
            .finish(board.grid_mut(), &mut NoopObserver, &CancelToken::new())
            .clone();

        assert!(matches!(
            state,
            crate::find::PathFinderState::PathFound(crate::find::PathResult {
                total_cost: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_clear_search_keeps_walls() {
        let mut board = Board::from_grid("S..\n.#.\n..E".parse().unwrap()).unwrap();
        assert_eq!(board.run(|_, _| {}, &CancelToken::new()), Some(true));
        assert!(board.grid().count(CellState::Path) > 0);

        board.clear_search();
        assert_eq!(board.grid().to_string(), "S..\n.#.\n..E\n");
    }

    #[test]
    fn test_reset() {
        let mut board = Board::new(6, 60);
        board.primary_action(Point::new(0, 0));
        board.primary_action(Point::new(5, 5));
        board.primary_action(Point::new(3, 3));

        board.reset();

        assert_eq!(board.start(), None);
        assert_eq!(board.end(), None);
        assert_eq!(board.grid().rows(), 6);
        assert_eq!(board.grid().size(), 60);
        assert_eq!(board.grid().count(CellState::Empty), 36);
    }

    #[test]
    fn test_from_grid() {
        let board = Board::from_grid("S.\n.E".parse().unwrap()).unwrap();
        assert_eq!(board.start(), Some(Point::new(0, 0)));
        assert_eq!(board.end(), Some(Point::new(1, 1)));

        assert!(Board::from_grid("SS\n.E".parse().unwrap()).is_err());
        assert!(Board::from_grid("SE\nE.".parse().unwrap()).is_err());
    }
}
