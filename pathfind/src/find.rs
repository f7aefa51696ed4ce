use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{
        atomic::{self, AtomicBool},
        Arc,
    },
};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::grid::{CellState, CellStorage, Grid, Point};

/// Score of a cell the search has not reached (yet)
pub const INFINITY: usize = usize::MAX;

/// Moving between orthogonal neighbors always costs the same
const MOVE_COST: usize = 1;

/// Estimate of the remaining cost between two cells. Never overestimates with
/// 4-directional unit-cost movement, and is consistent.
pub fn manhattan(a: Point, b: Point) -> usize {
    a.manhattan(b)
}

/// The objects that we store in the priority queue
#[derive(Debug, Clone, Copy)]
struct ToVisit {
    f_score: usize,
    sequence: u64,
    point: Point,
}

impl Ord for ToVisit {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse for BinaryHeap to be a min-heap, equal scores are served first-in-first-out
        (self.f_score, self.sequence)
            .cmp(&(other.f_score, other.sequence))
            .reverse()
    }
}

impl PartialOrd for ToVisit {
    fn partial_cmp(&self, other: &ToVisit) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ToVisit {
    fn eq(&self, other: &ToVisit) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToVisit {}

/// Priority queue of cells ordered by (f_score, insertion sequence), smallest first
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<ToVisit>,
    sequence: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a point and return the sequence number it was assigned
    pub fn push(&mut self, point: Point, f_score: usize) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;

        self.heap.push(ToVisit {
            f_score,
            sequence,
            point,
        });

        sequence
    }

    /// Remove the entry with the lowest f_score, returning its point and f_score
    pub fn pop(&mut self) -> Option<(Point, usize)> {
        self.heap.pop().map(|visit| (visit.point, visit.f_score))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Cooperative cancellation flag, polled by the search before every step.
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, atomic::Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(atomic::Ordering::Relaxed)
    }
}

/// What a single step of the search did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// A cell was taken from the frontier and its neighbors examined,
    /// `discovered` of them were new to the frontier
    Expanded { point: Point, discovered: usize },
    /// A cell on the found path was marked while walking back from the goal
    PathMarked(Point),
}

/// Gets told about every step of a running search, e.g. to redraw the grid.
/// The search does not depend on anything the observer does.
///
/// A step is reported after it is applied to the grid: for
/// [`StepEvent::Expanded`] the expanded cell is already marked
/// [`CellState::Closed`] (unless it is the start) and its new neighbors are Open.
pub trait StepObserver {
    fn on_step(&mut self, grid: &Grid, event: &StepEvent);
}

impl<F: FnMut(&Grid, &StepEvent)> StepObserver for F {
    fn on_step(&mut self, grid: &Grid, event: &StepEvent) {
        self(grid, event)
    }
}

/// Observer that ignores every step
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&mut self, _grid: &Grid, _event: &StepEvent) {}
}

#[derive(Debug, PartialEq, Clone, Eq, Serialize, Deserialize)]
pub struct PathResult {
    /// All cells from start to goal, both included
    pub path: Vec<Point>,
    pub start: Point,
    pub goal: Point,
    pub total_cost: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState {
    Computing,
    // goal reached, marking the path
    Tracing,
    NoPathFound,
    PathFound(PathResult),
    Cancelled,
}

impl PathFinderState {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing | PathFinderState::Tracing)
    }
}

/// A* search between two cells of a [`Grid`], advanced one step at a time.
///
/// The finder does not hold on to the grid, every call to [`PathFinder::step`] borrows it.
/// The grid must not be edited between steps and its neighbor lists must be up to date
/// (see [`Grid::update_neighbors`]) before the first one.
#[derive(Debug)]
pub struct PathFinder {
    start: Point,
    goal: Point,
    g_score: CellStorage<usize>,
    f_score: CellStorage<usize>,
    came_from: CellStorage<Option<Point>>,
    in_frontier: CellStorage<bool>,
    closed: CellStorage<bool>,
    frontier: Frontier,
    // intermediate path cells still to be marked, the last one is next to the goal
    trace: Vec<Point>,
    found: Option<PathResult>,
    nbuf: Vec<Point>,
    steps: usize,
    state: PathFinderState,
}

impl PathFinder {
    pub fn new(grid: &Grid, start: Point, goal: Point) -> Self {
        let mut g_score = grid.create_storage(INFINITY);
        let mut f_score = grid.create_storage(INFINITY);
        let mut in_frontier = grid.create_storage(false);
        let mut frontier = Frontier::new();

        *g_score.get_mut(start) = 0;
        *f_score.get_mut(start) = manhattan(start, goal);
        frontier.push(start, manhattan(start, goal));
        *in_frontier.get_mut(start) = true;

        debug!("searching path from {} to {}", start, goal);

        Self {
            start,
            goal,
            g_score,
            f_score,
            came_from: grid.create_storage(None),
            in_frontier,
            closed: grid.create_storage(false),
            frontier,
            trace: Vec::new(),
            found: None,
            nbuf: Vec::with_capacity(4),
            steps: 0,
            state: PathFinderState::Computing,
        }
    }

    /// Run the search until it is done, telling the observer about every step.
    /// The cancel token is checked before each step.
    pub fn finish<O: StepObserver>(
        &mut self,
        grid: &mut Grid,
        observer: &mut O,
        cancel: &CancelToken,
    ) -> &PathFinderState {
        loop {
            if cancel.is_cancelled() {
                self.cancel();
            }

            match self.step(grid) {
                Some(event) => observer.on_step(grid, &event),
                None => return &self.state,
            }
        }
    }

    /// Perform one unit of work. Returns `None` once the search is done, the outcome is
    /// then available through [`PathFinder::state`].
    pub fn step(&mut self, grid: &mut Grid) -> Option<StepEvent> {
        match self.state {
            PathFinderState::Computing => self.expand(grid),
            PathFinderState::Tracing => self.mark_path(grid),
            _ => None,
        }
    }

    /// Stop the search, leaving the grid as it is
    pub fn cancel(&mut self) {
        if !self.state.is_done() {
            info!(
                "search from {} to {} cancelled after {} steps",
                self.start, self.goal, self.steps
            );
            self.state = PathFinderState::Cancelled;
        }
    }

    fn expand(&mut self, grid: &mut Grid) -> Option<StepEvent> {
        // a cell is queued once, an improved score does not move its entry
        let Some((current, _)) = self.frontier.pop() else {
            debug!(
                "no path from {} to {} after {} steps",
                self.start, self.goal, self.steps
            );
            self.state = PathFinderState::NoPathFound;
            return None;
        };
        debug_assert!(self.in_frontier.get(current));

        *self.in_frontier.get_mut(current) = false;
        self.steps += 1;

        if current == self.goal {
            self.begin_trace();
            return self.mark_path(grid);
        }

        let current_g = self.g_score.get(current);
        let mut discovered = 0;

        let mut nbuf = std::mem::take(&mut self.nbuf);
        nbuf.clear();
        nbuf.extend_from_slice(grid.get(current).neighbors());

        for &neighbor in nbuf.iter() {
            if self.closed.get(neighbor) {
                continue;
            }

            let tentative_g = current_g + MOVE_COST;
            if tentative_g >= self.g_score.get(neighbor) {
                continue;
            }

            let f_score = tentative_g + manhattan(neighbor, self.goal);
            *self.came_from.get_mut(neighbor) = Some(current);
            *self.g_score.get_mut(neighbor) = tentative_g;
            *self.f_score.get_mut(neighbor) = f_score;

            if !self.in_frontier.get(neighbor) {
                self.frontier.push(neighbor, f_score);
                *self.in_frontier.get_mut(neighbor) = true;
                discovered += 1;

                if neighbor != self.goal {
                    grid.set_state(neighbor, CellState::Open);
                }
            }
        }

        self.nbuf = nbuf;

        *self.closed.get_mut(current) = true;
        if current != self.start {
            grid.set_state(current, CellState::Closed);
        }

        trace!(
            "expanded {} (g={}, discovered {}, frontier {})",
            current,
            current_g,
            discovered,
            self.frontier.len()
        );

        Some(StepEvent::Expanded {
            point: current,
            discovered,
        })
    }

    fn begin_trace(&mut self) {
        // backtrack to find the total shortest path
        let mut path = vec![self.goal];
        let mut current = self.goal;
        while let Some(from) = self.came_from.get(current) {
            path.push(from);
            current = from;
        }
        path.reverse();

        self.trace = path
            .iter()
            .copied()
            .filter(|p| *p != self.start && *p != self.goal)
            .collect();

        self.found = Some(PathResult {
            total_cost: self.g_score.get(self.goal),
            path,
            start: self.start,
            goal: self.goal,
        });
        self.state = PathFinderState::Tracing;
    }

    fn mark_path(&mut self, grid: &mut Grid) -> Option<StepEvent> {
        if let Some(point) = self.trace.pop() {
            grid.set_state(point, CellState::Path);
            return Some(StepEvent::PathMarked(point));
        }

        if self.goal != self.start {
            grid.set_state(self.goal, CellState::End);
        }

        if let Some(result) = self.found.take() {
            debug!(
                "found path from {} to {}: cost={}, steps={}",
                self.start, self.goal, result.total_cost, self.steps
            );
            self.state = PathFinderState::PathFound(result);
        }

        None
    }

    pub fn state(&self) -> &PathFinderState {
        &self.state
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    /// Number of cells taken from the frontier so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn g_score(&self, point: Point) -> usize {
        self.g_score.get(point)
    }

    /// g + heuristic of a reached cell, [`INFINITY`] otherwise
    pub fn f_score(&self, point: Point) -> usize {
        self.f_score.get(point)
    }

    pub fn came_from(&self, point: Point) -> Option<Point> {
        self.came_from.get(point)
    }

    pub fn in_frontier(&self, point: Point) -> bool {
        self.in_frontier.get(point)
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }
}

/// Search a path from `start` to `end`, marking it on the grid.
///
/// `on_step` is called after every step so the caller can render the progress. Returns
/// `true` if a path was found, `false` if none exists or `cancel` was raised.
pub fn find_path(
    grid: &mut Grid,
    start: Point,
    end: Point,
    mut on_step: impl FnMut(&Grid, &StepEvent),
    cancel: &CancelToken,
) -> bool {
    let mut finder = PathFinder::new(grid, start, end);

    matches!(
        finder.finish(grid, &mut on_step, cancel),
        PathFinderState::PathFound(_)
    )
}
