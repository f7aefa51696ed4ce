use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pathfind::{CancelToken, CellState, Grid, NoopObserver, PathFinder, PathFinderState, Point};

/// Square grid with every other column walled off except for one gap, alternating between
/// top and bottom, so the path has to snake through the whole grid
fn create_snake_grid(rows: usize) -> Grid {
    let mut grid = Grid::new(rows, rows);
    for col in (1..rows - 1).step_by(2) {
        let gap = if (col / 2) % 2 == 0 { rows - 1 } else { 0 };
        for row in (0..rows).filter(|row| *row != gap) {
            grid.set_state(Point::new(row, col), CellState::Wall);
        }
    }
    grid
}

fn bench_grid(c: &mut Criterion, name: &str, mut grid: Grid) {
    let start = Point::new(0, 0);
    let goal = Point::new(grid.rows() - 1, grid.rows() - 1);
    grid.update_neighbors();

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut grid = grid.clone();
            let mut finder = PathFinder::new(&grid, black_box(start), black_box(goal));
            let res = finder.finish(&mut grid, &mut NoopObserver, &CancelToken::new());
            assert!(matches!(res, PathFinderState::PathFound(_)));
        })
    });
}

pub fn grid_open(c: &mut Criterion) {
    for rows in [10, 70, 200] {
        bench_grid(c, &format!("open_{}", rows), Grid::new(rows, rows));
    }
}

pub fn grid_snake(c: &mut Criterion) {
    for rows in [11, 71, 201] {
        bench_grid(c, &format!("snake_{}", rows), create_snake_grid(rows));
    }
}

criterion_group!(benches, grid_open, grid_snake);
criterion_main!(benches);
