use anyhow::Context;
use pathfind::{Board, CancelToken, Grid, PathFinderState, PathResult, StepEvent, StepObserver};
use serde::Serialize;

const USAGE: &str = "usage: pathfind [--json] <grid.txt> [max_steps]";

/// Counts the steps of a search and gives up once there were too many
struct StepLimit {
    expanded: usize,
    marked: usize,
    max_steps: Option<usize>,
    cancel: CancelToken,
}

impl StepObserver for StepLimit {
    fn on_step(&mut self, _grid: &Grid, event: &StepEvent) {
        match event {
            StepEvent::Expanded { .. } => self.expanded += 1,
            StepEvent::PathMarked(_) => self.marked += 1,
        }

        if let Some(max_steps) = self.max_steps {
            if self.expanded + self.marked >= max_steps {
                self.cancel.cancel();
            }
        }
    }
}

/// Outcome of a search as printed with `--json`
#[derive(Serialize)]
struct Summary<'a> {
    outcome: &'static str,
    expanded: usize,
    marked: usize,
    path: Option<&'a PathResult>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let (flags, positional): (Vec<String>, Vec<String>) =
        std::env::args().skip(1).partition(|arg| arg.starts_with("--"));
    let json = match flags.as_slice() {
        [] => false,
        [flag] if flag == "--json" => true,
        _ => anyhow::bail!(USAGE),
    };

    let mut args = positional.into_iter();
    let path = args.next().context(USAGE)?;
    let max_steps = args
        .next()
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("max_steps must be a positive number")?;

    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let grid: Grid = text.parse().with_context(|| format!("parsing {}", path))?;
    let mut board = Board::from_grid(grid)?;

    let cancel = CancelToken::new();
    let mut limit = StepLimit {
        expanded: 0,
        marked: 0,
        max_steps,
        cancel: cancel.clone(),
    };

    let mut finder = board
        .prepare_search()
        .context("the grid needs both a start (S) and an end (E)")?;
    let state = finder
        .finish(board.grid_mut(), &mut limit, &cancel)
        .clone();

    if json {
        let (outcome, path) = match &state {
            PathFinderState::PathFound(result) => ("found", Some(result)),
            PathFinderState::NoPathFound => ("no_path", None),
            PathFinderState::Cancelled => ("cancelled", None),
            s => unreachable!("search stopped while {:?}", s),
        };
        let summary = Summary {
            outcome,
            expanded: limit.expanded,
            marked: limit.marked,
            path,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print!("{}", board.grid());

    match state {
        PathFinderState::PathFound(result) => println!(
            "path found: cost={}, expanded={}",
            result.total_cost, limit.expanded
        ),
        PathFinderState::NoPathFound => println!("no path, expanded={}", limit.expanded),
        PathFinderState::Cancelled => println!(
            "gave up after {} steps",
            limit.expanded + limit.marked
        ),
        s => unreachable!("search stopped while {:?}", s),
    }

    Ok(())
}
