use egui::{Color32, Key, Pos2, Rect, Sense, Stroke, Vec2};
use log::{debug, info};
use pathfind::{Board, CellState, PathFinder, PathFinderState};

use crate::config::Config;

const CLOSED_COLOR: Color32 = Color32::from_rgb(239, 143, 117);
const OPEN_COLOR: Color32 = Color32::from_rgb(17, 46, 61);
const EMPTY_COLOR: Color32 = Color32::from_rgb(247, 236, 189);
const WALL_COLOR: Color32 = Color32::from_rgb(175, 192, 159);
const PANEL_COLOR: Color32 = Color32::from_rgb(165, 184, 147);
const PATH_COLOR: Color32 = Color32::from_rgb(192, 68, 68);
const START_COLOR: Color32 = Color32::from_rgb(192, 68, 68);
const END_COLOR: Color32 = Color32::from_rgb(192, 68, 68);
const GRID_COLOR: Color32 = Color32::from_rgb(247, 236, 189);

pub const HELP: &str =
    "Left click: place nodes | right click: remove nodes | space: start pathfinder | c: reset grid";

fn cell_color(state: CellState) -> Color32 {
    match state {
        CellState::Empty => EMPTY_COLOR,
        CellState::Wall => WALL_COLOR,
        CellState::Start => START_COLOR,
        CellState::End => END_COLOR,
        CellState::Open => OPEN_COLOR,
        CellState::Closed => CLOSED_COLOR,
        CellState::Path => PATH_COLOR,
    }
}

pub struct App {
    config: Config,
    board: Board,
    /// The running search, if any. The board is not edited while this is set.
    search: Option<PathFinder>,
    status: String,
}

impl App {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        Self {
            board: Board::new(config.rows, config.grid_width),
            config,
            search: None,
            status: String::new(),
        }
    }

    fn stop_search(&mut self) {
        if let Some(mut search) = self.search.take() {
            search.cancel();
            self.status = "Cancelled".to_owned();
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (run, reset, quit, close_requested) = ctx.input(|i| {
            (
                i.key_pressed(Key::Space),
                i.key_pressed(Key::C),
                i.key_pressed(Key::Escape),
                i.viewport().close_requested(),
            )
        });

        // never block a quit on a running search
        if quit || close_requested {
            self.stop_search();
            if quit {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            return;
        }

        if reset {
            self.stop_search();
            self.board.reset();
            self.status.clear();
        }

        if run && self.search.is_none() {
            if let Some(search) = self.board.prepare_search() {
                debug!("starting search");
                self.status = "Searching...".to_owned();
                self.search = Some(search);
            }
        }
    }

    /// Let the running search take its steps for this frame
    fn advance_search(&mut self, ctx: &egui::Context) {
        let Some(search) = &mut self.search else {
            return;
        };

        for _ in 0..self.config.steps_per_frame {
            if search.step(self.board.grid_mut()).is_none() {
                break;
            }
        }

        if !search.state().is_done() {
            ctx.request_repaint();
            return;
        }

        self.status = match search.state() {
            PathFinderState::PathFound(result) => {
                format!("Path length {}\n{} steps", result.total_cost, search.steps())
            }
            PathFinderState::NoPathFound => format!("No path\n{} steps", search.steps()),
            _ => "Cancelled".to_owned(),
        };
        info!("search done: {:?}", search.state());
        self.search = None;
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if self.search.is_some() {
            return;
        }
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };

        let local = pos - response.rect.min;
        let (primary, secondary) =
            ui.input(|i| (i.pointer.primary_down(), i.pointer.secondary_down()));

        if primary {
            self.board.primary_at_pixel(local.x, local.y);
        } else if secondary {
            self.board.secondary_at_pixel(local.x, local.y);
        }
    }

    fn paint_grid(&self, painter: &egui::Painter, origin: Pos2) {
        let grid = self.board.grid();
        let width = grid.cell_width() as f32;
        let extent = grid.rows() as f32 * width;

        painter.rect_filled(
            Rect::from_min_size(origin, Vec2::splat(extent)),
            0.0,
            EMPTY_COLOR,
        );

        for cell in grid.cells() {
            if cell.state_is(CellState::Empty) {
                continue;
            }
            let (x, y) = cell.pixel_origin();
            painter.rect_filled(
                Rect::from_min_size(origin + Vec2::new(x as f32, y as f32), Vec2::splat(width)),
                0.0,
                cell_color(cell.state()),
            );
        }

        if self.config.draw_grid_lines {
            let stroke = Stroke::new(1.0, GRID_COLOR);
            for i in 0..=grid.rows() {
                let offset = i as f32 * width;
                painter.line_segment(
                    [origin + Vec2::new(0.0, offset), origin + Vec2::new(extent, offset)],
                    stroke,
                );
                painter.line_segment(
                    [origin + Vec2::new(offset, 0.0), origin + Vec2::new(offset, extent)],
                    stroke,
                );
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);
        self.advance_search(ctx);

        egui::SidePanel::right("controls")
            .exact_width(self.config.panel_width as f32)
            .resizable(false)
            .frame(egui::Frame::none().fill(PANEL_COLOR).inner_margin(6.0))
            .show(ctx, |ui| {
                ui.label("Left: place");
                ui.label("Right: remove");
                ui.label("Space: run");
                ui.label("C: reset");
                ui.separator();
                ui.checkbox(&mut self.config.draw_grid_lines, "Lines");
                ui.separator();
                ui.label(&self.status);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(WALL_COLOR))
            .show(ctx, |ui| {
                let size = self.board.grid().size() as f32;
                let (response, painter) =
                    ui.allocate_painter(Vec2::splat(size), Sense::click_and_drag());

                self.handle_pointer(ui, &response);
                self.paint_grid(&painter, response.rect.min);
            });
    }
}
