use app::{App, HELP};
use config::Config;

mod app;
mod config;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "{}x{} grid, {} pixels wide",
        config.rows,
        config.rows,
        config.grid_width
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                (config.grid_width + config.panel_width) as f32,
                config.grid_width as f32,
            ])
            .with_resizable(false)
            .with_title(HELP),
        ..Default::default()
    };

    eframe::run_native(
        "astar",
        native_options,
        Box::new(move |cc| Box::new(App::new(cc, config))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run the visualizer: {}", e))
}
