#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod error;
mod map;
mod maps_api;
mod ui;

use config::AppConfig;

fn main() -> eframe::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Map configuration missing: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Starting {} map (statistics from {}, {} boundary attempts)",
        config.disease,
        config.health_url,
        config.retry_count
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1440.0, 900.0))
            .with_min_inner_size(egui::vec2(400.0, 300.0))
            .with_title("EpiMap")
            .with_resizable(true)
            .with_decorations(true),
        ..Default::default()
    };

    eframe::run_native(
        "EpiMap",
        native_options,
        Box::new(|cc| Ok(Box::new(ui::app::EpiMapApp::new(cc, config)?))),
    )
}
