mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::Path;

use app::ImpliedPanelsApp;
use config::{StudyConfig, CONFIG_FILE};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = StudyConfig::load_or_default(Path::new(CONFIG_FILE)).unwrap_or_else(|e| {
        log::error!("Ignoring {CONFIG_FILE}: {e:#}");
        StudyConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 950.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Option implied quantiles and expectiles",
        options,
        Box::new(|_cc| Ok(Box::new(ImpliedPanelsApp::new(config)))),
    )
}
