use eframe::egui;

use crate::config::StudyConfig;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ImpliedPanelsApp {
    pub state: AppState,
}

impl ImpliedPanelsApp {
    /// Build the app and load the configured study.
    pub fn new(config: StudyConfig) -> Self {
        let mut state = AppState::new(config);
        state.load();
        Self { state }
    }
}

impl eframe::App for ImpliedPanelsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: dataset status ----
        egui::SidePanel::left("dataset_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: selected cross-section ----
        egui::TopBottomPanel::bottom("cross_section")
            .default_height(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                table::cross_section_panel(ui, &mut self.state);
            });

        // ---- Central panel: day slider and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::day_selector(ui, &mut self.state);
            ui.separator();
            plot::method_grid(ui, &self.state);
        });
    }
}
