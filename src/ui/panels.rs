use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::Alignment;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – dataset status and references
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Datasets");
    ui.separator();

    let Some(study) = &state.study else {
        ui.label("No study loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let alignment = match study.alignment() {
                Alignment::ByDate => "by date",
                Alignment::Positional => "by position",
            };
            ui.label(format!(
                "Days aligned {alignment}, slider driven by {}",
                study.reference().label()
            ));
            ui.add_space(4.0);

            for panel in study.panels() {
                let color = state.colors.color_for(panel.kind);
                egui::CollapsingHeader::new(RichText::new(panel.kind.label()).strong().color(color))
                    .id_salt(panel.kind.id())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.label(RichText::new(&panel.source).weak());
                        match &panel.index {
                            Ok(index) => {
                                ui.label(format!(
                                    "{} cross-sections by {}",
                                    index.count(),
                                    index.key_fields().join(" + ")
                                ));
                            }
                            Err(e) => {
                                ui.label(RichText::new(e.to_string()).color(Color32::RED));
                            }
                        }
                        match state.selection(panel.kind) {
                            Some(Ok(table)) => {
                                ui.label(format!("{} options on this day", table.len()));
                            }
                            Some(Err(e)) if panel.index.is_ok() => {
                                ui.label(RichText::new(e.to_string()).color(Color32::RED));
                            }
                            _ => {}
                        }
                    });
            }

            ui.separator();
            ui.strong("References");
            ui.label(
                "Bondarenko, O. (2003). Estimation of risk-neutral densities using positive \
                 convolution approximation. Journal of Econometrics, 116(1-2), 85-112.",
            );
            ui.label(
                "Jackwerth, J. C. (2004). Option-Implied Risk-Neutral Distributions and Risk \
                 Aversion, Research Foundation of AIMR, Charlottesville, VA.",
            );
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data directory…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.load();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(study) = &state.study {
            ui.label(format!(
                "{} days from {}",
                study.day_count(),
                state.config.data_dir.display()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Day slider
// ---------------------------------------------------------------------------

/// Title and the single day slider shared by every method.
pub fn day_selector(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Estimation of option implied quantiles and expectiles");

    let Some(max) = state.study.as_ref().map(|s| s.max_ordinal()) else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        let mut day = state.day;
        let response = ui.add(egui::Slider::new(&mut day, 0..=max).text("Select date in the sample"));
        if response.changed() {
            state.set_day(day);
        }
        if let Some(label) = state.day_label() {
            ui.label(RichText::new(label).monospace());
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open study data directory")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Switching data directory to {}", dir.display());
        state.set_data_dir(dir);
    }
}
