use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::selector::MethodKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Cross-section table (bottom panel)
// ---------------------------------------------------------------------------

/// Method picker plus the selected day's projected, sorted rows.
pub fn cross_section_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Cross-section");
        egui::ComboBox::from_id_salt("table_method")
            .selected_text(state.table_method.label())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in MethodKind::ALL {
                    ui.selectable_value(&mut state.table_method, kind, kind.label());
                }
            });
    });
    ui.separator();

    let table = match state.selection(state.table_method) {
        Some(Ok(table)) => table,
        Some(Err(e)) => {
            ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
            return;
        }
        None => {
            ui.label("Not configured.");
            return;
        }
    };

    let columns = table.columns();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(70.0), columns.len())
        .header(20.0, |mut header| {
            for col in columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(&col.name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, table.len(), |mut row| {
                let i = row.index();
                for col in columns {
                    row.col(|ui: &mut Ui| {
                        ui.label(col.values[i].to_string());
                    });
                }
            });
        });
}
