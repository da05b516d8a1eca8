use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Line, Plot, PlotBounds, PlotUi, Points};

use crate::data::model::ResultTable;
use crate::data::selector::{self, MethodKind};
use crate::state::AppState;

/// Forward moneyness axis shared by every chart.
const MONEYNESS_DOMAIN: (f64, f64) = (0.7, 1.2);
const PRICE_DOMAIN: (f64, f64) = (0.0, 200.0);
const CDF_DOMAIN: (f64, f64) = (0.0, 1.1);

// ---------------------------------------------------------------------------
// Method grid (central panel)
// ---------------------------------------------------------------------------

/// One row per fitted method: price fit, Quantile-CDF, Expectile-CDF.
pub fn method_grid(ui: &mut Ui, state: &AppState) {
    if state.study.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data directory to view the study  (File → Open data directory…)");
        });
        return;
    }

    let quotes = match state.selection(MethodKind::FilteredQuotes) {
        Some(Ok(table)) => selector::xy(table, "callprice").ok(),
        _ => None,
    };

    let row_height = (ui.available_height() / MethodKind::FITTED.len() as f32 - 28.0).max(120.0);

    for kind in MethodKind::FITTED {
        ui.strong(kind.label());
        match state.selection(kind) {
            Some(Ok(table)) => {
                let color = state.colors.color_for(kind);
                ui.columns(3, |cols: &mut [Ui]| {
                    price_chart(&mut cols[0], kind, table, quotes.as_deref(), color, row_height);
                    cdf_chart(&mut cols[1], kind, table, "QAlpha", "Quantile-CDF", color, row_height);
                    cdf_chart(&mut cols[2], kind, table, "EAlpha", "Expectile-CDF", color, row_height);
                });
            }
            Some(Err(e)) => {
                ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
            }
            None => {
                ui.label("Not configured.");
            }
        }
        ui.separator();
    }
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// Points inside the moneyness domain, as drawn.
fn clipped(points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    points
        .into_iter()
        .filter(|[x, _]| (MONEYNESS_DOMAIN.0..=MONEYNESS_DOMAIN.1).contains(x))
        .collect()
}

/// Fixed-domain chart; dragging and zooming are off so every day reads alike.
fn chart(
    ui: &mut Ui,
    id: String,
    y_domain: (f64, f64),
    height: f32,
    y_label: &str,
    add: impl FnOnce(&mut PlotUi),
) {
    Plot::new(id)
        .height(height)
        .x_axis_label("Forward moneyness K/F")
        .y_axis_label(y_label)
        .legend(egui_plot::Legend::default())
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [MONEYNESS_DOMAIN.0, y_domain.0],
                [MONEYNESS_DOMAIN.1, y_domain.1],
            ));
            add(plot_ui);
        });
}

/// Fitted price curve over the day's observed call quotes.
fn price_chart(
    ui: &mut Ui,
    kind: MethodKind,
    table: &ResultTable,
    quotes: Option<&[[f64; 2]]>,
    color: Color32,
    height: f32,
) {
    let fitted = selector::xy(table, "prices").unwrap_or_default();

    ui.label("Prices");
    chart(ui, format!("{kind}_prices"), PRICE_DOMAIN, height - 18.0, "in USD", |plot_ui| {
        if let Some(quotes) = quotes {
            plot_ui.points(
                Points::new(clipped(quotes.to_vec()))
                    .name("Observed market prices")
                    .color(crate::color::QUOTE_COLOR)
                    .radius(2.5),
            );
        }
        plot_ui.line(
            Line::new(clipped(fitted))
                .name(kind.label())
                .color(color)
                .width(1.5),
        );
    });
}

fn cdf_chart(
    ui: &mut Ui,
    kind: MethodKind,
    table: &ResultTable,
    column: &str,
    title: &str,
    color: Color32,
    height: f32,
) {
    let points = selector::xy(table, column).unwrap_or_default();

    ui.label(title);
    chart(ui, format!("{kind}_{column}"), CDF_DOMAIN, height - 18.0, "", |plot_ui| {
        plot_ui.line(Line::new(clipped(points)).name(title).color(color).width(1.5));
    });
}
