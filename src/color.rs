use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::selector::MethodKind;

/// Observed market quotes are always drawn in this purple.
pub const QUOTE_COLOR: Color32 = Color32::from_rgb(0x7D, 0x3C, 0x98);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            // first hue is blue, away from the purple quotes
            let hue = (210.0 + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Method colours: MethodKind → Color32
// ---------------------------------------------------------------------------

/// One distinct line colour per fitted method.
#[derive(Debug, Clone)]
pub struct MethodColors {
    mapping: BTreeMap<MethodKind, Color32>,
    default_color: Color32,
}

impl Default for MethodColors {
    fn default() -> Self {
        let palette = generate_palette(MethodKind::FITTED.len());
        let mapping = MethodKind::FITTED.into_iter().zip(palette).collect();
        MethodColors {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }
}

impl MethodColors {
    pub fn color_for(&self, kind: MethodKind) -> Color32 {
        match kind {
            MethodKind::FilteredQuotes => QUOTE_COLOR,
            _ => self.mapping.get(&kind).copied().unwrap_or(self.default_color),
        }
    }
}
