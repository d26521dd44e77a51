use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

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
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb, 255)
        })
        .collect()
}

fn to_color32(rgb: Srgb, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
        alpha,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: subspecies → Color32
// ---------------------------------------------------------------------------

/// Maps category labels (common names) to distinct colours, so the chart
/// series and the map markers for a subspecies always agree.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map over all categories of the loaded source.
    pub fn new<S: AsRef<str>>(categories: &[S]) -> Self {
        let palette = generate_palette(categories.len());
        let mapping = categories
            .iter()
            .zip(palette)
            .map(|(c, color)| (c.as_ref().to_string(), color))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a category; unknown labels are grey.
    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping
            .get(category)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Heatmap gradient
// ---------------------------------------------------------------------------

/// Blue → lime → red, with stops at 0.4, 0.65 and 1.0.
const HEAT_STOPS: [(f32, (f32, f32, f32)); 3] = [
    (0.4, (0.0, 0.0, 1.0)),
    (0.65, (0.0, 1.0, 0.0)),
    (1.0, (1.0, 0.0, 0.0)),
];

/// Colour of a heat cell with the given normalized intensity.
/// Alpha ramps from `min_opacity` at zero up to opaque at one.
pub fn heat_color(intensity: f64, min_opacity: f32) -> Color32 {
    let t = intensity.clamp(0.0, 1.0) as f32;

    let rgb = match HEAT_STOPS.iter().position(|(stop, _)| t <= *stop) {
        Some(0) => stop_color(0),
        Some(i) => {
            let (lo, hi) = (HEAT_STOPS[i - 1].0, HEAT_STOPS[i].0);
            let f = (t - lo) / (hi - lo);
            stop_color(i - 1).mix(stop_color(i), f)
        }
        None => stop_color(HEAT_STOPS.len() - 1),
    };

    let min_opacity = min_opacity.clamp(0.0, 1.0);
    let alpha = min_opacity + (1.0 - min_opacity) * t;
    to_color32(Srgb::from_linear(rgb), (alpha * 255.0) as u8)
}

fn stop_color(i: usize) -> LinSrgb {
    let (r, g, b) = HEAT_STOPS[i].1;
    Srgb::new(r, g, b).into_linear()
}
