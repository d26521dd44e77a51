use std::ops::RangeInclusive;

use eframe::egui::Ui;
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Observations by year (line chart)
// ---------------------------------------------------------------------------

/// One line per subspecies: x = year, y = count.
pub fn observations_chart(ui: &mut Ui, state: &AppState) {
    ui.heading("Observations by Year and Subspecies");

    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Open a file to view observations  (File → Open…)");
        });
        return;
    }
    if state.visible_aggregate.is_empty() {
        ui.label("No observations match the current filters.");
    }

    Plot::new("observations_chart")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Observations")
        .x_axis_formatter(year_label)
        .height(ui.available_height().max(200.0))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for category in &state.categories {
                let series: Vec<[f64; 2]> = state
                    .visible_counts()
                    .filter(|r| &r.common_name == category)
                    .map(|r| [r.observation_year as f64, r.count as f64])
                    .collect();
                if series.is_empty() {
                    continue;
                }

                let color = state.color_map.color_for(category);

                plot_ui.line(
                    Line::new(PlotPoints::new(series.clone()))
                        .name(category)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::new(series))
                        .name(category)
                        .color(color)
                        .radius(4.0),
                );
            }
        });
}

/// Only whole years get a tick label.
fn year_label(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract() == 0.0 {
        format!("{}", mark.value as i64)
    } else {
        String::new()
    }
}
