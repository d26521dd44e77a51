use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::MapStrategy;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Please Filter here:");
    ui.separator();

    let Some((min_year, max_year)) = state.year_bounds else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- Year range ----
    ui.strong("Select Observation Years");
    let mut start = state.selection.start_year;
    let mut end = state.selection.end_year;
    let mut changed = false;
    changed |= ui
        .add(Slider::new(&mut start, min_year..=max_year).text("from"))
        .changed();
    changed |= ui
        .add(Slider::new(&mut end, min_year..=max_year).text("to"))
        .changed();
    if changed {
        state.set_year_range(start, end);
    }
    if start > end {
        ui.label(RichText::new("Start year is after end year.").color(Color32::YELLOW));
    }
    ui.separator();

    // ---- Subspecies ----
    let n_selected = state.selection.categories.len();
    let n_total = state.categories.len();
    ui.strong(format!("Select Bear Subspecies  ({n_selected}/{n_total})"));

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    // Clone so we can mutate state inside the loop.
    let categories = state.categories.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for category in &categories {
                let mut checked = state.selection.categories.contains(category);
                let text = RichText::new(category).color(state.color_map.color_for(category));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_category(category);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Page header – title and headline metrics
// ---------------------------------------------------------------------------

pub fn header(ui: &mut Ui, state: &AppState) {
    ui.heading(RichText::new("Bear Observations in BC").size(36.0).strong());
    ui.add_space(8.0);

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].label(RichText::new("Total number of observations:").size(20.0));
        cols[0].label(
            RichText::new(state.summary.total_observations.to_string())
                .size(20.0)
                .strong(),
        );

        cols[1].label(RichText::new("Percent of Black Bear observations:").size(20.0));
        cols[1].label(
            RichText::new(state.summary.percentage_label())
                .size(20.0)
                .strong(),
        );
    });
}

// ---------------------------------------------------------------------------
// Counts table
// ---------------------------------------------------------------------------

/// The filtered (year, subspecies, count) rows feeding the chart.
pub fn counts_table(ui: &mut Ui, state: &AppState) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(160.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Year");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Subspecies");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Count");
            });
        })
        .body(|mut body| {
            for row in state.visible_counts() {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui: &mut Ui| {
                        ui.label(row.observation_year.to_string());
                    });
                    table_row.col(|ui: &mut Ui| {
                        ui.label(
                            RichText::new(&row.common_name)
                                .color(state.color_map.color_for(&row.common_name)),
                        );
                    });
                    table_row.col(|ui: &mut Ui| {
                        ui.label(row.count.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                // Errors are already surfaced through `status_message`.
                let _ = state.reload();
                ui.close_menu();
            }
            if ui
                .add_enabled(
                    state.cached_sources() > 0,
                    egui::Button::new(format!("Clear cache ({})", state.cached_sources())),
                )
                .clicked()
            {
                state.clear_cache();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} observations loaded, {} visible",
                table.len(),
                state.visible_observations.len()
            ));
        }

        ui.separator();

        ui.label(match state.config.map_strategy {
            MapStrategy::Points => "Map: points",
            MapStrategy::Cluster => "Map: clusters",
        });

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open bear observations")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if state.open_source(&path).is_ok() {
            log::info!("Opened {}", path.display());
        }
    }
}
