use eframe::egui;

use crate::state::AppState;
use crate::ui::map::{renderer_for, MapRenderer};
use crate::ui::{chart, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BearDashboardApp {
    pub state: AppState,
    map_renderer: Box<dyn MapRenderer>,
}

impl BearDashboardApp {
    pub fn new(state: AppState) -> Self {
        let map_renderer = renderer_for(&state.config);
        Self {
            state,
            map_renderer,
        }
    }
}

impl eframe::App for BearDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: counts table ----
        egui::TopBottomPanel::bottom("counts_panel")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    panels::counts_table(ui, &self.state);
                });
            });

        // ---- Central panel: metrics, map, chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::header(ui, &self.state);
            ui.separator();

            let map_width = ui.available_width() * 0.4;
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(map_width);
                    map::observations_map(ui, &mut self.state, self.map_renderer.as_ref());
                });
                ui.separator();
                ui.vertical(|ui| {
                    chart::observations_chart(ui, &self.state);
                });
            });
        });
    }
}
