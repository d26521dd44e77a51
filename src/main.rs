mod app;
mod color;
mod config;
mod data;
mod geo;
mod state;
mod ui;

use anyhow::Context;
use app::BearDashboardApp;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::load().context("loading dashboard configuration")?;
    log::info!(
        "source {}, map strategy {:?}",
        config.source.display(),
        config.map_strategy
    );

    let mut state = AppState::new(config);
    let source = state.config.source.clone();
    if source.exists() {
        // Failures land in the status bar; the window still opens.
        let _ = state.open_source(&source);
    } else {
        log::warn!("{} not found; waiting for File → Open…", source.display());
        state.status_message = Some(format!("{} not found. Use File → Open…", source.display()));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bear Observations in BC",
        options,
        Box::new(|_cc| Ok(Box::new(BearDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard: {e}"))
}
