use anyhow::{anyhow, Result};
use cannabis_explorer::app::ExplorerApp;
use cannabis_explorer::config::{Args, DashboardConfig};
use cannabis_explorer::data::loader::TableCache;
use cannabis_explorer::state::AppState;
use clap::Parser;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig::from_args(&args)?;
    let cache = TableCache::new(config.text_encoding()?);
    log::info!("Data source: {} ({})", config.source, config.encoding);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cannabis Establishment Explorer",
        options,
        Box::new(move |_cc| Ok(Box::new(ExplorerApp::new(AppState::new(config, cache))))),
    )
    .map_err(|e| anyhow!("running the UI: {e}"))
}
