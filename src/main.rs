mod app;
mod charts;
mod cli;
mod color;
mod config;
mod data;
mod export;
mod session;
mod state;
mod ui;

use anyhow::Result;
use app::DashboardApp;
use clap::Parser;
use cli::{Cli, Command};
use eframe::egui;
use session::Session;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.dashboard_config()?;
    let session = Session::start(config)?;

    if let Some(Command::Export(args)) = &cli.command {
        let path = cli::run_export(&session, args)?;
        println!("{}", path.display());
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let state = AppState::new(session);
    eframe::run_native(
        "Customer Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))
}
