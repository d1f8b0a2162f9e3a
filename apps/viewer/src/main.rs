use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::spawn_backend_thread;
use controller::events::UiEvent;
use ui::app::ViewerApp;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the dataset server.
    #[arg(long, default_value = "http://127.0.0.1:8750")]
    server_url: String,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    spawn_backend_thread(args.server_url, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Chartfolio Viewer")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Chartfolio Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(cmd_tx, ui_rx)))),
    )
}
