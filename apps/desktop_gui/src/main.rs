use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::{spawn_backend_thread, BackendConfig, CameraBackend};
use controller::events::UiEvent;
use ui::PulseCheckApp;

#[derive(Debug, Parser)]
#[command(name = "pulsecheck", about = "PulseCheck desktop screening page")]
struct Args {
    /// Base URL of the assistant relay.
    #[arg(long, default_value = "http://127.0.0.1:8787")]
    relay_url: String,

    /// Capture store database URL. Defaults to ~/.pulsecheck/capture.db.
    #[arg(long)]
    database_url: Option<String>,

    /// Camera backend wired into the scanner.
    #[arg(long, value_enum, default_value_t = CameraBackendArg::Synthetic)]
    camera: CameraBackendArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CameraBackendArg {
    Synthetic,
    None,
}

fn default_database_url() -> String {
    let base = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let path = base.join(".pulsecheck").join("capture.db");
    format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"))
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let config = BackendConfig {
        relay_url: args.relay_url,
        database_url: args.database_url.unwrap_or_else(default_database_url),
        camera_backend: match args.camera {
            CameraBackendArg::Synthetic => CameraBackend::Synthetic,
            CameraBackendArg::None => CameraBackend::None,
        },
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    spawn_backend_thread(config, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PulseCheck")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([860.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PulseCheck",
        options,
        Box::new(|_cc| Ok(Box::new(PulseCheckApp::new(cmd_tx, ui_rx)))),
    )
}
