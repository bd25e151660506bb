mod auth;
mod config;
mod entry;
mod logging;
mod sheets;
mod shell;
mod ui;

use eframe::egui;
use std::path::Path;
use std::sync::Arc;

use auth::{Authenticator, CredentialProvider, GoogleCredentials};
use config::Config;
use sheets::SheetsClient;

fn load_icon() -> egui::IconData {
    let (rgba, width, height) = ui::icon_rgba();
    egui::IconData { rgba, width, height }
}

/// Authorize against Google and build the spreadsheet client. Any failure is
/// logged and leaves the add-entry capability disabled.
fn connect_sheets(runtime: &tokio::runtime::Runtime, app_dir: Option<&Path>) -> Option<Arc<SheetsClient>> {
    let app_dir = app_dir?;
    let provider: Arc<dyn CredentialProvider> = Arc::new(GoogleCredentials::new(app_dir));

    match runtime.block_on(auth::authorize(provider.as_ref())) {
        Ok(token) => {
            tracing::info!("Google Sheets service initialized");
            Some(Arc::new(SheetsClient::new(Authenticator::new(provider, token))))
        }
        Err(e) => {
            tracing::error!("Failed to create sheet service: {e}");
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    let app_dir = Config::config_dir();
    match &app_dir {
        Ok(dir) => {
            if let Err(e) = logging::enable_logging(dir) {
                eprintln!("Failed to set up logging: {e}");
            }
        }
        Err(e) => eprintln!("{e}"),
    }

    let config = Config::load();
    if !config.is_configured() {
        tracing::warn!("No spreadsheet configured, use Configure in the tray menu");
    }

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let sheets = connect_sheets(&runtime, app_dir.as_deref().ok());

    // The entry popup: borderless, on top, hidden until summoned
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1680.0, 96.0])
        .with_title("Time Entry")
        .with_decorations(false)
        .with_resizable(false)
        .with_taskbar(false)
        .with_window_level(egui::WindowLevel::AlwaysOnTop)
        .with_visible(false)
        .with_icon(Arc::new(load_icon()));

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let result = eframe::run_native(
        "Time Tracker",
        options,
        Box::new(move |cc| Ok(Box::new(ui::TimeTrackerApp::new(cc, config, runtime, sheets)))),
    );
    tracing::info!("Shutting down...");
    result
}
