mod app;
mod color;
mod config;
mod data;
mod error;
mod pipeline;
mod state;
mod ui;

use app::FileConverterApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env().unwrap_or_else(|e| {
        log::warn!("Falling back to default settings: {e}");
        Settings::default()
    });
    log::info!("Starting with {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "File Converter & Cleaner",
        options,
        Box::new(|_cc| Ok(Box::new(FileConverterApp::new(settings)))),
    )
}
