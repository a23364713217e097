mod app;
mod color;
mod config;
mod data;
mod error;
mod figure;
mod state;
mod ui;

use app::ProfileViewerApp;
use config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional path or URL to open on start-up.
    let location = std::env::args().nth(1);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 720.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AUV Profile Viewer",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ProfileViewerApp::new(
                ViewerConfig::default(),
                location.as_deref(),
            )))
        }),
    )
}
