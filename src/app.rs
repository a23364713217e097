use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ProfileViewerApp {
    pub state: AppState,
}

impl ProfileViewerApp {
    /// Start with `config`, opening `location` right away when given.
    pub fn new(config: ViewerConfig, location: Option<&str>) -> Self {
        let mut state = AppState::new(config);
        if let Some(location) = location {
            state.open(location);
        }
        Self { state }
    }
}

impl eframe::App for ProfileViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: axes and colour-by controls ----
        egui::SidePanel::left("control_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: figure ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::profile_figure(ui, &self.state);
        });
    }
}
