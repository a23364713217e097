use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorMapKind;
use crate::config::{PanelPreset, ViewerConfig};
use crate::data::model::ProfileDataset;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – figure controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Profiles");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    let names = dataset.variable_names();
    let cycles = dataset.cycles().max(1);
    let candidates = state.colour_candidates();

    // Edits are collected first and applied once, after the widgets.
    let mut changed = false;
    let mut new_x: Option<String> = None;
    let mut new_cycle = state.config.cycle;
    let mut toggled: Option<String> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Axes ----
            ui.strong("X axis");
            egui::ComboBox::from_id_salt("x_variable")
                .selected_text(&state.config.x_variable)
                .show_ui(ui, |ui: &mut Ui| {
                    for name in &names {
                        if ui
                            .selectable_label(state.config.x_variable == *name, name)
                            .clicked()
                        {
                            new_x = Some(name.clone());
                        }
                    }
                });

            if cycles > 1 {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("Dive cycle");
                    ui.add(egui::DragValue::new(&mut new_cycle).range(0..=cycles - 1));
                    ui.label(format!("of {cycles}"));
                });
            }
            ui.separator();

            // ---- Colour-by panels ----
            ui.strong("Color by");
            for name in &candidates {
                let enabled = state
                    .config
                    .preset(name)
                    .map(|p| p.enabled)
                    .unwrap_or(false);
                let mut checked = enabled;
                if ui.checkbox(&mut checked, name).changed() {
                    toggled = Some(name.clone());
                }
                if enabled {
                    if let Some(preset) = state.config.preset_mut(name) {
                        changed |= preset_controls(ui, preset);
                    }
                }
            }

            // Presets that do not exist in this dataset stay visible so they can be switched off.
            let missing: Vec<String> = state
                .config
                .enabled_panels()
                .filter(|p| !candidates.contains(&p.variable))
                .map(|p| p.variable.clone())
                .collect();
            for name in missing {
                let mut checked = true;
                let text = RichText::new(format!("{name} (not plottable)")).color(Color32::RED);
                if ui.checkbox(&mut checked, text).changed() {
                    toggled = Some(name);
                }
            }
            ui.separator();

            egui::CollapsingHeader::new(RichText::new("Variables").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| variable_table(ui, dataset));

            egui::CollapsingHeader::new(RichText::new("Attributes").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for (key, value) in &dataset.attributes {
                        ui.label(format!("{key}: {value}"));
                    }
                });
        });

    if let Some(x) = new_x {
        state.set_x_variable(x);
    } else if let Some(name) = toggled {
        state.toggle_panel(&name);
    } else if new_cycle != state.config.cycle {
        state.set_cycle(new_cycle);
    } else if changed {
        state.rebuild_figure();
    }
}

/// Colour map and range controls for one enabled panel. Returns whether anything changed.
fn preset_controls(ui: &mut Ui, preset: &mut PanelPreset) -> bool {
    let mut changed = false;
    ui.indent(("preset", &preset.variable), |ui: &mut Ui| {
        egui::ComboBox::from_id_salt(("colormap", &preset.variable))
            .selected_text(preset.colormap.name())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in ColorMapKind::ALL {
                    changed |= ui
                        .selectable_value(&mut preset.colormap, kind, kind.name())
                        .changed();
                }
            });

        let mut fixed = preset.range.is_some();
        if ui.checkbox(&mut fixed, "Fixed range").changed() {
            preset.range = if fixed { Some([0.0, 1.0]) } else { None };
            changed = true;
        }
        if let Some([lo, hi]) = &mut preset.range {
            ui.horizontal(|ui: &mut Ui| {
                changed |= ui.add(egui::DragValue::new(lo).speed(0.05)).changed();
                ui.label("to");
                changed |= ui.add(egui::DragValue::new(hi).speed(0.05)).changed();
            });
        }
    });
    changed
}

/// Name / shape / units of every variable in the dataset.
fn variable_table(ui: &mut Ui, dataset: &ProfileDataset) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("Name");
            });
            header.col(|ui| {
                ui.strong("Shape");
            });
            header.col(|ui| {
                ui.strong("Units");
            });
        })
        .body(|mut body| {
            for var in dataset.variables.values() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&var.name);
                    });
                    row.col(|ui| {
                        ui.label(format!("{:?}", var.shape));
                    });
                    row.col(|ui| {
                        ui.label(var.units().unwrap_or(""));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let response = ui.add(
            egui::TextEdit::singleline(&mut state.location_input)
                .hint_text("path or OPeNDAP URL")
                .desired_width(320.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Load").clicked() || submitted {
            let location = state.location_input.clone();
            state.open(&location);
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} variables, {} dive cycles",
                ds.title(),
                ds.len(),
                ds.cycles()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open AUV profile data")
        .add_filter("Supported files", &["nc", "nc4", "cdf", "parquet", "pq", "json", "csv"])
        .add_filter("netCDF", &["nc", "nc4", "cdf"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path.display().to_string());
    }
}

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Load viewer config")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match ViewerConfig::from_json_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                state.set_config(config);
            }
            Err(e) => {
                log::error!("Failed to load config: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
