use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::ColorMapKind;

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// One colour-by panel the viewer can show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelPreset {
    /// Dataset variable that colours the points.
    pub variable: String,
    /// Colour-bar label; the variable's `long_name` is used when absent.
    pub label: Option<String>,
    pub colormap: ColorMapKind,
    /// Fixed colour range `[lo, hi]`; the data range is used when absent.
    pub range: Option<[f64; 2]>,
    pub enabled: bool,
}

impl Default for PanelPreset {
    fn default() -> Self {
        Self {
            variable: String::new(),
            label: None,
            colormap: ColorMapKind::Viridis,
            range: None,
            enabled: true,
        }
    }
}

impl PanelPreset {
    pub fn new(variable: &str, label: &str, enabled: bool) -> Self {
        Self {
            variable: variable.to_string(),
            label: Some(label.to_string()),
            enabled,
            ..Default::default()
        }
    }
}

/// Everything that shapes the figure. Missing JSON fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Variable on the horizontal axis.
    pub x_variable: String,
    /// Variable plotted (inverted) on the vertical axis.
    pub depth_variable: String,
    /// Dive cycle sliced from each variable.
    pub cycle: usize,
    pub point_radius: f32,
    /// Number of discrete colour steps used when drawing points.
    pub color_levels: usize,
    pub panels: Vec<PanelPreset>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            x_variable: "time".into(),
            depth_variable: "depth".into(),
            cycle: 0,
            point_radius: 2.0,
            color_levels: 64,
            panels: vec![
                PanelPreset::new("dissolved_nitrate", "Nitrate", true),
                PanelPreset::new("chlorophyll_a", "Chlorophyll", true),
                PanelPreset::new("salinity", "Salinity", false),
            ],
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing viewer config")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn enabled_panels(&self) -> impl Iterator<Item = &PanelPreset> {
        self.panels.iter().filter(|p| p.enabled)
    }

    pub fn preset(&self, variable: &str) -> Option<&PanelPreset> {
        self.panels.iter().find(|p| p.variable == variable)
    }

    pub fn preset_mut(&mut self, variable: &str) -> Option<&mut PanelPreset> {
        self.panels.iter_mut().find(|p| p.variable == variable)
    }

    /// Enable or disable the panel for `variable`, adding a preset if needed.
    pub fn set_panel_enabled(&mut self, variable: &str, enabled: bool) {
        match self.preset_mut(variable) {
            Some(preset) => preset.enabled = enabled,
            None => self.panels.push(PanelPreset {
                variable: variable.to_string(),
                enabled,
                ..Default::default()
            }),
        }
    }
}
