//! Figure model: what gets drawn, independent of egui.
//!
//! ```text
//!  ProfileDataset + FigureSpec ──build_figure──▶ Figure { panels: [ScatterPanel] }
//! ```

use crate::color::{ColorMapKind, ColorScale};
use crate::config::ViewerConfig;
use crate::data::model::{ProfileDataset, Variable};
use crate::data::series::{extract, FlatSeries};
use crate::data::time::CfTime;
use crate::error::{ProfileError, Result};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One requested colour-by panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub variable: String,
    pub label: Option<String>,
    pub colormap: ColorMapKind,
    pub range: Option<[f64; 2]>,
}

impl PanelSpec {
    pub fn new(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            label: None,
            colormap: ColorMapKind::Viridis,
            range: None,
        }
    }
}

/// A full figure request: shared axes plus one panel per colour variable.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureSpec {
    pub x_variable: String,
    pub depth_variable: String,
    pub cycle: usize,
    pub panels: Vec<PanelSpec>,
}

impl FigureSpec {
    /// Default axes (`time`, `depth`, first cycle) for the given colour variables.
    pub fn for_variables(variables: &[&str]) -> Self {
        Self {
            x_variable: "time".into(),
            depth_variable: "depth".into(),
            cycle: 0,
            panels: variables.iter().map(|v| PanelSpec::new(v)).collect(),
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            x_variable: config.x_variable.clone(),
            depth_variable: config.depth_variable.clone(),
            cycle: config.cycle,
            panels: config
                .enabled_panels()
                .map(|p| PanelSpec {
                    variable: p.variable.clone(),
                    label: p.label.clone(),
                    colormap: p.colormap,
                    range: p.range,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendered model
// ---------------------------------------------------------------------------

/// Sample `index` of the dive cycle, positioned and coloured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub index: usize,
    pub x: f64,
    pub depth: f64,
    /// Raw value of the colour variable.
    pub value: f64,
    /// `value` clipped into the panel's colour range.
    pub color_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPanel {
    pub variable: String,
    /// Short name used in the figure title.
    pub name: String,
    /// Colour-bar label, with units when known.
    pub color_label: String,
    pub scale: ColorScale,
    pub points: Vec<ScatterPoint>,
    /// Samples dropped because a coordinate or value was not finite.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// x values are Unix seconds and should be formatted as dates.
    pub x_is_time: bool,
    pub panels: Vec<ScatterPanel>,
}

/// Depth → plot y. Depth grows downward, so the surface ends up on top.
#[inline]
pub fn plot_y(depth: f64) -> f64 {
    -depth
}

/// Plot y → depth shown on the axis.
#[inline]
pub fn depth_at(y: f64) -> f64 {
    -y
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Build the figure for `spec`. Every requested variable is resolved before
/// any panel is built: a missing one fails the whole figure.
pub fn build_figure(dataset: &ProfileDataset, spec: &FigureSpec) -> Result<Figure> {
    let x_var = dataset.variable(&spec.x_variable)?;
    let mut x = extract(dataset, &spec.x_variable, spec.cycle)?;
    let depth = extract(dataset, &spec.depth_variable, spec.cycle)?;
    check_len(&depth, x.len())?;

    let mut colour_series = Vec::with_capacity(spec.panels.len());
    for panel in &spec.panels {
        let var = dataset.variable(&panel.variable)?;
        let series = extract(dataset, &panel.variable, spec.cycle)?;
        check_len(&series, x.len())?;
        colour_series.push((panel, var, series));
    }

    let time = x_var.units().and_then(CfTime::parse);
    if let Some(cf) = time {
        for v in &mut x.values {
            *v = cf.to_unix_seconds(*v);
        }
    }

    let panels = colour_series
        .into_iter()
        .map(|(panel, var, series)| build_panel(panel, var, &series, &x, &depth))
        .collect::<Vec<_>>();

    let title = figure_title(&panels.iter().map(|p| p.name.as_str()).collect::<Vec<_>>());

    Ok(Figure {
        title,
        x_label: if time.is_some() {
            "Time".to_string()
        } else {
            axis_label(x_var)
        },
        y_label: "Depth (m)".to_string(),
        x_is_time: time.is_some(),
        panels,
    })
}

fn check_len(series: &FlatSeries, expected: usize) -> Result<()> {
    if series.len() != expected {
        return Err(ProfileError::LengthMismatch {
            name: series.name.clone(),
            len: series.len(),
            expected,
        });
    }
    Ok(())
}

fn build_panel(
    spec: &PanelSpec,
    var: &Variable,
    series: &FlatSeries,
    x: &FlatSeries,
    depth: &FlatSeries,
) -> ScatterPanel {
    let scale = match spec.range {
        Some([lo, hi]) => ColorScale::fixed(lo, hi, spec.colormap),
        None => ColorScale::from_range(series.finite_range(), spec.colormap),
    };

    let mut points = Vec::with_capacity(series.len());
    let mut skipped = 0;
    for (index, ((&xi, &di), &vi)) in x
        .values
        .iter()
        .zip(&depth.values)
        .zip(&series.values)
        .enumerate()
    {
        if !(xi.is_finite() && di.is_finite() && vi.is_finite()) {
            skipped += 1;
            continue;
        }
        points.push(ScatterPoint {
            index,
            x: xi,
            depth: di,
            value: vi,
            color_value: scale.clip(vi),
        });
    }
    if skipped > 0 {
        log::debug!("{}: skipped {skipped} non-finite samples", spec.variable);
    }

    let name = spec
        .label
        .clone()
        .or_else(|| var.long_name().map(str::to_string))
        .unwrap_or_else(|| var.name.clone());
    let color_label = match var.units() {
        Some(units) if !units.is_empty() => format!("{name} ({units})"),
        _ => name.clone(),
    };

    ScatterPanel {
        variable: spec.variable.clone(),
        name,
        color_label,
        scale,
        points,
        skipped,
    }
}

fn axis_label(var: &Variable) -> String {
    let name = var.long_name().unwrap_or(&var.name);
    match var.units() {
        Some(units) if !units.is_empty() => format!("{name} ({units})"),
        _ => name.to_string(),
    }
}

/// `"Nitrate"` → `"Nitrate Concentration Over Time at Different Depths"`,
/// two names are joined with "and", longer lists with commas.
pub fn figure_title(names: &[&str]) -> String {
    let subject = match names {
        [] => return "Depth Profile".to_string(),
        [one] => one.to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    };
    format!("{subject} Concentration Over Time at Different Depths")
}
