use eframe::egui::{pos2, vec2, Align2, Color32, FontId, Rect, RichText, Sense, Ui};
use egui_plot::{Plot, PlotPoints, Points};

use crate::config::ViewerConfig;
use crate::data::time::format_unix_seconds;
use crate::figure::{depth_at, plot_y, Figure, ScatterPanel};
use crate::state::AppState;

const COLOR_BAR_WIDTH: f32 = 78.0;
const COLOR_BAR_STEPS: usize = 64;

// ---------------------------------------------------------------------------
// Profile figure (central panel)
// ---------------------------------------------------------------------------

/// Render the current figure: a title and one scatter panel per colour variable.
pub fn profile_figure(ui: &mut Ui, state: &AppState) {
    let figure = match &state.figure {
        Some(f) => f,
        None => {
            let hint = if state.dataset.is_none() {
                "Open a netCDF file to view depth profiles  (File → Open…)"
            } else {
                "No figure for the current selection"
            };
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(hint);
            });
            return;
        }
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(&figure.title);
    });

    if figure.panels.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Pick a variable to colour by in the side panel.");
        });
        return;
    }

    ui.columns(figure.panels.len(), |columns: &mut [Ui]| {
        for (col, panel) in columns.iter_mut().zip(&figure.panels) {
            scatter_panel(col, figure, panel, &state.config);
        }
    });
}

/// One panel: x vs. inverted depth, coloured by the panel variable, plus its colour bar.
fn scatter_panel(ui: &mut Ui, figure: &Figure, panel: &ScatterPanel, config: &ViewerConfig) {
    let mut summary = format!("{} points", panel.points.len());
    if panel.skipped > 0 {
        summary.push_str(&format!(", {} without data", panel.skipped));
    }
    ui.label(RichText::new(summary).small().weak());

    // Group points by colour level: one `Points` item per level.
    let levels = config.color_levels.max(1);
    let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); levels];
    for p in &panel.points {
        buckets[panel.scale.level(p.color_value, levels)].push([p.x, plot_y(p.depth)]);
    }

    let height = ui.available_height();
    let plot_width = (ui.available_width() - COLOR_BAR_WIDTH).max(120.0);
    let x_is_time = figure.x_is_time;

    ui.horizontal(|ui: &mut Ui| {
        let mut plot = Plot::new(("profile_panel", &panel.variable))
            .width(plot_width)
            .height(height)
            .x_axis_label(&figure.x_label)
            .y_axis_label(&figure.y_label)
            .link_axis("profile_axes", [true, true])
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .y_axis_formatter(|mark, _range| depth_label(mark.value, 0))
            .label_formatter(move |_name, value| {
                let x = if x_is_time {
                    format_unix_seconds(value.x, "%Y-%m-%d %H:%M:%S")
                } else {
                    format!("{:.4}", value.x)
                };
                format!("{x}\ndepth {} m", depth_label(value.y, 1))
            });
        if x_is_time {
            plot = plot.x_axis_formatter(|mark, _range| format_unix_seconds(mark.value, "%m-%d %H:%M"));
        }

        let scale = panel.scale;
        let radius = config.point_radius;
        plot.show(ui, |plot_ui| {
            for (level, pts) in buckets.into_iter().enumerate() {
                if pts.is_empty() {
                    continue;
                }
                let points = Points::new(PlotPoints::new(pts))
                    .color(scale.level_color(level, levels))
                    .radius(radius)
                    .filled(true);
                plot_ui.points(points);
            }
        });

        color_bar(ui, panel, height);
    });
}

// ---------------------------------------------------------------------------
// Colour bar
// ---------------------------------------------------------------------------

/// Vertical colour bar with the high end on top, min/mid/max ticks and a label.
fn color_bar(ui: &mut Ui, panel: &ScatterPanel, height: f32) {
    let (rect, _response) = ui.allocate_exact_size(vec2(COLOR_BAR_WIDTH, height), Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(11.0);

    painter.text(
        pos2(rect.left() + 2.0, rect.top()),
        Align2::LEFT_TOP,
        &panel.color_label,
        font.clone(),
        text_color,
    );

    let bar = Rect::from_min_max(
        pos2(rect.left() + 4.0, rect.top() + 20.0),
        pos2(rect.left() + 20.0, rect.bottom() - 24.0),
    );
    if bar.height() <= 0.0 {
        return;
    }

    let step = bar.height() / COLOR_BAR_STEPS as f32;
    for i in 0..COLOR_BAR_STEPS {
        let bottom = bar.bottom() - i as f32 * step;
        let cell = Rect::from_min_max(pos2(bar.left(), bottom - step), pos2(bar.right(), bottom));
        let t = (i as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        painter.rect_filled(cell, 0.0, panel.scale.map.sample(t));
    }

    let ticks = [
        (bar.top(), panel.scale.hi),
        (bar.center().y, (panel.scale.lo + panel.scale.hi) / 2.0),
        (bar.bottom(), panel.scale.lo),
    ];
    for (y, value) in ticks {
        painter.line_segment(
            [pos2(bar.right(), y), pos2(bar.right() + 3.0, y)],
            (1.0, Color32::GRAY),
        );
        painter.text(
            pos2(bar.right() + 5.0, y),
            Align2::LEFT_CENTER,
            format_tick(value),
            font.clone(),
            text_color,
        );
    }
}

/// Depth shown for plot y, rounded to `decimals`. Values that round to zero print as `0`.
fn depth_label(y: f64, decimals: usize) -> String {
    let depth = depth_at(y);
    let half_step = 0.5 * 10f64.powi(-(decimals as i32));
    let depth = if depth.abs() < half_step { 0.0 } else { depth };
    format!("{depth:.decimals$}")
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 100.0 {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::{depth_label, format_tick};
    use crate::figure::plot_y;

    #[test]
    fn tick_precision_follows_magnitude() {
        assert_eq!(format_tick(1500.4), "1500");
        assert_eq!(format_tick(33.456), "33.46");
        assert_eq!(format_tick(0.1234), "0.123");
    }

    #[test]
    fn surface_depth_has_no_sign() {
        assert_eq!(depth_label(plot_y(0.0), 0), "0");
        assert_eq!(depth_label(0.0, 1), "0.0");
        assert_eq!(depth_label(-0.3, 0), "0");
        assert_eq!(depth_label(1e-12, 1), "0.0");
        assert_eq!(depth_label(plot_y(12.0), 0), "12");
        assert_eq!(depth_label(plot_y(7.26), 1), "7.3");
    }
}
