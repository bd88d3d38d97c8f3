use std::f64::consts::TAU;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, Points, Polygon};

use crate::charts::point_radius;
use crate::data::model::CellValue;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Spending score by age group (grouped bars)
// ---------------------------------------------------------------------------

pub fn spending_by_age_group(ui: &mut Ui, state: &AppState) {
    let bars = &state.charts.spending_by_age_group;
    let categories = bars.categories.clone();
    let groups = bars.series.len().max(1) as f64;
    let bar_width = 0.8 / groups;

    Plot::new("spending_by_age_group")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Age Group")
        .y_axis_label("Avg Spending Score")
        .x_axis_formatter(move |mark, _range| {
            let index = mark.value.round();
            if (mark.value - index).abs() < 1e-6 && index >= 0.0 {
                categories.get(index as usize).map(|c| c.to_string()).unwrap_or_default()
            } else {
                String::new()
            }
        })
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (s, series) in bars.series.iter().enumerate() {
                let offset = (s as f64 - (groups - 1.0) / 2.0) * bar_width;
                let name = series.key.label();
                let items: Vec<Bar> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(g, value)| {
                        value.map(|v| {
                            Bar::new(g as f64 + offset, v)
                                .width(bar_width * 0.95)
                                .name(&name)
                        })
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(items)
                        .name(&name)
                        .color(state.palette.gender.color_for(&series.key)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Income vs spending score (scatter, one series per profession)
// ---------------------------------------------------------------------------

pub fn income_vs_spending(ui: &mut Ui, state: &AppState) {
    let points = &state.charts.income_vs_spending;
    let mut professions: Vec<&CellValue> = Vec::new();
    for point in points {
        if !professions.contains(&&point.profession) {
            professions.push(&point.profession);
        }
    }

    Plot::new("income_vs_spending")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Annual Income ($)")
        .y_axis_label("Spending Score (1-100)")
        .show(ui, |plot_ui| {
            for profession in professions {
                let color = state.palette.profession.color_for(profession);
                let name = profession.label();
                // One item per marker size; egui_plot sizes a whole series at once.
                for point in points.iter().filter(|p| &p.profession == profession) {
                    plot_ui.points(
                        Points::new(vec![[point.income, point.spending_score]])
                            .radius(point_radius(point.age))
                            .filled(true)
                            .color(color)
                            .name(&name),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Spender type breakdown (pie drawn from polygons)
// ---------------------------------------------------------------------------

pub fn spender_breakdown(ui: &mut Ui, state: &AppState) {
    let slices = &state.charts.spender_breakdown;
    let total: usize = slices.iter().map(|s| s.count).sum();

    Plot::new("spender_breakdown")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if total == 0 {
                return;
            }
            let mut start = 0.0;
            for slice in slices {
                let fraction = slice.count as f64 / total as f64;
                let color = state
                    .palette
                    .spender
                    .color_for(&CellValue::from_label(slice.label));
                let name = format!(
                    "{} ({:.1}%)",
                    slice.label,
                    fraction * 100.0
                );
                plot_ui.polygon(
                    Polygon::new(wedge(start, start + fraction))
                        .fill_color(color)
                        .stroke((1.0, Color32::WHITE))
                        .name(name),
                );
                start += fraction;
            }
        });
}

/// Unit-circle wedge between two fractions of a turn, clockwise from twelve
/// o'clock.
fn wedge(from: f64, to: f64) -> Vec<[f64; 2]> {
    let steps = ((to - from) * 96.0).ceil().max(2.0) as usize;
    let mut points = vec![[0.0, 0.0]];
    for i in 0..=steps {
        let t = from + (to - from) * i as f64 / steps as f64;
        let angle = t * TAU;
        points.push([angle.sin(), angle.cos()]);
    }
    points
}
