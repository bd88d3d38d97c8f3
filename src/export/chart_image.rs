use std::error::Error;
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};

use super::ExportError;
use crate::charts::{point_radius, ChartPalette, ChartSeries, GroupedBars, ScatterPoint, Slice};
use crate::data::model::CellValue;

/// Pixel sizes of the three report charts.
pub const BAR_SIZE: (u32, u32) = (800, 400);
pub const SCATTER_SIZE: (u32, u32) = (800, 400);
pub const PIE_SIZE: (u32, u32) = (400, 400);

const FONT_FAMILY: &str = "sans-serif";
static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

/// Files written for one report.
#[derive(Debug, Clone)]
pub struct ChartFiles {
    pub age: PathBuf,
    pub scatter: PathBuf,
    pub pie: PathBuf,
}

/// Render all three charts into `dir` as `fig_{age,scatter,pie}_<stamp>.png`.
pub fn write_chart_images(
    charts: &ChartSeries,
    palette: &ChartPalette,
    dir: &Path,
    stamp: &str,
) -> Result<ChartFiles, ExportError> {
    std::fs::create_dir_all(dir)?;
    let files = ChartFiles {
        age: dir.join(format!("fig_age_{stamp}.png")),
        scatter: dir.join(format!("fig_scatter_{stamp}.png")),
        pie: dir.join(format!("fig_pie_{stamp}.png")),
    };

    render_bars(&charts.spending_by_age_group, palette, BAR_SIZE)?.save(&files.age)?;
    render_scatter(&charts.income_vs_spending, palette, SCATTER_SIZE)?.save(&files.scatter)?;
    render_pie(&charts.spender_breakdown, palette, PIE_SIZE)?.save(&files.pie)?;
    log::debug!("Wrote chart images to {}", dir.display());
    Ok(files)
}

// ---------------------------------------------------------------------------
// Drawing plumbing
// ---------------------------------------------------------------------------

/// The bitmap backend has no system font lookup; register the bundled face
/// once per process.
fn ensure_font() -> Result<(), ExportError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered =
        *REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT).is_ok());
    if registered {
        Ok(())
    } else {
        Err(ExportError::Chart("bundled chart font could not be loaded".into()))
    }
}

/// Run `draw` on a white RGB canvas of `size` and hand back the pixels.
fn paint<F>(size: (u32, u32), draw: F) -> Result<RgbImage, ExportError>
where
    F: FnOnce(&Area<'_>) -> DrawResult,
{
    ensure_font()?;
    let (width, height) = size;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    draw_into(&mut buffer, size, draw).map_err(|e| ExportError::Chart(e.to_string()))?;
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ExportError::Chart("chart buffer does not match its size".into()))
}

fn draw_into<F>(buffer: &mut [u8], size: (u32, u32), draw: F) -> DrawResult
where
    F: FnOnce(&Area<'_>) -> DrawResult,
{
    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    Ok(())
}

fn rgb([r, g, b]: [u8; 3]) -> RGBColor {
    RGBColor(r, g, b)
}

fn centered(size: f64) -> TextStyle<'static> {
    TextStyle::from((FONT_FAMILY, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Grouped bars: one cluster per age group, one bar per gender.
pub fn render_bars(
    bars: &GroupedBars,
    palette: &ChartPalette,
    size: (u32, u32),
) -> Result<RgbImage, ExportError> {
    paint(size, |root| {
        let groups = bars.categories.len().max(1);
        let max = bars
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold(0.0f64, |a, &b| a.max(b));
        let y_max = if max > 0.0 { max * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(root)
            .caption("Spending Score by Age Group", (FONT_FAMILY, 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..groups as f64, 0f64..y_max)?;

        // Ticks fall on half units; the centre of slot `i` names category `i`.
        let category = |x: &f64| {
            let slot = x - 0.5;
            if slot >= 0.0 && slot.fract().abs() < 1e-6 {
                bars.categories
                    .get(slot as usize)
                    .map(|c| c.to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups * 2 + 1)
            .x_label_formatter(&category)
            .x_desc("Age Group")
            .y_desc("Mean Spending Score")
            .draw()?;

        let width = 0.8 / bars.series.len().max(1) as f64;
        for (s, series) in bars.series.iter().enumerate() {
            let color = rgb(palette.gender.rgb_for(&series.key));
            let rects = series.values.iter().enumerate().filter_map(|(g, value)| {
                let value = (*value)?;
                let x0 = g as f64 + 0.1 + s as f64 * width;
                Some(Rectangle::new([(x0, 0.0), (x0 + width, value)], color.filled()))
            });
            chart
                .draw_series(rects)?
                .label(series.key.label())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        if !bars.series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        Ok(())
    })
}

/// Income on x, spending score on y, one dot per customer sized by age and
/// coloured by profession.
pub fn render_scatter(
    points: &[ScatterPoint],
    palette: &ChartPalette,
    size: (u32, u32),
) -> Result<RgbImage, ExportError> {
    paint(size, |root| {
        let (x_min, x_max) = extent(points.iter().map(|p| p.income));
        let (y_min, y_max) = extent(points.iter().map(|p| p.spending_score));

        let mut chart = ChartBuilder::on(root)
            .caption("Income vs Spending Score", (FONT_FAMILY, 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_label_formatter(&|x| format!("{:.0}k", x / 1000.0))
            .x_desc("Annual Income ($)")
            .y_desc("Spending Score")
            .draw()?;

        let mut professions: Vec<&CellValue> = Vec::new();
        for point in points {
            if !professions.contains(&&point.profession) {
                professions.push(&point.profession);
            }
        }

        for profession in &professions {
            let color = rgb(palette.profession.rgb_for(profession));
            let dots = points
                .iter()
                .filter(|p| &p.profession == *profession)
                .map(|p| {
                    let radius = point_radius(p.age).round() as u32;
                    Circle::new((p.income, p.spending_score), radius, color.filled())
                });
            chart
                .draw_series(dots)?
                .label(profession.label())
                .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
        }

        if !professions.is_empty() {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        Ok(())
    })
}

/// Min and max padded by 5%, never an empty span.
fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

/// Pie with slices clockwise from twelve o'clock, in slice order, each
/// labelled with its tier and share.
pub fn render_pie(
    slices: &[Slice],
    palette: &ChartPalette,
    size: (u32, u32),
) -> Result<RgbImage, ExportError> {
    paint(size, |root| {
        let area = root.titled("Spender Type Breakdown", (FONT_FAMILY, 22))?;
        let (width, height) = area.dim_in_pixel();
        let center = (width as f64 / 2.0, height as f64 / 2.0);

        let total: usize = slices.iter().map(|s| s.count).sum();
        if total == 0 {
            area.draw(&Text::new("no data", to_pixel(center), centered(18.0)))?;
            return Ok(());
        }

        let radius = width.min(height) as f64 / 2.0 - 36.0;
        let mut start = 0.0;
        for slice in slices {
            let share = slice.count as f64 / total as f64;
            let end = start + share;
            let color = rgb(palette.spender.rgb_for(&CellValue::from_label(slice.label)));
            area.draw(&Polygon::new(wedge(center, radius, start, end), color.filled()))?;

            let mid = (start + end) / 2.0;
            area.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                to_pixel(on_circle(center, radius * 0.6, mid)),
                centered(15.0),
            ))?;
            area.draw(&Text::new(
                slice.label,
                to_pixel(on_circle(center, radius + 18.0, mid)),
                centered(15.0),
            ))?;
            start = end;
        }
        Ok(())
    })
}

/// Point at `fraction` of a full turn, clockwise from twelve o'clock.
fn on_circle((cx, cy): (f64, f64), radius: f64, fraction: f64) -> (f64, f64) {
    let angle = fraction * TAU;
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

fn to_pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Polygon outline of the slice between two turn fractions.
fn wedge(center: (f64, f64), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = (((end - start) * 120.0).ceil() as usize).max(2);
    std::iter::once(to_pixel(center))
        .chain((0..=steps).map(|i| {
            let fraction = start + (end - start) * i as f64 / steps as f64;
            to_pixel(on_circle(center, radius, fraction))
        }))
        .collect()
}
