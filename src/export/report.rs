use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use handlebars::Handlebars;
use serde::Serialize;

use super::chart_image::{write_chart_images, ChartFiles};
use super::tabular::{export_headers, export_row};
use super::{file_stamp, report_time, ExportError, ExportFormat};
use crate::charts::{ChartPalette, ChartSeries};
use crate::color::{to_hex, ColorMap};
use crate::data::model::CellValue;
use crate::data::summary::{FormattedSummary, Summary};
use crate::data::view::FilteredView;

const TEMPLATE_NAME: &str = "report";

/// Where report artifacts go and which renderer turns HTML into PDF.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub image_dir: PathBuf,
    pub renderer: PathBuf,
}

// ---------------------------------------------------------------------------
// Template context
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct LegendEntry {
    label: String,
    color: String,
}

#[derive(Debug, Serialize)]
struct SliceEntry {
    label: &'static str,
    color: String,
    count: usize,
    percent: String,
}

#[derive(Debug, Serialize)]
struct ReportContext<'a> {
    #[serde(flatten)]
    summary: FormattedSummary,
    has_data: bool,
    report_time: String,
    stylesheet: &'a str,
    fig_age_path: String,
    fig_scatter_path: String,
    fig_pie_path: String,
    gender_legend: Vec<LegendEntry>,
    profession_legend: Vec<LegendEntry>,
    spender_breakdown: Vec<SliceEntry>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn legend(map: &ColorMap, keep: impl Fn(&str) -> bool) -> Vec<LegendEntry> {
    map.legend_entries()
        .into_iter()
        .filter(|(label, _)| keep(label))
        .map(|(label, color)| LegendEntry {
            label,
            color: to_hex(color),
        })
        .collect()
}

/// `file://` URI for an image so the renderer can load it from disk.
pub fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = absolute.to_string_lossy().replace('\\', "/");
    let text = text.strip_prefix("//?/").unwrap_or(&text);
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders the dashboard report: chart images, HTML template, PDF.
pub struct ReportRenderer {
    registry: Handlebars<'static>,
    stylesheet: String,
    settings: ReportSettings,
}

impl ReportRenderer {
    /// Compile the template up front so syntax errors surface at startup.
    pub fn new(
        template: &str,
        stylesheet: String,
        settings: ReportSettings,
    ) -> Result<Self, ExportError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(Box::new)?;
        Ok(ReportRenderer {
            registry,
            stylesheet,
            settings,
        })
    }

    /// Render the HTML document for already-written chart images.
    pub fn render_html(
        &self,
        view: &FilteredView<'_>,
        summary: &Summary,
        charts: &ChartSeries,
        palette: &ChartPalette,
        images: &ChartFiles,
        now: &DateTime<Local>,
    ) -> Result<String, ExportError> {
        let genders: Vec<String> = charts
            .spending_by_age_group
            .series
            .iter()
            .map(|s| s.key.label())
            .collect();
        let professions: Vec<String> = {
            let mut seen: Vec<&CellValue> = Vec::new();
            for point in &charts.income_vs_spending {
                if !seen.contains(&&point.profession) {
                    seen.push(&point.profession);
                }
            }
            seen.into_iter().map(CellValue::label).collect()
        };
        let total: usize = charts.spender_breakdown.iter().map(|s| s.count).sum();

        let context = ReportContext {
            summary: summary.formatted(),
            has_data: !view.is_empty(),
            report_time: report_time(now),
            stylesheet: &self.stylesheet,
            fig_age_path: file_uri(&images.age),
            fig_scatter_path: file_uri(&images.scatter),
            fig_pie_path: file_uri(&images.pie),
            gender_legend: legend(&palette.gender, |l| genders.iter().any(|g| g == l)),
            profession_legend: legend(&palette.profession, |l| professions.iter().any(|p| p == l)),
            spender_breakdown: charts
                .spender_breakdown
                .iter()
                .map(|slice| SliceEntry {
                    label: slice.label,
                    color: to_hex(palette.spender.color_for(&CellValue::from_label(slice.label))),
                    count: slice.count,
                    percent: format!("{:.1}%", 100.0 * slice.count as f64 / total.max(1) as f64),
                })
                .collect(),
            columns: export_headers(view),
            rows: view
                .iter()
                .map(|c| export_row(view, c).iter().map(ToString::to_string).collect())
                .collect(),
        };

        Ok(self
            .registry
            .render(TEMPLATE_NAME, &context)
            .map_err(Box::new)?)
    }

    /// Write chart images, render the template and convert it to
    /// `dashboard_report_<stamp>.pdf` in the output directory.
    pub fn generate(
        &self,
        view: &FilteredView<'_>,
        summary: &Summary,
        charts: &ChartSeries,
        palette: &ChartPalette,
        now: &DateTime<Local>,
    ) -> Result<PathBuf, ExportError> {
        let stamp = file_stamp(now);
        let images = write_chart_images(charts, palette, &self.settings.image_dir, &stamp)?;
        let html = self.render_html(view, summary, charts, palette, &images, now)?;

        std::fs::create_dir_all(&self.settings.output_dir)?;
        let pdf_path = self
            .settings
            .output_dir
            .join(ExportFormat::Pdf.default_file_name(&stamp));

        // Removed when dropped, whatever the renderer does.
        let mut page = tempfile::Builder::new()
            .prefix("dashboard_report_")
            .suffix(".html")
            .tempfile_in(&self.settings.output_dir)?;
        page.write_all(html.as_bytes())?;
        page.flush()?;

        self.run_renderer(page.path(), &pdf_path)?;
        log::info!(
            "Generated report for {} customers at {}",
            view.len(),
            pdf_path.display()
        );
        Ok(pdf_path)
    }

    fn run_renderer(&self, html: &Path, pdf: &Path) -> Result<(), ExportError> {
        let renderer = &self.settings.renderer;
        let output = Command::new(renderer)
            .arg("--quiet")
            .arg("--enable-local-file-access")
            .arg(html)
            .arg(pdf)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExportError::RendererMissing(renderer.clone()),
                _ => ExportError::Io(e),
            })?;

        if !output.status.success() {
            return Err(ExportError::RendererFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterSelection;
    use crate::data::model::fixtures::{customer, dataset};
    use crate::data::view::render;
    use chrono::TimeZone;

    const TEMPLATE: &str = "\
<style>{{{stylesheet}}}</style>
<p>{{report_time}}</p>
<p>{{total_customers}} | {{avg_income}} | {{avg_score}} | {{avg_family}}</p>
<img src=\"{{fig_pie_path}}\">
{{#each gender_legend}}[{{label}} {{color}}]{{/each}}
{{#each spender_breakdown}}({{label}} {{count}} {{percent}}){{/each}}
{{#if has_data}}<table>{{#each rows}}<tr>{{#each this}}<td>{{this}}</td>{{/each}}</tr>{{/each}}</table>{{else}}<p>no rows</p>{{/if}}
";

    fn settings(dir: &Path, renderer: &str) -> ReportSettings {
        ReportSettings {
            output_dir: dir.to_path_buf(),
            image_dir: dir.join("images"),
            renderer: PathBuf::from(renderer),
        }
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn renders_summary_legends_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(vec![
            customer(1, "M", 30.0, "Artist"),
            customer(2, "F<b>", 30.0, "Doctor"),
        ]);
        let (view, summary) = render(&ds, &FilterSelection::all(&ds));
        let charts = ChartSeries::from_view(&view, &ds);
        let palette = ChartPalette::for_dataset(&ds);
        let images = write_chart_images(&charts, &palette, dir.path(), "t").unwrap();

        let renderer =
            ReportRenderer::new(TEMPLATE, "body{}".into(), settings(dir.path(), "wkhtmltopdf"))
                .unwrap();
        let html = renderer
            .render_html(&view, &summary, &charts, &palette, &images, &now())
            .unwrap();

        assert!(html.contains("<style>body{}</style>"));
        assert!(html.contains("January 02, 2024 at 09:30 AM"));
        assert!(html.contains("2 | $15,000.00 | 15.0 | 1.5"));
        assert!(html.contains("src=\"file://"));
        assert!(html.contains("[M #"));
        // Cell text is HTML-escaped.
        assert!(html.contains("F&lt;b&gt;"));
        assert!(html.contains("(Low 2 100.0%)"));
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn empty_view_renders_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(vec![customer(1, "M", 30.0, "Artist")]);
        let (view, summary) = render(&ds, &FilterSelection::none());
        let charts = ChartSeries::from_view(&view, &ds);
        let palette = ChartPalette::for_dataset(&ds);
        let images = write_chart_images(&charts, &palette, dir.path(), "t").unwrap();

        let renderer =
            ReportRenderer::new(TEMPLATE, String::new(), settings(dir.path(), "wkhtmltopdf"))
                .unwrap();
        let html = renderer
            .render_html(&view, &summary, &charts, &palette, &images, &now())
            .unwrap();
        assert!(html.contains("0 | no data | no data | no data"));
        assert!(html.contains("<p>no rows</p>"));
    }

    #[test]
    fn bundled_template_renders() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(vec![
            customer(1, "M", 30.0, "Artist"),
            customer(7, "F", 50.0, "Doctor"),
        ]);
        let (view, summary) = render(&ds, &FilterSelection::all(&ds));
        let charts = ChartSeries::from_view(&view, &ds);
        let palette = ChartPalette::for_dataset(&ds);
        let images = write_chart_images(&charts, &palette, dir.path(), "t").unwrap();

        let renderer = ReportRenderer::new(
            include_str!("../../templates/report.html"),
            include_str!("../../styles/style.css").into(),
            settings(dir.path(), "wkhtmltopdf"),
        )
        .unwrap();
        let html = renderer
            .render_html(&view, &summary, &charts, &palette, &images, &now())
            .unwrap();
        assert!(html.contains("Customer Behavior Report"));
        assert!(html.contains("Spender Type Breakdown"));
        assert!(html.contains("<td>Doctor</td>"));
    }

    #[test]
    fn invalid_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            ReportRenderer::new("{{#each rows}}", String::new(), settings(dir.path(), "x"));
        assert!(matches!(result, Err(ExportError::Template(_))));
    }

    #[test]
    fn missing_renderer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(vec![customer(1, "M", 30.0, "Artist")]);
        let (view, summary) = render(&ds, &FilterSelection::all(&ds));
        let charts = ChartSeries::from_view(&view, &ds);
        let palette = ChartPalette::for_dataset(&ds);

        let renderer = ReportRenderer::new(
            TEMPLATE,
            String::new(),
            settings(dir.path(), "/nonexistent/wkhtmltopdf"),
        )
        .unwrap();
        let err = renderer
            .generate(&view, &summary, &charts, &palette, &now())
            .unwrap_err();
        assert!(matches!(err, ExportError::RendererMissing(_)));

        // Chart images stay for the retention sweep; the HTML page does not.
        assert!(dir.path().join("images/fig_age_20240102_093000.png").exists());
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "html"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn failing_renderer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(vec![customer(1, "M", 30.0, "Artist")]);
        let (view, summary) = render(&ds, &FilterSelection::all(&ds));
        let charts = ChartSeries::from_view(&view, &ds);
        let palette = ChartPalette::for_dataset(&ds);

        let renderer =
            ReportRenderer::new(TEMPLATE, String::new(), settings(dir.path(), "false")).unwrap();
        let err = renderer
            .generate(&view, &summary, &charts, &palette, &now())
            .unwrap_err();
        assert!(matches!(err, ExportError::RendererFailed { .. }));
    }

    #[test]
    fn file_uris_are_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();
        let uri = file_uri(&path);
        assert!(uri.starts_with("file:///"), "{uri}");
        assert!(uri.ends_with("/a.png"));
    }
}
