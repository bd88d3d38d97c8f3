/// Export adapters consuming the filtered view and summary.
///
/// * `tabular`     – CSV and XLSX files of the filtered view
/// * `chart_image` – PNG renderings of the three dashboard charts
/// * `report`      – HTML template → PDF via an external renderer
/// * `cleanup`     – startup retention sweep of old artifacts
pub mod chart_image;
pub mod cleanup;
pub mod report;
pub mod tabular;

use std::path::PathBuf;

use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("chart image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("chart drawing error: {0}")]
    Chart(String),

    #[error("report template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("report render error: {0}")]
    Render(#[from] Box<handlebars::RenderError>),

    #[error("PDF renderer '{}' was not found; install wkhtmltopdf or set `renderer`", .0.display())]
    RendererMissing(PathBuf),

    #[error("PDF renderer exited with {status}: {stderr}")]
    RendererFailed { status: String, stderr: String },
}

/// Artifact kinds offered by the dashboard and the `export` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// The tabular writer for this format; `None` for the PDF report.
    pub fn table(self) -> Option<tabular::TableFormat> {
        match self {
            ExportFormat::Csv => Some(tabular::TableFormat::Csv),
            ExportFormat::Xlsx => Some(tabular::TableFormat::Xlsx),
            ExportFormat::Pdf => None,
        }
    }

    /// `filtered_customers_<stamp>.csv`, `dashboard_report_<stamp>.pdf`, ...
    pub fn default_file_name(self, stamp: &str) -> String {
        let stem = match self {
            ExportFormat::Csv | ExportFormat::Xlsx => "filtered_customers",
            ExportFormat::Pdf => "dashboard_report",
        };
        format!("{stem}_{stamp}.{}", self.extension())
    }
}

/// Timestamp embedded in artifact file names.
pub fn file_stamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Timestamp printed in the report header.
pub fn report_time(now: &DateTime<Local>) -> String {
    now.format("%B %d, %Y at %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn artifact_names() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let stamp = file_stamp(&now);
        assert_eq!(stamp, "20240309_140507");
        assert_eq!(
            ExportFormat::Csv.default_file_name(&stamp),
            "filtered_customers_20240309_140507.csv"
        );
        assert_eq!(
            ExportFormat::Pdf.default_file_name(&stamp),
            "dashboard_report_20240309_140507.pdf"
        );
        assert_eq!(report_time(&now), "March 09, 2024 at 02:05 PM");
    }

    #[test]
    fn only_csv_and_xlsx_are_tables() {
        for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
            assert_eq!(format.table().map(|t| t.export_format()), Some(format));
        }
        assert_eq!(ExportFormat::Pdf.table(), None);
    }
}
