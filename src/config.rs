use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::export::report::ReportSettings;

/// Report PDFs swept at startup.
pub const REPORT_GLOB: &str = "dashboard_report_*.pdf";
/// Chart images swept at startup.
pub const CHART_GLOB: &str = "fig_*.png";

/// Locations and policies read once at startup.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Customer table (`.csv`, `.parquet` or `.json`).
    pub data_path: PathBuf,
    /// Stylesheet embedded into the report.
    pub stylesheet_path: PathBuf,
    /// Handlebars template for the report.
    pub template_path: PathBuf,
    /// Directory receiving report PDFs.
    pub output_dir: PathBuf,
    /// Directory receiving chart images.
    pub image_dir: PathBuf,
    /// Age after which generated artifacts are deleted at startup.
    pub retention_secs: u64,
    /// HTML-to-PDF converter executable.
    pub renderer: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/Customer_data.csv"),
            stylesheet_path: PathBuf::from("styles/style.css"),
            template_path: PathBuf::from("templates/report.html"),
            output_dir: PathBuf::from("."),
            image_dir: PathBuf::from("images"),
            retention_secs: 3600,
            renderer: default_renderer(),
        }
    }
}

#[cfg(windows)]
fn default_renderer() -> PathBuf {
    PathBuf::from(r"C:\Program Files\wkhtmltopdf\bin\wkhtmltopdf.exe")
}

#[cfg(not(windows))]
fn default_renderer() -> PathBuf {
    PathBuf::from("wkhtmltopdf")
}

impl DashboardConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            output_dir: self.output_dir.clone(),
            image_dir: self.image_dir.clone(),
            renderer: self.renderer.clone(),
        }
    }

    /// `(directory, glob)` pairs covered by the retention sweep.
    pub fn cleanup_targets(&self) -> [(&Path, &str); 2] {
        [
            (self.output_dir.as_path(), REPORT_GLOB),
            (self.image_dir.as_path(), CHART_GLOB),
        ]
    }
}
