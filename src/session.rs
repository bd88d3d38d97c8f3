use anyhow::{Context, Result};

use crate::charts::ChartPalette;
use crate::config::DashboardConfig;
use crate::data::loader::load_dataset;
use crate::data::model::CustomerDataset;
use crate::export::cleanup::sweep_artifacts;
use crate::export::report::ReportRenderer;

/// Everything loaded once at startup and owned for the process lifetime.
pub struct Session {
    pub config: DashboardConfig,
    pub dataset: CustomerDataset,
    pub report: ReportRenderer,
    pub palette: ChartPalette,
}

impl Session {
    /// Sweep stale artifacts, read the report resources and load the data.
    /// Any missing resource or schema problem aborts startup.
    pub fn start(config: DashboardConfig) -> Result<Self> {
        sweep_artifacts(&config.cleanup_targets(), config.retention());

        let stylesheet_path = config.stylesheet_path.display();
        let template_path = config.template_path.display();
        let stylesheet = std::fs::read_to_string(&config.stylesheet_path)
            .with_context(|| format!("reading stylesheet {stylesheet_path}"))?;
        let template = std::fs::read_to_string(&config.template_path)
            .with_context(|| format!("reading report template {template_path}"))?;
        let report = ReportRenderer::new(&template, stylesheet, config.report_settings())
            .with_context(|| format!("compiling report template {template_path}"))?;

        let dataset = load_dataset(&config.data_path)
            .with_context(|| format!("loading customer data {}", config.data_path.display()))?;
        if dataset.is_empty() {
            log::warn!("{} has no customer rows", config.data_path.display());
        }
        let palette = ChartPalette::for_dataset(&dataset);

        Ok(Session {
            config,
            dataset,
            report,
            palette,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::config_in;
    use super::*;
    use crate::data::schema::SchemaError;

    #[test]
    fn starts_with_all_resources() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::start(config_in(dir.path())).unwrap();
        assert_eq!(session.dataset.len(), 6);
    }

    #[test]
    fn missing_stylesheet_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::remove_file(&config.stylesheet_path).unwrap();
        let err = Session::start(config).err().unwrap();
        assert!(format!("{err:#}").contains("reading stylesheet"));
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::remove_file(&config.template_path).unwrap();
        assert!(Session::start(config).is_err());
    }

    #[test]
    fn schema_errors_abort_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.data_path, "CustomerID,Gender\n1,Male\n").unwrap();
        let err = Session::start(config).err().unwrap();
        assert!(err
            .chain()
            .any(|cause| cause.downcast_ref::<SchemaError>().is_some()));
    }
}
