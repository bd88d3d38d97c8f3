use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use crate::charts::ChartSeries;
use crate::config::DashboardConfig;
use crate::data::filter::FilterSelection;
use crate::data::model::{CustomerDataset, FilterField};
use crate::data::view::render;
use crate::export::{file_stamp, ExportFormat};
use crate::session::Session;

#[derive(Debug, Parser)]
#[command(name = "customer-dashboard", version, about = "Customer behavior dashboard")]
pub struct Cli {
    /// JSON config file; flags below override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Customer table to load instead of the configured one.
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Directory receiving generated reports.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter the dataset and write one export without opening a window.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Permitted gender; repeat for several. Omit to keep all.
    #[arg(long = "gender")]
    pub genders: Vec<String>,

    /// Permitted profession; repeat for several. Omit to keep all.
    #[arg(long = "profession")]
    pub professions: Vec<String>,

    /// Permitted age group (e.g. "26-35"); repeat for several. Omit to keep all.
    #[arg(long = "age-group")]
    pub age_groups: Vec<String>,

    /// Destination for CSV/XLSX. Defaults to a timestamped name in the
    /// output directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    pub fn dashboard_config(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

impl ExportArgs {
    /// Selection from the repeated filter flags, matched against each
    /// field's domain by display label.
    pub fn selection(&self, dataset: &CustomerDataset) -> FilterSelection {
        let mut selection = FilterSelection::all(dataset);
        for (field, wanted) in [
            (FilterField::Gender, &self.genders),
            (FilterField::Profession, &self.professions),
            (FilterField::AgeGroup, &self.age_groups),
        ] {
            if wanted.is_empty() {
                continue;
            }
            let domain = dataset.domain(field);
            for label in wanted {
                if !domain.iter().any(|v| v.label() == *label) {
                    log::warn!("{} value '{label}' does not occur in the data", field.title());
                }
            }
            selection.set(
                field,
                domain
                    .iter()
                    .filter(|v| wanted.contains(&v.label()))
                    .cloned(),
            );
        }
        selection
    }
}

/// Run one headless export and return the written path.
pub fn run_export(session: &Session, args: &ExportArgs) -> Result<PathBuf> {
    let selection = args.selection(&session.dataset);
    let (view, summary) = render(&session.dataset, &selection);
    log::info!(
        "{} of {} customers selected",
        view.len(),
        session.dataset.len()
    );

    let now = Local::now();
    let default_path = || {
        session
            .config
            .output_dir
            .join(args.format.default_file_name(&file_stamp(&now)))
    };

    let path = match args.format.table() {
        Some(table) => {
            let path = args.out.clone().unwrap_or_else(default_path);
            table.save(&view, &path)?;
            path
        }
        None => {
            if args.out.is_some() {
                log::warn!("--out is ignored for PDF reports; they go to the output directory");
            }
            let charts = ChartSeries::from_view(&view, &session.dataset);
            session
                .report
                .generate(&view, &summary, &charts, &session.palette, &now)
                .context("generating PDF report")?
        }
    };
    Ok(path)
}
