use std::path::{Path, PathBuf};

use chrono::Local;

use crate::charts::{ChartPalette, ChartSeries};
use crate::data::filter::FilterSelection;
use crate::data::model::{CellValue, CustomerDataset, FilterField};
use crate::data::summary::Summary;
use crate::data::view::{render, FilteredView};
use crate::export::report::ReportRenderer;
use crate::export::tabular::TableFormat;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Message shown in the top bar after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset.
    pub dataset: CustomerDataset,

    /// Per-attribute filter selections.
    pub filters: FilterSelection,

    /// Indices of customers passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over the visible customers (cached).
    pub summary: Summary,

    /// Chart data over the visible customers (cached).
    pub charts: ChartSeries,

    /// Series colours, stable across filter changes.
    pub palette: ChartPalette,

    pub report: ReportRenderer,

    /// Status / error message shown in the UI.
    pub status_message: Option<Status>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        let Session {
            dataset,
            report,
            palette,
            ..
        } = session;
        let mut state = Self {
            filters: FilterSelection::all(&dataset),
            dataset,
            visible_indices: Vec::new(),
            summary: Summary::default(),
            charts: ChartSeries::default(),
            palette,
            report,
            status_message: None,
        };
        state.refilter();
        state
    }

    /// Recompute view, summary and chart series after a filter change.
    pub fn refilter(&mut self) {
        let (view, summary) = render(&self.dataset, &self.filters);
        self.charts = ChartSeries::from_view(&view, &self.dataset);
        self.visible_indices = view.indices().to_vec();
        self.summary = summary;
    }

    /// The current filtered view.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::from_indices(&self.dataset, &self.visible_indices)
    }

    /// Toggle a single value in a field's filter.
    pub fn toggle_filter_value(&mut self, field: FilterField, value: &CellValue) {
        self.filters.toggle(field, value);
        self.refilter();
    }

    /// Select all values of a field.
    pub fn select_all(&mut self, field: FilterField) {
        self.filters.select_all(field, &self.dataset);
        self.refilter();
    }

    /// Deselect all values of a field.
    pub fn select_none(&mut self, field: FilterField) {
        self.filters.select_none(field);
        self.refilter();
    }

    /// Write the filtered view as CSV or XLSX. Failures only set the status.
    pub fn export_table(&mut self, format: TableFormat, path: &Path) {
        let result = format.save(&self.view(), path);
        self.status_message = Some(match result {
            Ok(()) => Status::Info(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("{} export failed: {e}", format.export_format().extension());
                Status::Error(format!("Export failed: {e}"))
            }
        });
    }

    /// Render the PDF report. Failures only set the status.
    pub fn generate_report(&mut self) -> Option<PathBuf> {
        let view = self.view();
        let result = self.report.generate(
            &view,
            &self.summary,
            &self.charts,
            &self.palette,
            &Local::now(),
        );
        match result {
            Ok(path) => {
                self.status_message =
                    Some(Status::Info(format!("PDF report generated: {}", path.display())));
                Some(path)
            }
            Err(e) => {
                log::error!("Report generation failed: {e}");
                self.status_message = Some(Status::Error(format!("Report failed: {e}")));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::config_in;

    fn state(root: &Path) -> AppState {
        AppState::new(Session::start(config_in(root)).unwrap())
    }

    #[test]
    fn starts_with_everything_visible() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        assert_eq!(state.visible_indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(state.summary.total_customers, 6);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn filter_changes_refresh_caches() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());

        state.toggle_filter_value(FilterField::Gender, &CellValue::String("Male".into()));
        assert_eq!(state.visible_indices, vec![2, 3, 4]);
        assert_eq!(state.summary.total_customers, 3);

        state.select_none(FilterField::AgeGroup);
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.summary.avg_income, None);
        assert!(state.charts.income_vs_spending.is_empty());

        state.select_all(FilterField::AgeGroup);
        assert_eq!(state.visible_indices, vec![2, 3, 4]);
    }

    #[test]
    fn export_failures_stay_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());

        state.export_table(TableFormat::Csv, &dir.path().join("missing/dir/out.csv"));
        assert!(matches!(state.status_message, Some(Status::Error(_))));
        assert_eq!(state.visible_indices.len(), 6);

        let out = dir.path().join("out.csv");
        state.export_table(TableFormat::Csv, &out);
        assert!(matches!(state.status_message, Some(Status::Info(_))));
        assert!(out.exists());

        let xlsx = dir.path().join("out.xlsx");
        state.export_table(TableFormat::Xlsx, &xlsx);
        assert!(matches!(state.status_message, Some(Status::Info(_))));
        assert!(xlsx.exists());

        assert_eq!(state.generate_report(), None);
        assert!(matches!(state.status_message, Some(Status::Error(_))));
    }
}
