use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::export::tabular::{export_headers, export_row};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    let text = state.summary.formatted();
    let cards = [
        ("Total Customers", text.total_customers),
        ("Avg Income", text.avg_income),
        ("Avg Spending Score", text.avg_score),
        ("Avg Family Size", text.avg_family),
    ];

    ui.columns(cards.len(), |columns| {
        for (ui, (title, value)) in columns.iter_mut().zip(cards) {
            ui.group(|ui| {
                ui.vertical_centered(|ui| {
                    ui.label(title);
                    ui.label(RichText::new(value).heading().strong());
                });
            });
        }
    });

    if state.summary.is_empty() {
        ui.label(RichText::new("No customers match the current filters.").italics().weak());
    }
}

// ---------------------------------------------------------------------------
// Filtered customer table
// ---------------------------------------------------------------------------

pub fn customer_table(ui: &mut Ui, state: &AppState) {
    let view = state.view();
    let headers = export_headers(&view);
    let customers: Vec<_> = view.iter().collect();

    egui::ScrollArea::horizontal()
        .id_salt("customer_table")
        .show(ui, |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .max_scroll_height(360.0)
                .columns(Column::auto().at_least(60.0).resizable(true), headers.len())
                .header(20.0, |mut header| {
                    for name in &headers {
                        header.col(|ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, customers.len(), |mut row| {
                        let customer = customers[row.index()];
                        for cell in export_row(&view, customer) {
                            row.col(|ui| {
                                ui.label(cell.to_string());
                            });
                        }
                    });
                });
        });
}
