use eframe::egui::{self, Ui};

use crate::state::AppState;
use crate::ui::{charts, panels, summary};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, charts, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("Customer Behavior Dashboard");
                    summary::kpi_row(ui, &self.state);
                    ui.separator();

                    ui.heading("Spending Score by Age Group");
                    charts::spending_by_age_group(ui, &self.state);

                    ui.heading("Income vs Spending Score");
                    charts::income_vs_spending(ui, &self.state);

                    ui.heading("Spender Type Breakdown");
                    charts::spender_breakdown(ui, &self.state);
                    ui.separator();

                    ui.heading("Filtered Customer Table");
                    summary::customer_table(ui, &self.state);
                });
        });
    }
}
