use chrono::Local;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::FilterField;
use crate::export::file_stamp;
use crate::export::tabular::TableFormat;
use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Customer Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for field in FilterField::ALL {
                filter_group(ui, state, field);
            }
        });
}

/// One collapsible checkbox list for a governed attribute.
fn filter_group(ui: &mut Ui, state: &mut AppState, field: FilterField) {
    let values = state.dataset.domain(field).to_vec();

    // Show count of selected / total in the header
    let (n_selected, n_total) = state.filters.counts(field, &state.dataset);
    let header_text = format!("{}  ({n_selected}/{n_total})", field.title());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(field.title())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            // Select all / none buttons
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(field);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(field);
                }
            });

            for value in &values {
                let mut text = RichText::new(value.label());
                if field == FilterField::Gender {
                    text = text.color(state.palette.gender.color_for(value));
                }

                let mut checked = state.filters.is_selected(field, value);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(field, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Export", |ui: &mut Ui| {
            if ui.button("Download CSV…").clicked() {
                save_file_dialog(state, TableFormat::Csv);
                ui.close_menu();
            }
            if ui.button("Download Excel…").clicked() {
                save_file_dialog(state, TableFormat::Xlsx);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Generate PDF Report").clicked() {
                state.generate_report();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} customers loaded, {} visible",
            state.dataset.len(),
            state.visible_indices.len()
        ));

        ui.separator();

        match &state.status_message {
            Some(Status::Info(msg)) => {
                ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn save_file_dialog(state: &mut AppState, format: TableFormat) {
    let (title, filter_name) = match format {
        TableFormat::Csv => ("Save filtered customers as CSV", "CSV"),
        TableFormat::Xlsx => ("Save filtered customers as Excel", "Excel"),
    };
    let kind = format.export_format();
    let file = rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(kind.default_file_name(&file_stamp(&Local::now())))
        .add_filter(filter_name, &[kind.extension()])
        .save_file();

    if let Some(path) = file {
        state.export_table(format, &path);
    }
}
