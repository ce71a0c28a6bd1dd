use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::loader::DataSource;
use crate::state::{AppState, Category};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Maximum License Payment");
            let range = state.config.payment;
            let mut max_payment = state.criteria.max_payment;
            if ui
                .add(Slider::new(&mut max_payment, range.min..=range.max).step_by(1.0))
                .changed()
            {
                state.set_max_payment(max_payment);
            }
            ui.separator();

            for category in [Category::LicenseType, Category::City] {
                category_filter(ui, state, category);
            }
        });
}

/// Collapsible multi-select list for one category, most common first.
fn category_filter(ui: &mut Ui, state: &mut AppState, category: Category) {
    // Clone what we need so we can mutate state inside the loop.
    let options = state.options(category).entries().to_vec();
    let n_selected = state.selected(category).len();
    let header_text = format!("{}  ({n_selected}/{})", category.title(), options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(category.title())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(category);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(category);
                }
            });

            for option in &options {
                let mut checked = state.selected(category).contains(&option.value);
                let label = format!("{}  ({})", option.value, option.count);
                if ui.checkbox(&mut checked, label).changed() {
                    state.toggle(category, &option.value);
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
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Load configured source").clicked() {
                let source = state.config.data_source();
                // Failures are already shown in the status line.
                let _ = state.load_source(source);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} establishments loaded, {} match",
                table.len(),
                state.charts.visible
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open establishment data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        // Failures are already shown in the status line.
        let _ = state.load_source(DataSource::File(path));
    }
}
