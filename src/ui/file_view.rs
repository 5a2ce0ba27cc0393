use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::color::notice_color;
use crate::data::export::ExportFormat;
use crate::pipeline::{FileChoices, FileReport};
use crate::state::AppState;
use crate::ui::panels::save_artifact;
use crate::ui::{plot, table};

/// What the user did inside one file's section during this frame.
///
/// Collected while drawing and applied afterwards, so drawing only ever
/// borrows the state immutably.
enum FileAction {
    ToggleFill,
    ToggleColumn(String),
    AllColumns,
    NoColumns,
    ToggleChart,
    ToggleChartColumn(String),
    SetFormat(ExportFormat),
    Download,
    Remove,
}

// ---------------------------------------------------------------------------
// Central panel – one section per file
// ---------------------------------------------------------------------------

pub fn files_view(ui: &mut Ui, state: &mut AppState) {
    if state.files.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Upload your CSV or Excel files  (File → Open…)");
        });
        return;
    }

    let mut actions: Vec<(usize, FileAction)> = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (index, report) in state.reports.iter().enumerate() {
                let choices = &state.choices[index];
                egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
                    file_section(ui, index, report, choices, &mut actions);
                });
                ui.add_space(8.0);
            }
        });

    for (index, action) in actions {
        apply(state, index, action);
    }
}

fn file_section(
    ui: &mut Ui,
    index: usize,
    report: &FileReport,
    choices: &FileChoices,
    actions: &mut Vec<(usize, FileAction)>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.heading(format!("Processing: {}", report.name));
        if ui.small_button("Remove").clicked() {
            actions.push((index, FileAction::Remove));
        }
    });

    for notice in &report.notices {
        ui.label(RichText::new(&notice.text).color(notice_color(notice.level)));
    }

    let Some(preview) = &report.preview else {
        return;
    };

    egui::CollapsingHeader::new(RichText::new(format!("{} - Data Processing", report.name)).strong())
        .id_salt(("processing", index))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Data Preview");
            table::table_grid(ui, ("preview", index), preview);
            ui.separator();

            // ---- Missing values ----
            let mut fill = choices.fill_missing;
            if ui.checkbox(&mut fill, "Fill Missing Values").changed() {
                actions.push((index, FileAction::ToggleFill));
            }
            if let Some(imputed) = &report.imputed_preview {
                table::table_grid(ui, ("imputed", index), imputed);
            }
            ui.separator();

            // ---- Column selection ----
            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Select Columns");
                if ui.small_button("All").clicked() {
                    actions.push((index, FileAction::AllColumns));
                }
                if ui.small_button("None").clicked() {
                    actions.push((index, FileAction::NoColumns));
                }
            });
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for col in &report.columns {
                    let mut checked = choices
                        .selected_columns
                        .as_ref()
                        .map_or(true, |selected| selected.contains(col));
                    if ui.checkbox(&mut checked, col).changed() {
                        actions.push((index, FileAction::ToggleColumn(col.clone())));
                    }
                }
            });
            ui.separator();

            // ---- Visualization ----
            let mut show_chart = choices.show_chart;
            if ui.checkbox(&mut show_chart, "Show Chart").changed() {
                actions.push((index, FileAction::ToggleChart));
            }
            if choices.show_chart && !report.numeric_columns.is_empty() {
                ui.label("Select columns to visualize");
                ui.horizontal_wrapped(|ui: &mut Ui| {
                    for col in &report.numeric_columns {
                        let mut checked = report.charted_columns.contains(col);
                        if ui.checkbox(&mut checked, col).changed() {
                            actions.push((index, FileAction::ToggleChartColumn(col.clone())));
                        }
                    }
                });
                if let Some(chart) = &report.chart {
                    plot::bar_chart(ui, ("chart", index), chart);
                }
            }
        });

    if report.error.is_some() {
        return;
    }

    // ---- Conversion and download ----
    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("Convert {} to:", report.name));
        for format in ExportFormat::ALL {
            if ui
                .radio(choices.format == format, format.to_string())
                .clicked()
            {
                actions.push((index, FileAction::SetFormat(format)));
            }
        }
        if ui
            .button(format!("Download {} as {}", report.name, choices.format))
            .clicked()
        {
            actions.push((index, FileAction::Download));
        }
    });
}

fn apply(state: &mut AppState, index: usize, action: FileAction) {
    match action {
        FileAction::ToggleColumn(col) => state.toggle_column(index, &col),
        FileAction::AllColumns => state.select_all_columns(index),
        FileAction::NoColumns => state.select_no_columns(index),
        FileAction::ToggleChartColumn(col) => state.toggle_chart_column(index, &col),
        FileAction::Remove => state.remove_file(index),
        FileAction::Download => download(state, index),
        FileAction::ToggleFill => state.update_choices(index, |c| c.fill_missing = !c.fill_missing),
        FileAction::ToggleChart => state.update_choices(index, |c| c.show_chart = !c.show_chart),
        FileAction::SetFormat(format) => state.update_choices(index, |c| c.format = format),
    }
}

fn download(state: &mut AppState, index: usize) {
    let Some(artifact) = state.prepare_download(index) else {
        return;
    };
    match save_artifact(&artifact) {
        Ok(Some(path)) => {
            log::info!("Saved {} to {}", artifact.file_name, path.display());
            state.status_message = None;
        }
        Ok(None) => log::debug!("Download of {} cancelled", artifact.file_name),
        Err(e) => {
            log::error!("Failed to save file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
