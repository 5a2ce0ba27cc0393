use std::path::PathBuf;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::export::ExportArtifact;
use crate::state::{AppState, read_upload};

// ---------------------------------------------------------------------------
// Left side panel – settings
// ---------------------------------------------------------------------------

/// Render the left settings panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Settings");
    ui.separator();

    let mut changed = false;

    ui.label("Maximum file size (MB)");
    changed |= ui
        .add(egui::DragValue::new(&mut state.settings.max_file_size_mb).range(1..=u32::MAX))
        .changed();

    ui.add_space(4.0);
    changed |= ui
        .checkbox(&mut state.settings.full_preview, "Show full data preview")
        .changed();

    if changed {
        log::debug!("Settings changed: {:?}", state.settings);
        state.recompute();
    }

    ui.separator();
    let done = state.reports.iter().filter(|r| r.is_done()).count();
    let skipped = state.reports.iter().filter(|r| r.is_skipped()).count();
    let failed = state
        .reports
        .iter()
        .filter(|r| r.error.is_some() && !r.is_skipped())
        .count();
    ui.label(format!("{} file(s) uploaded, {done} processed", state.files.len()));
    if skipped > 0 {
        ui.label(format!("{skipped} skipped (too large)"));
    }
    if failed > 0 {
        ui.label(RichText::new(format!("{failed} failed")).color(Color32::RED));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label("Upload your CSV and Excel files to clean the data and convert formats");

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let Some(paths) = rfd::FileDialog::new()
        .set_title("Upload your CSV or Excel files")
        .add_filter("Supported files", &["csv", "xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .pick_files()
    else {
        return;
    };

    let mut uploads = Vec::with_capacity(paths.len());
    state.status_message = None;
    for path in paths {
        match read_upload(&path) {
            Ok(file) => {
                log::info!("Uploaded {} ({} bytes)", file.name, file.size);
                uploads.push(file);
            }
            Err(e) => {
                log::error!("Failed to upload file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
    state.add_files(uploads);
}

/// Ask where to save the artifact and write it. `Ok(None)` when cancelled.
pub fn save_artifact(artifact: &ExportArtifact) -> Result<Option<PathBuf>> {
    let extension = artifact.file_name.rsplit('.').next().unwrap_or_default();
    let Some(path) = rfd::FileDialog::new()
        .set_title("Download converted file")
        .set_file_name(&artifact.file_name)
        .add_filter(artifact.mime, &[extension])
        .save_file()
    else {
        return Ok(None);
    };
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(Some(path))
}
