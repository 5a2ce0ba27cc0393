use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::data::export::ExportArtifact;
use crate::pipeline::{FileChoices, FileReport, UploadedFile, process_batch, process_file};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Only inputs are kept (files, settings, choices). Reports are recomputed
/// from them by [`AppState::recompute`] after every interaction.
pub struct AppState {
    pub settings: Settings,

    /// Uploaded files, in upload order.
    pub files: Vec<UploadedFile>,

    /// Per-file interactive choices, parallel to `files`.
    pub choices: Vec<FileChoices>,

    /// Result of the last pipeline pass, parallel to `files`.
    pub reports: Vec<FileReport>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            files: Vec::new(),
            choices: Vec::new(),
            reports: Vec::new(),
            status_message: None,
        }
    }

    /// Re-run the pipeline for every file from the current inputs.
    pub fn recompute(&mut self) {
        self.reports = process_batch(&self.files, &self.settings, &self.choices);
    }

    /// Append newly uploaded files with default choices.
    pub fn add_files(&mut self, files: Vec<UploadedFile>) {
        for file in files {
            self.files.push(file);
            self.choices.push(FileChoices::default());
        }
        self.recompute();
    }

    pub fn remove_file(&mut self, index: usize) {
        if index < self.files.len() {
            let file = self.files.remove(index);
            self.choices.remove(index);
            log::info!("Removed {}", file.name);
            self.recompute();
        }
    }

    /// Change one file's choices and re-run the pipeline.
    pub fn update_choices(&mut self, index: usize, update: impl FnOnce(&mut FileChoices)) {
        if let Some(choices) = self.choices.get_mut(index) {
            update(choices);
            self.recompute();
        }
    }

    /// Toggle one column in the file's selection. An untouched selection
    /// means "all columns".
    pub fn toggle_column(&mut self, index: usize, column: &str) {
        let Some(report) = self.reports.get(index) else {
            return;
        };
        let all: BTreeSet<String> = report.columns.iter().cloned().collect();
        let choices = &mut self.choices[index];
        let selected = choices.selected_columns.get_or_insert(all);
        if !selected.remove(column) {
            selected.insert(column.to_string());
        } else if let Some(chart) = &mut choices.chart_columns {
            chart.retain(|c| c != column);
        }
        self.recompute();
    }

    /// Select all columns of a file.
    pub fn select_all_columns(&mut self, index: usize) {
        if let Some(choices) = self.choices.get_mut(index) {
            choices.selected_columns = None;
            self.recompute();
        }
    }

    /// Deselect all columns of a file.
    pub fn select_no_columns(&mut self, index: usize) {
        if let Some(choices) = self.choices.get_mut(index) {
            choices.selected_columns = Some(BTreeSet::new());
            choices.chart_columns = Some(Vec::new());
            self.recompute();
        }
    }

    /// Toggle one column in the chart. An untouched chart selection starts
    /// from the columns currently charted.
    pub fn toggle_chart_column(&mut self, index: usize, column: &str) {
        let Some(report) = self.reports.get(index) else {
            return;
        };
        let current = report.charted_columns.clone();
        let chart = self.choices[index].chart_columns.get_or_insert(current);
        if let Some(pos) = chart.iter().position(|c| c == column) {
            chart.remove(pos);
        } else {
            chart.push(column.to_string());
        }
        self.recompute();
    }

    /// Run the pipeline for one file with the download requested. The new
    /// report replaces the old one so export errors are shown.
    pub fn prepare_download(&mut self, index: usize) -> Option<ExportArtifact> {
        let file = self.files.get(index)?;
        let choices = FileChoices {
            download_requested: true,
            ..self.choices[index].clone()
        };
        let mut report = process_file(file, &self.settings, &choices);
        let artifact = report.artifact.take();
        self.reports[index] = report;
        artifact
    }
}

/// Read a file picked in the open dialog into an [`UploadedFile`].
pub fn read_upload(path: &Path) -> Result<UploadedFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("file name is not valid UTF-8")?
        .to_string();
    let content = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(UploadedFile::new(name, content))
}
