//! Per-file processing: size check → load → transform → preview → export.
//!
//! Everything here is a pure function of the uploaded files, the session
//! [`Settings`] and the per-file [`FileChoices`]. The UI calls
//! [`process_batch`] again after every interaction instead of keeping
//! intermediate tables around.

use std::collections::BTreeSet;

use crate::config::Settings;
use crate::data::export::{ExportArtifact, ExportFormat, export};
use crate::data::loader::{file_extension, load};
use crate::data::model::Table;
use crate::data::preview::{
    ChartSeries, IMPUTED_PREVIEW_ROWS, chart_data, default_chart_columns, preview,
};
use crate::data::transform::{fill_missing_numeric, select_columns};
use crate::error::{FileError, LoadError};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A file as received from the upload boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
    /// Declared size in bytes. Checked before any parsing.
    pub size: u64,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        let size = content.len() as u64;
        Self {
            name: name.into(),
            content,
            size,
        }
    }
}

/// Interactive choices made for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileChoices {
    pub fill_missing: bool,
    /// Columns to keep; `None` keeps all of them.
    pub selected_columns: Option<BTreeSet<String>>,
    pub show_chart: bool,
    /// Columns to chart; `None` charts the first two numeric columns.
    pub chart_columns: Option<Vec<String>>,
    pub format: ExportFormat,
    /// Export only happens when the user asked for the download.
    pub download_requested: bool,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Last stage a file reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    SizeChecked,
    Skipped,
    Loaded,
    Transformed,
    Previewed,
    Exported,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-facing message attached to one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Everything the UI shows for one file after a pipeline pass.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub name: String,
    pub stage: Stage,
    /// Set when the pipeline stopped early.
    pub error: Option<FileError>,
    pub notices: Vec<Notice>,
    /// Columns of the loaded table, offered for selection.
    pub columns: Vec<String>,
    /// Numeric columns left after selection, offered for charting.
    pub numeric_columns: Vec<String>,
    /// Columns actually charted.
    pub charted_columns: Vec<String>,
    pub preview: Option<Table>,
    pub imputed_preview: Option<Table>,
    pub chart: Option<ChartSeries>,
    pub artifact: Option<ExportArtifact>,
}

impl FileReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stage: Stage::Received,
            error: None,
            notices: Vec::new(),
            columns: Vec::new(),
            numeric_columns: Vec::new(),
            charted_columns: Vec::new(),
            preview: None,
            imputed_preview: None,
            chart: None,
            artifact: None,
        }
    }

    fn notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice::new(level, text));
    }

    fn advance(&mut self, stage: Stage) {
        log::debug!("{}: {:?} -> {:?}", self.name, self.stage, stage);
        self.stage = stage;
    }

    /// Stop this file's pipeline, keeping whatever was produced so far.
    fn fail(mut self, error: FileError) -> Self {
        log::warn!("{}: stopped after {:?}: {error}", self.name, self.stage);
        let text = match &error {
            FileError::Load(LoadError::Parse(msg)) => {
                format!("Error reading {}: {msg}", self.name)
            }
            other => other.to_string(),
        };
        self.notice(NoticeLevel::Error, text);
        self.error = Some(error);
        self
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn is_skipped(&self) -> bool {
        self.stage == Stage::Skipped
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Process files in upload order. `choices[i]` belongs to `files[i]`;
/// missing entries fall back to the defaults.
pub fn process_batch(
    files: &[UploadedFile],
    settings: &Settings,
    choices: &[FileChoices],
) -> Vec<FileReport> {
    let default_choices = FileChoices::default();
    files
        .iter()
        .enumerate()
        .map(|(i, file)| process_file(file, settings, choices.get(i).unwrap_or(&default_choices)))
        .collect()
}

/// Run one file through the pipeline. Failures end up in the report; they
/// never escape to the caller.
pub fn process_file(file: &UploadedFile, settings: &Settings, choices: &FileChoices) -> FileReport {
    let mut report = FileReport::new(&file.name);

    // ---- Size check (before any parsing) ----
    if settings.exceeds_limit(file.size) {
        let error = FileError::SizeLimitExceeded {
            name: file.name.clone(),
            size_mb: Settings::size_mb(file.size),
        };
        log::warn!("{error}");
        report.notice(NoticeLevel::Warning, error.to_string());
        report.error = Some(error);
        report.advance(Stage::Skipped);
        return report;
    }
    report.advance(Stage::SizeChecked);

    // ---- Load ----
    let table = match load(&file.content, &file_extension(&file.name)) {
        Ok(table) => table,
        Err(e) => return report.fail(e.into()),
    };
    log::info!(
        "Loaded {}: {} rows, columns {:?}",
        file.name,
        table.row_count(),
        table.column_names()
    );
    report.columns = table.column_names();
    report.preview = Some(preview(&table, settings.full_preview));
    report.advance(Stage::Loaded);

    // ---- Transform ----
    let table = if choices.fill_missing {
        let imputation = fill_missing_numeric(&table);
        if imputation.nothing_to_do() {
            report.notice(
                NoticeLevel::Warning,
                "No numeric columns found for mean imputation",
            );
        } else {
            log::debug!(
                "{}: filled {} cells across {:?}",
                file.name,
                imputation.filled_cells,
                imputation.numeric_columns
            );
            report.notice(NoticeLevel::Success, "Missing numeric values filled with mean!");
            if !imputation.undefined_mean.is_empty() {
                report.notice(
                    NoticeLevel::Info,
                    format!(
                        "Left empty (no values to average): {}",
                        imputation.undefined_mean.join(", ")
                    ),
                );
            }
        }
        report.imputed_preview = Some(imputation.table.head(IMPUTED_PREVIEW_ROWS));
        imputation.table
    } else {
        table
    };

    let table = match &choices.selected_columns {
        Some(names) => match select_columns(&table, names) {
            Ok(selected) => selected,
            Err(e) => return report.fail(e.into()),
        },
        None => table,
    };
    report.numeric_columns = table.numeric_column_names();
    report.advance(Stage::Transformed);

    // ---- Chart (optional display; problems are warnings) ----
    if choices.show_chart {
        let columns = choices
            .chart_columns
            .clone()
            .unwrap_or_else(|| default_chart_columns(&table));
        match chart_data(&table, &columns) {
            Ok(chart) if chart.is_empty() => {}
            Ok(chart) => {
                report.charted_columns = columns;
                report.chart = Some(chart);
            }
            Err(e) => report.notice(NoticeLevel::Warning, e.to_string()),
        }
    }
    report.advance(Stage::Previewed);

    // ---- Export (user-triggered) ----
    if choices.download_requested {
        match export(&table, choices.format, &file.name) {
            Ok(artifact) => {
                log::info!(
                    "Exported {} as {} ({} bytes)",
                    file.name,
                    artifact.file_name,
                    artifact.bytes.len()
                );
                report.notice(NoticeLevel::Success, "File ready for download!");
                report.artifact = Some(artifact);
                report.advance(Stage::Exported);
            }
            Err(e) => return report.fail(e.into()),
        }
    }

    report.notice(
        NoticeLevel::Success,
        format!("Processing completed for {}!", file.name),
    );
    report.advance(Stage::Done);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::error::{ChartError, TransformError};

    fn csv_file(name: &str, body: &str) -> UploadedFile {
        UploadedFile::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn fill_and_export_scenario() {
        let file = csv_file("data.csv", "age,name\n25,A\n,B\n35,C\n");
        let choices = FileChoices {
            fill_missing: true,
            format: ExportFormat::Excel,
            download_requested: true,
            ..FileChoices::default()
        };
        let report = process_file(&file, &Settings::default(), &choices);

        assert!(report.is_done());
        assert!(report.error.is_none());
        let imputed = report.imputed_preview.as_ref().unwrap();
        let ages: Vec<Option<f64>> = imputed
            .column("age")
            .unwrap()
            .values
            .iter()
            .map(CellValue::as_f64)
            .collect();
        assert_eq!(ages, vec![Some(25.0), Some(30.0), Some(35.0)]);
        assert_eq!(
            imputed.column("name").unwrap().values,
            vec![
                CellValue::Text("A".into()),
                CellValue::Text("B".into()),
                CellValue::Text("C".into())
            ]
        );

        let artifact = report.artifact.as_ref().unwrap();
        assert_eq!(artifact.file_name, "data.xlsx");
        assert_eq!(artifact.mime, ExportFormat::Excel.mime());
    }

    #[test]
    fn oversized_file_never_reaches_the_loader() {
        // Content is not valid CSV for the declared extension; a skip means
        // no parse error can show up.
        let mut file = csv_file("big.txt", "irrelevant");
        file.size = 11 * 1024 * 1024;
        let report = process_file(&file, &Settings::default(), &FileChoices::default());

        assert!(report.is_skipped());
        assert!(matches!(report.error, Some(FileError::SizeLimitExceeded { .. })));
        assert_eq!(report.notices[0].level, NoticeLevel::Warning);
        assert!(report.notices[0].text.contains("exceeds maximum size limit"));
        assert!(report.preview.is_none());
    }

    #[test]
    fn unsupported_file_does_not_stop_the_batch() {
        let files = vec![
            csv_file("notes.txt", "hello"),
            csv_file("data.csv", "a\n1\n"),
        ];
        let reports = process_batch(&files, &Settings::default(), &[]);

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].error,
            Some(FileError::Load(LoadError::UnsupportedFormat("txt".into())))
        );
        assert_eq!(reports[0].stage, Stage::SizeChecked);
        assert_eq!(reports[0].notices[0].text, "Unsupported file format: txt");
        assert!(reports[1].is_done());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let report = process_file(
            &csv_file("bad.csv", "a,b\n1,2,3\n"),
            &Settings::default(),
            &FileChoices::default(),
        );
        assert!(matches!(report.error, Some(FileError::Load(LoadError::Parse(_)))));
        assert!(report.notices[0].text.starts_with("Error reading bad.csv:"));
    }

    #[test]
    fn unknown_selection_keeps_the_preview() {
        let choices = FileChoices {
            selected_columns: Some(["zzz".to_string()].into_iter().collect()),
            ..FileChoices::default()
        };
        let report = process_file(&csv_file("data.csv", "a\n1\n"), &Settings::default(), &choices);

        assert_eq!(report.stage, Stage::Loaded);
        assert_eq!(
            report.error,
            Some(FileError::Transform(TransformError::UnknownColumn("zzz".into())))
        );
        assert!(report.preview.is_some());
    }

    #[test]
    fn chart_problems_are_warnings() {
        let choices = FileChoices {
            show_chart: true,
            ..FileChoices::default()
        };
        let report = process_file(&csv_file("t.csv", "name\nA\n"), &Settings::default(), &choices);

        assert!(report.is_done());
        assert!(report.chart.is_none());
        assert!(report
            .notices
            .iter()
            .any(|n| n.level == NoticeLevel::Warning
                && n.text == ChartError::NoNumericColumns.to_string()));
    }

    #[test]
    fn chart_defaults_to_first_two_numeric_columns() {
        let choices = FileChoices {
            show_chart: true,
            ..FileChoices::default()
        };
        let report = process_file(
            &csv_file("t.csv", "x,label,y,z\n1,a,2,3\n"),
            &Settings::default(),
            &choices,
        );
        assert_eq!(report.charted_columns, vec!["x", "y"]);
        assert_eq!(report.chart.unwrap().series.len(), 2);
    }

    #[test]
    fn no_export_without_a_download_request() {
        let report = process_file(
            &csv_file("data.csv", "a\n1\n"),
            &Settings::default(),
            &FileChoices::default(),
        );
        assert!(report.is_done());
        assert!(report.artifact.is_none());
    }

    #[test]
    fn full_preview_shows_every_row() {
        let body: String = std::iter::once("n\n".to_string())
            .chain((0..30).map(|i| format!("{i}\n")))
            .collect();
        let file = csv_file("long.csv", &body);
        let full = Settings {
            full_preview: true,
            ..Settings::default()
        };

        let bounded = process_file(&file, &Settings::default(), &FileChoices::default());
        let unbounded = process_file(&file, &full, &FileChoices::default());
        assert_eq!(bounded.preview.unwrap().row_count(), 20);
        assert_eq!(unbounded.preview.unwrap().row_count(), 30);
    }
}
