use std::fmt;

use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};

use super::loader::file_extension;
use super::model::{CellValue, Table, format_float};
use crate::error::ExportError;

pub const CSV_MIME: &str = "text/csv";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Target format offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Excel];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Csv => CSV_MIME,
            ExportFormat::Excel => XLSX_MIME,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Excel => write!(f, "Excel"),
        }
    }
}

/// Serialized table ready to hand to the download boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub file_name: String,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Serialize `table` (header row, no index column) and name the result after
/// `original_name`.
pub fn export(
    table: &Table,
    format: ExportFormat,
    original_name: &str,
) -> Result<ExportArtifact, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => write_csv(table)?,
        ExportFormat::Excel => write_xlsx(table)?,
    };
    Ok(ExportArtifact {
        bytes,
        mime: format.mime(),
        file_name: export_file_name(original_name, format),
    })
}

/// Replace the first occurrence of the original extension token (ASCII
/// case-insensitive) with the target extension. `csv_report.csv` therefore
/// becomes `xlsx_report.csv` when exported to Excel.
pub fn export_file_name(original_name: &str, format: ExportFormat) -> String {
    let ext = file_extension(original_name);
    if ext.is_empty() {
        return format!("{original_name}{}", format.extension());
    }
    match original_name.to_ascii_lowercase().find(&ext) {
        Some(start) => format!(
            "{}{}{}",
            &original_name[..start],
            format.extension(),
            &original_name[start + ext.len()..]
        ),
        None => original_name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// A table without columns writes an empty header line and one empty line
/// per row.
fn write_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    if table.column_count() == 0 {
        return Ok("\n".repeat(table.row_count() + 1).into_bytes());
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
    for row in 0..table.row_count() {
        writer.write_record(table.row(row).map(CellValue::to_field))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))
}

fn write_xlsx(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = col_num(col_idx)?;
        worksheet.write_string_with_format(0, col, &column.name, &header_format)?;
        for (row_idx, value) in column.values.iter().enumerate() {
            write_cell(worksheet, row_num(row_idx + 1)?, col, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
) -> Result<(), ExportError> {
    match value {
        CellValue::Missing => {}
        CellValue::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(v) if v.is_finite() => {
            worksheet.write_number(row, col, *v)?;
        }
        CellValue::Float(v) => {
            worksheet.write_string(row, col, format_float(*v))?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Text(s) | CellValue::Date(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn row_num(index: usize) -> Result<RowNum, ExportError> {
    RowNum::try_from(index)
        .map_err(|_| ExportError::Serialization(format!("row {index} exceeds the sheet limit")))
}

fn col_num(index: usize) -> Result<ColNum, ExportError> {
    ColNum::try_from(index)
        .map_err(|_| ExportError::Serialization(format!("column {index} exceeds the sheet limit")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load;
    use crate::data::model::Column;
    use crate::error::LoadError;

    fn sample() -> Table {
        Table::new(vec![
            Column::new(
                "age",
                vec![CellValue::Integer(25), CellValue::Float(30.0), CellValue::Integer(35)],
            ),
            Column::new(
                "name",
                vec![
                    CellValue::Text("A".into()),
                    CellValue::Text("B, Jr.".into()),
                    CellValue::Missing,
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn csv_has_header_and_no_index() {
        let artifact = export(&sample(), ExportFormat::Csv, "data.xlsx").unwrap();
        assert_eq!(artifact.mime, CSV_MIME);
        assert_eq!(artifact.file_name, "data.csv");
        assert_eq!(
            String::from_utf8(artifact.bytes).unwrap(),
            "age,name\n25,A\n30,\"B, Jr.\"\n35,\n"
        );
    }

    #[test]
    fn zero_rows_yield_only_the_header() {
        let empty = sample().head(0);
        let artifact = export(&empty, ExportFormat::Csv, "data.csv").unwrap();
        assert_eq!(String::from_utf8(artifact.bytes).unwrap(), "age,name\n");

        let xlsx = export(&empty, ExportFormat::Excel, "data.csv").unwrap();
        let reloaded = load(&xlsx.bytes, "xlsx").unwrap();
        assert_eq!(reloaded.column_names(), vec!["age", "name"]);
        assert_eq!(reloaded.row_count(), 0);
    }

    #[test]
    fn zero_columns_export_without_an_invented_column() {
        let bare = crate::data::transform::select_columns(&sample(), &Default::default()).unwrap();
        assert_eq!(bare.column_count(), 0);

        let csv = export(&bare, ExportFormat::Csv, "data.csv").unwrap();
        assert_eq!(String::from_utf8(csv.bytes.clone()).unwrap(), "\n\n\n\n");
        assert!(matches!(load(&csv.bytes, "csv"), Err(LoadError::Parse(_))));

        let xlsx = export(&bare, ExportFormat::Excel, "data.csv").unwrap();
        assert!(matches!(load(&xlsx.bytes, "xlsx"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn csv_round_trip_keeps_values() {
        let table = sample();
        let artifact = export(&table, ExportFormat::Csv, "data.csv").unwrap();
        let reloaded = load(&artifact.bytes, "csv").unwrap();

        assert_eq!(reloaded.column_names(), table.column_names());
        let ages: Vec<Option<f64>> = reloaded.column("age").unwrap().values.iter().map(|v| v.as_f64()).collect();
        assert_eq!(ages, vec![Some(25.0), Some(30.0), Some(35.0)]);
        assert_eq!(reloaded.column("name"), table.column("name"));
    }

    #[test]
    fn excel_export_is_a_readable_workbook() {
        let artifact = export(&sample(), ExportFormat::Excel, "data.csv").unwrap();
        assert_eq!(artifact.mime, XLSX_MIME);
        assert_eq!(artifact.file_name, "data.xlsx");
        assert_eq!(&artifact.bytes[..2], b"PK");

        let reloaded = load(&artifact.bytes, "xlsx").unwrap();
        assert_eq!(reloaded.row_count(), 3);
        assert_eq!(reloaded.column("age").unwrap().values[1], CellValue::Integer(30));
        assert_eq!(reloaded.column("name").unwrap().values[2], CellValue::Missing);
    }

    #[test]
    fn file_name_replaces_first_extension_token() {
        assert_eq!(export_file_name("data.csv", ExportFormat::Excel), "data.xlsx");
        assert_eq!(export_file_name("Sales.XLS", ExportFormat::Csv), "Sales.csv");
        assert_eq!(export_file_name("csv_report.csv", ExportFormat::Excel), "xlsx_report.csv");
    }
}
