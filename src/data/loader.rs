use std::collections::BTreeSet;
use std::io::Cursor;

use calamine::{Data, ExcelDateTime, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;

use super::model::{CellValue, Column, Table};
use crate::error::LoadError;

/// Tokens read as a missing entry, in addition to the empty cell.
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "#NA",
    "<NA>",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse an uploaded file into a [`Table`].  Dispatch by declared extension.
///
/// Supported formats:
/// * `.csv`          – comma separated, first row is the header
/// * `.xlsx` / `.xls` – first sheet, first row is the header
pub fn load(content: &[u8], extension: &str) -> Result<Table, LoadError> {
    match extension.to_ascii_lowercase().as_str() {
        "csv" => load_csv(content),
        "xlsx" | "xls" => load_excel(content),
        _ => Err(LoadError::UnsupportedFormat(extension.to_string())),
    }
}

/// The lower-cased text after the last `.` of a file name.
pub fn file_extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or("").to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Short rows are padded with missing cells; long rows are an error.
fn load_csv(content: &[u8]) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = normalise_headers(reader.headers()?.iter().map(str::to_string));
    if headers.is_empty() {
        return Err(LoadError::Parse("No columns to parse from file".to_string()));
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(LoadError::Parse(format!(
                "Error tokenizing data. Expected {} fields in line {line}, saw {}",
                headers.len(),
                record.len()
            )));
        }
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            let cell = record
                .get(col_idx)
                .filter(|s| !is_na_token(s))
                .map(str::to_string);
            cells.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, infer_column(cells)))
        .collect();
    Ok(Table::new(columns)?)
}

fn is_na_token(s: &str) -> bool {
    s.is_empty() || NA_TOKENS.contains(&s)
}

/// Column-level typing: all-numeric, then all-boolean, otherwise text.
fn infer_column(cells: Vec<Option<String>>) -> Vec<CellValue> {
    if cells.iter().flatten().all(|s| parse_number(s).is_some()) {
        return cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_number).unwrap_or(CellValue::Missing))
            .collect();
    }
    if cells.iter().flatten().all(|s| parse_bool(s).is_some()) {
        return cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(parse_bool)
                    .map_or(CellValue::Missing, CellValue::Bool)
            })
            .collect();
    }
    cells
        .into_iter()
        .map(|c| c.map_or(CellValue::Missing, CellValue::Text))
        .collect()
}

fn parse_number(s: &str) -> Option<CellValue> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(CellValue::Integer(i));
    }
    s.parse::<f64>().ok().map(CellValue::Float)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Reads the first worksheet. The workbook flavour (xlsx, xls, ...) is
/// detected from the content, not the extension.
fn load_excel(content: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Parse("Workbook contains no worksheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(LoadError::Parse("No columns to parse from file".to_string()));
    };
    let headers = normalise_headers(header_row.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => excel_date_text(dt),
        other => other.to_string(),
    }));

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, column) in values.iter_mut().enumerate() {
            column.push(row.get(col_idx).map_or(CellValue::Missing, excel_cell));
        }
    }

    let row_count = range.height().saturating_sub(1);
    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, vals)| Column::new(name, vals))
        .collect();
    Ok(Table::with_row_count(columns, row_count)?)
}

/// Excel stores every number as a float; integral ones come back as integers.
fn excel_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            CellValue::Integer(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if is_na_token(s) => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => CellValue::Date(excel_date_text(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Missing,
    }
}

/// ISO text for a serial date: `%Y-%m-%d` at midnight, with the time
/// otherwise. Durations render as `[-]H:MM:SS` with unbounded hours.
fn excel_date_text(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            let sign = if secs < 0 { "-" } else { "" };
            let secs = secs.unsigned_abs();
            return format!("{sign}{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
        }
    } else if let Some(stamp) = dt.as_datetime() {
        let pattern = if stamp.time() == NaiveTime::MIN {
            "%Y-%m-%d"
        } else {
            "%Y-%m-%d %H:%M:%S"
        };
        return stamp.format(pattern).to_string();
    }
    dt.to_string()
}

// ---------------------------------------------------------------------------
// Header hygiene
// ---------------------------------------------------------------------------

/// Blank names become `Unnamed: {index}`; repeats get `.1`, `.2`, ... suffixes.
fn normalise_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    raw.enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut n = 1;
            while used.contains(&candidate) {
                candidate = format!("{base}.{n}");
                n += 1;
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_columns_are_typed() {
        let table = load(b"age,name,score,ok\n25,A,1.5,true\n,B,2,False\n35,C,NA,\n", "csv").unwrap();
        assert_eq!(table.column_names(), vec!["age", "name", "score", "ok"]);
        assert_eq!(table.row_count(), 3);

        let age = &table.column("age").unwrap().values;
        assert_eq!(
            age,
            &vec![CellValue::Integer(25), CellValue::Missing, CellValue::Integer(35)]
        );
        let score = &table.column("score").unwrap().values;
        assert_eq!(score[0], CellValue::Float(1.5));
        assert_eq!(score[2], CellValue::Missing);
        assert_eq!(table.column("ok").unwrap().values[1], CellValue::Bool(false));
        assert_eq!(
            table.column("name").unwrap().values[0],
            CellValue::Text("A".into())
        );
        assert_eq!(table.numeric_column_names(), vec!["age", "score"]);
    }

    #[test]
    fn extension_is_case_insensitive() {
        let table = load(b"a\n1\n", "CSV").unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        assert_eq!(
            load(b"hello", "txt"),
            Err(LoadError::UnsupportedFormat("txt".into()))
        );
    }

    #[test]
    fn empty_csv_is_a_parse_error() {
        assert!(matches!(load(b"", "csv"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn long_rows_fail_and_short_rows_pad() {
        assert!(matches!(
            load(b"a,b\n1,2,3\n", "csv"),
            Err(LoadError::Parse(_))
        ));

        let table = load(b"a,b\n1\n", "csv").unwrap();
        assert_eq!(table.column("b").unwrap().values, vec![CellValue::Missing]);
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        assert!(matches!(
            load(b"a,b\n\xff\xfe,1\n", "csv"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn headers_are_made_unique() {
        let table = load(b"x,,x,x\n1,2,3,4\n", "csv").unwrap();
        assert_eq!(table.column_names(), vec!["x", "Unnamed: 1", "x.1", "x.2"]);
    }

    #[test]
    fn garbage_workbook_is_a_parse_error() {
        assert!(matches!(
            load(b"definitely not a workbook", "xlsx"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn workbook_dates_are_text_and_na_cells_are_missing() {
        use rust_xlsxwriter::{ExcelDateTime as XlsxDateTime, Format, Workbook};

        let day = Format::new().set_num_format("yyyy-mm-dd");
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "when").unwrap();
        sheet.write_string(0, 1, "status").unwrap();
        sheet
            .write_datetime_with_format(0, 2, &XlsxDateTime::from_ymd(2024, 1, 1).unwrap(), &day)
            .unwrap();

        let date = XlsxDateTime::from_ymd(2024, 3, 15).unwrap();
        let afternoon = XlsxDateTime::from_ymd(2024, 3, 15).unwrap().and_hms(13, 30, 0).unwrap();
        sheet.write_datetime_with_format(1, 0, &date, &day).unwrap();
        sheet.write_datetime_with_format(2, 0, &afternoon, &stamp).unwrap();
        sheet.write_string(1, 1, "NA").unwrap();
        sheet.write_string(2, 1, "ok").unwrap();
        sheet.write_number(1, 2, 1.0).unwrap();
        sheet.write_number(2, 2, 2.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = load(&bytes, "xlsx").unwrap();
        assert_eq!(table.column_names(), vec!["when", "status", "2024-01-01"]);
        assert_eq!(
            table.column("when").unwrap().values,
            vec![
                CellValue::Date("2024-03-15".into()),
                CellValue::Date("2024-03-15 13:30:00".into()),
            ]
        );
        assert_eq!(
            table.column("status").unwrap().values,
            vec![CellValue::Missing, CellValue::Text("ok".into())]
        );
        assert_eq!(
            excel_cell(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Missing
        );
    }

    #[test]
    fn file_extension_takes_last_segment() {
        assert_eq!(file_extension("report.final.XLSX"), "xlsx");
        assert_eq!(file_extension("data.csv"), "csv");
    }
}
