use super::model::Table;
use crate::error::ChartError;

/// Rows shown when the full preview is off.
pub const PREVIEW_ROWS: usize = 20;

/// Rows shown right after mean imputation.
pub const IMPUTED_PREVIEW_ROWS: usize = 5;

/// Either the first [`PREVIEW_ROWS`] rows or the whole table.
pub fn preview(table: &Table, full_view: bool) -> Table {
    if full_view {
        table.clone()
    } else {
        table.head(PREVIEW_ROWS)
    }
}

// ---------------------------------------------------------------------------
// Bar chart data
// ---------------------------------------------------------------------------

/// One column's bars: one value per row, `None` where the cell is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Row-indexed series ready to be drawn as grouped bars.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub row_count: usize,
    pub series: Vec<BarSeries>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Build one series per requested column, in request order.
///
/// Fails with [`ChartError::NoNumericColumns`] when the table has no numeric
/// column at all, and with [`ChartError::UnknownColumn`] when a requested
/// column is absent or not numeric.
pub fn chart_data(table: &Table, columns: &[String]) -> Result<ChartSeries, ChartError> {
    if table.numeric_column_names().is_empty() {
        return Err(ChartError::NoNumericColumns);
    }

    let series = columns
        .iter()
        .map(|name| {
            let col = table
                .column(name)
                .filter(|c| c.is_numeric())
                .ok_or_else(|| ChartError::UnknownColumn(name.clone()))?;
            Ok(BarSeries {
                name: name.clone(),
                values: col.values.iter().map(|v| v.as_f64()).collect(),
            })
        })
        .collect::<Result<Vec<_>, ChartError>>()?;

    Ok(ChartSeries {
        row_count: table.row_count(),
        series,
    })
}

/// The first two numeric columns, used when the user has not picked any.
pub fn default_chart_columns(table: &Table) -> Vec<String> {
    table.numeric_column_names().into_iter().take(2).collect()
}
