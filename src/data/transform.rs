use std::collections::BTreeSet;

use super::model::{CellValue, Column, Table};
use crate::error::TransformError;

// ---------------------------------------------------------------------------
// Mean imputation
// ---------------------------------------------------------------------------

/// Result of [`fill_missing_numeric`]: the new table plus what was done.
#[derive(Debug, Clone)]
pub struct Imputation {
    pub table: Table,
    /// Numeric columns considered, in table order.
    pub numeric_columns: Vec<String>,
    /// Number of cells that received a mean.
    pub filled_cells: usize,
    /// Numeric columns with no values at all; their gaps are left as is.
    pub undefined_mean: Vec<String>,
}

impl Imputation {
    /// No numeric column existed, so the table came back unchanged.
    pub fn nothing_to_do(&self) -> bool {
        self.numeric_columns.is_empty()
    }
}

/// Replace missing entries of every numeric column with that column's mean
/// over its non-missing values. Other columns are copied untouched.
pub fn fill_missing_numeric(table: &Table) -> Imputation {
    let mut numeric_columns = Vec::new();
    let mut undefined_mean = Vec::new();
    let mut filled_cells = 0;

    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if !col.is_numeric() {
                return col.clone();
            }
            numeric_columns.push(col.name.clone());
            let Some(mean) = col.mean() else {
                if col.missing_count() > 0 {
                    undefined_mean.push(col.name.clone());
                }
                return col.clone();
            };
            let values = col
                .values
                .iter()
                .map(|v| match v {
                    CellValue::Missing => {
                        filled_cells += 1;
                        CellValue::Float(mean)
                    }
                    other => other.clone(),
                })
                .collect();
            Column::new(col.name.clone(), values)
        })
        .collect();

    Imputation {
        table: table.derive(columns),
        numeric_columns,
        filled_cells,
        undefined_mean,
    }
}

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Keep only `names`, in the table's own column order. The row count is
/// preserved even when nothing is selected.
pub fn select_columns(table: &Table, names: &BTreeSet<String>) -> Result<Table, TransformError> {
    if let Some(missing) = names.iter().find(|n| table.column(n).is_none()) {
        return Err(TransformError::UnknownColumn(missing.clone()));
    }
    let columns = table
        .columns()
        .iter()
        .filter(|c| names.contains(&c.name))
        .cloned()
        .collect();
    Ok(table.derive(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new(
                "age",
                vec![CellValue::Integer(25), CellValue::Missing, CellValue::Integer(35)],
            ),
            Column::new(
                "name",
                vec![
                    CellValue::Text("A".into()),
                    CellValue::Missing,
                    CellValue::Text("C".into()),
                ],
            ),
            Column::new(
                "score",
                vec![CellValue::Float(1.0), CellValue::Float(2.0), CellValue::Missing],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn fills_each_numeric_column_with_its_own_mean() {
        let table = sample();
        let imputed = fill_missing_numeric(&table);

        assert!(!imputed.nothing_to_do());
        assert_eq!(imputed.numeric_columns, vec!["age", "score"]);
        assert_eq!(imputed.filled_cells, 2);
        assert_eq!(
            imputed.table.column("age").unwrap().values,
            vec![CellValue::Integer(25), CellValue::Float(30.0), CellValue::Integer(35)]
        );
        assert_eq!(
            imputed.table.column("score").unwrap().values[2],
            CellValue::Float(1.5)
        );
        // Text columns keep their gaps.
        assert_eq!(imputed.table.column("name"), table.column("name"));
    }

    #[test]
    fn no_numeric_columns_is_nothing_to_do() {
        let table = Table::new(vec![Column::new(
            "name",
            vec![CellValue::Text("A".into()), CellValue::Missing],
        )])
        .unwrap();
        let imputed = fill_missing_numeric(&table);
        assert!(imputed.nothing_to_do());
        assert_eq!(imputed.table, table);
    }

    #[test]
    fn all_missing_column_is_left_unchanged() {
        let table = Table::new(vec![Column::new(
            "blank",
            vec![CellValue::Missing, CellValue::Missing],
        )])
        .unwrap();
        let imputed = fill_missing_numeric(&table);
        assert_eq!(imputed.undefined_mean, vec!["blank"]);
        assert_eq!(imputed.filled_cells, 0);
        assert_eq!(imputed.table, table);
    }

    #[test]
    fn selection_keeps_table_order_and_rows() {
        let table = sample();
        let names: BTreeSet<String> = ["score", "age"].iter().map(|s| s.to_string()).collect();
        let selected = select_columns(&table, &names).unwrap();
        assert_eq!(selected.column_names(), vec!["age", "score"]);
        assert_eq!(selected.row_count(), table.row_count());
    }

    #[test]
    fn empty_selection_keeps_row_count() {
        let table = sample();
        let selected = select_columns(&table, &BTreeSet::new()).unwrap();
        assert_eq!(selected.column_count(), 0);
        assert_eq!(selected.row_count(), 3);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let names: BTreeSet<String> = ["height".to_string()].into_iter().collect();
        assert_eq!(
            select_columns(&sample(), &names),
            Err(TransformError::UnknownColumn("height".into()))
        );
    }
}
