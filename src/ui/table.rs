use std::hash::Hash;

use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column as GridColumn, TableBuilder};

use crate::data::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// Table preview grid
// ---------------------------------------------------------------------------

/// Render a read-only grid of `table`. `id` keeps several grids on one page apart.
pub fn table_grid(ui: &mut Ui, id: impl Hash, table: &Table) {
    if table.column_count() == 0 {
        ui.label("No columns selected.");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(320.0)
            .columns(GridColumn::auto().at_least(60.0), table.column_count())
            .header(20.0, |mut header| {
                for col in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(&col.name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.row_count(), |mut row| {
                    let i = row.index();
                    for col in table.columns() {
                        row.col(|ui: &mut Ui| {
                            let value = &col.values[i];
                            let mut text = RichText::new(value.to_string());
                            if matches!(value, CellValue::Missing) {
                                text = text.color(Color32::GRAY);
                            }
                            ui.label(text);
                        });
                    }
                });
            });
    });

    ui.label(format!(
        "{} rows × {} columns",
        table.row_count(),
        table.column_count()
    ));
}
