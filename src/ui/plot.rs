use std::hash::Hash;

use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::generate_palette;
use crate::data::preview::ChartSeries;

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// Total width taken by one row's group of bars.
const GROUP_WIDTH: f64 = 0.8;

/// Render one bar per row per series, grouped side by side around the row index.
pub fn bar_chart(ui: &mut Ui, id: impl Hash, chart: &ChartSeries) {
    let n = chart.series.len().max(1) as f64;
    let width = GROUP_WIDTH / n;
    let colors = generate_palette(chart.series.len());

    Plot::new(id)
        .legend(Legend::default())
        .height(260.0)
        .x_axis_label("Row")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .include_x(-0.5)
        .include_x(chart.row_count as f64 - 0.5)
        .show(ui, |plot_ui| {
            for (k, (series, color)) in chart.series.iter().zip(colors).enumerate() {
                let offset = (k as f64 - (n - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(row, value)| {
                        value.map(|v| Bar::new(row as f64 + offset, v).width(width))
                    })
                    .collect();

                plot_ui.bar_chart(BarChart::new(bars).name(&series.name).color(color));
            }
        });
}
