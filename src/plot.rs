use plotly::{
    common::Mode,
    layout::{Axis, Layout},
    Plot, Scatter,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::demand::comparison::Comparison;

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Projected and actual demand with their difference, one point per half hour.
pub fn plot_comparison(comparison: &Comparison, title: &str) -> Plot {
    let x: Vec<String> = comparison
        .rows
        .iter()
        .map(|r| r.period_beginning.strftime("%Y-%m-%d %H:%M").to_string())
        .collect();
    let projected = Scatter::new(
        x.clone(),
        comparison.rows.iter().map(|r| to_f64(r.projected)).collect(),
    )
    .mode(Mode::Lines)
    .name("Projected");
    let actual = Scatter::new(
        x.clone(),
        comparison.rows.iter().map(|r| to_f64(r.actual)).collect(),
    )
    .mode(Mode::Lines)
    .name("Actual");
    let delta = Scatter::new(x, comparison.rows.iter().map(|r| to_f64(r.delta)).collect())
        .mode(Mode::Lines)
        .name("Actual - Projected");

    let mut plot = Plot::new();
    plot.add_trace(projected);
    plot.add_trace(actual);
    plot.add_trace(delta);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Period beginning, NEM time"))
            .y_axis(Axis::new().title("MW")),
    );
    plot
}
