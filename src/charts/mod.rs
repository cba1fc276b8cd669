//! Charts module - Chart data and static rendering

mod plotter;
mod renderer;

pub use plotter::{BarChartData, ChartData, ChartPlotter, LineChartData};
pub use renderer::StaticChartRenderer;
