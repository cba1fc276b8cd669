//! Static Chart Renderer
//! Draws chart data to PNG or SVG files with plotters.
//!
//! Layout matches the notebook figures: 10x6 in line charts and an
//! 8x5 in bar chart at 100 dpi, title on top, legend in the upper left.

use crate::charts::{BarChartData, ChartData, ChartPlotter, LineChartData};
use crate::config::ImageFormat;
use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const LINE_SIZE: (u32, u32) = (1000, 600);
const BAR_SIZE: (u32, u32) = (800, 500);
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to draw chart: {0}")]
    Plot(String),
}

fn plot_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Plot(err.to_string())
}

pub struct StaticChartRenderer {
    out_dir: PathBuf,
    format: ImageFormat,
}

impl StaticChartRenderer {
    /// Prepare a renderer writing into `out_dir`, creating it if needed.
    pub fn new(out_dir: &Path, format: ImageFormat) -> Result<Self, RenderError> {
        fs::create_dir_all(out_dir).map_err(|source| RenderError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            format,
        })
    }

    /// File a chart is written to.
    pub fn output_path(&self, chart: &ChartData) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", chart.file_stem(), self.format.extension()))
    }

    /// Render one chart and return the written file.
    pub fn render(&self, chart: &ChartData) -> Result<PathBuf, RenderError> {
        let path = self.output_path(chart);
        let size = match chart {
            ChartData::Line(_) => LINE_SIZE,
            ChartData::Bar(_) => BAR_SIZE,
        };

        match self.format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(&path, size).into_drawing_area();
                Self::draw(&root, chart)?;
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                Self::draw(&root, chart)?;
            }
        }

        info!(chart = chart.title(), path = %path.display(), "Chart written");
        Ok(path)
    }

    /// Show a written chart in the system viewer. Failures are logged only.
    pub fn show(path: &Path) {
        if let Err(e) = open::that(path) {
            warn!(path = %path.display(), error = %e, "Could not open chart");
        }
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(plot_err)?;
        match chart {
            ChartData::Line(data) => Self::draw_line_chart(root, data)?,
            ChartData::Bar(data) => Self::draw_bar_chart(root, data)?,
        }
        root.present().map_err(plot_err)
    }

    fn draw_line_chart<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &LineChartData,
    ) -> Result<(), RenderError> {
        let (start, end) = data.x_range().unwrap_or_else(|| {
            let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
            (epoch, epoch.succ_opt().unwrap_or(epoch))
        });
        let (y_min, y_max) = data.y_range();

        let mut chart = ChartBuilder::on(root)
            .caption(data.title.as_str(), (FONT, 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(day_number(start)..day_number(end), y_min..y_max)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .x_labels(8)
            .x_label_formatter(&|x: &f64| month_label(*x))
            .y_label_formatter(&|y: &f64| ChartPlotter::format_axis_value(*y))
            .draw()
            .map_err(plot_err)?;

        for series in &data.series {
            let color = ChartPlotter::get_series_color(series.color_index);
            let style = color.stroke_width(2);
            let mut segments = series.segments.iter();

            // The legend entry rides on the first segment, which may be empty.
            let first = segments.next().map(Vec::as_slice).unwrap_or_default();
            chart
                .draw_series(LineSeries::new(
                    first.iter().map(|&(d, v)| (day_number(d), v)),
                    style,
                ))
                .map_err(plot_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

            for segment in segments {
                chart
                    .draw_series(LineSeries::new(
                        segment.iter().map(|&(d, v)| (day_number(d), v)),
                        style,
                    ))
                    .map_err(plot_err)?;
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 14))
            .draw()
            .map_err(plot_err)
    }

    fn draw_bar_chart<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        data: &BarChartData,
    ) -> Result<(), RenderError> {
        let n = data.bars.len().max(1) as u32;
        let names: Vec<String> = data.bars.iter().map(|(name, _)| name.clone()).collect();

        let mut chart = ChartBuilder::on(root)
            .caption(data.title.as_str(), (FONT, 22))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..data.y_max())
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(data.x_label.as_str())
            .y_desc(data.y_label.as_str())
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => names.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y: &f64| format!("{:.0}", y))
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(
                data.bars
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, value))| value.is_finite())
                    .map(|(i, (_, value))| {
                        let color = ChartPlotter::get_series_color(i);
                        let mut bar = Rectangle::new(
                            [
                                (SegmentValue::Exact(i as u32), 0.0),
                                (SegmentValue::Exact(i as u32 + 1), *value),
                            ],
                            color.filled(),
                        );
                        bar.set_margin(0, 0, 20, 20);
                        bar
                    }),
            )
            .map_err(plot_err)?;

        Ok(())
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn month_label(day: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}
