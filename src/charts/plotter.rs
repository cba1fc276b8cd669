//! Chart Plotter Module
//! Turns the analysed table into renderer-independent chart data.

use crate::data::Record;
use crate::stats::{SnapshotRow, StatsCalculator};
use chrono::{Duration, NaiveDate};
use plotters::style::RGBColor;

/// Series colors, matplotlib's default cycle
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Grey
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

/// Per-row value plotted against date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalCases,
    TotalDeaths,
    DeathRate,
    TotalVaccinations,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::TotalCases,
        Metric::TotalDeaths,
        Metric::DeathRate,
        Metric::TotalVaccinations,
    ];

    pub fn value(self, record: &Record) -> f64 {
        let raw = match self {
            Metric::TotalCases => record.total_cases,
            Metric::TotalDeaths => record.total_deaths,
            Metric::DeathRate => return record.death_rate(),
            Metric::TotalVaccinations => record.total_vaccinations,
        };
        raw.unwrap_or(f64::NAN)
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Metric::TotalCases => "total_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::DeathRate => "death_rate",
            Metric::TotalVaccinations => "total_vaccinations",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::TotalCases => "Total COVID-19 Cases Over Time",
            Metric::TotalDeaths => "Total COVID-19 Deaths Over Time",
            Metric::DeathRate => "COVID-19 Death Rate Over Time",
            Metric::TotalVaccinations => "COVID-19 Vaccinations Over Time",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            Metric::TotalCases => "Total Cases",
            Metric::TotalDeaths => "Total Deaths",
            Metric::DeathRate => "Death Rate",
            Metric::TotalVaccinations => "Total Vaccinations",
        }
    }
}

/// One country's line, split wherever a value is missing or non-finite.
#[derive(Debug, Clone)]
pub struct LineSeriesData {
    pub name: String,
    pub color_index: usize,
    pub segments: Vec<Vec<(NaiveDate, f64)>>,
}

#[derive(Debug, Clone)]
pub struct LineChartData {
    pub file_stem: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeriesData>,
}

impl LineChartData {
    fn points(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.segments.iter())
            .flat_map(|seg| seg.iter())
    }

    /// Date span of all plotted points, widened to at least two days.
    pub fn x_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (min, max) = self.points().fold(None, |acc, &(d, _)| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })?;
        if min == max {
            Some((min - Duration::days(1), max + Duration::days(1)))
        } else {
            Some((min, max))
        }
    }

    /// Value span of all plotted points with 5% padding.
    pub fn y_range(&self) -> (f64, f64) {
        let (min, max) = self
            .points()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| {
                (lo.min(v), hi.max(v))
            });
        padded_range(min, max)
    }
}

#[derive(Debug, Clone)]
pub struct BarChartData {
    pub file_stem: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

impl BarChartData {
    /// Upper bound of the value axis; bars always start at zero.
    pub fn y_max(&self) -> f64 {
        let max = self
            .bars
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if max.is_finite() && max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }
}

/// Chart ready for rendering
#[derive(Debug, Clone)]
pub enum ChartData {
    Line(LineChartData),
    Bar(BarChartData),
}

impl ChartData {
    pub fn file_stem(&self) -> &str {
        match self {
            ChartData::Line(c) => &c.file_stem,
            ChartData::Bar(c) => &c.file_stem,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ChartData::Line(c) => &c.title,
            ChartData::Bar(c) => &c.title,
        }
    }
}

/// Builds the line and bar charts of the analysis.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get color for a series.
    pub fn get_series_color(index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    /// One line per country, points in table order.
    pub fn line_chart(table: &[Record], countries: &[String], metric: Metric) -> LineChartData {
        let series = countries
            .iter()
            .enumerate()
            .map(|(i, country)| LineSeriesData {
                name: country.clone(),
                color_index: i,
                segments: Self::segments(
                    StatsCalculator::rows_for(table, country).map(|r| (r.date, metric.value(r))),
                ),
            })
            .collect();

        LineChartData {
            file_stem: metric.file_stem().to_string(),
            title: metric.title().to_string(),
            x_label: "Date".to_string(),
            y_label: metric.y_label().to_string(),
            series,
        }
    }

    /// Vaccinated share per snapshot location, in snapshot order.
    pub fn vaccination_bar_chart(snapshot: &[SnapshotRow]) -> BarChartData {
        BarChartData {
            file_stem: "vaccinated_pct".to_string(),
            title: "Percentage of Population Vaccinated".to_string(),
            x_label: "Country".to_string(),
            y_label: "% Vaccinated".to_string(),
            bars: snapshot
                .iter()
                .map(|row| (row.record.location.clone(), row.vaccinated_pct))
                .collect(),
        }
    }

    /// The four line charts followed by the vaccination bar chart.
    pub fn all_charts(
        table: &[Record],
        snapshot: &[SnapshotRow],
        countries: &[String],
    ) -> Vec<ChartData> {
        Metric::ALL
            .iter()
            .map(|&metric| ChartData::Line(Self::line_chart(table, countries, metric)))
            .chain(std::iter::once(ChartData::Bar(Self::vaccination_bar_chart(
                snapshot,
            ))))
            .collect()
    }

    /// Split a series into runs of finite values.
    pub fn segments(
        points: impl Iterator<Item = (NaiveDate, f64)>,
    ) -> Vec<Vec<(NaiveDate, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (date, value) in points {
            if value.is_finite() {
                current.push((date, value));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Compact axis tick label (`1.5M`, `250K`, `0.021`).
    pub fn format_axis_value(value: f64) -> String {
        let abs = value.abs();
        if abs >= 1e9 {
            format!("{:.1}B", value / 1e9)
        } else if abs >= 1e6 {
            format!("{:.1}M", value / 1e6)
        } else if abs >= 1e4 {
            format!("{:.0}K", value / 1e3)
        } else if abs >= 10.0 || abs == 0.0 {
            format!("{:.0}", value)
        } else if abs >= 1.0 {
            format!("{:.1}", value)
        } else {
            format!("{:.3}", value)
        }
    }
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
        return (min - pad, max + pad);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}
