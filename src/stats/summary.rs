//! Key insights derived from the filtered table and its latest snapshot.

use crate::data::Record;
use crate::stats::{Peak, SnapshotRow, StatsCalculator};
use chrono::NaiveDate;
use serde::Serialize;

/// Latest figures for one country.
#[derive(Debug, Clone, Serialize)]
pub struct CountryInsight {
    pub location: String,
    pub latest_date: NaiveDate,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub death_rate: f64,
    pub vaccinated_pct: f64,
    pub peak_new_cases: Option<Peak>,
}

/// Cross-country comparison of the latest snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub countries: Vec<CountryInsight>,
    pub most_cases: Option<String>,
    pub most_deaths: Option<String>,
    pub highest_vaccination: Option<String>,
    pub lowest_vaccination: Option<String>,
}

impl Insights {
    pub fn compute(filtered: &[Record], snapshot: &[SnapshotRow]) -> Self {
        let countries: Vec<CountryInsight> = snapshot
            .iter()
            .map(|row| CountryInsight {
                location: row.record.location.clone(),
                latest_date: row.record.date,
                total_cases: row.record.total_cases,
                total_deaths: row.record.total_deaths,
                death_rate: row.death_rate,
                vaccinated_pct: row.vaccinated_pct,
                peak_new_cases: StatsCalculator::peak_new_cases(filtered, &row.record.location),
            })
            .collect();

        let most_cases = Self::arg_max(&countries, |c| c.total_cases.unwrap_or(f64::NAN));
        let most_deaths = Self::arg_max(&countries, |c| c.total_deaths.unwrap_or(f64::NAN));
        let highest_vaccination = Self::arg_max(&countries, |c| c.vaccinated_pct);
        let lowest_vaccination = Self::arg_max(&countries, |c| -c.vaccinated_pct);

        Self {
            countries,
            most_cases,
            most_deaths,
            highest_vaccination,
            lowest_vaccination,
        }
    }

    /// Location with the largest finite key. First one wins ties.
    fn arg_max(
        countries: &[CountryInsight],
        key: impl Fn(&CountryInsight) -> f64,
    ) -> Option<String> {
        countries
            .iter()
            .map(|c| (c, key(c)))
            .filter(|(_, v)| v.is_finite())
            .fold(None, |best: Option<(&CountryInsight, f64)>, (c, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((c, v)),
            })
            .map(|(c, _)| c.location.clone())
    }

    fn find(&self, location: &str) -> Option<&CountryInsight> {
        self.countries.iter().find(|c| c.location == location)
    }

    /// Human-readable observations, one per line.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(c) = self.most_cases.as_deref().and_then(|l| self.find(l)) {
            lines.push(format!(
                "{} recorded the highest total number of cases ({}) among the selected countries.",
                c.location,
                format_count(c.total_cases)
            ));
        }
        if let Some(c) = self.most_deaths.as_deref().and_then(|l| self.find(l)) {
            lines.push(format!(
                "{} recorded the highest total number of deaths ({}).",
                c.location,
                format_count(c.total_deaths)
            ));
        }
        match (
            self.highest_vaccination.as_deref().and_then(|l| self.find(l)),
            self.lowest_vaccination.as_deref().and_then(|l| self.find(l)),
        ) {
            (Some(high), Some(low)) if high.location != low.location => lines.push(format!(
                "{} reached the highest vaccination coverage ({:.1}%), {} the lowest ({:.1}%).",
                high.location, high.vaccinated_pct, low.location, low.vaccinated_pct
            )),
            (Some(high), _) => lines.push(format!(
                "{} reached a vaccination coverage of {:.1}%.",
                high.location, high.vaccinated_pct
            )),
            _ => {}
        }

        for c in &self.countries {
            let peak = match &c.peak_new_cases {
                Some(p) => format!(
                    "new cases peaked at {} on {}",
                    format_count(Some(p.value)),
                    p.date
                ),
                None => "no daily case counts reported".to_string(),
            };
            let rate = if c.death_rate.is_finite() {
                format!("{:.2}%", c.death_rate * 100.0)
            } else {
                "undefined".to_string()
            };
            lines.push(format!(
                "{}: {}; death rate as of {} is {}.",
                c.location, peak, c.latest_date, rate
            ));
        }

        lines
    }
}

/// Whole-number count with thousands separators, `n/a` when missing.
pub fn format_count(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "n/a".to_string();
    };

    let digits = format!("{:.0}", v.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if v < 0.0 && digits != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_row(location: &str, cases: f64, deaths: f64, vacc: f64) -> SnapshotRow {
        let mut record = Record::new(location, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        record.total_cases = Some(cases);
        record.total_deaths = Some(deaths);
        record.total_vaccinations = Some(vacc);
        record.population = Some(1000.0);
        SnapshotRow {
            death_rate: record.death_rate(),
            vaccinated_pct: record.vaccinated_pct(),
            record,
        }
    }

    #[test]
    fn ranks_countries_on_latest_snapshot() {
        let snapshot = vec![
            snapshot_row("Kenya", 300.0, 5.0, 200.0),
            snapshot_row("United States", 900.0, 20.0, 1800.0),
            snapshot_row("India", 800.0, 25.0, 1500.0),
        ];
        let insights = Insights::compute(&[], &snapshot);

        assert_eq!(insights.most_cases.as_deref(), Some("United States"));
        assert_eq!(insights.most_deaths.as_deref(), Some("India"));
        assert_eq!(insights.highest_vaccination.as_deref(), Some("United States"));
        assert_eq!(insights.lowest_vaccination.as_deref(), Some("Kenya"));
        assert_eq!(insights.lines().len(), 6);
    }

    #[test]
    fn non_finite_values_never_rank() {
        let mut row = snapshot_row("Kenya", 0.0, 0.0, 10.0);
        row.record.population = Some(0.0);
        row.vaccinated_pct = row.record.vaccinated_pct();
        let insights = Insights::compute(&[], &[row]);

        assert_eq!(insights.most_cases.as_deref(), Some("Kenya"));
        assert!(insights.highest_vaccination.is_none());
        assert!(insights.lines().iter().any(|l| l.contains("undefined")));
    }

    #[test]
    fn peak_comes_from_filtered_rows() {
        let snapshot = vec![snapshot_row("Kenya", 300.0, 5.0, 200.0)];
        let mut day = Record::new("Kenya", NaiveDate::from_ymd_opt(2021, 7, 14).unwrap());
        day.new_cases = Some(1234.0);
        let insights = Insights::compute(&[day], &snapshot);

        let peak = insights.countries[0].peak_new_cases.as_ref().unwrap();
        assert_eq!(peak.value, 1234.0);
        assert!(insights.lines()[3].contains("1,234 on 2021-07-14"));
    }

    #[test]
    fn counts_grouped_by_thousands() {
        assert_eq!(format_count(Some(103_436_829.0)), "103,436,829");
        assert_eq!(format_count(Some(999.0)), "999");
        assert_eq!(format_count(Some(1000.4)), "1,000");
        assert_eq!(format_count(None), "n/a");
        assert_eq!(format_count(Some(f64::NAN)), "n/a");
    }
}
