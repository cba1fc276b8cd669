//! Typed rows produced by the cleaner.

use chrono::NaiveDate;
use serde::Serialize;

/// One (location, date) observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub location: String,
    pub total_cases: Option<f64>,
    pub new_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub new_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
    pub population: Option<f64>,
}

impl Record {
    /// Empty observation for a location and date.
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            date,
            location: location.into(),
            total_cases: None,
            new_cases: None,
            total_deaths: None,
            new_deaths: None,
            total_vaccinations: None,
            population: None,
        }
    }

    /// `total_deaths / total_cases`. NaN when either side is missing.
    pub fn death_rate(&self) -> f64 {
        ratio(self.total_deaths, self.total_cases)
    }

    /// Share of the population vaccinated, in percent.
    pub fn vaccinated_pct(&self) -> f64 {
        ratio(self.total_vaccinations, self.population) * 100.0
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    numerator.unwrap_or(f64::NAN) / denominator.unwrap_or(f64::NAN)
}

/// Observations in source file order.
pub type Table = Vec<Record>;

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, d).unwrap()
    }

    #[test]
    fn death_rate_is_plain_quotient() {
        let mut r = Record::new("Kenya", day(1));
        r.total_cases = Some(200.0);
        r.total_deaths = Some(5.0);
        assert_eq!(r.death_rate(), 5.0 / 200.0);
    }

    #[test]
    fn death_rate_non_finite_on_zero_cases() {
        let mut r = Record::new("Kenya", day(1));
        r.total_cases = Some(0.0);
        r.total_deaths = Some(0.0);
        assert!(r.death_rate().is_nan());

        r.total_deaths = Some(3.0);
        assert!(r.death_rate().is_infinite());
    }

    #[test]
    fn missing_inputs_give_nan() {
        let mut r = Record::new("Kenya", day(1));
        r.total_deaths = Some(3.0);
        assert!(r.death_rate().is_nan());
        assert!(r.vaccinated_pct().is_nan());
    }

    #[test]
    fn vaccinated_pct_scales_to_percent() {
        let mut r = Record::new("India", day(2));
        r.total_vaccinations = Some(250.0);
        r.population = Some(1000.0);
        assert_eq!(r.vaccinated_pct(), 25.0);

        r.population = Some(0.0);
        assert!(!r.vaccinated_pct().is_finite());
    }
}
