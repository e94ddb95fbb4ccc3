//! Synthetic A/B test snapshot generation.
//!
//! Gives the tool a realistic, reproducible dataset when no input file is
//! supplied: a control arm plus lifted variants, weekday-dependent traffic,
//! binomially drawn conversions, and occasional missing-data days so the
//! null-rate path gets exercised.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Binomial, Normal};

use crate::domain::{RawData, RawRow, RawVariation};
use crate::error::AppError;

/// Traffic multiplier applied on Saturdays and Sundays.
const WEEKEND_FACTOR: f64 = 0.55;

/// Relative std dev of day-to-day visit noise.
const VISITS_NOISE: f64 = 0.15;

/// Relative std dev of day-to-day conversion-rate drift.
const RATE_NOISE: f64 = 0.10;

/// Shape of the generated snapshot.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Number of arms, control included (1–9 so TUI digit toggles work).
    pub variations: usize,
    /// Number of consecutive calendar days.
    pub days: usize,
    pub start_date: NaiveDate,
    pub seed: u64,
    /// Mean weekday visits per variation.
    pub base_visits: f64,
    /// Control conversion rate as a fraction (e.g. `0.042`).
    pub base_rate: f64,
    /// Multiplicative lift per arm: arm `i` converts at
    /// `base_rate * (1 + i * lift_step)`.
    pub lift_step: f64,
    /// Probability that a (day, variation) pair has no recorded data.
    pub gap_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            variations: 3,
            days: 60,
            // A Monday, so week mode starts on a full bucket.
            start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default(),
            seed: 42,
            base_visits: 420.0,
            base_rate: 0.042,
            lift_step: 0.08,
            gap_prob: 0.03,
        }
    }
}

/// Generate a snapshot. Identical configs yield identical snapshots.
pub fn generate_sample(config: &SampleConfig) -> Result<RawData, AppError> {
    if config.variations == 0 || config.variations > 9 {
        return Err(AppError::new(2, "Sample variation count must be 1-9."));
    }
    if config.days == 0 {
        return Err(AppError::new(2, "Sample day count must be > 0."));
    }
    if !(config.base_visits.is_finite() && config.base_visits > 0.0) {
        return Err(AppError::new(2, "Invalid base visit count for sample generation."));
    }
    if !(config.base_rate.is_finite() && config.base_rate > 0.0 && config.base_rate < 1.0) {
        return Err(AppError::new(2, "Base conversion rate must be in (0, 1)."));
    }
    if !(config.lift_step.is_finite() && config.lift_step >= 0.0) {
        return Err(AppError::new(2, "Invalid lift step for sample generation."));
    }
    if !(0.0..=1.0).contains(&config.gap_prob) {
        return Err(AppError::new(2, "Gap probability must be in [0, 1]."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let variations: Vec<RawVariation> = (0..config.variations)
        .map(|i| RawVariation {
            id: Some(i as i64),
            name: variation_name(i),
        })
        .collect();

    let mut rows = Vec::with_capacity(config.days);
    for day in 0..config.days {
        let date = config
            .start_date
            .checked_add_signed(Duration::days(day as i64))
            .ok_or_else(|| AppError::new(2, "Sample date range overflows the calendar."))?;

        let day_factor = match date.weekday() {
            Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
            _ => 1.0,
        };

        let mut visits = BTreeMap::new();
        let mut conversions = BTreeMap::new();

        for (i, variation) in variations.iter().enumerate() {
            if rng.gen_range(0.0..1.0) < config.gap_prob {
                continue;
            }

            let id = variation.id.unwrap_or(0).to_string();

            let z: f64 = noise.sample(&mut rng);
            let day_visits = (config.base_visits * day_factor * (1.0 + VISITS_NOISE * z))
                .round()
                .max(0.0) as u64;

            let z: f64 = noise.sample(&mut rng);
            let rate = (config.base_rate * (1.0 + config.lift_step * i as f64)
                * (1.0 + RATE_NOISE * z))
                .clamp(0.0005, 0.95);

            let binomial = Binomial::new(day_visits, rate)
                .map_err(|e| AppError::new(4, format!("Conversion distribution error: {e}")))?;
            let day_conversions = binomial.sample(&mut rng);

            visits.insert(id.clone(), day_visits);
            conversions.insert(id, day_conversions);
        }

        rows.push(RawRow {
            date,
            visits,
            conversions,
        });
    }

    Ok(RawData {
        variations,
        data: rows,
    })
}

fn variation_name(index: usize) -> String {
    if index == 0 {
        return "Control".to_string();
    }
    // Control is implicitly "A"; variants continue from "B".
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("Variant {letter}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a, b);

        let other = generate_sample(&SampleConfig {
            seed: 43,
            ..config
        })
        .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn shape_matches_config() {
        let config = SampleConfig {
            variations: 4,
            days: 14,
            ..SampleConfig::default()
        };
        let data = generate_sample(&config).unwrap();

        assert_eq!(data.variations.len(), 4);
        assert_eq!(data.data.len(), 14);
        assert_eq!(data.variations[0].name, "Control");
        assert_eq!(data.variations[1].name, "Variant B");
        assert_eq!(data.data[0].date, config.start_date);
        assert_eq!(
            data.data[13].date,
            config.start_date + Duration::days(13)
        );
    }

    #[test]
    fn conversions_never_exceed_visits() {
        let data = generate_sample(&SampleConfig::default()).unwrap();
        for row in &data.data {
            for (id, conversions) in &row.conversions {
                let visits = row.visits.get(id).copied().unwrap_or(0);
                assert!(conversions <= &visits, "{}: {conversions} > {visits}", row.date);
            }
        }
    }

    #[test]
    fn gap_probability_one_yields_only_empty_rows() {
        let data = generate_sample(&SampleConfig {
            gap_prob: 1.0,
            days: 5,
            ..SampleConfig::default()
        })
        .unwrap();

        for row in &data.data {
            assert!(row.visits.is_empty());
            assert!(row.conversions.is_empty());
        }
    }

    #[test]
    fn config_validation() {
        let bad = [
            SampleConfig {
                variations: 0,
                ..SampleConfig::default()
            },
            SampleConfig {
                days: 0,
                ..SampleConfig::default()
            },
            SampleConfig {
                base_rate: 1.5,
                ..SampleConfig::default()
            },
            SampleConfig {
                gap_prob: -0.1,
                ..SampleConfig::default()
            },
        ];
        for config in bad {
            assert_eq!(generate_sample(&config).unwrap_err().exit_code(), 2);
        }
    }
}
