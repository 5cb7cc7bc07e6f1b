//! Glycemic metrics
//!
//! This module computes the standard CGM summary statistics from a canonical series:
//! - Mean, standard deviation (n-1), coefficient of variation
//! - Glucose management indicator
//! - Time in range / below range / above range (counts and percentages)

use crate::config::RangeThresholds;
use crate::error::AnalysisError;
use crate::types::{round2, GlucosePoint, MetricsResult};

/// GMI intercept (%), from the Bergenstal et al. linear model
const GMI_INTERCEPT: f64 = 3.31;

/// GMI slope (% per mg/dL)
const GMI_SLOPE: f64 = 0.02392;

/// Calculator for aggregate glycemic metrics
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute metrics with the configured range thresholds.
    ///
    /// Fails with [`AnalysisError::EmptySeries`] when there are no points.
    pub fn compute(
        series: &[GlucosePoint],
        ranges: &RangeThresholds,
    ) -> Result<MetricsResult, AnalysisError> {
        let total = series.len();
        if total == 0 {
            return Err(AnalysisError::EmptySeries);
        }

        let values: Vec<f64> = series.iter().map(|p| p.glucose).collect();
        let mean = mean(&values);
        let std = sample_std_dev(&values, mean);
        let cv = if mean != 0.0 { std / mean * 100.0 } else { 0.0 };
        let gmi = GMI_INTERCEPT + GMI_SLOPE * mean;

        let mut tir_count = 0;
        let mut below_70_count = 0;
        let mut below_54_count = 0;
        let mut above_180_count = 0;
        let mut above_250_count = 0;

        for &v in &values {
            if v < ranges.tir_low {
                below_70_count += 1;
                if v < ranges.very_low {
                    below_54_count += 1;
                }
            } else if v > ranges.tir_high {
                above_180_count += 1;
                if v > ranges.very_high {
                    above_250_count += 1;
                }
            } else {
                tir_count += 1;
            }
        }

        Ok(MetricsResult {
            mean_glucose: round2(mean),
            std_glucose: round2(std),
            cv: round2(cv),
            gmi: round2(gmi),

            tir_percent: percent(tir_count, total),
            below_70_percent: percent(below_70_count, total),
            below_54_percent: percent(below_54_count, total),
            above_180_percent: percent(above_180_count, total),
            above_250_percent: percent(above_250_count, total),

            tir_count,
            below_70_count,
            below_54_count,
            above_180_count,
            above_250_count,
            total_points: total,
        })
    }

    /// Compute metrics with the default clinical thresholds
    pub fn compute_default(series: &[GlucosePoint]) -> Result<MetricsResult, AnalysisError> {
        Self::compute(series, &RangeThresholds::default())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased (n-1) standard deviation; zero for a single value
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

fn percent(count: usize, total: usize) -> f64 {
    round2(count as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn series(values: &[f64]) -> Vec<GlucosePoint> {
        let start = DateTime::parse_from_rfc3339("2024-01-15T10:00:00+00:00").unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &g)| GlucosePoint::new(start + Duration::minutes(5 * i as i64), g))
            .collect()
    }

    #[test]
    fn test_flat_series() {
        let metrics = MetricsCalculator::compute_default(&series(&[100.0; 12])).unwrap();

        assert_eq!(metrics.mean_glucose, 100.0);
        assert_eq!(metrics.std_glucose, 0.0);
        assert_eq!(metrics.cv, 0.0);
        assert_eq!(metrics.gmi, 5.7); // 3.31 + 2.392 = 5.702
        assert_eq!(metrics.tir_percent, 100.0);
        assert_eq!(metrics.total_points, 12);
    }

    #[test]
    fn test_sample_standard_deviation() {
        // mean 100, squared deviations 100 + 0 + 100 over n-1 = 2 -> variance 100
        let metrics = MetricsCalculator::compute_default(&series(&[90.0, 100.0, 110.0])).unwrap();
        assert_eq!(metrics.std_glucose, 10.0);
        assert_eq!(metrics.cv, 10.0);
    }

    #[test]
    fn test_single_point_has_zero_std() {
        let metrics = MetricsCalculator::compute_default(&series(&[140.0])).unwrap();
        assert_eq!(metrics.std_glucose, 0.0);
        assert_eq!(metrics.cv, 0.0);
    }

    #[test]
    fn test_boundaries_are_in_range() {
        let metrics = MetricsCalculator::compute_default(&series(&[70.0, 180.0])).unwrap();
        assert_eq!(metrics.tir_count, 2);
        assert_eq!(metrics.below_70_count, 0);
        assert_eq!(metrics.above_180_count, 0);
    }

    #[test]
    fn test_nested_buckets() {
        let values = [50.0, 60.0, 100.0, 200.0, 260.0, 54.0, 250.0];
        let metrics = MetricsCalculator::compute_default(&series(&values)).unwrap();

        assert_eq!(metrics.below_70_count, 3);
        assert_eq!(metrics.below_54_count, 1);
        assert_eq!(metrics.above_180_count, 3);
        assert_eq!(metrics.above_250_count, 1);
        assert_eq!(metrics.tir_count, 1);
        assert_eq!(
            metrics.tir_count + metrics.below_70_count + metrics.above_180_count,
            metrics.total_points
        );
        // 3 of 7 = 42.857...
        assert_eq!(metrics.below_70_percent, 42.86);
        assert_eq!(metrics.tir_percent, 14.29);
    }

    #[test]
    fn test_custom_ranges() {
        let ranges = RangeThresholds {
            tir_low: 63.0,
            tir_high: 140.0,
            very_low: 54.0,
            very_high: 250.0,
        };
        let metrics = MetricsCalculator::compute(&series(&[65.0, 150.0]), &ranges).unwrap();
        assert_eq!(metrics.tir_count, 1);
        assert_eq!(metrics.above_180_count, 1);
    }

    #[test]
    fn test_empty_series_fails() {
        let empty: Vec<GlucosePoint> = Vec::new();
        assert!(matches!(
            MetricsCalculator::compute_default(&empty),
            Err(AnalysisError::EmptySeries)
        ));
    }

    #[test]
    fn test_compute_is_pure() {
        let s = series(&[65.0, 88.0, 143.0, 210.0, 97.0]);
        let first = MetricsCalculator::compute_default(&s).unwrap();
        let second = MetricsCalculator::compute_default(&s).unwrap();
        assert_eq!(first, second);
    }
}
