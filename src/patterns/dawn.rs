//! Dawn phenomenon detection

use crate::config::{DawnConfig, DawnPolicy};
use crate::types::GlucosePoint;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::clock::{is_dawn_window, is_early_morning, is_pre_dawn};

/// Evaluate the configured dawn policy over the series
pub fn detect_dawn(series: &[GlucosePoint], config: &DawnConfig) -> bool {
    match config.policy {
        DawnPolicy::NadirPeak => nadir_to_peak(series, config.min_delta),
        DawnPolicy::RiseCount => rise_count(series, config.min_delta, config.min_rises),
    }
}

/// Morning peak minus pre-dawn nadir reaches `min_delta` on at least one date.
///
/// Each calendar date is evaluated on its own: its [02,06) minimum against its
/// [06,08) maximum. A date needs a reading in both windows.
pub fn nadir_to_peak(series: &[GlucosePoint], min_delta: f64) -> bool {
    let mut nights: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for point in series {
        if is_pre_dawn(&point.timestamp) {
            let (nadir, _) = nights.entry(point.timestamp.date_naive()).or_default();
            *nadir = Some(nadir.map_or(point.glucose, |n| n.min(point.glucose)));
        } else if is_early_morning(&point.timestamp) {
            let (_, peak) = nights.entry(point.timestamp.date_naive()).or_default();
            *peak = Some(peak.map_or(point.glucose, |p| p.max(point.glucose)));
        }
    }

    nights.values().any(|night| match *night {
        (Some(nadir), Some(peak)) => peak - nadir >= min_delta,
        _ => false,
    })
}

/// At least `min_rises` adjacent pairs inside the dawn window rise by `min_delta`.
///
/// Qualifying pairs are counted across the whole series; they do not have to
/// follow one another.
pub fn rise_count(series: &[GlucosePoint], min_delta: f64, min_rises: usize) -> bool {
    let rises = series
        .windows(2)
        .filter(|pair| is_dawn_window(&pair[0].timestamp) && is_dawn_window(&pair[1].timestamp))
        .filter(|pair| pair[1].glucose - pair[0].glucose >= min_delta)
        .count();
    rises >= min_rises
}
