//! Postprandial spike detection

use crate::config::SpikeConfig;
use crate::types::{round2, GlucosePoint, Spike};
use std::collections::HashSet;

use super::clock::{is_awake, truncate_to_hour};

/// Scan awake-window samples for a rise of at least `min_delta` within the
/// next `lookahead_samples` readings.
///
/// The first qualifying rise ends the scan for that start sample. Only one
/// spike is kept per clock hour of the start sample.
pub fn detect_spikes(series: &[GlucosePoint], config: &SpikeConfig) -> Vec<Spike> {
    let mut spikes = Vec::new();
    let mut seen_hours = HashSet::new();

    for (i, start) in series.iter().enumerate() {
        if !is_awake(&start.timestamp) {
            continue;
        }
        let hour = truncate_to_hour(&start.timestamp);
        if seen_hours.contains(&hour) {
            continue;
        }

        let rise = series[i + 1..]
            .iter()
            .take(config.lookahead_samples)
            .find(|later| later.glucose - start.glucose >= config.min_delta);

        if let Some(end) = rise {
            seen_hours.insert(hour);
            spikes.push(Spike {
                start: start.timestamp,
                end: end.timestamp,
                delta: round2(end.glucose - start.glucose),
            });
        }
    }

    spikes
}
