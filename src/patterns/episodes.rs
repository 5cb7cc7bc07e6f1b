//! Hypo/hyperglycemia episode detection
//!
//! Two grouping strategies coexist:
//! - Run-length: consecutive violating samples, emitted when the run reaches a
//!   minimum number of samples.
//! - Gap-tolerant: already-flagged readings merged while the time between
//!   successive readings stays within a tolerance, with no minimum size.

use crate::types::{Episode, EpisodeKind, GlucosePoint};
use chrono::Duration;

use super::clock::is_nocturnal;

impl EpisodeKind {
    /// Whether a reading violates the threshold for this kind of episode
    pub fn violates(&self, glucose: f64, threshold: f64) -> bool {
        match self {
            EpisodeKind::Hypo => glucose < threshold,
            EpisodeKind::Hyper => glucose > threshold,
        }
    }

    /// The more extreme of two readings for this kind of episode
    fn extreme(&self, a: f64, b: f64) -> f64 {
        match self {
            EpisodeKind::Hypo => a.min(b),
            EpisodeKind::Hyper => a.max(b),
        }
    }
}

/// Episode under construction
struct OpenEpisode {
    first: GlucosePoint,
    last: GlucosePoint,
    extreme: f64,
    count: usize,
}

impl OpenEpisode {
    fn start(point: &GlucosePoint) -> Self {
        Self {
            first: *point,
            last: *point,
            extreme: point.glucose,
            count: 1,
        }
    }

    fn extend(&mut self, kind: EpisodeKind, point: &GlucosePoint) {
        self.last = *point;
        self.extreme = kind.extreme(self.extreme, point.glucose);
        self.count += 1;
    }

    fn close(self, kind: EpisodeKind) -> Episode {
        Episode {
            kind,
            start: self.first.timestamp,
            end: self.last.timestamp,
            extreme_glucose: self.extreme,
            count: self.count,
        }
    }
}

/// Scan for runs of consecutive samples violating `threshold`.
///
/// A run closes at the first non-violating sample or at the end of the series
/// and is kept only if it holds at least `min_samples` readings.
pub fn detect_runs(
    series: &[GlucosePoint],
    kind: EpisodeKind,
    threshold: f64,
    min_samples: usize,
) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut open: Option<OpenEpisode> = None;

    for point in series {
        if kind.violates(point.glucose, threshold) {
            match open.as_mut() {
                Some(run) => run.extend(kind, point),
                None => open = Some(OpenEpisode::start(point)),
            }
        } else if let Some(run) = open.take() {
            if run.count >= min_samples {
                episodes.push(run.close(kind));
            }
        }
    }

    if let Some(run) = open {
        if run.count >= min_samples {
            episodes.push(run.close(kind));
        }
    }

    episodes
}

/// Merge flagged readings into groups while successive gaps are `<= tolerance`
pub fn group_with_gap_tolerance(
    flagged: &[GlucosePoint],
    kind: EpisodeKind,
    tolerance: Duration,
) -> Vec<Episode> {
    let mut groups = Vec::new();
    let mut open: Option<OpenEpisode> = None;

    for point in flagged {
        open = match open {
            Some(mut group) if point.timestamp - group.last.timestamp <= tolerance => {
                group.extend(kind, point);
                Some(group)
            }
            Some(group) => {
                groups.push(group.close(kind));
                Some(OpenEpisode::start(point))
            }
            None => Some(OpenEpisode::start(point)),
        };
    }

    if let Some(group) = open {
        groups.push(group.close(kind));
    }

    groups
}

/// Episodes whose first reading falls in the nocturnal window
pub fn nocturnal_subset(episodes: &[Episode]) -> Vec<Episode> {
    episodes
        .iter()
        .filter(|e| is_nocturnal(&e.start))
        .cloned()
        .collect()
}

/// Nocturnal readings below `threshold`, in series order
pub fn nocturnal_lows(series: &[GlucosePoint], threshold: f64) -> Vec<GlucosePoint> {
    series
        .iter()
        .filter(|p| EpisodeKind::Hypo.violates(p.glucose, threshold) && is_nocturnal(&p.timestamp))
        .copied()
        .collect()
}
