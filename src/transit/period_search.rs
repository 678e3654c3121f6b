//! Seam for third-party period-search detectors and the benchmark summary
//! that compares their output with detected transit events.
//!
//! No search algorithm lives here. A detector is anything implementing
//! `PeriodSearch`; its failures are recorded, never propagated, so one bad
//! light curve cannot abort a batch.

use crate::sim::units::{Float, DAY};
use crate::transit::detector::{median, TransitEvent};
use crate::transit::synthesizer::FluxSample;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodSearchResult {
    /// Days
    pub period: Float,
    /// Days
    pub duration: Float,
    /// Epoch of the first transit, in days
    pub t0: Float,
    pub depth: Float,
    /// Detection statistic (power or SNR, detector specific)
    pub power: Float,
}

pub trait PeriodSearch {
    fn name(&self) -> &str;

    /// Searches `flux` sampled at `time_days`. An `Err` carries a
    /// human-readable cause.
    fn search(&self, time_days: &[Float], flux: &[Float]) -> Result<PeriodSearchResult, String>;
}

/// Outcome of one detector on one light curve; all result fields are `None`
/// when the detector failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodSearchRecord {
    pub detector: String,
    pub period: Option<Float>,
    pub duration: Option<Float>,
    pub t0: Option<Float>,
    pub depth: Option<Float>,
    pub power: Option<Float>,
    pub error: Option<String>,
}

impl PeriodSearchRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs `detector` on the noisy flux with time converted to days.
pub fn run_period_search(detector: &dyn PeriodSearch, series: &[FluxSample]) -> PeriodSearchRecord {
    let time_days: Vec<Float> = series.iter().map(|s| s.time / DAY).collect();
    let flux: Vec<Float> = series.iter().map(|s| s.flux_noisy).collect();
    match detector.search(&time_days, &flux) {
        Ok(result) => PeriodSearchRecord {
            detector: detector.name().to_string(),
            period: Some(result.period),
            duration: Some(result.duration),
            t0: Some(result.t0),
            depth: Some(result.depth),
            power: Some(result.power),
            error: None,
        },
        Err(cause) => {
            tracing::warn!(detector = detector.name(), "Period search failed: {}", cause);
            PeriodSearchRecord {
                detector: detector.name().to_string(),
                period: None,
                duration: None,
                t0: None,
                depth: None,
                power: None,
                error: Some(cause),
            }
        }
    }
}

/// Median spacing of event start times, in days; needs at least two events.
pub fn true_period(events: &[TransitEvent]) -> Option<Float> {
    if events.len() < 2 {
        return None;
    }
    let gaps: Vec<Float> = events
        .windows(2)
        .map(|pair| (pair[1].start_time - pair[0].start_time) / DAY)
        .collect();
    Some(median(&gaps))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureFlags {
    pub missed_transits: bool,
    /// `None` when there is no reference period to compare against.
    pub wrong_periodicity: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub index: usize,
    pub n_truth_events: usize,
    pub true_period: Option<Float>,
    pub searches: Vec<PeriodSearchRecord>,
    pub failure: FailureFlags,
}

/// Relative period error above which a search counts as wrong.
pub const PERIOD_TOLERANCE: Float = 0.1;
/// Power below which a search is considered to have found nothing.
pub const MINIMUM_POWER: Float = 1.0;

/// Runs every detector on one light curve and flags failures against the
/// detected events. Flags are judged on the first detector's record.
pub fn benchmark(
    index: usize,
    series: &[FluxSample],
    events: &[TransitEvent],
    detectors: &[&dyn PeriodSearch],
) -> BenchmarkEntry {
    let searches: Vec<PeriodSearchRecord> = detectors
        .iter()
        .map(|detector| run_period_search(*detector, series))
        .collect();
    let true_period = true_period(events);
    let primary = searches.first();

    let missed_transits = !events.is_empty()
        && primary.map_or(true, |record| {
            record.power.map_or(true, |power| power < MINIMUM_POWER)
        });
    let wrong_periodicity = true_period.map(|truth| {
        primary
            .and_then(|record| record.period)
            .map_or(true, |period| (period - truth).abs() > PERIOD_TOLERANCE * truth)
    });

    BenchmarkEntry {
        index,
        n_truth_events: events.len(),
        true_period,
        searches,
        failure: FailureFlags {
            missed_transits,
            wrong_periodicity,
        },
    }
}
