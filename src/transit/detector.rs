use crate::sim::units::Float;
use crate::transit::synthesizer::FluxSample;
use serde::{Deserialize, Serialize};

/// One contiguous run of samples below the detection threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitEvent {
    pub start_time: Float,
    pub end_time: Float,
    pub duration: Float,
    pub depth: Float,
}

/// Robust baseline of a flux series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub median: Float,
    pub std_dev: Float,
    pub value: Float,
}

pub fn median(values: &[Float]) -> Float {
    if values.is_empty() {
        return Float::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[Float]) -> Float {
    if values.is_empty() {
        return Float::NAN;
    }
    let n = values.len() as Float;
    let mean = values.iter().sum::<Float>() / n;
    (values.iter().map(|x| (x - mean).powi(2)).sum::<Float>() / n).sqrt()
}

pub fn threshold(values: &[Float], sigma: Float) -> Threshold {
    let median = median(values);
    let std_dev = std_dev(values);
    Threshold {
        median,
        std_dev,
        value: median - sigma * std_dev,
    }
}

/// Finds every maximal run of `flux_noisy` strictly below
/// `median - sigma·std_dev`, in time order.
///
/// Single-sample dips are events too; there is no shape test. A negative or
/// NaN `sigma` is treated as zero, so the threshold never rises above the
/// median.
pub fn detect(series: &[FluxSample], sigma: Float) -> Vec<TransitEvent> {
    if series.is_empty() {
        return Vec::new();
    }
    if !(sigma >= 0.) {
        tracing::warn!(sigma, "Negative detection sigma, using 0");
    }
    let sigma = sigma.max(0.);
    let flux: Vec<Float> = series.iter().map(|s| s.flux_noisy).collect();
    let threshold = threshold(&flux, sigma);

    let mut events = Vec::new();
    let mut i = 0;
    while i < series.len() {
        if flux[i] >= threshold.value || flux[i].is_nan() {
            i += 1;
            continue;
        }
        let start = i;
        while i < series.len() && flux[i] < threshold.value {
            i += 1;
        }
        let end = i - 1;
        let minimum = flux[start..=end].iter().copied().fold(Float::INFINITY, Float::min);
        events.push(TransitEvent {
            start_time: series[start].time,
            end_time: series[end].time,
            duration: series[end].time - series[start].time,
            depth: threshold.median - minimum,
        });
    }
    tracing::debug!(
        events = events.len(),
        median = threshold.median,
        std_dev = threshold.std_dev,
        threshold = threshold.value,
        "Transit detection complete"
    );
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(flux: &[Float], dt: Float) -> Vec<FluxSample> {
        flux.iter()
            .enumerate()
            .map(|(k, f)| FluxSample {
                time: k as Float * dt,
                flux: *f,
                flux_noisy: *f,
            })
            .collect()
    }

    fn with_dip(len: usize, dip: std::ops::RangeInclusive<usize>, depth: Float) -> Vec<Float> {
        (0..len)
            .map(|k| if dip.contains(&k) { 1. - depth } else { 1. })
            .collect()
    }

    #[test]
    fn median_of_odd_and_even_lengths() {
        assert_eq!(median(&[3., 1., 2.]), 2.);
        assert_eq!(median(&[4., 1., 3., 2.]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn population_standard_deviation() {
        assert_relative_eq!(std_dev(&[2., 4., 4., 4., 5., 5., 7., 9.]), 2.);
        assert_eq!(std_dev(&[1., 1., 1.]), 0.);
    }

    #[test]
    fn flat_series_has_no_events() {
        let flat = series(&[1.; 200], 60.);
        for sigma in [0., 0.5, 1., 3., 5., 100.] {
            assert!(detect(&flat, sigma).is_empty(), "sigma = {sigma}");
        }
        assert!(detect(&series(&[0.7; 5], 1.), 1.).is_empty());
    }

    #[test]
    fn flat_series_with_inexact_mean_has_no_events_for_any_sigma() {
        for level in [0.3, 0.7, 0.9999] {
            for len in [3, 7, 200] {
                let flat = series(&vec![level; len], 60.);
                for sigma in [-5., -1., 0., 1e-3, 5., Float::NAN] {
                    assert!(
                        detect(&flat, sigma).is_empty(),
                        "level = {level}, len = {len}, sigma = {sigma}"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_series_has_no_events() {
        assert!(detect(&[], 3.).is_empty());
    }

    #[test]
    fn single_dip_is_one_event() {
        let dt = 30.;
        let flux = with_dip(100, 40..=49, 0.01);
        let events = detect(&series(&flux, dt), 3.);
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_eq!(event.start_time, 40. * dt);
        assert_eq!(event.end_time, 49. * dt);
        assert_eq!(event.duration, 9. * dt);
        assert_relative_eq!(event.depth, 0.01, max_relative = 1e-9);
    }

    #[test]
    fn single_sample_dip_is_an_event() {
        let flux = with_dip(50, 20..=20, 0.5);
        let events = detect(&series(&flux, 1.), 5.);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_time, 20.);
        assert_eq!(events[0].duration, 0.);
    }

    #[test]
    fn dips_at_series_edges_are_closed() {
        let mut flux = with_dip(60, 0..=2, 0.02);
        flux[57] = 0.98;
        flux[58] = 0.97;
        flux[59] = 0.98;
        let events = detect(&series(&flux, 1.), 2.);
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].start_time, events[0].end_time), (0., 2.));
        assert_eq!((events[1].start_time, events[1].end_time), (57., 59.));
        assert_relative_eq!(events[1].depth, 0.03, max_relative = 1e-9);
    }

    #[test]
    fn events_are_time_ordered_and_disjoint() {
        let mut flux = vec![1.; 300];
        for start in [10, 110, 210] {
            for k in start..start + 5 {
                flux[k] = 0.99;
            }
        }
        let events = detect(&series(&flux, 2.), 3.);
        assert_eq!(events.len(), 3);
        for pair in events.windows(2) {
            assert!(pair[0].end_time < pair[1].start_time);
        }
    }

    #[test]
    fn detection_reads_the_noisy_column() {
        let mut samples = series(&[1.; 40], 1.);
        samples[10].flux = 0.5;
        assert!(detect(&samples, 3.).is_empty());
        samples[10].flux_noisy = 0.5;
        assert_eq!(detect(&samples, 3.).len(), 1);
    }
}
