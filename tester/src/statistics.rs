use crate::error::StatsError;

/// Summary of one worker's round of timed calls, all times in seconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoundSummary {
    pub minimum: f64,
    pub maximum: f64,
    pub sum: f64,
    pub mean: f64,
    pub std_deviation: f64,
    pub throughput_per_second: f64,
    /// Number of samples the round was derived from
    pub samples: usize,
}

/// Reduces one round's latency samples to its summary.
///
/// Throughput is `n / sum` only when the round took longer than one second in total;
/// faster rounds report `n` itself. The discontinuity at `sum == 1` is kept so numbers stay
/// comparable with earlier runs of this harness.
pub fn summarize(samples: &[f64]) -> Result<RoundSummary, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySamples);
    }

    let mut minimum = f64::INFINITY;
    let mut maximum = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut sum_of_squares = 0.0;
    for &sample in samples {
        if sample > maximum {
            maximum = sample;
        }
        if sample < minimum {
            minimum = sample;
        }
        sum += sample;
        sum_of_squares += sample * sample;
    }

    let n = samples.len() as f64;
    let mean = sum / n;
    // Cancellation can push the variance of near-identical samples slightly below zero.
    let variance = (sum_of_squares / n - mean * mean).max(0.0);
    let throughput_per_second = if sum > 1.0 { n / sum } else { n };

    Ok(RoundSummary {
        minimum,
        maximum,
        sum,
        mean,
        std_deviation: variance.sqrt(),
        throughput_per_second,
        samples: samples.len(),
    })
}
