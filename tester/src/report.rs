//! Combining per-round summaries into one report

use std::fmt;

use crate::error::StatsError;
use crate::statistics::RoundSummary;

/// Round summaries in the order their workers finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rounds: Vec<RoundSummary>,
}

impl ResultSet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            rounds: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, round: RoundSummary) {
        self.rounds.push(round);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundSummary> {
        self.rounds.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[RoundSummary] {
        &self.rounds
    }
}

impl FromIterator<RoundSummary> for ResultSet {
    fn from_iter<I: IntoIterator<Item = RoundSummary>>(iter: I) -> Self {
        Self {
            rounds: iter.into_iter().collect(),
        }
    }
}

/// Totals across all rounds of one run.
///
/// Mean, deviation, throughput and sum are averages of the per-round values rather than
/// figures recomputed from raw samples. Minimum and maximum are global extremes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AggregateReport {
    pub rounds: usize,
    pub mean: f64,
    pub std_deviation: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub throughput_per_second: f64,
    pub sum: f64,
}

pub fn report(results: &ResultSet) -> Result<AggregateReport, StatsError> {
    if results.is_empty() {
        return Err(StatsError::EmptyResultSet);
    }

    let mut mean = 0.0;
    let mut std_deviation = 0.0;
    let mut throughput = 0.0;
    let mut sum = 0.0;
    let mut minimum = f64::INFINITY;
    let mut maximum = f64::NEG_INFINITY;
    for round in results.iter() {
        mean += round.mean;
        std_deviation += round.std_deviation;
        throughput += round.throughput_per_second;
        sum += round.sum;
        if round.maximum > maximum {
            maximum = round.maximum;
        }
        if round.minimum < minimum {
            minimum = round.minimum;
        }
    }

    let l = results.len() as f64;
    Ok(AggregateReport {
        rounds: results.len(),
        mean: mean / l,
        std_deviation: std_deviation / l,
        minimum,
        maximum,
        throughput_per_second: throughput / l,
        sum: sum / l,
    })
}

/// Human readable breakdown, one block per round plus the total.
pub struct ReportView<'a> {
    test_name: &'a str,
    results: &'a ResultSet,
    total: Option<&'a AggregateReport>,
}

#[must_use]
pub fn render<'a>(
    test_name: &'a str,
    results: &'a ResultSet,
    total: Option<&'a AggregateReport>,
) -> ReportView<'a> {
    ReportView {
        test_name,
        results,
        total,
    }
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    mean: f64,
    std_deviation: f64,
    minimum: f64,
    maximum: f64,
    throughput: f64,
    sum: f64,
) -> fmt::Result {
    writeln!(f, "Average time: {mean:.6}")?;
    writeln!(f, "Deviation: {std_deviation:.6}")?;
    writeln!(f, "Minimum time: {minimum:.6}")?;
    writeln!(f, "Maximum: {maximum:.6}")?;
    // Whole transactions only.
    writeln!(f, "Transaction per second: {}", throughput.trunc() as u64)?;
    writeln!(f, "All time: {sum:.6}")
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "------------------ Performance result for test {} ------------------",
            self.test_name
        )?;
        for (round, res) in self.results.iter().enumerate() {
            writeln!(
                f,
                "----------------------------- Round {round} -----------------------------"
            )?;
            write_block(
                f,
                res.mean,
                res.std_deviation,
                res.minimum,
                res.maximum,
                res.throughput_per_second,
                res.sum,
            )?;
        }
        writeln!(
            f,
            "---------------------------- Total ------------------------------------"
        )?;
        match self.total {
            Some(total) => write_block(
                f,
                total.mean,
                total.std_deviation,
                total.minimum,
                total.maximum,
                total.throughput_per_second,
                total.sum,
            )?,
            None => writeln!(f, "No rounds completed")?,
        }
        write!(
            f,
            "-----------------------------------------------------------------------"
        )
    }
}
