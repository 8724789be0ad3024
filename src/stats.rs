use itertools::{Itertools, MinMaxResult};

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Summary of the reaction times recorded in one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub average: f64,
    pub fastest: f64,
    pub slowest: f64,
    pub spread: f64,
    pub count: usize,
}

impl LatencySummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let average = mean(samples)?;
        let spread = std_dev(samples)?;
        let (fastest, slowest) = match samples.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        Some(Self {
            average,
            fastest,
            slowest,
            spread,
            count: samples.len(),
        })
    }
}
