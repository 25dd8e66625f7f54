use rand::Rng;
use serde::Serialize;

use super::types::SimulationResult;

/// Percentile ranks reported in the summary table: 5, 10, ..., 95.
pub const PERCENTILE_RANKS: [u32; 19] = [
    5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95,
];

/// Default cap on how many paths are subsampled for trajectory rendering.
pub const DEFAULT_SAMPLE_PATHS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileRow {
    pub rank: u32,
    pub nominal: f64,
    pub real: f64,
}

/// Cross-sectional percentile envelope across years. `median[t]`,
/// `lower[t]` and `upper[t]` are percentiles taken across paths
/// independently at year `t`; the band need not follow any realized path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryBand {
    pub lower_rank: u32,
    pub upper_rank: u32,
    pub median: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Terminal values deflated by each path's own realized inflation factor,
/// expressing today's purchasing power. Pure elementwise division.
pub fn terminal_real_values(result: &SimulationResult) -> Vec<f64> {
    result
        .terminal_values()
        .iter()
        .zip(result.cumulative_inflation())
        .map(|(&nominal, &factor)| nominal / factor)
        .collect()
}

/// Percentage of paths whose terminal nominal value is strictly positive.
pub fn success_rate(result: &SimulationResult) -> f64 {
    let survivors = result
        .terminal_values()
        .iter()
        .filter(|&&value| value > 0.0)
        .count();
    survivors as f64 / result.paths() as f64 * 100.0
}

pub fn distribution_summary(values: &[f64]) -> DistributionSummary {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let mut scratch = values.to_vec();
    DistributionSummary {
        mean,
        median: percentile(&mut scratch, 50.0),
    }
}

/// Nominal and real percentiles of the terminal distribution, one row per
/// rank in [`PERCENTILE_RANKS`], each dimension computed independently.
pub fn percentile_table(result: &SimulationResult) -> Vec<PercentileRow> {
    let mut nominal = result.terminal_values().to_vec();
    let mut real = terminal_real_values(result);
    nominal.sort_by(|a, b| a.total_cmp(b));
    real.sort_by(|a, b| a.total_cmp(b));

    PERCENTILE_RANKS
        .iter()
        .map(|&rank| PercentileRow {
            rank,
            nominal: percentile_sorted(&nominal, rank as f64),
            real: percentile_sorted(&real, rank as f64),
        })
        .collect()
}

/// Picks at most `max` path indices uniformly without replacement, to bound
/// rendering cost. Indices come back sorted for stable display.
pub fn sample_path_indices(paths: usize, max: usize, rng: &mut impl Rng) -> Vec<usize> {
    let amount = max.min(paths);
    let mut indices = rand::seq::index::sample(rng, paths, amount).into_vec();
    indices.sort_unstable();
    indices
}

/// Full trajectory (one value per year) for each selected path.
pub fn sample_trajectories(result: &SimulationResult, indices: &[usize]) -> Vec<Vec<f64>> {
    indices
        .iter()
        .map(|&path| (0..result.years()).map(|year| result.value(year, path)).collect())
        .collect()
}

/// Median plus symmetric percentile band across the selected paths,
/// computed per year. An empty `indices` slice means the full path set.
pub fn trajectory_band(
    result: &SimulationResult,
    indices: &[usize],
    lower_rank: u32,
    upper_rank: u32,
) -> TrajectoryBand {
    let years = result.years();
    let mut band = TrajectoryBand {
        lower_rank,
        upper_rank,
        median: Vec::with_capacity(years),
        lower: Vec::with_capacity(years),
        upper: Vec::with_capacity(years),
    };

    let mut scratch = Vec::new();
    for year in 0..years {
        let row = result.year_values(year);
        scratch.clear();
        if indices.is_empty() {
            scratch.extend_from_slice(row);
        } else {
            scratch.extend(indices.iter().map(|&path| row[path]));
        }
        scratch.sort_by(|a, b| a.total_cmp(b));

        band.lower.push(percentile_sorted(&scratch, lower_rank as f64));
        band.median.push(percentile_sorted(&scratch, 50.0));
        band.upper.push(percentile_sorted(&scratch, upper_rank as f64));
    }

    band
}

/// Linear-interpolation percentile over an unsorted buffer.
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(values, p)
}

fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
