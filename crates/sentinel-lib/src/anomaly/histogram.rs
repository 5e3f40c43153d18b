//! Time-bin histograms and dispersion statistics

/// Count events per fixed-width bin across `[start_time, end_time]`
///
/// Bins are walked from `start_time` in steps of `bin_seconds`; each bin
/// counts timestamps with `min <= t <= max`, and the walk stops once the
/// advanced upper edge passes `end_time`. Both bin edges are inclusive, so a
/// timestamp sitting exactly on a shared edge is counted in both adjacent
/// bins. That matches how notification thresholds were tuned in production
/// and is kept rather than normalized to half-open bins.
pub fn bin_counts(timestamps: &[i64], start_time: i64, end_time: i64, bin_seconds: i64) -> Vec<u64> {
    assert!(bin_seconds > 0, "bin width must be positive");

    let mut distribution = Vec::new();
    let mut min = start_time;
    let mut max = start_time + bin_seconds;

    loop {
        distribution.push(count_in_range(timestamps, min, max));
        min = max;
        max += bin_seconds;
        if max > end_time {
            break;
        }
    }

    distribution
}

/// Sample standard deviation of the bin counts
///
/// Returns `None` for fewer than two bins, where the statistic is undefined.
pub fn sample_std_dev(counts: &[u64]) -> Option<f64> {
    if counts.len() < 2 {
        return None;
    }

    let n = counts.len() as f64;
    let mean = counts.iter().sum::<u64>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    Some(variance.sqrt())
}

fn count_in_range(timestamps: &[i64], min: i64, max: i64) -> u64 {
    timestamps.iter().filter(|&&t| min <= t && t <= max).count() as u64
}
