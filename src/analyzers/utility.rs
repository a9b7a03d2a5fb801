/// Computes the arithmetic mean of a total over `count` samples. Returns 0.0 when `count` is 0.
pub fn mean(total: u128, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

/// Computes the `q`-th quantile (0.0–1.0) of ascending-sorted samples.
///
/// Uses linear interpolation between the order statistics around
/// `q * (n - 1)`, the same rule as numpy's default `percentile`.
/// Returns `None` for empty input.
pub fn percentile(sorted: &[u64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    let low = sorted[lo] as f64;
    let high = sorted[hi] as f64;
    Some(low + (high - low) * (rank - lo as f64))
}
