//! Jenks natural-breaks optimal partition.
//!
//! Classic Jenks-Fisher dynamic program over a sorted sample: minimizes the
//! within-class sum of squared deviations from class means across `k`
//! classes. O(n²·k) time, O(n·k) space; callers cap `n` via sampling before
//! invoking this.

/// Compute the `k - 1` interior break values for `k` natural-breaks classes.
///
/// `sorted` must be ascending and non-empty. Each returned break is the
/// lowest member of the class above it, so a value belongs to class `i`
/// when `breaks[i - 1] <= value < breaks[i]`.
pub fn natural_breaks(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    if k <= 1 || n == 0 {
        return Vec::new();
    }
    if k >= n {
        // Every value its own class; breaks at each distinct step up.
        return sorted[1..].to_vec();
    }

    // lower_limit[i][j]: index (1-based into the sorted sample) of the
    // lowest member of class j for an optimal partition of the first i
    // values. variance[i][j]: the corresponding optimal cost. Flat row-major
    // (n + 1) x (k + 1) matrices.
    let cols = k + 1;
    let mut lower_limit = vec![0usize; (n + 1) * cols];
    let mut variance = vec![f64::INFINITY; (n + 1) * cols];

    for j in 1..=k {
        lower_limit[cols + j] = 1;
        variance[cols + j] = 0.0;
    }

    for i in 2..=n {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        // Walk the candidate lowest class member m from i down to 1,
        // accumulating the trailing class [m..=i] cost incrementally.
        for offset in 1..=i {
            let m = i - offset + 1;
            let value = sorted[m - 1];
            sum += value;
            sum_sq += value * value;
            let count = offset as f64;
            let cost = sum_sq - (sum * sum) / count;

            if m > 1 {
                for j in 2..=k {
                    let candidate = variance[(m - 1) * cols + (j - 1)] + cost;
                    if candidate < variance[i * cols + j] {
                        variance[i * cols + j] = candidate;
                        lower_limit[i * cols + j] = m;
                    }
                }
            }
        }
        // One class covering everything seen so far.
        lower_limit[i * cols + 1] = 1;
        variance[i * cols + 1] = sum_sq - (sum * sum) / i as f64;
    }

    // Backtrack class lower limits from the full sample.
    let mut breaks = vec![0.0; k - 1];
    let mut upper = n;
    for j in (2..=k).rev() {
        let lower = lower_limit[upper * cols + j];
        breaks[j - 2] = sorted[lower - 1];
        upper = lower - 1;
    }
    breaks
}
