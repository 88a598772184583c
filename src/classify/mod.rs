//! Classification / break engine.
//!
//! Turns a numeric sample (feature attribute values or raster cells) into an
//! ordered set of class boundaries. Methods: equal interval, quantile,
//! natural breaks (Jenks), standard deviation, geometric progression,
//! defined interval, and manual. Oversized samples are capped by a
//! deterministic random subsample; degenerate samples (empty, or all values
//! equal) classify into a single class instead of erroring.

mod jenks;

pub use jenks::natural_breaks;

use crate::error::{SymbologyError, SymbologyResult};
use serde::{Deserialize, Serialize};

/// Break-placement rule for a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntervalMethod {
    #[default]
    EqualInterval,
    /// Near-equal member counts per class over the sorted sample.
    Quantile,
    /// Jenks optimal partition minimizing within-class squared deviation.
    NaturalBreaks,
    /// Boundaries at `mean + m·σ` steps.
    StdDev,
    /// Boundaries follow a geometric progression between min and max.
    Geometrical,
    /// Fixed numeric step; the class count derives from the range.
    DefinedInterval,
    /// Evenly spaced defaults, individually repositionable by the caller.
    Manual,
}

/// Post-pass applied to each raw boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntervalSnapMethod {
    #[default]
    None,
    /// Snap to the nearest actual sample value.
    DataValue,
    /// Snap to the nearest integer.
    Rounding,
    /// Keep a fixed number of significant figures.
    SignificantFigures,
}

/// Classification parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    /// Requested class count (ignored by DefinedInterval and StdDev, whose
    /// counts derive from the data).
    pub num_breaks: usize,
    pub interval_method: IntervalMethod,
    pub snap_method: IntervalSnapMethod,
    /// Digits kept by `SignificantFigures` snapping.
    pub significant_figures: u32,
    /// Multiple of σ between StdDev boundaries (commonly 1.0 or 0.5).
    pub std_dev_step: f64,
    /// Step for DefinedInterval.
    pub defined_interval: f64,
    /// Samples above this count are randomly (deterministically) thinned.
    pub max_sample_count: usize,
    /// Optional clamp: values below are discarded before classification.
    pub min: Option<f64>,
    /// Optional clamp: values above are discarded before classification.
    pub max: Option<f64>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            num_breaks: 5,
            interval_method: IntervalMethod::EqualInterval,
            snap_method: IntervalSnapMethod::None,
            significant_figures: 3,
            std_dev_step: 1.0,
            defined_interval: 0.0,
            max_sample_count: 10_000,
            min: None,
            max: None,
        }
    }
}

/// One-pass summary statistics over the classified sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl SampleStats {
    /// Compute stats over the finite members of `values`.
    pub fn from_values(values: &[f64]) -> Self {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for &v in values {
            if !v.is_finite() {
                continue;
            }
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
            sum_sq += v * v;
        }
        if count == 0 {
            return Self::default();
        }
        let mean = sum / count as f64;
        let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
        Self {
            count,
            min,
            max,
            sum,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

/// Result of a classification: interior boundaries plus sample stats.
///
/// `breaks.len() + 1` is the class count. A value belongs to class `i` when
/// `breaks[i-1] <= value < breaks[i]`; everything at or above the last break
/// is in the last class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub breaks: Vec<f64>,
    pub stats: SampleStats,
}

impl Classification {
    pub fn num_classes(&self) -> usize {
        self.breaks.len() + 1
    }

    /// Map a value to its class index. Values below the first break land in
    /// class 0, values at or above the last break in the last class.
    pub fn class_index(&self, value: f64) -> usize {
        self.breaks.partition_point(|b| value >= *b)
    }

    /// Per-class `(low, high)` bounds over the sample range.
    pub fn class_bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = Vec::with_capacity(self.num_classes());
        let mut low = self.stats.min;
        for &b in &self.breaks {
            bounds.push((low, b));
            low = b;
        }
        bounds.push((low, self.stats.max));
        bounds
    }
}

/// Classify `values` per `options`.
///
/// Never fails on degenerate data: an empty or constant sample yields a
/// single class. Invalid parameters (zero class count, nonpositive defined
/// interval) are rejected before any work.
pub fn compute_breaks(values: &[f64], options: &ClassifyOptions) -> SymbologyResult<Classification> {
    if options.num_breaks == 0 {
        return Err(SymbologyError::invalid_argument(
            "class count must be at least 1",
        ));
    }
    if options.interval_method == IntervalMethod::DefinedInterval
        && !(options.defined_interval > 0.0)
    {
        return Err(SymbologyError::invalid_argument(format!(
            "defined interval must be positive, got {}",
            options.defined_interval
        )));
    }

    // Drop non-finite values and apply the optional clamp window.
    let mut sample: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .filter(|v| options.min.map_or(true, |lo| *v >= lo))
        .filter(|v| options.max.map_or(true, |hi| *v <= hi))
        .collect();

    if sample.len() > options.max_sample_count && options.max_sample_count > 0 {
        subsample_in_place(&mut sample, options.max_sample_count);
    }

    let stats = SampleStats::from_values(&sample);
    if stats.count == 0 || stats.min == stats.max {
        log::debug!(
            "degenerate sample (count={}, min==max={}), single class",
            stats.count,
            stats.min
        );
        return Ok(Classification {
            breaks: Vec::new(),
            stats,
        });
    }

    sample.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let k = options.num_breaks;
    let mut breaks = match options.interval_method {
        IntervalMethod::EqualInterval | IntervalMethod::Manual => {
            equal_interval(stats.min, stats.max, k)
        }
        IntervalMethod::Quantile => quantile(&sample, k),
        IntervalMethod::NaturalBreaks => natural_breaks(&sample, k),
        IntervalMethod::StdDev => std_dev_breaks(&stats, options.std_dev_step),
        IntervalMethod::Geometrical => geometrical(stats.min, stats.max, k),
        IntervalMethod::DefinedInterval => {
            defined_interval(stats.min, stats.max, options.defined_interval)
        }
    };

    snap_breaks(&mut breaks, options.snap_method, options.significant_figures, &sample);

    Ok(Classification { breaks, stats })
}

fn equal_interval(min: f64, max: f64, k: usize) -> Vec<f64> {
    let width = (max - min) / k as f64;
    (1..k).map(|i| min + i as f64 * width).collect()
}

/// Quantile boundaries over a sorted sample. Duplicate values keep array
/// position order, so heavy ties can leave bucket counts uneven; that is
/// the accepted behavior, not corrected here.
fn quantile(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    (1..k)
        .map(|i| sorted[(i * n / k).min(n - 1)])
        .collect()
}

/// Boundaries at `mean + m·step·σ` strictly inside the sample range.
fn std_dev_breaks(stats: &SampleStats, step: f64) -> Vec<f64> {
    let stride = step.abs() * stats.std_dev;
    if !(stride > 0.0) {
        return Vec::new();
    }
    let mut breaks = Vec::new();
    // Lowest multiple of the stride above min.
    let mut m = ((stats.min - stats.mean) / stride).floor() + 1.0;
    loop {
        let b = stats.mean + m * stride;
        if b >= stats.max {
            break;
        }
        if b > stats.min {
            breaks.push(b);
        }
        m += 1.0;
    }
    breaks
}

/// Geometric-progression boundaries. Domains touching zero or below are
/// shifted into positive territory first, then shifted back.
fn geometrical(min: f64, max: f64, k: usize) -> Vec<f64> {
    let shift = if min > 0.0 { 0.0 } else { 1.0 - min };
    let lo = min + shift;
    let hi = max + shift;
    let ratio = (hi / lo).powf(1.0 / k as f64);
    (1..k).map(|i| lo * ratio.powi(i as i32) - shift).collect()
}

/// Each boundary is computed as `min + i * step` rather than accumulated,
/// so rounding error stays bounded and an integral `(max-min)/step` cannot
/// leave a sliver class just under `max`.
fn defined_interval(min: f64, max: f64, step: f64) -> Vec<f64> {
    (1u32..)
        .map(|i| min + i as f64 * step)
        .take_while(|b| *b < max)
        .collect()
}

fn snap_breaks(breaks: &mut [f64], method: IntervalSnapMethod, sig_figs: u32, sorted: &[f64]) {
    match method {
        IntervalSnapMethod::None => {}
        IntervalSnapMethod::Rounding => {
            for b in breaks.iter_mut() {
                *b = b.round();
            }
        }
        IntervalSnapMethod::SignificantFigures => {
            for b in breaks.iter_mut() {
                *b = round_significant(*b, sig_figs);
            }
        }
        IntervalSnapMethod::DataValue => {
            for b in breaks.iter_mut() {
                *b = nearest_value(sorted, *b);
            }
        }
    }
}

/// Round to `figures` significant digits (minimum 1).
fn round_significant(value: f64, figures: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let figures = figures.max(1) as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(figures - 1 - magnitude);
    (value * scale).round() / scale
}

/// Nearest member of an ascending slice.
fn nearest_value(sorted: &[f64], target: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let idx = sorted.partition_point(|v| *v < target);
    if idx == 0 {
        return sorted[0];
    }
    if idx >= sorted.len() {
        return sorted[sorted.len() - 1];
    }
    let below = sorted[idx - 1];
    let above = sorted[idx];
    if target - below <= above - target {
        below
    } else {
        above
    }
}

/// Thin `sample` to `target` members with a partial Fisher-Yates shuffle
/// driven by a fixed-seed LCG, so the same input always keeps the same
/// subsample and classification stays deterministic.
fn subsample_in_place(sample: &mut Vec<f64>, target: usize) {
    let mut seed: u64 = 0x5DEECE66D;
    let mut next = move || {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (seed >> 33) as usize
    };
    let n = sample.len();
    for i in 0..target {
        let j = i + next() % (n - i);
        sample.swap(i, j);
    }
    sample.truncate(target);
}
