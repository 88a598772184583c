//! Colors, bi-value gradients, and multi-stop color ramps.
//!
//! Bi-value interpolation drives continuous-color categories; ramps assign
//! one color per category when a scheme is applied.

use crate::error::{SymbologyError, SymbologyResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba([r, g, b, a])
    }

    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    /// Conventional selection highlight (cyan).
    pub const SELECTION: Rgba = Rgba::rgb(0, 255, 255);

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> SymbologyResult<Self> {
        let trimmed = hex.trim().trim_start_matches('#');
        if trimmed.len() != 6 && trimmed.len() != 8 {
            return Err(SymbologyError::invalid_argument(format!(
                "color must be #RRGGBB or #RRGGBBAA, got: #{}",
                trimmed
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&trimmed[range], 16).map_err(|e| {
                SymbologyError::invalid_argument(format!("invalid hex color '{}': {}", hex, e))
            })
        };
        let r = channel(0..2)?;
        let g = channel(2..4)?;
        let b = channel(4..6)?;
        let a = if trimmed.len() == 8 { channel(6..8)? } else { 255 };
        Ok(Rgba([r, g, b, a]))
    }

    /// Format as `#RRGGBB` (alpha 255) or `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }

    /// Per-channel linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
            mix(self.0[3], other.0[3]),
        ])
    }
}

/// How a bi-value category maps a value fraction onto its color span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientModel {
    #[default]
    Linear,
    /// Squared fraction: higher values are weighted more heavily.
    Exponential,
    /// Log-compressed fraction: de-emphasizes large values.
    Logarithmic,
}

impl GradientModel {
    /// Map a raw fraction in [0, 1] to the interpolation parameter.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            GradientModel::Linear => t,
            GradientModel::Exponential => t * t,
            GradientModel::Logarithmic => (1.0 + 9.0 * t).ln() / 10f64.ln(),
        }
    }
}

/// Continuous color span between two endpoint colors over a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiValueColor {
    pub low_color: Rgba,
    pub high_color: Rgba,
    pub gradient_model: GradientModel,
}

impl Default for BiValueColor {
    fn default() -> Self {
        Self {
            low_color: Rgba::WHITE,
            high_color: Rgba::WHITE,
            gradient_model: GradientModel::Linear,
        }
    }
}

impl BiValueColor {
    pub fn new(low: Rgba, high: Rgba, model: GradientModel) -> Self {
        Self {
            low_color: low,
            high_color: high,
            gradient_model: model,
        }
    }

    /// True only when the endpoints differ; a single-color category is not
    /// bi-value.
    pub fn is_bivalue(&self) -> bool {
        self.low_color != self.high_color
    }

    /// Collapse to a single color (bi-value off).
    pub fn set_single(&mut self, color: Rgba) {
        self.low_color = color;
        self.high_color = color;
    }

    /// Interpolate for `value` in `[low, high]`. Values at or below `low`
    /// return exactly `low_color`; at or above `high`, exactly `high_color`.
    /// A degenerate range (`high <= low`) always yields `low_color`.
    pub fn calculate_color(&self, value: f64, low: f64, high: f64) -> Rgba {
        if !self.is_bivalue() || high <= low {
            return self.low_color;
        }
        if value <= low {
            return self.low_color;
        }
        if value >= high {
            return self.high_color;
        }
        let t = self.gradient_model.apply((value - low) / (high - low));
        self.low_color.lerp(self.high_color, t)
    }
}

/// Multi-stop color ramp with piecewise-linear lookup.
///
/// Stops are sorted by position on construction; lookups outside the stop
/// range clamp to the endpoint colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgba)>,
}

impl ColorRamp {
    /// Build a ramp from `(position, color)` stops. At least two stops with
    /// finite positions are required.
    pub fn from_stops(stops: Vec<(f64, Rgba)>) -> SymbologyResult<Self> {
        if stops.len() < 2 {
            return Err(SymbologyError::invalid_argument(
                "color ramp needs at least two stops",
            ));
        }
        if stops.iter().any(|(pos, _)| !pos.is_finite()) {
            return Err(SymbologyError::invalid_argument(
                "color ramp stop positions must be finite",
            ));
        }
        let mut sorted = stops;
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(Self { stops: sorted })
    }

    /// Two-color convenience ramp over [0, 1].
    pub fn two_color(low: Rgba, high: Rgba) -> Self {
        Self {
            stops: vec![(0.0, low), (1.0, high)],
        }
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Sample the ramp at `position`.
    pub fn color_at(&self, position: f64) -> Rgba {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if position <= first.0 {
            return first.1;
        }
        if position >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if position >= p0 && position <= p1 {
                let t = if p1 > p0 { (position - p0) / (p1 - p0) } else { 0.0 };
                return c0.lerp(c1, t);
            }
        }
        last.1
    }

    /// Evenly sample `count` colors across the ramp, one per category.
    pub fn sample(&self, count: usize) -> Vec<Rgba> {
        if count == 0 {
            return Vec::new();
        }
        if count == 1 {
            return vec![self.color_at(self.stops[0].0)];
        }
        let lo = self.stops[0].0;
        let hi = self.stops[self.stops.len() - 1].0;
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                self.color_at(lo + t * (hi - lo))
            })
            .collect()
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        // Light-to-dark blue, a serviceable default for choropleths.
        Self::two_color(Rgba::rgb(0xde, 0xeb, 0xf7), Rgba::rgb(0x08, 0x51, 0x9c))
    }
}
