//! Render-style model and the render-target contract.
//!
//! Symbolizers are plain data handed to an external drawing surface; the
//! core never rasterizes. The [`RenderTarget`] trait is the narrow seam a
//! host implements with whatever 2D API it has.

use crate::color::Rgba;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Geometry family a symbolizer (and its category) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    Raster,
}

/// Glyph shape for point features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
}

/// Stroke applied around a filled shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub color: Rgba,
    pub width: f64,
}

impl Default for Outline {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            width: 1.0,
        }
    }
}

/// Render style for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Symbolizer {
    Point {
        color: Rgba,
        size: f64,
        shape: PointShape,
        outline: Option<Outline>,
    },
    Line {
        color: Rgba,
        width: f64,
        /// Dash pattern in device-independent units; `None` is solid.
        dash: Option<Vec<f64>>,
    },
    Polygon {
        fill: Rgba,
        outline: Option<Outline>,
    },
    Raster {
        /// 0 transparent, 1 opaque.
        opacity: f64,
    },
}

impl Symbolizer {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Symbolizer::Point { .. } => GeometryKind::Point,
            Symbolizer::Line { .. } => GeometryKind::Line,
            Symbolizer::Polygon { .. } => GeometryKind::Polygon,
            Symbolizer::Raster { .. } => GeometryKind::Raster,
        }
    }

    /// Plain default style for a geometry family, in the given color.
    pub fn default_for(kind: GeometryKind, color: Rgba) -> Self {
        match kind {
            GeometryKind::Point => Symbolizer::Point {
                color,
                size: 4.0,
                shape: PointShape::default(),
                outline: Some(Outline::default()),
            },
            GeometryKind::Line => Symbolizer::Line {
                color,
                width: 1.0,
                dash: None,
            },
            GeometryKind::Polygon => Symbolizer::Polygon {
                fill: color,
                outline: Some(Outline::default()),
            },
            GeometryKind::Raster => Symbolizer::Raster { opacity: 1.0 },
        }
    }

    /// Dominant color of the style (fill for polygons); raster styles have
    /// none.
    pub fn primary_color(&self) -> Option<Rgba> {
        match self {
            Symbolizer::Point { color, .. } | Symbolizer::Line { color, .. } => Some(*color),
            Symbolizer::Polygon { fill, .. } => Some(*fill),
            Symbolizer::Raster { .. } => None,
        }
    }

    /// Copy of this style recolored for selection highlighting.
    pub fn highlighted(&self, highlight: Rgba) -> Self {
        let mut copy = self.clone();
        match &mut copy {
            Symbolizer::Point { color, .. } | Symbolizer::Line { color, .. } => *color = highlight,
            Symbolizer::Polygon { fill, .. } => *fill = highlight,
            Symbolizer::Raster { .. } => {}
        }
        copy
    }
}

/// Drawing surface contract. Coordinates are device-independent; the host
/// owns all transforms and rasterization.
pub trait RenderTarget {
    fn fill_path(&mut self, path: &[DVec2], color: Rgba);
    fn stroke_path(&mut self, path: &[DVec2], color: Rgba, width: f64);
    fn draw_glyph(&mut self, at: DVec2, shape: PointShape, size: f64, color: Rgba);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbolizer_matches_kind() {
        for kind in [
            GeometryKind::Point,
            GeometryKind::Line,
            GeometryKind::Polygon,
            GeometryKind::Raster,
        ] {
            assert_eq!(Symbolizer::default_for(kind, Rgba::BLACK).kind(), kind);
        }
    }

    #[test]
    fn test_highlight_recolors_primary() {
        let sym = Symbolizer::default_for(GeometryKind::Polygon, Rgba::rgb(1, 2, 3));
        let hi = sym.highlighted(Rgba::SELECTION);
        assert_eq!(hi.primary_color(), Some(Rgba::SELECTION));
        // Outline is untouched.
        match hi {
            Symbolizer::Polygon { outline, .. } => assert_eq!(outline, Some(Outline::default())),
            _ => panic!("kind changed"),
        }
    }
}
