//! Batched feature drawing over the filter partition.
//!
//! Walks a feature collection grouped by drawn-state partition (category ×
//! selection), visible features only, and hands each feature's geometry and
//! resolved symbolizer to the host's [`RenderTarget`]. Draw order is
//! deterministic: categories in scheme order, the selection overlay last.

use crate::color::Rgba;
use crate::feature::FeatureSource;
use crate::filter::{DrawingFilter, FilterSpec};
use crate::geom::Geometry;
use crate::scheme::Scheme;
use crate::symbolizer::{RenderTarget, Symbolizer};

/// Draw every visible feature. Unselected features render in category
/// order; selected features render afterward with the category symbolizer
/// recolored to `selection_color`, so highlights sit on top.
pub fn draw_features(
    target: &mut dyn RenderTarget,
    source: &dyn FeatureSource,
    filter: &DrawingFilter,
    scheme: &Scheme,
    selection_color: Rgba,
) {
    for selected in [false, true] {
        for category in 0..scheme.len().max(1) {
            let spec = FilterSpec::category(category)
                .with_selected(selected)
                .with_visible(true);
            for index in filter.iter_matching(spec) {
                let Some(geometry) = source.geometry(index) else {
                    continue;
                };
                let Some(category) = scheme.get(category) else {
                    continue;
                };
                let symbolizer = if selected {
                    category.symbolizer().highlighted(selection_color)
                } else {
                    category.symbolizer().clone()
                };
                draw_one(target, geometry, &symbolizer);
            }
        }
    }
}

fn draw_one(target: &mut dyn RenderTarget, geometry: &Geometry, symbolizer: &Symbolizer) {
    match (geometry, symbolizer) {
        (Geometry::Point(p), Symbolizer::Point { color, size, shape, .. }) => {
            target.draw_glyph(*p, *shape, *size, *color);
        }
        (Geometry::Line(pts), Symbolizer::Line { color, width, .. }) => {
            target.stroke_path(pts, *color, *width);
        }
        (Geometry::Polygon { outer, holes }, Symbolizer::Polygon { fill, outline }) => {
            target.fill_path(outer, *fill);
            if let Some(outline) = outline {
                target.stroke_path(outer, outline.color, outline.width);
                for hole in holes {
                    target.stroke_path(hole, outline.color, outline.width);
                }
            }
        }
        // Kind mismatches are rejected at assignment; anything arriving
        // here mismatched is skipped rather than drawn wrongly.
        _ => {}
    }
}
