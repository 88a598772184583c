//! Read-only data-source contracts.
//!
//! The symbology core never owns file I/O: feature attribute values,
//! geometries, and raster cells arrive through these accessor traits. An
//! in-memory implementation is provided for hosts and tests.

use crate::geom::{Envelope, Geometry};
use serde_json::{Map, Value};

/// Feature property map, keyed by field name.
pub type Properties = Map<String, Value>;

/// Read-only accessor over an ordered feature collection.
///
/// Indices are dense `0..len()`; the drawing filter relies on that to keep
/// exactly one drawn state per feature.
pub trait FeatureSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn geometry(&self, index: usize) -> Option<&Geometry>;

    fn envelope(&self, index: usize) -> Option<Envelope> {
        self.geometry(index).map(|g| g.envelope())
    }

    /// Numeric attribute value, `None` for missing fields or non-numeric
    /// values.
    fn value(&self, index: usize, field: &str) -> Option<f64>;

    fn properties(&self, index: usize) -> Option<&Properties>;

    /// Union of all feature envelopes.
    fn full_extent(&self) -> Envelope {
        let mut env = Envelope::empty();
        for i in 0..self.len() {
            if let Some(e) = self.envelope(i) {
                env.expand_to_include(&e);
            }
        }
        env
    }

    /// Collect one field as a classification sample, skipping features
    /// where the field is missing or non-numeric.
    fn sample_field(&self, field: &str) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.value(i, field)).collect()
    }
}

/// One feature: a geometry plus its property map.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// In-memory feature collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureSet {
    features: Vec<Feature>,
}

impl MemoryFeatureSet {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn push(&mut self, feature: Feature) -> usize {
        self.features.push(feature);
        self.features.len() - 1
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }
}

impl FeatureSource for MemoryFeatureSet {
    fn len(&self) -> usize {
        self.features.len()
    }

    fn geometry(&self, index: usize) -> Option<&Geometry> {
        self.features.get(index).map(|f| &f.geometry)
    }

    fn value(&self, index: usize, field: &str) -> Option<f64> {
        self.features.get(index)?.properties.get(field)?.as_f64()
    }

    fn properties(&self, index: usize) -> Option<&Properties> {
        self.features.get(index).map(|f| &f.properties)
    }
}

/// Read-only accessor over a raster grid, for cell-value classification.
pub trait RasterSource {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;

    /// Cell value; `None` for no-data cells.
    fn cell(&self, row: usize, col: usize) -> Option<f64>;

    /// Flatten the grid into a classification sample, skipping no-data.
    fn sample_cells(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                if let Some(v) = self.cell(r, c) {
                    out.push(v);
                }
            }
        }
        out
    }
}

/// Dense in-memory raster with an optional no-data marker.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
    no_data: Option<f64>,
}

impl MemoryRaster {
    /// `cells` is row-major and must hold `rows * cols` values.
    pub fn new(rows: usize, cols: usize, cells: Vec<f64>, no_data: Option<f64>) -> crate::error::SymbologyResult<Self> {
        if cells.len() != rows * cols {
            return Err(crate::error::SymbologyError::invalid_argument(format!(
                "raster cell count {} does not match {}x{}",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(Self {
            rows,
            cols,
            cells,
            no_data,
        })
    }
}

impl RasterSource for MemoryRaster {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn cell(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let v = self.cells[row * self.cols + col];
        if Some(v) == self.no_data || !v.is_finite() {
            None
        } else {
            Some(v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn point_set() -> MemoryFeatureSet {
        let mut set = MemoryFeatureSet::default();
        for i in 0..5 {
            set.push(
                Feature::new(Geometry::Point(DVec2::new(i as f64, 0.0)))
                    .with_property("VALUE", i * 10),
            );
        }
        set
    }

    #[test]
    fn test_sample_field_skips_missing_values() {
        let mut set = point_set();
        set.push(Feature::new(Geometry::Point(DVec2::ZERO)).with_property("OTHER", 1));
        let sample = set.sample_field("VALUE");
        assert_eq!(sample, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_full_extent_spans_all_features() {
        let set = point_set();
        let env = set.full_extent();
        assert_eq!(env.min, DVec2::new(0.0, 0.0));
        assert_eq!(env.max, DVec2::new(4.0, 0.0));
    }

    #[test]
    fn test_raster_no_data_and_bounds() {
        let raster = MemoryRaster::new(2, 3, vec![1.0, -9999.0, 3.0, 4.0, 5.0, 6.0], Some(-9999.0)).unwrap();
        assert_eq!(raster.cell(0, 1), None);
        assert_eq!(raster.cell(1, 2), Some(6.0));
        assert_eq!(raster.cell(5, 0), None);
        assert_eq!(raster.sample_cells(), vec![1.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_raster_rejects_mismatched_dimensions() {
        assert!(MemoryRaster::new(2, 2, vec![1.0; 3], None).is_err());
    }
}
