//! Region-based selection on top of the drawing filter.
//!
//! [`Selection`] is the filter specialization fixed to the selection
//! dimension (category, visibility, and chunk dimensions off), with a
//! default mode of `IntersectsExtent`. All region operations delegate to
//! [`DrawingFilter::apply_region`], inheriting its one-notification
//! guarantee.

use super::{DrawingFilter, FilterSpec, RegionOp};
use crate::feature::FeatureSource;
use crate::geom::{self, Envelope, Geometry};
use serde::{Deserialize, Serialize};

/// Geometric relation a feature must have to the selection region.
///
/// The feature is the subject: `Within` selects features within the region,
/// `Contains` features that contain it. The two extent modes are the cheap
/// variants, evaluated on envelopes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    Contains,
    /// Region envelope contains the feature envelope.
    ContainsExtent,
    CoveredBy,
    Covers,
    Crosses,
    Disjoint,
    Intersects,
    /// Feature envelope intersects the region envelope.
    #[default]
    IntersectsExtent,
    Overlaps,
    Touches,
    Within,
}

impl SelectionMode {
    /// Evaluate the relation of `feature` to `region`.
    pub fn evaluate(&self, feature: &Geometry, region: &Geometry) -> bool {
        match self {
            SelectionMode::IntersectsExtent => {
                feature.envelope().intersects(&region.envelope())
            }
            SelectionMode::ContainsExtent => {
                region.envelope().contains_envelope(&feature.envelope())
            }
            SelectionMode::Intersects => geom::intersects(feature, region),
            SelectionMode::Disjoint => geom::disjoint(feature, region),
            SelectionMode::Contains => geom::contains(feature, region),
            SelectionMode::Covers => geom::covers(feature, region),
            SelectionMode::Within => geom::contains(region, feature),
            SelectionMode::CoveredBy => geom::covers(region, feature),
            SelectionMode::Crosses => geom::crosses(feature, region),
            SelectionMode::Touches => geom::touches(feature, region),
            SelectionMode::Overlaps => geom::overlaps(feature, region),
        }
    }
}

/// The selection view over a drawing filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    pub mode: SelectionMode,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: SelectionMode) -> Self {
        Self { mode }
    }

    /// The fixed filter specialization: selection dimension only.
    pub fn spec(&self) -> FilterSpec {
        FilterSpec::selection(true)
    }

    /// Select every feature matching the region. Returns whether anything
    /// changed and the envelope of the features that did.
    pub fn add_region(
        &self,
        filter: &mut DrawingFilter,
        source: &dyn FeatureSource,
        region: &Geometry,
    ) -> (bool, Envelope) {
        filter.apply_region(source, region, self.mode, RegionOp::Select)
    }

    /// Symmetric unselect.
    pub fn remove_region(
        &self,
        filter: &mut DrawingFilter,
        source: &dyn FeatureSource,
        region: &Geometry,
    ) -> (bool, Envelope) {
        filter.apply_region(source, region, self.mode, RegionOp::Unselect)
    }

    /// Toggle selection for every feature matching the region.
    pub fn invert_region(
        &self,
        filter: &mut DrawingFilter,
        source: &dyn FeatureSource,
        region: &Geometry,
    ) -> (bool, Envelope) {
        filter.apply_region(source, region, self.mode, RegionOp::Invert)
    }

    /// Layer-level convenience: invert against the full extent of the
    /// collection.
    pub fn invert_all(
        &self,
        filter: &mut DrawingFilter,
        source: &dyn FeatureSource,
    ) -> (bool, Envelope) {
        let extent = source.full_extent();
        if extent.is_empty() {
            return (false, Envelope::empty());
        }
        self.invert_region(filter, source, &extent.to_polygon())
    }

    pub fn add_range(
        &self,
        filter: &mut DrawingFilter,
        indices: impl IntoIterator<Item = usize>,
    ) -> bool {
        filter.select_range(indices, true)
    }

    pub fn remove_range(
        &self,
        filter: &mut DrawingFilter,
        indices: impl IntoIterator<Item = usize>,
    ) -> bool {
        filter.select_range(indices, false)
    }

    /// Clear the whole selection.
    pub fn clear(&self, filter: &mut DrawingFilter) -> bool {
        let all: Vec<usize> = filter.iter_matching(self.spec()).collect();
        filter.select_range(all, false)
    }

    /// Currently selected indices, in index order.
    pub fn indices<'f>(&self, filter: &'f DrawingFilter) -> impl Iterator<Item = usize> + 'f {
        filter.iter_matching(self.spec())
    }

    pub fn count(&self, filter: &DrawingFilter) -> usize {
        filter.count_matching(self.spec())
    }

    /// Union of envelopes of the selected features.
    pub fn envelope(&self, filter: &DrawingFilter, source: &dyn FeatureSource) -> Envelope {
        let mut env = Envelope::empty();
        for index in self.indices(filter) {
            if let Some(e) = source.envelope(index) {
                env.expand_to_include(&e);
            }
        }
        env
    }
}
