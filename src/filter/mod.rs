//! Drawn states and the multi-dimensional drawing filter.
//!
//! The filter keeps exactly one [`DrawnState`] per feature index and answers
//! membership queries along four independent dimensions (category, chunk,
//! selection, visibility) without materializing the cross-product. Region
//! driven selection edits live here too; the [`selection`] module layers
//! the fixed selection specialization on top.
//!
//! Single-threaded by design: enumeration concurrent with mutation is the
//! caller's obligation to exclude.

pub mod selection;

pub use selection::{Selection, SelectionMode};

use crate::event::{ChangeSink, Changeable};
use crate::feature::FeatureSource;
use crate::geom::{Envelope, Geometry};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Per-feature render state tuple.
///
/// Equality covers all four fields; the hash deliberately folds only
/// `(category, selected)` so states bucket by render partition, trading
/// collisions on visibility for a cheaper key. `partition_key` exposes the
/// same fold directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnState {
    pub category: usize,
    pub selected: bool,
    pub visible: bool,
    pub chunk: i32,
}

impl Hash for DrawnState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.partition_key().hash(state);
    }
}

impl DrawnState {
    /// Default state for a fresh feature: unselected, visible, default
    /// (first) category.
    pub fn default_for(index: usize, chunk_size: usize) -> Self {
        Self {
            category: 0,
            selected: false,
            visible: true,
            chunk: (index / chunk_size.max(1)) as i32,
        }
    }

    /// Render-partition key: category folded with the selection flag.
    pub fn partition_key(&self) -> i64 {
        let base = self.category as i64 + 1;
        if self.selected {
            -base
        } else {
            base
        }
    }
}

/// Which dimensions an iteration constrains. `None` leaves a dimension
/// inactive (matches everything).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterSpec {
    pub category: Option<usize>,
    pub selected: Option<bool>,
    pub visible: Option<bool>,
    pub chunk: Option<i32>,
}

impl FilterSpec {
    /// All dimensions inactive: matches every feature.
    pub fn all() -> Self {
        Self::default()
    }

    /// The selection specialization: selection dimension only.
    pub fn selection(selected: bool) -> Self {
        Self {
            selected: Some(selected),
            ..Self::default()
        }
    }

    pub fn category(category: usize) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_chunk(mut self, chunk: i32) -> Self {
        self.chunk = Some(chunk);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn matches(&self, state: &DrawnState) -> bool {
        self.category.map_or(true, |c| state.category == c)
            && self.selected.map_or(true, |s| state.selected == s)
            && self.visible.map_or(true, |v| state.visible == v)
            && self.chunk.map_or(true, |k| state.chunk == k)
    }
}

/// One drawn state per feature index, plus the change-coalescing machinery
/// every mutator runs under.
pub struct DrawingFilter {
    states: Vec<DrawnState>,
    chunk_size: usize,
    changeable: Changeable,
}

impl std::fmt::Debug for DrawingFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingFilter")
            .field("len", &self.states.len())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl DrawingFilter {
    /// A filter for `count` features split into chunks of `chunk_size`.
    pub fn new(count: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            states: (0..count)
                .map(|i| DrawnState::default_for(i, chunk_size))
                .collect(),
            chunk_size,
            changeable: Changeable::default(),
        }
    }

    pub fn set_sink(&self, sink: Rc<dyn ChangeSink>) {
        self.changeable.set_sink(sink);
    }

    pub fn suspend_changes(&self) {
        self.changeable.suspend_changes();
    }

    pub fn resume_changes(&self) {
        self.changeable.resume_changes();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn num_chunks(&self) -> usize {
        self.states.len().div_ceil(self.chunk_size)
    }

    /// Track the owning collection's size: new indices get the default
    /// state, truncation drops trailing states. Invariant: every feature
    /// index has exactly one state at all times.
    pub fn resize(&mut self, count: usize) {
        if count == self.states.len() {
            return;
        }
        if count < self.states.len() {
            self.states.truncate(count);
        } else {
            for i in self.states.len()..count {
                self.states.push(DrawnState::default_for(i, self.chunk_size));
            }
        }
        self.changeable.on_changed();
    }

    pub fn state(&self, index: usize) -> Option<&DrawnState> {
        self.states.get(index)
    }

    /// Route every feature through the scheme's categorizer. One coalesced
    /// change for the whole pass.
    pub fn assign_categories(&mut self, categorize: impl Fn(usize) -> usize) {
        self.changeable.suspend_changes();
        let mut moved = false;
        for (i, state) in self.states.iter_mut().enumerate() {
            let category = categorize(i);
            if state.category != category {
                state.category = category;
                moved = true;
            }
        }
        if moved {
            self.changeable.on_changed();
        }
        self.changeable.resume_changes();
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        self.set_state_field(index, |s| {
            if s.selected == selected {
                false
            } else {
                s.selected = selected;
                true
            }
        })
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        self.set_state_field(index, |s| {
            if s.visible == visible {
                false
            } else {
                s.visible = visible;
                true
            }
        })
    }

    pub fn set_category(&mut self, index: usize, category: usize) -> bool {
        self.set_state_field(index, |s| {
            if s.category == category {
                false
            } else {
                s.category = category;
                true
            }
        })
    }

    fn set_state_field(&mut self, index: usize, edit: impl FnOnce(&mut DrawnState) -> bool) -> bool {
        let Some(state) = self.states.get_mut(index) else {
            return false;
        };
        if edit(state) {
            self.changeable.on_changed();
            true
        } else {
            false
        }
    }

    /// Lazy, restartable iteration of the indices matching `spec`. Bounded
    /// by the collection size; safe to restart at any time.
    pub fn iter_matching(&self, spec: FilterSpec) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(move |(_, s)| spec.matches(s))
            .map(|(i, _)| i)
    }

    pub fn count_matching(&self, spec: FilterSpec) -> usize {
        self.iter_matching(spec).count()
    }

    /// Bulk selection edit by explicit index list. The whole loop runs under
    /// one suspend bracket: one notification no matter how many states move.
    /// Returns true when anything changed.
    pub fn select_range(&mut self, indices: impl IntoIterator<Item = usize>, selected: bool) -> bool {
        self.changeable.suspend_changes();
        let mut changed = false;
        for index in indices {
            if let Some(state) = self.states.get_mut(index) {
                if state.selected != selected {
                    state.selected = selected;
                    changed = true;
                }
            }
        }
        if changed {
            self.changeable.on_changed();
        }
        self.changeable.resume_changes();
        changed
    }

    /// Region-driven selection edit. For every feature whose geometry
    /// relates to `region` per `mode`, apply `op`; extent modes test the
    /// feature envelope, full modes the true geometry. Runs inside one
    /// suspend bracket; returns whether anything changed plus the union of
    /// envelopes of the features whose state actually changed.
    pub fn apply_region(
        &mut self,
        source: &dyn FeatureSource,
        region: &Geometry,
        mode: SelectionMode,
        op: RegionOp,
    ) -> (bool, Envelope) {
        self.changeable.suspend_changes();
        let mut affected = Envelope::empty();
        let mut changed = false;
        let count = self.states.len().min(source.len());
        for index in 0..count {
            let Some(geometry) = source.geometry(index) else {
                continue;
            };
            if !mode.evaluate(geometry, region) {
                continue;
            }
            let state = &mut self.states[index];
            let target = match op {
                RegionOp::Select => true,
                RegionOp::Unselect => false,
                RegionOp::Invert => !state.selected,
            };
            if state.selected != target {
                state.selected = target;
                changed = true;
                affected.expand_to_include(&geometry.envelope());
            }
        }
        if changed {
            log::debug!("region {:?} changed selection, affected {:?}", op, affected);
            self.changeable.on_changed();
        }
        self.changeable.resume_changes();
        (changed, affected)
    }
}

/// Selection edit applied by `apply_region`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOp {
    Select,
    Unselect,
    Invert,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, MemoryFeatureSet};
    use glam::DVec2;
    use std::cell::Cell;

    struct Counter(Cell<u32>);

    impl ChangeSink for Counter {
        fn on_changed(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn grid_source(n: usize) -> MemoryFeatureSet {
        let mut set = MemoryFeatureSet::default();
        for i in 0..n {
            set.push(Feature::new(Geometry::Point(DVec2::new(i as f64, 0.0))));
        }
        set
    }

    #[test]
    fn test_default_state() {
        let filter = DrawingFilter::new(10, 4);
        let state = filter.state(7).unwrap();
        assert!(!state.selected);
        assert!(state.visible);
        assert_eq!(state.category, 0);
        assert_eq!(state.chunk, 1);
        assert_eq!(filter.num_chunks(), 3);
    }

    #[test]
    fn test_partition_key_folds_category_and_selection() {
        let mut a = DrawnState::default_for(0, 1);
        let mut b = a;
        b.visible = false;
        // Visibility is excluded from the partition on purpose.
        assert_eq!(a.partition_key(), b.partition_key());
        assert_ne!(a, b);

        b.visible = true;
        b.selected = true;
        assert_ne!(a.partition_key(), b.partition_key());

        a.category = 3;
        a.selected = true;
        assert_eq!(a.partition_key(), -4);
    }

    #[test]
    fn test_resize_keeps_one_state_per_index() {
        let mut filter = DrawingFilter::new(3, 100);
        filter.set_selected(2, true);
        filter.resize(6);
        assert_eq!(filter.len(), 6);
        assert!(filter.state(2).unwrap().selected);
        assert!(!filter.state(5).unwrap().selected);
        filter.resize(2);
        assert_eq!(filter.len(), 2);
        assert!(filter.state(2).is_none());
    }

    #[test]
    fn test_iter_matching_dimensions() {
        let mut filter = DrawingFilter::new(8, 4);
        filter.set_selected(1, true);
        filter.set_selected(5, true);
        filter.set_visible(5, false);
        filter.set_category(2, 1);

        let selected: Vec<usize> = filter.iter_matching(FilterSpec::selection(true)).collect();
        assert_eq!(selected, vec![1, 5]);

        let selected_visible: Vec<usize> = filter
            .iter_matching(FilterSpec::selection(true).with_visible(true))
            .collect();
        assert_eq!(selected_visible, vec![1]);

        let chunk0: Vec<usize> = filter
            .iter_matching(FilterSpec::all().with_chunk(0))
            .collect();
        assert_eq!(chunk0, vec![0, 1, 2, 3]);

        let cat1: Vec<usize> = filter.iter_matching(FilterSpec::category(1)).collect();
        assert_eq!(cat1, vec![2]);

        // Restartable: a second pass sees the same sequence.
        let spec = FilterSpec::selection(true);
        let again: Vec<usize> = filter.iter_matching(spec).collect();
        assert_eq!(again, selected);
    }

    #[test]
    fn test_select_range_fires_once() {
        let counter = Rc::new(Counter(Cell::new(0)));
        let mut filter = DrawingFilter::new(100, 10);
        filter.set_sink(counter.clone());

        assert!(filter.select_range(0..50, true));
        assert_eq!(counter.0.get(), 1);
        assert_eq!(filter.count_matching(FilterSpec::selection(true)), 50);

        // Re-selecting the same features changes nothing and stays silent.
        assert!(!filter.select_range(0..50, true));
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn test_apply_region_selects_and_reports_envelope() {
        let source = grid_source(10);
        let counter = Rc::new(Counter(Cell::new(0)));
        let mut filter = DrawingFilter::new(source.len(), 100);
        filter.set_sink(counter.clone());

        let region = Geometry::rect(DVec2::new(2.5, -1.0), DVec2::new(6.5, 1.0));
        let (changed, affected) =
            filter.apply_region(&source, &region, SelectionMode::IntersectsExtent, RegionOp::Select);
        assert!(changed);
        assert_eq!(counter.0.get(), 1);
        let selected: Vec<usize> = filter.iter_matching(FilterSpec::selection(true)).collect();
        assert_eq!(selected, vec![3, 4, 5, 6]);
        assert_eq!(affected.min, DVec2::new(3.0, 0.0));
        assert_eq!(affected.max, DVec2::new(6.0, 0.0));
    }

    #[test]
    fn test_apply_region_no_change_is_silent_and_empty() {
        let source = grid_source(4);
        let counter = Rc::new(Counter(Cell::new(0)));
        let mut filter = DrawingFilter::new(source.len(), 100);
        filter.set_sink(counter.clone());

        let region = Geometry::rect(DVec2::new(50.0, 50.0), DVec2::new(60.0, 60.0));
        let (changed, affected) =
            filter.apply_region(&source, &region, SelectionMode::IntersectsExtent, RegionOp::Select);
        assert!(!changed);
        assert!(affected.is_empty());
        assert_eq!(counter.0.get(), 0);
    }

    #[test]
    fn test_assign_categories_coalesces() {
        let counter = Rc::new(Counter(Cell::new(0)));
        let mut filter = DrawingFilter::new(10, 100);
        filter.set_sink(counter.clone());
        filter.assign_categories(|i| i % 3);
        assert_eq!(counter.0.get(), 1);
        assert_eq!(filter.state(4).unwrap().category, 1);
        // Identical assignment: silent.
        filter.assign_categories(|i| i % 3);
        assert_eq!(counter.0.get(), 1);
    }
}
