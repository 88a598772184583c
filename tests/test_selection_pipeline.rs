// tests/test_selection_pipeline.rs
// Drawing filter + region selection working over a feature collection,
// including change-notification coalescing across bulk operations

#[cfg(test)]
mod selection_pipeline_tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use symbology::event::ChangeSink;
    use symbology::feature::{Feature, MemoryFeatureSet};
    use symbology::geom::{Envelope, Geometry};
    use symbology::{DrawingFilter, FeatureSource, FilterSpec, Selection, SelectionMode};
    use glam::DVec2;

    struct Counter(Cell<u32>);

    impl ChangeSink for Counter {
        fn on_changed(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    /// Ten unit squares in a row at x = 0, 2, 4, ...
    fn squares(count: usize) -> MemoryFeatureSet {
        init_logs();
        let mut set = MemoryFeatureSet::default();
        for i in 0..count {
            let x = (i * 2) as f64;
            set.push(Feature::new(Geometry::rect(v(x, 0.0), v(x + 1.0, 1.0))));
        }
        set
    }

    #[test]
    fn test_bulk_select_fires_one_change() {
        let source = squares(10);
        let mut filter = DrawingFilter::new(source.len(), 4);
        let counter = Rc::new(Counter(Cell::new(0)));
        filter.set_sink(counter.clone());

        let selection = Selection::new();
        let region = Geometry::rect(v(-1.0, -1.0), v(9.0, 2.0));
        let (changed, affected) = selection.add_region(&mut filter, &source, &region);
        assert!(changed);
        assert_eq!(counter.0.get(), 1);
        assert_eq!(selection.count(&filter), 5);

        // Affected envelope spans exactly the features that flipped.
        assert_eq!(affected.min, v(0.0, 0.0));
        assert_eq!(affected.max, v(9.0, 1.0));
    }

    #[test]
    fn test_noop_region_fires_nothing() {
        let source = squares(4);
        let mut filter = DrawingFilter::new(source.len(), 4);
        let counter = Rc::new(Counter(Cell::new(0)));
        filter.set_sink(counter.clone());

        let selection = Selection::new();
        let region = Geometry::rect(v(100.0, 100.0), v(101.0, 101.0));
        let (changed, affected) = selection.add_region(&mut filter, &source, &region);
        assert!(!changed);
        assert!(affected.is_empty());
        assert_eq!(counter.0.get(), 0);
    }

    #[test]
    fn test_remove_region_only_touches_selected() {
        let source = squares(6);
        let mut filter = DrawingFilter::new(source.len(), 4);
        let selection = Selection::new();
        selection.add_range(&mut filter, [0, 2, 4]);

        // The region spans features 0..=2 but only 0 and 2 are selected.
        let region = Geometry::rect(v(-1.0, -1.0), v(5.5, 2.0));
        let (changed, affected) = selection.remove_region(&mut filter, &source, &region);
        assert!(changed);
        assert_eq!(affected.min, v(0.0, 0.0));
        assert_eq!(affected.max, v(5.0, 1.0));
        let remaining: Vec<usize> = selection.indices(&filter).collect();
        assert_eq!(remaining, vec![4]);
    }

    #[test]
    fn test_selection_is_independent_of_category_and_visibility() {
        let source = squares(6);
        let mut filter = DrawingFilter::new(source.len(), 4);
        filter.assign_categories(|i| i % 3);
        filter.set_visible(1, false);

        let selection = Selection::new();
        let region = Geometry::rect(v(-1.0, -1.0), v(12.0, 2.0));
        selection.add_region(&mut filter, &source, &region);
        // Hidden features still select; region edits only touch the
        // selection dimension.
        assert_eq!(selection.count(&filter), 6);

        // Category partitions intersect the selection dimension cleanly.
        let spec = FilterSpec::category(0).with_selected(true);
        let in_zero: Vec<usize> = filter.iter_matching(spec).collect();
        assert_eq!(in_zero, vec![0, 3]);
    }

    #[test]
    fn test_partition_key_separates_selected_mirror() {
        let mut filter = DrawingFilter::new(2, 4);
        filter.set_category(0, 3);
        filter.set_category(1, 3);
        filter.set_selected(1, true);
        let a = filter.state(0).unwrap().partition_key();
        let b = filter.state(1).unwrap().partition_key();
        assert_eq!(a, -b);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_resize_preserves_prefix_states() {
        let mut filter = DrawingFilter::new(3, 2);
        filter.set_selected(1, true);
        filter.resize(5);
        assert_eq!(filter.len(), 5);
        assert!(filter.state(1).unwrap().selected);
        assert!(!filter.state(4).unwrap().selected);
        assert_eq!(filter.state(4).unwrap().chunk, 2);
        assert_eq!(filter.num_chunks(), 3);
    }

    #[test]
    fn test_crosses_mode_through_the_pipeline() {
        init_logs();
        let mut set = MemoryFeatureSet::default();
        // A line passing through square territory and one far away.
        set.push(Feature::new(Geometry::Line(vec![v(-1.0, 0.5), v(3.0, 0.5)])));
        set.push(Feature::new(Geometry::Line(vec![v(50.0, 50.0), v(60.0, 50.0)])));
        let mut filter = DrawingFilter::new(set.len(), 4);
        let selection = Selection::with_mode(SelectionMode::Crosses);
        let region = Geometry::rect(v(0.0, 0.0), v(1.0, 1.0));
        selection.add_region(&mut filter, &set, &region);
        let selected: Vec<usize> = selection.indices(&filter).collect();
        assert_eq!(selected, vec![0]);
    }

    #[test]
    fn test_clear_selection() {
        let source = squares(5);
        let mut filter = DrawingFilter::new(source.len(), 4);
        let selection = Selection::new();
        selection.add_range(&mut filter, [1, 3]);
        assert!(selection.clear(&mut filter));
        assert_eq!(selection.count(&filter), 0);
        assert_eq!(selection.envelope(&filter, &source), Envelope::empty());
    }
}
