//! Categories and classification schemes.
//!
//! A scheme owns an ordered category collection plus the editor settings
//! that drive reclassification. The collection maintains each category's
//! back-reference (its position in the owning scheme) inside its own
//! add/insert/remove operations, and every bulk mutation runs under one
//! suspend/resume bracket so observers see a single coalesced change.

use crate::classify::{compute_breaks, Classification, ClassifyOptions, IntervalMethod, SampleStats};
use crate::color::{BiValueColor, ColorRamp, GradientModel, Rgba};
use crate::error::{SymbologyError, SymbologyResult};
use crate::event::{ChangeSink, Changeable};
use crate::expr;
use crate::persist::{FromPropertyBag, PropertyBag, ToPropertyBag};
use crate::symbolizer::{GeometryKind, Symbolizer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

/// One classification bucket: render style, legend text, and the predicate
/// or numeric range that routes features into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub legend_text: String,
    symbolizer: Symbolizer,
    /// Attribute predicate in array-expression form.
    pub filter_expression: Option<Value>,
    /// Numeric value range `[low, high)`; `high` inclusive when
    /// `max_inclusive` (the last category of a scheme).
    pub range: Option<(f64, f64)>,
    pub max_inclusive: bool,
    /// Continuous-color span for bi-value rendering.
    pub color: BiValueColor,
    /// Position within the owning scheme. Non-owning back-reference,
    /// maintained by the scheme's collection operations; `None` while
    /// detached.
    position: Option<usize>,
}

impl Category {
    pub fn new(kind: GeometryKind, name: impl Into<String>, color: Rgba) -> Self {
        let name = name.into();
        let mut bivalue = BiValueColor::default();
        bivalue.set_single(color);
        Self {
            legend_text: name.clone(),
            name,
            symbolizer: Symbolizer::default_for(kind, color),
            filter_expression: None,
            range: None,
            max_inclusive: false,
            color: bivalue,
            position: None,
        }
    }

    pub fn symbolizer(&self) -> &Symbolizer {
        &self.symbolizer
    }

    /// Replace the render style. A symbolizer of a different geometry family
    /// is rejected and the category is left unmodified.
    pub fn set_symbolizer(&mut self, symbolizer: Symbolizer) -> SymbologyResult<()> {
        if symbolizer.kind() != self.symbolizer.kind() {
            return Err(SymbologyError::invalid_operation(format!(
                "cannot assign a {:?} symbolizer to a {:?} category",
                symbolizer.kind(),
                self.symbolizer.kind()
            )));
        }
        self.symbolizer = symbolizer;
        Ok(())
    }

    pub fn kind(&self) -> GeometryKind {
        self.symbolizer.kind()
    }

    /// Back-reference into the owning scheme, when attached.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Whether `value` falls in this category's numeric range.
    pub fn contains_value(&self, value: f64) -> bool {
        match self.range {
            None => false,
            Some((low, high)) => {
                value >= low && (value < high || (self.max_inclusive && value <= high))
            }
        }
    }

    /// Interpolated color for a value across this category's range. Without
    /// a range or bi-value span this is the flat low color.
    pub fn calculate_color(&self, value: f64) -> Rgba {
        match self.range {
            Some((low, high)) => self.color.calculate_color(value, low, high),
            None => self.color.low_color,
        }
    }

    fn set_range(&mut self, field: &str, low: f64, high: f64, max_inclusive: bool) {
        self.range = Some((low, high));
        self.max_inclusive = max_inclusive;
        self.legend_text = format_range(low, high);
        self.filter_expression = Some(expr::range_filter(field, low, high, max_inclusive));
    }
}

fn format_range(low: f64, high: f64) -> String {
    if low == high {
        format!("{}", trim_float(low))
    } else {
        format!("{} - {}", trim_float(low), trim_float(high))
    }
}

fn trim_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.3}", v)
    }
}

/// Settings driving `create_categories`, persisted with the scheme.
/// Keys absent from a saved bag fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Attribute field supplying the classification sample.
    pub field: String,
    pub classify: ClassifyOptions,
    pub ramp: ColorRamp,
    /// When set, each category gets a bi-value color span across its range
    /// instead of a single ramp color.
    pub use_gradient: bool,
    pub gradient_model: GradientModel,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            field: String::new(),
            classify: ClassifyOptions::default(),
            ramp: ColorRamp::default(),
            use_gradient: false,
            gradient_model: GradientModel::Linear,
        }
    }
}

/// Ordered category collection plus editor settings.
pub struct Scheme {
    kind: GeometryKind,
    categories: Vec<Category>,
    pub settings: EditorSettings,
    changeable: Changeable,
    stats: Option<SampleStats>,
}

impl std::fmt::Debug for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheme")
            .field("kind", &self.kind)
            .field("categories", &self.categories.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Scheme {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            categories: Vec::new(),
            settings: EditorSettings::default(),
            changeable: Changeable::default(),
            stats: None,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
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
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Stats of the sample behind the last `create_categories`, kept for
    /// legend display.
    pub fn stats(&self) -> Option<&SampleStats> {
        self.stats.as_ref()
    }

    /// Append a category. The collection sets the back-reference; a
    /// category of the wrong geometry family is rejected unmodified.
    pub fn add_category(&mut self, category: Category) -> SymbologyResult<usize> {
        self.insert_category(self.categories.len(), category)
    }

    pub fn insert_category(&mut self, index: usize, mut category: Category) -> SymbologyResult<usize> {
        if category.kind() != self.kind {
            return Err(SymbologyError::invalid_operation(format!(
                "cannot add a {:?} category to a {:?} scheme",
                category.kind(),
                self.kind
            )));
        }
        if index > self.categories.len() {
            return Err(SymbologyError::invalid_argument(format!(
                "insert index {} out of range (len {})",
                index,
                self.categories.len()
            )));
        }
        category.position = Some(index);
        self.categories.insert(index, category);
        self.reindex_from(index + 1);
        self.changeable.on_changed();
        Ok(index)
    }

    /// Remove and return a category, clearing its back-reference.
    pub fn remove_category(&mut self, index: usize) -> Option<Category> {
        if index >= self.categories.len() {
            return None;
        }
        let mut removed = self.categories.remove(index);
        removed.position = None;
        self.reindex_from(index);
        self.changeable.on_changed();
        Some(removed)
    }

    /// Drop all categories, firing one change.
    pub fn clear(&mut self) {
        if self.categories.is_empty() {
            return;
        }
        for c in &mut self.categories {
            c.position = None;
        }
        self.categories.clear();
        self.stats = None;
        self.changeable.on_changed();
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, c) in self.categories.iter_mut().enumerate().skip(start) {
            c.position = Some(i);
        }
    }

    /// Update a category in place through `edit`, firing one change.
    pub fn edit_category<R>(&mut self, index: usize, edit: impl FnOnce(&mut Category) -> R) -> Option<R> {
        let category = self.categories.get_mut(index)?;
        let out = edit(category);
        self.changeable.on_changed();
        Some(out)
    }

    /// Map a value to its category index: first category (in order) whose
    /// range contains it. Values matching nothing fall to the default
    /// (first) category, so category-dependent rendering never sees an
    /// undefined state. Overlapping manual ranges resolve by first match.
    pub fn categorize(&self, value: f64) -> usize {
        self.categories
            .iter()
            .position(|c| c.contains_value(value))
            .unwrap_or(0)
    }

    /// Reclassify: compute breaks over `values` per the editor settings and
    /// rebuild the category collection. One coalesced change regardless of
    /// the category count; a degenerate sample produces the single default
    /// category.
    pub fn create_categories(&mut self, values: &[f64]) -> SymbologyResult<()> {
        let classification = compute_breaks(values, &self.settings.classify)?;
        self.rebuild_from(&classification);
        Ok(())
    }

    fn rebuild_from(&mut self, classification: &Classification) {
        let bounds = classification.class_bounds();
        let colors = self.settings.ramp.sample(bounds.len());
        let kind = self.kind;
        let field = self.settings.field.clone();
        let use_gradient = self.settings.use_gradient;
        let gradient_model = self.settings.gradient_model;
        let n = bounds.len();

        self.changeable.suspend_changes();
        self.clear();
        for (i, (low, high)) in bounds.iter().copied().enumerate() {
            let last = i + 1 == n;
            let mut category = Category::new(kind, format_range(low, high), colors[i]);
            category.set_range(&field, low, high, last);
            if use_gradient && n > 0 {
                let t0 = i as f64 / n as f64;
                let t1 = (i + 1) as f64 / n as f64;
                category.color = BiValueColor::new(
                    self.settings.ramp.color_at(t0),
                    self.settings.ramp.color_at(t1),
                    gradient_model,
                );
            }
            category.position = Some(i);
            self.categories.push(category);
        }
        self.stats = Some(classification.stats);
        self.changeable.on_changed();
        self.changeable.resume_changes();

        log::info!(
            "scheme reclassified: {} categories over [{}, {}] ({} samples)",
            n,
            classification.stats.min,
            classification.stats.max,
            classification.stats.count
        );
    }

    /// Move one interior boundary (between category `boundary` and
    /// `boundary + 1`) to `value`, rewriting both ranges, legend texts, and
    /// filter expressions. Ordering against neighboring boundaries is
    /// deliberately not re-validated; overlap resolves in `categorize` by
    /// first match.
    pub fn set_break(&mut self, boundary: usize, value: f64) -> SymbologyResult<()> {
        if boundary + 1 >= self.categories.len() {
            return Err(SymbologyError::invalid_argument(format!(
                "boundary index {} out of range ({} categories)",
                boundary,
                self.categories.len()
            )));
        }
        if !value.is_finite() {
            return Err(SymbologyError::invalid_argument(format!(
                "break value must be finite, got {}",
                value
            )));
        }
        self.settings.classify.interval_method = IntervalMethod::Manual;
        let field = self.settings.field.clone();
        let below = &mut self.categories[boundary];
        if let Some((low, _)) = below.range {
            let inclusive = below.max_inclusive;
            below.set_range(&field, low, value, inclusive);
        }
        let above = &mut self.categories[boundary + 1];
        if let Some((_, high)) = above.range {
            let inclusive = above.max_inclusive;
            above.set_range(&field, value, high, inclusive);
        }
        self.changeable.on_changed();
        Ok(())
    }

    /// Persist the scheme configuration to a flat property bag. The sink
    /// registration is runtime wiring and is not saved.
    pub fn to_bag(&self) -> SymbologyResult<PropertyBag> {
        SchemeState {
            kind: self.kind,
            categories: self.categories.clone(),
            settings: self.settings.clone(),
            stats: self.stats,
        }
        .to_bag()
    }

    /// Rebuild a scheme from a saved bag. Category positions come from the
    /// collection, not the bag, so a hand-edited document cannot desync
    /// them.
    pub fn from_bag(bag: &PropertyBag) -> SymbologyResult<Self> {
        let state: SchemeState = FromPropertyBag::from_bag(bag)?;
        let mut scheme = Scheme::new(state.kind);
        scheme.settings = state.settings;
        for category in state.categories {
            scheme.add_category(category)?;
        }
        scheme.stats = state.stats;
        Ok(scheme)
    }
}

/// Serialized form of a scheme.
#[derive(Serialize, Deserialize)]
struct SchemeState {
    kind: GeometryKind,
    categories: Vec<Category>,
    settings: EditorSettings,
    stats: Option<SampleStats>,
}
