//! Thematic map symbology core.
//!
//! Feature classification (break engines over a numeric field), a category
//! scheme that maps classes to symbolizers, and a per-feature drawing filter
//! with region-based selection. Rendering and storage stay behind thin
//! traits ([`symbolizer::RenderTarget`], [`feature::FeatureSource`],
//! [`persist::ToPropertyBag`]) so the host application supplies the canvas,
//! the data access, and the document format.

pub mod classify;
pub mod color;
pub mod error;
pub mod event;
pub mod expr;
pub mod feature;
pub mod filter;
pub mod geom;
pub mod persist;
pub mod render;
pub mod scheme;
pub mod symbolizer;

pub use classify::{Classification, ClassifyOptions, IntervalMethod, IntervalSnapMethod};
pub use color::{BiValueColor, ColorRamp, GradientModel, Rgba};
pub use error::{SymbologyError, SymbologyResult};
pub use event::{ChangeSink, Changeable};
pub use feature::{Feature, FeatureSource, MemoryFeatureSet};
pub use filter::{DrawingFilter, DrawnState, FilterSpec, Selection, SelectionMode};
pub use geom::{Envelope, Geometry};
pub use persist::{FromPropertyBag, PropertyBag, ToPropertyBag};
pub use render::draw_features;
pub use scheme::{Category, EditorSettings, Scheme};
pub use symbolizer::{GeometryKind, RenderTarget, Symbolizer};
