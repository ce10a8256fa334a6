//! Drawing helpers shared by every renderer.
//!
//! - [`LayeredOutput`] collects SVG nodes per [`RenderLayer`] so renderers can
//!   emit elements in any order and still get a stable z-order.
//! - [`StrokeDefinition`] maps line styles onto SVG stroke attributes.

mod layer;
mod stroke;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeDefinition, StrokeStyle};
