//! Diagram renderers.
//!
//! Every diagram type has one [`DiagramRenderer`]. The dispatcher creates a
//! fresh renderer per call, pushes the type's configuration namespace into
//! it and asks it to draw the definition into a scratch surface.

mod flowchart;
mod gantt;
mod info;
mod sequence;

pub use flowchart::FlowchartRenderer;
pub use gantt::GanttRenderer;
pub use info::InfoRenderer;
pub use sequence::SequenceRenderer;

use svg::{Node, node::element as svg_element};
use toml::Table;

use merrow_core::{
    draw::{LayeredOutput, StrokeDefinition},
    geometry::{Bounds, Point},
    kind::DiagramKind,
    scene::ScratchSurface,
    semantic::{ClassDef, ClickBinding},
};

use crate::error::RenderError;

/// Marker referenced by arrows ending in a filled head.
pub const ARROWHEAD_MARKER: &str = "arrowhead";
/// Marker referenced by sequence messages ending in a cross.
pub const CROSSHEAD_MARKER: &str = "crosshead";

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Interaction bindings produced by a render, handed to the caller's callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    clicks: Vec<ClickBinding>,
}

impl Bindings {
    pub fn new(clicks: Vec<ClickBinding>) -> Self {
        Self { clicks }
    }

    pub fn clicks(&self) -> &[ClickBinding] {
        &self.clicks
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }
}

/// A renderer for one diagram type.
pub trait DiagramRenderer {
    /// Receives the configuration namespace of the diagram type, if any.
    fn set_config(&mut self, namespace: Option<&Table>);

    /// Parses `text` and draws it into `surface`.
    ///
    /// `kind` tells renderers that serve several grammars which one `text`
    /// is written in.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Parse`] when `text` does not parse, or another
    /// [`RenderError`] when the model cannot be drawn.
    fn draw(
        &mut self,
        text: &str,
        surface: &mut ScratchSurface<'_>,
        kind: DiagramKind,
    ) -> Result<Bindings, RenderError>;

    /// Class definitions declared by the last definition drawn, for CSS
    /// cloning.
    ///
    /// `None` means the diagram type has no class concept.
    fn classes(&self) -> Option<&[ClassDef]> {
        None
    }
}

/// Writes the layered output into the surface and sizes the `<svg>` element.
///
/// With `use_max_width` the graphic scales down to its container; otherwise
/// it keeps its natural size.
pub(crate) fn finish_surface(
    surface: &mut ScratchSurface<'_>,
    definitions: Option<svg_element::Definitions>,
    output: LayeredOutput,
    bounds: Bounds,
    use_max_width: bool,
) {
    let width = bounds.width().max(1.0);
    let height = bounds.height().max(1.0);

    surface.set_attribute(
        "viewBox",
        format!("{} {} {} {}", bounds.min_x(), bounds.min_y(), width, height),
    );
    if use_max_width {
        surface.set_attribute("style", format!("max-width:{width}px;"));
    } else {
        surface.set_attribute("width", width.to_string());
        surface.set_attribute("height", height.to_string());
    }

    if let Some(definitions) = definitions {
        surface.append(definitions);
    }
    surface.extend(output.render());
}

/// Marker drawing a filled triangle at the end of a path.
pub(crate) fn arrowhead_marker(stroke: &StrokeDefinition) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", ARROWHEAD_MARKER)
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerUnits", "strokeWidth")
        .set("markerWidth", 8)
        .set("markerHeight", 6)
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 0 0 L 10 5 L 0 10 z")
                .set("fill", stroke.color()),
        )
}

/// Marker drawing an `x` at the end of a path.
pub(crate) fn crosshead_marker(stroke: &StrokeDefinition) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", CROSSHEAD_MARKER)
        .set("viewBox", "0 0 10 10")
        .set("refX", 5)
        .set("refY", 5)
        .set("markerWidth", 10)
        .set("markerHeight", 10)
        .set("orient", "auto")
        .add(
            svg_element::Path::new()
                .set("d", "M 1 1 L 9 9 M 9 1 L 1 9")
                .set("fill", "none")
                .set("stroke", stroke.color())
                .set("stroke-width", 1.5),
        )
}

/// `url(#name)` reference to a definition inside the graphic.
pub(crate) fn fragment_url(name: &str) -> String {
    format!("url(#{name})")
}

/// Rough width of `text` drawn at `font_size`.
///
/// No font metrics are available, so every character counts as a fixed
/// fraction of the font size.
pub(crate) fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}

/// Centered single-line SVG text.
pub(crate) fn label_text(content: &str, position: Point, font_size: f32) -> svg_element::Text {
    svg_element::Text::new(content)
        .set("x", position.x())
        .set("y", position.y())
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-size", font_size)
}

/// Label as an XHTML `<div>` inside a `<foreignObject>` covering `bounds`.
pub(crate) fn html_label(content: &str, bounds: Bounds) -> svg_element::Element {
    let mut div = svg_element::Element::new("div");
    div.assign("xmlns", XHTML_NAMESPACE);
    div.assign("class", "label");
    div.assign(
        "style",
        "display: inline-block; white-space: nowrap; text-align: center;",
    );
    div.append(svg::node::Text::new(content));

    let mut object = svg_element::Element::new("foreignObject");
    object.assign("x", bounds.min_x());
    object.assign("y", bounds.min_y());
    object.assign("width", bounds.width());
    object.assign("height", bounds.height());
    object.append(div);
    object
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrowhead_marker_id() {
        let marker = arrowhead_marker(&StrokeDefinition::default()).to_string();
        assert!(marker.contains(r#"id="arrowhead""#));
        assert_eq!(fragment_url(ARROWHEAD_MARKER), "url(#arrowhead)");
    }

    #[test]
    fn test_html_label_is_foreign_object() {
        let markup = html_label("Start", Bounds::new(0.0, 0.0, 40.0, 20.0)).to_string();
        assert!(markup.starts_with("<foreignObject"));
        assert!(markup.contains(XHTML_NAMESPACE));
        assert!(markup.contains("Start"));
    }

    #[test]
    fn test_text_width_grows_with_length() {
        assert!(estimate_text_width("abcd", 14.0) > estimate_text_width("ab", 14.0));
        assert_eq!(estimate_text_width("", 14.0), 0.0);
    }
}
