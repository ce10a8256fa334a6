//! Layer-based z-ordering for SVG output.
//!
//! Renderers add nodes to a [`LayeredOutput`] tagged with a [`RenderLayer`];
//! [`LayeredOutput::render`] emits one `<g data-layer="...">` per non-empty
//! layer, bottom to top.
//!
//! # Example
//!
//! ```
//! # use merrow_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Line, Text};
//!
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Text, Box::new(Text::new("Alice")));
//! output.add_to_layer(RenderLayer::Lifeline, Box::new(Line::new()));
//!
//! // Lifeline group is emitted before the text group
//! let groups = output.render();
//! assert_eq!(groups.len(), 2);
//! ```

use std::collections::BTreeMap;

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers, bottom to top in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Section stripes and other fills behind everything else
    Background,
    /// Axis ticks and grid lines
    Grid,
    /// Sequence lifelines
    Lifeline,
    /// Loop, opt and alt boxes
    Block,
    /// Vertices, actors, bars - default layer
    Content,
    /// Notes
    Note,
    /// Edges and messages
    Arrow,
    /// Labels
    Text,
}

impl RenderLayer {
    /// Returns the value written to the group's `data-layer` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Grid => "grid",
            Self::Lifeline => "lifeline",
            Self::Block => "block",
            Self::Content => "content",
            Self::Note => "note",
            Self::Arrow => "arrow",
            Self::Text => "text",
        }
    }
}

/// SVG nodes tagged with the layer they belong to.
///
/// Insertion order is preserved within a layer.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    layers: BTreeMap<RenderLayer, Vec<SvgNode>>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.layers.entry(layer).or_default().push(node);
    }

    /// Appends every node of `other` after the nodes already in each layer.
    pub fn merge(&mut self, other: LayeredOutput) {
        for (layer, nodes) in other.layers {
            self.layers.entry(layer).or_default().extend(nodes);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Vec::is_empty)
    }

    /// Consumes the output and returns one `<g data-layer>` group per
    /// non-empty layer, bottom layer first.
    pub fn render(self) -> Vec<SvgNode> {
        self.layers
            .into_iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(layer, nodes)| {
                let group = nodes.into_iter().fold(
                    svg_element::Group::new().set("data-layer", layer.name()),
                    |group, node| group.add(node),
                );
                Box::new(group) as SvgNode
            })
            .collect()
    }
}
