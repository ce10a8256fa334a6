//! Renderer for `info` diagrams, which only show the library version.

use log::debug;
use svg::node::element as svg_element;
use toml::Table;

use merrow_core::{
    draw::{LayeredOutput, RenderLayer},
    geometry::{Bounds, Point},
    kind::DiagramKind,
    scene::ScratchSurface,
    semantic::Diagram,
};

use super::{Bindings, DiagramRenderer, finish_surface, label_text};
use crate::{error::RenderError, registry::parse_diagram};

const FONT_SIZE: f32 = 32.0;

#[derive(Debug, Default)]
pub struct InfoRenderer;

impl InfoRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DiagramRenderer for InfoRenderer {
    fn set_config(&mut self, _namespace: Option<&Table>) {}

    fn draw(
        &mut self,
        text: &str,
        surface: &mut ScratchSurface<'_>,
        kind: DiagramKind,
    ) -> Result<Bindings, RenderError> {
        let model = match parse_diagram(text, kind)? {
            Diagram::Info(model) => model,
            other => {
                return Err(RenderError::UnexpectedModel {
                    renderer: "info",
                    found: other.kind(),
                });
            }
        };
        debug!(show_info = model.show_info(); "Drawing info diagram");

        let mut output = LayeredOutput::new();
        let version = format!("v{}", crate::version());
        output.add_to_layer(
            RenderLayer::Text,
            Box::new(
                label_text(&version, Point::new(100.0, 40.0), FONT_SIZE).set("class", "version"),
            ),
        );

        let mut height = 80.0;
        if model.show_info() {
            let details = svg_element::Text::new(format!("{} {}", env!("CARGO_PKG_NAME"), version))
                .set("class", "info")
                .set("x", 100)
                .set("y", 90)
                .set("text-anchor", "middle")
                .set("font-size", 14);
            output.add_to_layer(RenderLayer::Text, Box::new(details));
            height = 110.0;
        }

        finish_surface(
            surface,
            None,
            output,
            Bounds::new(0.0, 0.0, 200.0, height),
            true,
        );
        Ok(Bindings::default())
    }
}
