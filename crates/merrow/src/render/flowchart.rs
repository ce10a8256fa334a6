//! Flowchart renderer for both the `graph` and `digraph` grammars.

use log::{debug, trace};
use svg::node::element as svg_element;
use toml::Table;

use merrow_core::{
    apply_stroke,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, StrokeStyle, SvgNode},
    geometry::{Bounds, Point},
    identifier::Id,
    kind::DiagramKind,
    scene::ScratchSurface,
    semantic::{ClassDef, Diagram, Edge, EdgeHead, EdgeStroke, FlowModel, Vertex, VertexShape},
};

use super::{
    ARROWHEAD_MARKER, Bindings, DiagramRenderer, arrowhead_marker, finish_surface, fragment_url,
    html_label, label_text,
};
use crate::{
    config::FlowchartConfig,
    error::RenderError,
    layout::{FlowLayout, FlowchartEngine},
    registry::parse_diagram,
};

const VERTEX_FILL: &str = "#ECECFF";
const VERTEX_STROKE: &str = "#9370DB";
const EDGE_STROKE: &str = "#333";
/// How far a self loop bulges out of its vertex.
const LOOP_REACH: f32 = 40.0;

#[derive(Debug, Default)]
pub struct FlowchartRenderer {
    config: FlowchartConfig,
    class_defs: Option<Vec<ClassDef>>,
}

impl FlowchartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(text: &str, kind: DiagramKind) -> Result<FlowModel, RenderError> {
        match parse_diagram(text, kind)? {
            Diagram::Flowchart(model) => Ok(model),
            other => Err(RenderError::UnexpectedModel {
                renderer: "flowchart",
                found: other.kind(),
            }),
        }
    }

    fn vertex_group(&self, vertex: &Vertex, bounds: Bounds, font_size: f32) -> svg_element::Group {
        let class = vertex
            .classes()
            .iter()
            .fold(String::from("node"), |class, name| class + " " + name);

        let group = svg_element::Group::new()
            .set("id", vertex.id().to_string())
            .set("class", class)
            .add(Self::vertex_shape(vertex, bounds));

        let label = vertex.label();
        if self.config.html_labels() {
            group.add(html_label(&label, bounds))
        } else {
            group.add(label_text(&label, bounds.center(), font_size))
        }
    }

    fn vertex_shape(vertex: &Vertex, bounds: Bounds) -> SvgNode {
        let stroke = StrokeDefinition::new(VERTEX_STROKE, 1.0);
        let style = vertex.styles().join(";");
        let center = bounds.center();
        let points = |points: &[(f32, f32)]| {
            points
                .iter()
                .map(|(x, y)| format!("{x},{y}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        macro_rules! outlined {
            ($element:expr) => {{
                let element = apply_stroke!($element.set("fill", VERTEX_FILL), &stroke);
                if style.is_empty() {
                    Box::new(element) as SvgNode
                } else {
                    Box::new(element.set("style", style.as_str())) as SvgNode
                }
            }};
        }

        match vertex.shape() {
            shape @ (VertexShape::Rect | VertexShape::Round) => {
                let radius = if shape == VertexShape::Round { 5.0 } else { 0.0 };
                outlined!(
                    svg_element::Rectangle::new()
                        .set("x", bounds.min_x())
                        .set("y", bounds.min_y())
                        .set("width", bounds.width())
                        .set("height", bounds.height())
                        .set("rx", radius)
                        .set("ry", radius)
                )
            }
            VertexShape::Circle => outlined!(
                svg_element::Circle::new()
                    .set("cx", center.x())
                    .set("cy", center.y())
                    .set("r", bounds.width() / 2.0)
            ),
            VertexShape::Diamond => outlined!(svg_element::Polygon::new().set(
                "points",
                points(&[
                    (center.x(), bounds.min_y()),
                    (bounds.max_x(), center.y()),
                    (center.x(), bounds.max_y()),
                    (bounds.min_x(), center.y()),
                ]),
            )),
            VertexShape::Odd => {
                let notch = bounds.height() / 2.0;
                outlined!(svg_element::Polygon::new().set(
                    "points",
                    points(&[
                        (bounds.min_x(), bounds.min_y()),
                        (bounds.max_x(), bounds.min_y()),
                        (bounds.max_x(), bounds.max_y()),
                        (bounds.min_x(), bounds.max_y()),
                        (bounds.min_x() + notch, center.y()),
                    ]),
                ))
            }
        }
    }

    /// Draws `edge`; returns the area it covers outside the vertices.
    fn render_edge(
        edge: &Edge,
        layout: &FlowLayout,
        font_size: f32,
        output: &mut LayeredOutput,
    ) -> Result<Option<Bounds>, RenderError> {
        let placed = |id: Id| {
            layout
                .vertex_bounds(id)
                .ok_or_else(|| RenderError::Layout(format!("vertex `{id}` was not placed")))
        };
        let source = placed(edge.start())?;
        let target = placed(edge.end())?;

        let (data, label_at, extra) = if edge.start() == edge.end() {
            let from = Point::new(source.max_x(), source.center().y() - 5.0);
            let to = Point::new(source.max_x(), source.center().y() + 5.0);
            let data = format!(
                "M {} {} C {} {}, {} {}, {} {}",
                from.x(),
                from.y(),
                from.x() + LOOP_REACH,
                from.y() - LOOP_REACH,
                to.x() + LOOP_REACH,
                to.y() + LOOP_REACH,
                to.x(),
                to.y()
            );
            let reach = Bounds::new(
                source.max_x(),
                source.min_y() - LOOP_REACH / 2.0,
                source.max_x() + LOOP_REACH,
                source.max_y() + LOOP_REACH / 2.0,
            );
            (data, Point::new(source.max_x() + LOOP_REACH, source.center().y()), Some(reach))
        } else {
            let from = source.boundary_towards(target.center());
            let to = target.boundary_towards(source.center());
            let data = format!("M {} {} L {} {}", from.x(), from.y(), to.x(), to.y());
            (data, from.midpoint(to), None)
        };

        let stroke = match edge.stroke() {
            EdgeStroke::Normal => StrokeDefinition::new(EDGE_STROKE, 1.5),
            EdgeStroke::Thick => StrokeDefinition::new(EDGE_STROKE, 3.5),
            EdgeStroke::Dotted => {
                StrokeDefinition::new(EDGE_STROKE, 1.5).with_style(StrokeStyle::Dotted)
            }
        };
        let mut path = apply_stroke!(
            svg_element::Path::new()
                .set("class", "flowchart-link")
                .set("d", data)
                .set("fill", "none"),
            &stroke
        );
        if edge.head() == EdgeHead::Arrow {
            path = path.set("marker-end", fragment_url(ARROWHEAD_MARKER));
        }
        output.add_to_layer(RenderLayer::Arrow, Box::new(path));

        if let Some(text) = edge.text() {
            let label = label_text(text, label_at, font_size).set("class", "edgeLabel");
            output.add_to_layer(RenderLayer::Text, Box::new(label) as SvgNode);
        }

        Ok(extra)
    }
}

impl DiagramRenderer for FlowchartRenderer {
    fn set_config(&mut self, namespace: Option<&Table>) {
        self.config = FlowchartConfig::from_namespace(namespace);
    }

    fn draw(
        &mut self,
        text: &str,
        surface: &mut ScratchSurface<'_>,
        kind: DiagramKind,
    ) -> Result<Bindings, RenderError> {
        let model = Self::model(text, kind)?;
        // Only the `graph` grammar has classDef statements.
        self.class_defs =
            (kind == DiagramKind::Flowchart).then(|| model.class_defs().cloned().collect());
        let engine = FlowchartEngine::new();
        let layout = engine.calculate(&model);
        debug!(
            vertices = model.vertex_count(),
            edges = model.edges().len(),
            html_labels = self.config.html_labels();
            "Drawing flowchart"
        );

        let mut output = LayeredOutput::new();
        for vertex in model.vertices() {
            let bounds = layout.vertex_bounds(vertex.id()).ok_or_else(|| {
                RenderError::Layout(format!("vertex `{}` was not placed", vertex.id()))
            })?;
            let group = self.vertex_group(vertex, bounds, engine.font_size());
            output.add_to_layer(RenderLayer::Content, Box::new(group));
        }

        let mut bounds = layout.bounds();
        for edge in model.edges() {
            let extra = Self::render_edge(edge, &layout, engine.font_size(), &mut output)?;
            if let Some(extra) = extra {
                bounds = bounds.merge(extra);
            }
        }

        let definitions = svg_element::Definitions::new()
            .add(arrowhead_marker(&StrokeDefinition::new(EDGE_STROKE, 1.5)));
        finish_surface(
            surface,
            Some(definitions),
            output,
            bounds,
            self.config.use_max_width(),
        );

        trace!(clicks = model.clicks().len(); "Flowchart drawn");
        Ok(Bindings::new(model.clicks().to_vec()))
    }

    fn classes(&self) -> Option<&[ClassDef]> {
        self.class_defs.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use merrow_core::scene::{DocumentLocation, Scene};

    use super::*;
    use crate::config::Configuration;

    fn draw(
        renderer: &mut FlowchartRenderer,
        text: &str,
        kind: DiagramKind,
    ) -> (Result<Bindings, RenderError>, String) {
        let mut scene = Scene::new(DocumentLocation::default());
        let mut surface = scene.attach(None, "graph0").unwrap();
        let result = renderer.draw(text, &mut surface, kind);
        let markup = surface.markup();
        (result, markup)
    }

    fn renderer_with(overrides: &str) -> FlowchartRenderer {
        let mut config = Configuration::default();
        config.merge(&Configuration::parse_overrides(overrides).unwrap());

        let mut renderer = FlowchartRenderer::new();
        renderer.set_config(config.namespace("flowchart"));
        renderer
    }

    #[test]
    fn test_draws_vertices_and_arrowheads() {
        let mut renderer = FlowchartRenderer::new();
        let (result, markup) = draw(
            &mut renderer,
            "graph TD\na[Start]-->b{Ok?}",
            DiagramKind::Flowchart,
        );

        assert!(result.unwrap().is_empty());
        assert!(markup.contains(r#"id="arrowhead""#));
        assert!(markup.contains(r#"marker-end="url(#arrowhead)""#));
        assert!(markup.contains("<polygon"));
        assert!(markup.contains("<foreignObject"));
        assert!(markup.contains("Start"));
    }

    #[test]
    fn test_svg_text_labels_when_html_disabled() {
        let mut renderer = renderer_with("[flowchart]\nhtmlLabels = false");
        let (_, markup) = draw(&mut renderer, "graph LR\na-->b", DiagramKind::Flowchart);

        assert!(!markup.contains("<foreignObject"));
        assert!(markup.contains("<text"));
    }

    #[test]
    fn test_max_width_style() {
        let mut renderer = FlowchartRenderer::new();
        let (_, markup) = draw(&mut renderer, "graph LR\na-->b", DiagramKind::Flowchart);
        assert!(markup.contains("max-width:"));
        assert!(markup.contains(r#"width="100%""#));

        let mut renderer = renderer_with("[flowchart]\nuseMaxWidth = false");
        let (_, markup) = draw(&mut renderer, "graph LR\na-->b", DiagramKind::Flowchart);
        assert!(!markup.contains("max-width:"));
        assert!(!markup.contains(r#"width="100%""#));
    }

    #[test]
    fn test_open_link_has_no_marker_reference() {
        let mut renderer = FlowchartRenderer::new();
        let (_, markup) = draw(&mut renderer, "graph TD\na---b", DiagramKind::Flowchart);
        assert!(!markup.contains("marker-end"));
    }

    #[test]
    fn test_classes_and_inline_styles() {
        let mut renderer = FlowchartRenderer::new();
        let text = "graph TD\na-->b\nclassDef hot fill:#f00\nclass a hot\nstyle b stroke-width:4px";
        let (_, markup) = draw(&mut renderer, text, DiagramKind::Flowchart);

        assert!(markup.contains(r#"class="node hot""#));
        assert!(markup.contains("stroke-width:4px"));

        let classes = renderer.classes().unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name(), "hot");
    }

    #[test]
    fn test_click_bindings() {
        let mut renderer = FlowchartRenderer::new();
        let (result, _) = draw(
            &mut renderer,
            "graph TD\na-->b\nclick a openDetails \"Details\"",
            DiagramKind::Flowchart,
        );

        let bindings = result.unwrap();
        assert_eq!(bindings.clicks().len(), 1);
        assert_eq!(bindings.clicks()[0].callback(), "openDetails");
    }

    #[test]
    fn test_dot_variant() {
        let mut renderer = FlowchartRenderer::new();
        let text = "digraph G { a -> b [label=\"go\"] }";
        let (result, markup) = draw(&mut renderer, text, DiagramKind::FlowchartDot);

        assert!(result.is_ok());
        assert!(markup.contains("go"));
        assert!(renderer.classes().is_none());
    }

    #[test]
    fn test_self_loop() {
        let mut renderer = FlowchartRenderer::new();
        let (result, markup) = draw(&mut renderer, "graph TD\na-->a", DiagramKind::Flowchart);
        assert!(result.is_ok());
        assert!(markup.contains(" C "));
    }

    #[test]
    fn test_parse_failure() {
        let mut renderer = FlowchartRenderer::new();
        let (result, _) = draw(&mut renderer, "graph TD\na--", DiagramKind::Flowchart);
        assert!(matches!(result, Err(RenderError::Parse(_))));
    }

    #[test]
    fn test_wrong_model() {
        let mut renderer = FlowchartRenderer::new();
        let (result, _) = draw(&mut renderer, "info", DiagramKind::Info);
        assert!(matches!(
            result,
            Err(RenderError::UnexpectedModel { found: DiagramKind::Info, .. })
        ));
    }
}
