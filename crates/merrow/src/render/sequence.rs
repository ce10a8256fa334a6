//! Sequence diagram renderer.
//!
//! Actors are laid out left to right in declaration order with a lifeline
//! hanging below each. Events are drawn top to bottom in source order, each
//! one advancing a vertical cursor. `loop`, `opt` and `alt` blocks become
//! frames spanning the actors their contents touch.

use log::debug;
use svg::node::element as svg_element;
use toml::Table;

use merrow_core::{
    apply_stroke,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, StrokeStyle},
    geometry::{Bounds, Point},
    identifier::Id,
    kind::DiagramKind,
    scene::ScratchSurface,
    semantic::{BlockKind, Diagram, LineType, NotePlacement, SequenceEvent, SequenceModel},
};

use super::{
    ARROWHEAD_MARKER, Bindings, CROSSHEAD_MARKER, DiagramRenderer, arrowhead_marker,
    crosshead_marker, estimate_text_width, finish_surface, fragment_url, label_text,
};
use crate::{config::SequenceConfig, error::RenderError, registry::parse_diagram};

const FONT_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 20.0;
const ACTOR_FILL: &str = "#ECECFF";
const NOTE_FILL: &str = "#EDF2AE";
const LINE_COLOR: &str = "#333";

#[derive(Debug, Default)]
pub struct SequenceRenderer {
    config: SequenceConfig,
}

impl SequenceRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagramRenderer for SequenceRenderer {
    fn set_config(&mut self, namespace: Option<&Table>) {
        self.config = SequenceConfig::from_namespace(namespace);
    }

    fn draw(
        &mut self,
        text: &str,
        surface: &mut ScratchSurface<'_>,
        kind: DiagramKind,
    ) -> Result<Bindings, RenderError> {
        let model = match parse_diagram(text, kind)? {
            Diagram::Sequence(model) => model,
            other => {
                return Err(RenderError::UnexpectedModel {
                    renderer: "sequence",
                    found: other.kind(),
                });
            }
        };
        debug!(
            actors = model.actor_count(),
            events = model.events().len(),
            mirror_actors = self.config.mirror_actors();
            "Drawing sequence diagram"
        );

        let mut painter = Painter::new(&self.config, &model);
        for event in model.events() {
            painter.event(event)?;
        }
        let (output, bounds) = painter.finish()?;

        let stroke = StrokeDefinition::new(LINE_COLOR, 1.5);
        let definitions = svg_element::Definitions::new()
            .add(arrowhead_marker(&stroke))
            .add(crosshead_marker(&stroke));
        finish_surface(
            surface,
            Some(definitions),
            output,
            bounds,
            self.config.use_max_width(),
        );

        Ok(Bindings::default())
    }
}

/// An open `loop`, `opt` or `alt` frame.
#[derive(Debug)]
struct Frame {
    kind: BlockKind,
    label: String,
    top: f32,
    /// Horizontal range touched by the events inside the frame
    span: Option<(f32, f32)>,
    /// `else` separators: height and label
    sections: Vec<(f32, String)>,
}

/// Cursor-driven drawing state for one diagram.
struct Painter<'a> {
    config: &'a SequenceConfig,
    model: &'a SequenceModel,
    output: LayeredOutput,
    cursor: f32,
    extents: Bounds,
    frames: Vec<Frame>,
}

impl<'a> Painter<'a> {
    fn new(config: &'a SequenceConfig, model: &'a SequenceModel) -> Self {
        let count = model.actor_count() as f32;
        let right = count * config.width() + (count - 1.0).max(0.0) * config.actor_margin();
        Self {
            config,
            model,
            output: LayeredOutput::new(),
            cursor: config.height(),
            extents: Bounds::new(0.0, 0.0, right.max(0.0), config.height()),
            frames: Vec::new(),
        }
    }

    fn actor_left(&self, index: usize) -> f32 {
        index as f32 * (self.config.width() + self.config.actor_margin())
    }

    fn actor_center(&self, id: Id) -> Result<f32, RenderError> {
        let index = self
            .model
            .actor_index(id)
            .ok_or_else(|| RenderError::Layout(format!("actor `{id}` was not declared")))?;
        Ok(self.actor_left(index) + self.config.width() / 2.0)
    }

    /// Records that the current event covers `left..right`.
    fn touch(&mut self, left: f32, right: f32) {
        self.extents = self
            .extents
            .merge(Bounds::new(left, self.extents.min_y(), right, self.cursor));
        for frame in &mut self.frames {
            frame.span = Some(match frame.span {
                Some((min, max)) => (min.min(left), max.max(right)),
                None => (left, right),
            });
        }
    }

    fn event(&mut self, event: &SequenceEvent) -> Result<(), RenderError> {
        match event {
            SequenceEvent::Message {
                from,
                to,
                text,
                line,
            } => self.message(*from, *to, text, *line),
            SequenceEvent::Note {
                actors,
                placement,
                text,
            } => self.note(actors, *placement, text),
            SequenceEvent::BlockStart { kind, label } => {
                self.cursor += self.config.box_margin();
                self.frames.push(Frame {
                    kind: *kind,
                    label: label.clone(),
                    top: self.cursor,
                    span: None,
                    sections: Vec::new(),
                });
                self.cursor += LINE_HEIGHT + self.config.box_text_margin();
                Ok(())
            }
            SequenceEvent::BlockElse { label } => {
                self.cursor += self.config.box_margin();
                let cursor = self.cursor;
                if let Some(frame) = self.frames.last_mut() {
                    frame.sections.push((cursor, label.clone()));
                }
                self.cursor += LINE_HEIGHT;
                Ok(())
            }
            SequenceEvent::BlockEnd => {
                self.cursor += self.config.box_margin();
                let frame = self
                    .frames
                    .pop()
                    .ok_or_else(|| RenderError::Layout("block end without a start".to_string()))?;
                self.frame(frame);
                Ok(())
            }
        }
    }

    fn message(&mut self, from: Id, to: Id, text: &str, line: LineType) -> Result<(), RenderError> {
        self.cursor += self.config.message_margin();
        let y = self.cursor;
        let start = self.actor_center(from)?;
        let end = self.actor_center(to)?;

        let stroke = if line.is_dotted() {
            StrokeDefinition::new(LINE_COLOR, 1.5).with_style(StrokeStyle::Dotted)
        } else {
            StrokeDefinition::new(LINE_COLOR, 1.5)
        };

        let (data, label_x, left, right) = if from == to {
            // Self message: a loop to the right of the lifeline.
            let reach = self.config.actor_margin() / 2.0 + 10.0;
            let data = format!(
                "M {start} {y} C {} {}, {} {}, {start} {}",
                start + reach,
                y - 10.0,
                start + reach,
                y + 30.0,
                y + 20.0
            );
            self.cursor += 20.0;
            (data, start + reach / 2.0, start, start + reach)
        } else {
            (
                format!("M {start} {y} L {end} {y}"),
                (start + end) / 2.0,
                start.min(end),
                start.max(end),
            )
        };

        let mut path = apply_stroke!(
            svg_element::Path::new()
                .set("class", "messageLine")
                .set("d", data)
                .set("fill", "none"),
            &stroke
        );
        if line.has_arrowhead() {
            path = path.set("marker-end", fragment_url(ARROWHEAD_MARKER));
        } else if line.has_crosshead() {
            path = path.set("marker-end", fragment_url(CROSSHEAD_MARKER));
        }
        self.output.add_to_layer(RenderLayer::Arrow, Box::new(path));

        if !text.is_empty() {
            let label = label_text(text, Point::new(label_x, y - LINE_HEIGHT / 2.0), FONT_SIZE)
                .set("class", "messageText");
            self.output.add_to_layer(RenderLayer::Text, Box::new(label));
        }

        let half_text = estimate_text_width(text, FONT_SIZE) / 2.0;
        self.touch(left.min(label_x - half_text), right.max(label_x + half_text));
        Ok(())
    }

    fn note(
        &mut self,
        actors: &[Id],
        placement: NotePlacement,
        text: &str,
    ) -> Result<(), RenderError> {
        self.cursor += self.config.note_margin();
        let centers = actors
            .iter()
            .map(|actor| self.actor_center(*actor))
            .collect::<Result<Vec<_>, _>>()?;
        let (Some(first), Some(last)) = (
            centers.iter().copied().reduce(f32::min),
            centers.iter().copied().reduce(f32::max),
        ) else {
            return Err(RenderError::Layout("note without actors".to_string()));
        };

        let width = self
            .config
            .width()
            .max(estimate_text_width(text, FONT_SIZE) + 2.0 * self.config.box_text_margin());
        let margin = self.config.note_margin();
        let (left, right) = match placement {
            NotePlacement::LeftOf => (first - margin - width, first - margin),
            NotePlacement::RightOf => (last + margin, last + margin + width),
            NotePlacement::Over if first == last => (first - width / 2.0, first + width / 2.0),
            NotePlacement::Over => (first - margin, last + margin),
        };
        let height = LINE_HEIGHT + 2.0 * self.config.box_text_margin();
        let top = self.cursor;

        let note = svg_element::Rectangle::new()
            .set("class", "note")
            .set("x", left)
            .set("y", top)
            .set("width", right - left)
            .set("height", height)
            .set("fill", NOTE_FILL);
        let note = apply_stroke!(note, &StrokeDefinition::new("#aaaa33", 1.0));
        self.output.add_to_layer(RenderLayer::Note, Box::new(note));

        let center = Point::new((left + right) / 2.0, top + height / 2.0);
        let label = label_text(text, center, FONT_SIZE).set("class", "noteText");
        self.output.add_to_layer(RenderLayer::Text, Box::new(label));

        self.cursor += height;
        self.touch(left, right);
        Ok(())
    }

    fn frame(&mut self, frame: Frame) {
        let margin = self.config.box_margin();
        let (left, right) = frame
            .span
            .unwrap_or((self.extents.min_x(), self.extents.max_x()));
        let (left, right) = (left - margin, right + margin);
        let stroke = StrokeDefinition::new("#483D8B", 1.0);

        let outline = svg_element::Rectangle::new()
            .set("class", "loopLine")
            .set("x", left)
            .set("y", frame.top)
            .set("width", right - left)
            .set("height", self.cursor - frame.top)
            .set("fill", "none");
        self.output
            .add_to_layer(RenderLayer::Block, Box::new(apply_stroke!(outline, &stroke)));

        let text_y = frame.top + LINE_HEIGHT / 2.0;
        let keyword = label_text(frame.kind.keyword(), Point::new(left + 25.0, text_y), FONT_SIZE)
            .set("class", "labelText");
        self.output.add_to_layer(RenderLayer::Text, Box::new(keyword));
        if !frame.label.is_empty() {
            let label = label_text(
                &format!("[{}]", frame.label),
                Point::new((left + right) / 2.0, text_y),
                FONT_SIZE,
            )
            .set("class", "loopText");
            self.output.add_to_layer(RenderLayer::Text, Box::new(label));
        }

        let dashed = stroke.with_style(StrokeStyle::Dashed);
        for (y, label) in frame.sections {
            let divider = svg_element::Line::new()
                .set("x1", left)
                .set("y1", y)
                .set("x2", right)
                .set("y2", y);
            self.output
                .add_to_layer(RenderLayer::Block, Box::new(apply_stroke!(divider, &dashed)));
            if !label.is_empty() {
                let text = label_text(
                    &format!("[{label}]"),
                    Point::new((left + right) / 2.0, y + LINE_HEIGHT / 2.0),
                    FONT_SIZE,
                )
                .set("class", "loopText");
                self.output.add_to_layer(RenderLayer::Text, Box::new(text));
            }
        }

        self.touch(left, right);
        // Enclosing frames keep a margin around this one.
        self.cursor += margin;
    }

    fn actor_box(&mut self, index: usize, description: &str, top: f32) {
        let left = self.actor_left(index);
        let bounds = Bounds::new(left, top, left + self.config.width(), top + self.config.height());

        let rect = svg_element::Rectangle::new()
            .set("class", "actor")
            .set("x", bounds.min_x())
            .set("y", bounds.min_y())
            .set("width", bounds.width())
            .set("height", bounds.height())
            .set("rx", 3)
            .set("ry", 3)
            .set("fill", ACTOR_FILL);
        let rect = apply_stroke!(rect, &StrokeDefinition::new("#CCCCFF", 1.0));
        self.output.add_to_layer(RenderLayer::Content, Box::new(rect));

        let label = label_text(description, bounds.center(), FONT_SIZE).set("class", "actor");
        self.output.add_to_layer(RenderLayer::Text, Box::new(label));
    }

    /// Draws actors and lifelines once the event height is known.
    fn finish(mut self) -> Result<(LayeredOutput, Bounds), RenderError> {
        if let Some(open) = self.frames.last() {
            return Err(RenderError::Layout(format!(
                "`{}` block is never closed",
                open.kind.keyword()
            )));
        }

        let config = self.config;
        let lifeline_end = self.cursor + config.message_margin();
        let mut bottom = lifeline_end;

        let actors: Vec<(usize, String)> = self
            .model
            .actors()
            .enumerate()
            .map(|(index, actor)| (index, actor.description().to_string()))
            .collect();
        for (index, description) in &actors {
            self.actor_box(*index, description, 0.0);

            let x = self.actor_left(*index) + config.width() / 2.0;
            let lifeline = svg_element::Line::new()
                .set("class", "actor-line")
                .set("x1", x)
                .set("y1", config.height())
                .set("x2", x)
                .set("y2", lifeline_end);
            self.output.add_to_layer(
                RenderLayer::Lifeline,
                Box::new(apply_stroke!(lifeline, &StrokeDefinition::new("#999", 0.5))),
            );

            if config.mirror_actors() {
                self.actor_box(*index, description, lifeline_end);
            }
        }
        if config.mirror_actors() {
            bottom = lifeline_end + config.height() + config.bottom_margin_adj();
        }

        let bounds = Bounds::new(
            self.extents.min_x() - config.diagram_margin_x(),
            -config.diagram_margin_y(),
            self.extents.max_x() + config.diagram_margin_x(),
            bottom + config.diagram_margin_y(),
        );
        Ok((self.output, bounds))
    }
}

#[cfg(test)]
mod tests {
    use merrow_core::scene::{DocumentLocation, Scene};

    use super::*;
    use crate::config::Configuration;

    fn draw(
        renderer: &mut SequenceRenderer,
        text: &str,
    ) -> (Result<Bindings, RenderError>, String) {
        let mut scene = Scene::new(DocumentLocation::default());
        let mut surface = scene.attach(None, "seq").unwrap();
        let result = renderer.draw(text, &mut surface, DiagramKind::Sequence);
        let markup = surface.markup();
        (result, markup)
    }

    fn count(markup: &str, needle: &str) -> usize {
        markup.matches(needle).count()
    }

    #[test]
    fn test_messages_reference_markers() {
        let (result, markup) = draw(
            &mut SequenceRenderer::new(),
            "sequenceDiagram\nAlice->>John: Hello\nJohn--xAlice: Bye\nAlice->John: open",
        );

        assert!(result.unwrap().is_empty());
        assert_eq!(count(&markup, r#"marker-end="url(#arrowhead)""#), 1);
        assert_eq!(count(&markup, r#"marker-end="url(#crosshead)""#), 1);
        assert!(markup.contains("stroke-dasharray"));
        assert!(markup.contains("Hello"));
    }

    #[test]
    fn test_actor_boxes_and_lifelines() {
        let (_, markup) = draw(
            &mut SequenceRenderer::new(),
            "sequenceDiagram\nparticipant A as Alice\nparticipant B\nA->B: hi",
        );

        assert_eq!(count(&markup, r#"class="actor-line""#), 2);
        assert!(markup.contains("Alice"));
        assert_eq!(count(&markup, "<rect class=\"actor\""), 2);
    }

    #[test]
    fn test_mirror_actors() {
        let mut config = Configuration::default();
        config.merge(
            &Configuration::parse_overrides("[sequenceDiagram]\nmirrorActors = true").unwrap(),
        );
        let mut renderer = SequenceRenderer::new();
        renderer.set_config(config.namespace("sequenceDiagram"));

        let (_, markup) = draw(&mut renderer, "sequenceDiagram\nA->B: hi");
        assert_eq!(count(&markup, "<rect class=\"actor\""), 4);
    }

    #[test]
    fn test_notes_and_blocks() {
        let text = "sequenceDiagram\n\
                    loop Every minute\n\
                    A->>B: ping\n\
                    end\n\
                    alt ok\n\
                    B->>A: pong\n\
                    else failed\n\
                    B-xA: error\n\
                    end\n\
                    Note right of B: thinking\n\
                    Note over A,B: shared";
        let (result, markup) = draw(&mut SequenceRenderer::new(), text);

        assert!(result.is_ok());
        assert_eq!(count(&markup, r#"class="loopLine""#), 2);
        assert_eq!(count(&markup, r#"class="note""#), 2);
        assert!(markup.contains("[Every minute]"));
        assert!(markup.contains("[failed]"));
    }

    #[test]
    fn test_self_message() {
        let (result, markup) = draw(&mut SequenceRenderer::new(), "sequenceDiagram\nA->>A: think");
        assert!(result.is_ok());
        assert!(markup.contains(" C "));
    }

    #[test]
    fn test_parse_failure() {
        let (result, _) = draw(
            &mut SequenceRenderer::new(),
            "sequenceDiagram\nloop forever\nA->B: x",
        );
        assert!(matches!(result, Err(RenderError::Parse(_))));
    }
}
