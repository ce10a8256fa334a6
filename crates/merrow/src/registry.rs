//! The closed table binding each diagram kind to its grammar, renderer and
//! configuration namespace.

use log::debug;

use merrow_core::{kind::DiagramKind, semantic::Diagram};
use merrow_parser::{
    error::ParseError, parse_dot, parse_flowchart, parse_gantt, parse_info, parse_sequence,
};

use crate::render::{
    DiagramRenderer, FlowchartRenderer, GanttRenderer, InfoRenderer, SequenceRenderer,
};

/// Parses a definition into its model.
pub type ParseFn = fn(&str) -> Result<Diagram, ParseError>;
/// Creates a fresh renderer.
pub type RendererFactory = fn() -> Box<dyn DiagramRenderer>;

/// Everything the orchestrator needs to handle one diagram kind.
#[derive(Debug, Clone, Copy)]
pub struct DiagramEntry {
    kind: DiagramKind,
    parse: ParseFn,
    renderer: RendererFactory,
}

impl DiagramEntry {
    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    /// Configuration namespace pushed into the renderer, if any.
    pub fn namespace(&self) -> Option<&'static str> {
        self.kind.namespace()
    }

    pub fn parse(&self, text: &str) -> Result<Diagram, ParseError> {
        (self.parse)(text)
    }

    pub fn renderer(&self) -> Box<dyn DiagramRenderer> {
        (self.renderer)()
    }
}

fn flowchart_renderer() -> Box<dyn DiagramRenderer> {
    Box::new(FlowchartRenderer::new())
}

fn sequence_renderer() -> Box<dyn DiagramRenderer> {
    Box::new(SequenceRenderer::new())
}

fn gantt_renderer() -> Box<dyn DiagramRenderer> {
    Box::new(GanttRenderer::new())
}

fn info_renderer() -> Box<dyn DiagramRenderer> {
    Box::new(InfoRenderer::new())
}

/// One row per kind, in [`DiagramKind::ALL`] order.
const TABLE: [DiagramEntry; DiagramKind::ALL.len()] = [
    DiagramEntry {
        kind: DiagramKind::Flowchart,
        parse: parse_flowchart,
        renderer: flowchart_renderer,
    },
    DiagramEntry {
        kind: DiagramKind::FlowchartDot,
        parse: parse_dot,
        renderer: flowchart_renderer,
    },
    DiagramEntry {
        kind: DiagramKind::Sequence,
        parse: parse_sequence,
        renderer: sequence_renderer,
    },
    DiagramEntry {
        kind: DiagramKind::Gantt,
        parse: parse_gantt,
        renderer: gantt_renderer,
    },
    DiagramEntry {
        kind: DiagramKind::Info,
        parse: parse_info,
        renderer: info_renderer,
    },
];

static REGISTRY: [DiagramEntry; DiagramKind::ALL.len()] = TABLE;

/// All registered kinds, in table order.
pub fn entries() -> &'static [DiagramEntry] {
    &REGISTRY
}

/// Returns the entry bound to `kind`.
pub fn entry(kind: DiagramKind) -> &'static DiagramEntry {
    &REGISTRY[kind as usize]
}

const _: () = {
    let mut index = 0;
    while index < TABLE.len() {
        assert!(TABLE[index].kind as usize == index, "registry rows out of order");
        index += 1;
    }
};

/// Parses `text` with the grammar registered for `kind`.
///
/// Each call returns a new model.
pub fn parse_diagram(text: &str, kind: DiagramKind) -> Result<Diagram, ParseError> {
    let result = entry(kind).parse(text);
    match &result {
        Ok(_) => debug!(kind:%; "Definition parsed"),
        Err(err) => debug!(
            kind:%,
            diagnostics = err.diagnostics().len();
            "Definition failed to parse"
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use merrow_parser::error::ErrorCode;

    use super::*;

    #[test]
    fn test_every_kind_registered_once() {
        for kind in DiagramKind::ALL {
            let count = entries().iter().filter(|entry| entry.kind() == kind).count();
            assert_eq!(count, 1, "{kind}");
            assert_eq!(entry(kind).kind(), kind);
        }
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(entry(DiagramKind::FlowchartDot).namespace(), Some("flowchart"));
        assert_eq!(entry(DiagramKind::Sequence).namespace(), Some("sequenceDiagram"));
        assert_eq!(entry(DiagramKind::Info).namespace(), None);
    }

    #[test]
    fn test_parse_returns_model_of_kind() {
        for (text, kind) in [
            ("graph TD\na-->b", DiagramKind::Flowchart),
            ("digraph { a -> b }", DiagramKind::FlowchartDot),
            ("sequenceDiagram\nA->>B: hi", DiagramKind::Sequence),
            ("gantt\ntask :t1, 2014-01-01, 2d", DiagramKind::Gantt),
            ("info", DiagramKind::Info),
        ] {
            assert_eq!(parse_diagram(text, kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_parse_failure_is_a_value() {
        assert!(parse_diagram("graph TD\na--", DiagramKind::Flowchart).is_err());
    }

    #[test]
    fn test_kind_mismatch_is_header_error() {
        let err = parse_diagram("gantt", DiagramKind::Sequence).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_sequential_parses_are_independent() {
        let first = parse_diagram("sequenceDiagram\nA->>B: one", DiagramKind::Sequence).unwrap();
        let second =
            parse_diagram("sequenceDiagram\nC->>D: two\nD->>E: three", DiagramKind::Sequence)
                .unwrap();

        let actors = |diagram: &Diagram| match diagram {
            Diagram::Sequence(model) => model.actor_count(),
            _ => 0,
        };
        assert_eq!(actors(&first), 2);
        assert_eq!(actors(&second), 3);
    }
}
