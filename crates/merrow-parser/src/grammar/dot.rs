//! Dot-style `digraph` grammar.
//!
//! Covers the subset of dot needed to draw simple flowcharts:
//!
//! ```text
//! digraph G {
//!     rankdir=LR;
//!     node [shape=box];
//!     start [label="Begin", shape=circle];
//!     start -> check -> done [label="ok"];
//!     check -- retry [style=dotted];
//! }
//! ```
//!
//! Default attribute statements (`graph`, `node`, `edge`) are accepted and
//! ignored, except for `graph [rankdir=...]`.

use winnow::{
    Parser,
    ascii::{Caseless, space0, space1},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated},
    token::{one_of, take_until, take_while},
};

use merrow_core::{
    identifier::Id,
    semantic::{Diagram, Direction, Edge, EdgeHead, EdgeStroke, FlowModel, FlowSyntax, VertexShape},
};

use super::{
    Expected, Input, PResult, Statement, identifier, padded, parse_statement, skip_space,
    statements,
};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

type Attributes<'a> = Vec<(&'a str, &'a str)>;

#[derive(Debug, PartialEq, Eq)]
enum DotStatement<'a> {
    /// `graph|node|edge [...]`
    Defaults(&'a str, Attributes<'a>),
    /// `key = value` at graph level.
    Assign(&'a str, &'a str),
    /// A node, or a chain of edges, with trailing attributes.
    Chain(&'a str, Vec<(EdgeHead, &'a str)>, Attributes<'a>),
}

/// Parses a `digraph` definition into a flowchart model.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let (open, close) = braces(source)?;
    parse_statement(&header_statement(source, open), header)?;

    let mut diagnostics = DiagnosticCollector::new();
    let mut model = FlowModel::new(FlowSyntax::Dot, Direction::TopBottom);

    let body = &source[open + 1..close];
    for stmt in statements(body, open + 1, true) {
        if stmt.text.starts_with("//") || stmt.text.starts_with('#') {
            continue;
        }
        if let Some(parsed) = diagnostics.collect(parse_statement(&stmt, statement)) {
            apply(&mut model, &stmt, parsed, &mut diagnostics);
        }
    }

    diagnostics.finish(model).map(Diagram::Flowchart)
}

/// Byte offsets of the body's opening and closing braces.
fn braces(source: &str) -> Result<(usize, usize), Diagnostic> {
    let Some(open) = source.find('{') else {
        let end = source.trim_end().len();
        return Err(Diagnostic::error("digraph has no body")
            .with_code(ErrorCode::E102)
            .with_label(Span::new(end.saturating_sub(1)..end), "expected `{` here")
            .with_help("wrap the statements in `{ ... }`"));
    };

    let close = source
        .rfind('}')
        .filter(|close| *close > open)
        .ok_or_else(|| {
            Diagnostic::error("digraph body is never closed")
                .with_code(ErrorCode::E102)
                .with_label(Span::new(open..open + 1), "opened here")
                .with_help("add a closing `}`")
        })?;

    let trailing = source[close + 1..].trim();
    if !trailing.is_empty() {
        let after = &source[close + 1..];
        let start = close + 1 + (after.len() - after.trim_start().len());
        return Err(Diagnostic::error("unexpected text after the digraph body")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(start..start + trailing.len()), "unexpected")
            .with_secondary_label(Span::new(close..close + 1), "body closed here"));
    }

    Ok((open, close))
}

fn header_statement(source: &str, open: usize) -> Statement<'_> {
    statements(&source[..open], 0, false)
        .into_iter()
        .next()
        .unwrap_or(Statement {
            text: "",
            span: Span::new(open..open),
        })
}

fn header<'a>(input: &mut Input<'a>) -> PResult<Option<&'a str>> {
    preceded(
        Caseless("digraph").context(
            Expected::new(ErrorCode::E001, "expected a `digraph` header")
                .with_help("start the definition with `digraph {`"),
        ),
        opt(preceded(space1, node_id)),
    )
    .parse_next(input)
}

fn statement<'a>(input: &mut Input<'a>) -> PResult<DotStatement<'a>> {
    alt((defaults, assign, chain)).parse_next(input)
}

fn defaults<'a>(input: &mut Input<'a>) -> PResult<DotStatement<'a>> {
    (
        alt(("graph", "node", "edge")),
        preceded(space0, attributes),
    )
        .map(|(target, attrs)| DotStatement::Defaults(target, attrs))
        .parse_next(input)
}

fn assign<'a>(input: &mut Input<'a>) -> PResult<DotStatement<'a>> {
    (identifier, preceded(padded('='), value))
        .map(|(key, value)| DotStatement::Assign(key, value))
        .parse_next(input)
}

fn chain<'a>(input: &mut Input<'a>) -> PResult<DotStatement<'a>> {
    (
        node_id,
        repeat(0.., edge_step),
        opt(preceded(space0, attributes)),
    )
        .map(|(first, steps, attrs)| DotStatement::Chain(first, steps, attrs.unwrap_or_default()))
        .parse_next(input)
}

fn edge_step<'a>(input: &mut Input<'a>) -> PResult<(EdgeHead, &'a str)> {
    (
        padded(alt(("->".value(EdgeHead::Arrow), "--".value(EdgeHead::Open)))),
        cut_err(node_id).context(
            Expected::new(ErrorCode::E101, "edge has no target node")
                .with_help("add a node after the arrow, e.g. `a -> b`"),
        ),
    )
        .parse_next(input)
}

fn attributes<'a>(input: &mut Input<'a>) -> PResult<Attributes<'a>> {
    delimited(
        ('[', space0),
        separated(0.., attribute, attribute_separator),
        (
            skip_space,
            cut_err(']').context(
                Expected::new(ErrorCode::E102, "unclosed attribute list")
                    .with_help("close the list with `]`"),
            ),
        ),
    )
    .parse_next(input)
}

fn attribute_separator(input: &mut Input<'_>) -> PResult<()> {
    alt(((space0, one_of([',', ';']), space0).void(), space1.void())).parse_next(input)
}

fn attribute<'a>(input: &mut Input<'a>) -> PResult<(&'a str, &'a str)> {
    (identifier, preceded(padded('='), value)).parse_next(input)
}

fn value<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    alt((
        quoted,
        take_while(1.., |c: char| {
            !c.is_whitespace() && !matches!(c, ',' | ';' | ']' | '[' | '=')
        }),
    ))
    .parse_next(input)
}

fn node_id<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    alt((quoted, identifier)).parse_next(input)
}

fn quoted<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    delimited(
        '"',
        take_until(0.., "\""),
        cut_err('"').context(Expected::new(ErrorCode::E102, "unterminated string")),
    )
    .parse_next(input)
}

fn apply(
    model: &mut FlowModel,
    stmt: &Statement<'_>,
    parsed: DotStatement<'_>,
    diagnostics: &mut DiagnosticCollector,
) {
    match parsed {
        DotStatement::Defaults(target, attrs) => {
            if target == "graph" {
                for (key, value) in attrs {
                    assign_graph(model, stmt, key, value, diagnostics);
                }
            }
        }
        DotStatement::Assign(key, value) => assign_graph(model, stmt, key, value, diagnostics),
        DotStatement::Chain(first, steps, attrs) if steps.is_empty() => {
            let mut text = None;
            let mut shape = None;
            for (key, value) in attrs {
                match key {
                    "label" => text = Some(value.to_string()),
                    "shape" => {
                        shape = node_shape(value);
                        if shape.is_none() {
                            diagnostics.emit(
                                Diagnostic::warning(format!("unsupported shape `{value}`"))
                                    .with_label(stmt.span_of(value), "drawn as a box"),
                            );
                        }
                    }
                    _ => {}
                }
            }
            model.add_vertex(Id::new(first), text, shape);
        }
        DotStatement::Chain(first, steps, attrs) => {
            let mut text = None;
            let mut stroke = EdgeStroke::Normal;
            for (key, value) in attrs {
                match (key, value) {
                    ("label", value) => text = Some(value),
                    ("style", "dotted" | "dashed") => stroke = EdgeStroke::Dotted,
                    ("style", "bold") => stroke = EdgeStroke::Thick,
                    _ => {}
                }
            }

            let mut previous = Id::new(first);
            for (head, target) in steps {
                let next = Id::new(target);
                let mut edge = Edge::new(previous, next)
                    .with_head(head)
                    .with_stroke(stroke);
                if let Some(text) = text {
                    edge = edge.with_text(text);
                }
                model.add_edge(edge);
                previous = next;
            }
        }
    }
}

fn assign_graph(
    model: &mut FlowModel,
    stmt: &Statement<'_>,
    key: &str,
    value: &str,
    diagnostics: &mut DiagnosticCollector,
) {
    if key != "rankdir" {
        return;
    }
    match Direction::from_keyword(value) {
        Some(direction) => model.set_direction(direction),
        None => diagnostics.emit(
            Diagnostic::warning(format!("unknown rankdir `{value}`"))
                .with_code(ErrorCode::E002)
                .with_label(stmt.span_of(value), "ignored"),
        ),
    }
}

fn node_shape(name: &str) -> Option<VertexShape> {
    match name {
        "box" | "rect" | "rectangle" | "square" => Some(VertexShape::Rect),
        "ellipse" | "oval" => Some(VertexShape::Round),
        "circle" | "doublecircle" => Some(VertexShape::Circle),
        "diamond" => Some(VertexShape::Diamond),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(source: &str) -> FlowModel {
        match parse(source).unwrap() {
            Diagram::Flowchart(model) => model,
            other => panic!("expected flowchart, got {:?}", other.kind()),
        }
    }

    fn first_code(source: &str) -> Option<ErrorCode> {
        parse(source).unwrap_err().diagnostics()[0].code()
    }

    #[test]
    fn test_minimal_digraph() {
        let model = flow("digraph { a -> b }");
        assert_eq!(model.syntax(), FlowSyntax::Dot);
        assert_eq!(model.edges().len(), 1);
        assert_eq!(model.direction(), Direction::TopBottom);
    }

    #[test]
    fn test_named_graph_with_attributes() {
        let model = flow(
            "digraph G {\n  rankdir=LR;\n  node [shape=box];\n  a [label=\"Start\", shape=circle];\n  a -> b -> c [label=go, style=dotted];\n  c -- a\n}",
        );
        assert_eq!(model.direction(), Direction::LeftRight);

        let a = model.vertex(Id::new("a")).unwrap();
        assert_eq!(a.label(), "Start");
        assert_eq!(a.shape(), VertexShape::Circle);

        let edges = model.edges();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[1].text(), Some("go"));
        assert_eq!(edges[1].stroke(), EdgeStroke::Dotted);
        assert_eq!(edges[2].head(), EdgeHead::Open);
    }

    #[test]
    fn test_graph_defaults_set_rankdir() {
        let model = flow("digraph {\n  graph [rankdir=RL]\n  a -> b\n}");
        assert_eq!(model.direction(), Direction::RightLeft);
    }

    #[test]
    fn test_unknown_shape_is_only_a_warning() {
        let model = flow("digraph { a [shape=star] }");
        assert_eq!(model.vertex(Id::new("a")).unwrap().shape(), VertexShape::Rect);
    }

    #[test]
    fn test_missing_braces() {
        assert_eq!(first_code("digraph G"), Some(ErrorCode::E102));
        assert_eq!(first_code("digraph G { a -> b"), Some(ErrorCode::E102));
    }

    #[test]
    fn test_dangling_edge() {
        assert_eq!(first_code("digraph { a -> }"), Some(ErrorCode::E101));
    }

    #[test]
    fn test_unclosed_attribute_list() {
        assert_eq!(first_code("digraph { a [label=x\n}"), Some(ErrorCode::E102));
    }
}
