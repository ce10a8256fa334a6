//! `graph` / `flowchart` grammar.
//!
//! ```text
//! graph LR
//!     a[Start] --> b{Ready?}
//!     b -- yes --> c((Done))
//!     b -.->|no| a
//!     style a fill:#f9f,stroke:#333
//!     classDef hot fill:#f96
//!     class c hot
//!     click a openDetails "Show details"
//! ```

use winnow::{
    Parser,
    ascii::{Caseless, alpha1, space0, space1},
    combinator::{alt, cut_err, delimited, fail, opt, preceded, separated, terminated},
    token::{literal, take_till, take_until},
};

use merrow_core::{
    identifier::Id,
    semantic::{
        ClassDef, ClickBinding, Diagram, Direction, Edge, EdgeHead, EdgeStroke, FlowModel,
        FlowSyntax, VertexShape,
    },
};

use super::{
    Expected, Input, PError, PResult, identifier, padded, parse_statement, rest_of_line, skip_space,
    statements, unquote,
};
use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

/// A vertex mention: id plus optional label text and shape.
#[derive(Debug, PartialEq, Eq)]
struct VertexRef<'a> {
    id: &'a str,
    text: Option<&'a str>,
    shape: Option<VertexShape>,
}

#[derive(Debug, PartialEq, Eq)]
struct Link<'a> {
    stroke: EdgeStroke,
    head: EdgeHead,
    text: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
enum FlowStatement<'a> {
    Chain(VertexRef<'a>, Vec<(Link<'a>, VertexRef<'a>)>),
    Style(&'a str, Vec<String>),
    ClassDef(&'a str, Vec<String>),
    Class(Vec<&'a str>, &'a str),
    Click(&'a str, &'a str, Option<&'a str>),
}

/// Parses a `graph` definition into a flowchart model.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let mut diagnostics = DiagnosticCollector::new();
    let stmts = statements(source, 0, true);

    let Some((head, body)) = stmts.split_first() else {
        return Err(missing_header().into());
    };
    // Nothing after a broken header is worth reporting.
    let direction = parse_statement(head, header)?;

    let mut model = FlowModel::new(FlowSyntax::Graph, direction);
    for stmt in body {
        if let Some(parsed) = diagnostics.collect(parse_statement(stmt, statement)) {
            apply(&mut model, parsed);
        }
    }

    diagnostics
        .finish(model)
        .map(Diagram::Flowchart)
}

fn missing_header() -> Diagnostic {
    Diagnostic::error("definition is empty")
        .with_code(ErrorCode::E001)
        .with_help("start the definition with `graph TD`")
}

fn apply(model: &mut FlowModel, statement: FlowStatement<'_>) {
    match statement {
        FlowStatement::Chain(first, links) => {
            let mut previous = declare(model, first);
            for (link, target) in links {
                let next = declare(model, target);
                let mut edge = Edge::new(previous, next)
                    .with_stroke(link.stroke)
                    .with_head(link.head);
                if let Some(text) = link.text {
                    edge = edge.with_text(text);
                }
                model.add_edge(edge);
                previous = next;
            }
        }
        FlowStatement::Style(id, styles) => model.add_styles(Id::new(id), styles),
        FlowStatement::ClassDef(name, styles) => model.add_class_def(ClassDef::new(name, styles)),
        FlowStatement::Class(ids, class) => {
            for id in ids {
                model.add_class(Id::new(id), class);
            }
        }
        FlowStatement::Click(id, callback, tooltip) => {
            let vertex = Id::new(id);
            model.add_vertex(vertex, None, None);
            model.add_click(ClickBinding::new(
                vertex,
                callback,
                tooltip.map(str::to_string),
            ));
        }
    }
}

fn declare(model: &mut FlowModel, vertex: VertexRef<'_>) -> Id {
    let id = Id::new(vertex.id);
    model.add_vertex(id, vertex.text.map(str::to_string), vertex.shape);
    id
}

fn header(input: &mut Input<'_>) -> PResult<Direction> {
    preceded(
        alt((Caseless("graph"), Caseless("flowchart"))).context(
            Expected::new(ErrorCode::E001, "expected a `graph` header")
                .with_help("start the definition with `graph TD`"),
        ),
        cut_err(preceded(space1, alpha1).verify_map(Direction::from_keyword)).context(
            Expected::new(ErrorCode::E002, "missing or unknown graph direction")
                .with_help("use one of `TB`, `TD`, `BT`, `LR` or `RL`"),
        ),
    )
    .parse_next(input)
}

fn statement<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    alt((style, class_def, class, click, chain)).parse_next(input)
}

fn keyword<'a>(word: &'static str) -> impl Parser<Input<'a>, &'a str, PError> {
    terminated(literal(word), space1)
}

fn style<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    preceded(
        keyword("style"),
        cut_err((terminated(identifier, space1), style_list)).context(
            Expected::new(ErrorCode::E101, "incomplete style statement")
                .with_help("write `style <id> <property>:<value>,...`"),
        ),
    )
    .map(|(id, styles)| FlowStatement::Style(id, styles))
    .parse_next(input)
}

fn class_def<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    preceded(
        keyword("classDef"),
        cut_err((terminated(identifier, space1), style_list)).context(
            Expected::new(ErrorCode::E101, "incomplete classDef statement")
                .with_help("write `classDef <name> <property>:<value>,...`"),
        ),
    )
    .map(|(name, styles)| FlowStatement::ClassDef(name, styles))
    .parse_next(input)
}

fn class<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    preceded(
        keyword("class"),
        cut_err((
            separated(1.., identifier, padded(',')),
            preceded(space1, identifier),
        ))
        .context(
            Expected::new(ErrorCode::E101, "incomplete class statement")
                .with_help("write `class <id>,<id> <className>`"),
        ),
    )
    .map(|(ids, class)| FlowStatement::Class(ids, class))
    .parse_next(input)
}

fn click<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    preceded(
        keyword("click"),
        cut_err((
            identifier,
            preceded(space1, take_till(1.., |c: char| c.is_whitespace())),
            opt(preceded(
                space1,
                delimited('"', take_until(0.., "\""), '"'),
            )),
        ))
        .context(
            Expected::new(ErrorCode::E101, "incomplete click statement")
                .with_help("write `click <id> <callback> \"tooltip\"`"),
        ),
    )
    .map(|(id, callback, tooltip)| FlowStatement::Click(id, callback, tooltip))
    .parse_next(input)
}

fn style_list(input: &mut Input<'_>) -> PResult<Vec<String>> {
    rest_of_line
        .verify(|rest: &str| !rest.is_empty())
        .map(|rest: &str| {
            rest.split(',')
                .map(str::trim)
                .filter(|style| !style.is_empty())
                .map(str::to_string)
                .collect()
        })
        .parse_next(input)
}

fn chain<'a>(input: &mut Input<'a>) -> PResult<FlowStatement<'a>> {
    let first = vertex.parse_next(input)?;
    let mut links = Vec::new();

    loop {
        skip_space(input)?;
        if input.is_empty() {
            break;
        }
        let Some(link) = opt(link).parse_next(input)? else {
            let expected = if input.starts_with(['-', '=', '.']) {
                Expected::new(ErrorCode::E101, "incomplete edge")
                    .with_help("complete the edge, e.g. `a --> b`")
            } else {
                Expected::new(ErrorCode::E100, "expected an edge or the end of the statement")
            };
            return cut_err(fail).context(expected).parse_next(input);
        };
        skip_space(input)?;
        let target = cut_err(vertex)
            .context(
                Expected::new(ErrorCode::E101, "edge has no target vertex")
                    .with_help("add a vertex after the arrow, e.g. `a --> b`"),
            )
            .parse_next(input)?;
        links.push((link, target));
    }

    Ok(FlowStatement::Chain(first, links))
}

fn vertex<'a>(input: &mut Input<'a>) -> PResult<VertexRef<'a>> {
    (identifier, opt(shape))
        .map(|(id, shaped)| VertexRef {
            id,
            text: shaped.map(|(text, _)| text),
            shape: shaped.map(|(_, shape)| shape),
        })
        .parse_next(input)
}

fn shape<'a>(input: &mut Input<'a>) -> PResult<(&'a str, VertexShape)> {
    alt((
        enclosed("((", "))", VertexShape::Circle),
        enclosed("(", ")", VertexShape::Round),
        enclosed("[", "]", VertexShape::Rect),
        enclosed("{", "}", VertexShape::Diamond),
        enclosed(">", "]", VertexShape::Odd),
    ))
    .parse_next(input)
}

fn enclosed<'a>(
    open: &'static str,
    close: &'static str,
    shape: VertexShape,
) -> impl Parser<Input<'a>, (&'a str, VertexShape), PError> {
    preceded(
        open,
        cut_err(terminated(take_until(0.., close), close)).context(
            Expected::new(ErrorCode::E102, "unclosed vertex label")
                .with_help("close the label with its matching bracket"),
        ),
    )
    .map(move |text| (unquote(text), shape))
}

fn link<'a>(input: &mut Input<'a>) -> PResult<Link<'a>> {
    let (stroke, head, inline) = alt((
        plain_link,
        labelled_link("--", "-->", "---", EdgeStroke::Normal),
        labelled_link("-.", ".->", ".-", EdgeStroke::Dotted),
        labelled_link("==", "==>", "===", EdgeStroke::Thick),
    ))
    .parse_next(input)?;

    let piped = opt(piped_text).parse_next(input)?;

    Ok(Link {
        stroke,
        head,
        text: inline.or(piped).map(unquote),
    })
}

fn piped_text<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    preceded(space0, delimited('|', take_until(0.., "|"), '|')).parse_next(input)
}

type LinkParts<'a> = (EdgeStroke, EdgeHead, Option<&'a str>);

fn plain_link<'a>(input: &mut Input<'a>) -> PResult<LinkParts<'a>> {
    alt((
        "-->".value((EdgeStroke::Normal, EdgeHead::Arrow, None)),
        "---".value((EdgeStroke::Normal, EdgeHead::Open, None)),
        "-.->".value((EdgeStroke::Dotted, EdgeHead::Arrow, None)),
        "-.-".value((EdgeStroke::Dotted, EdgeHead::Open, None)),
        "==>".value((EdgeStroke::Thick, EdgeHead::Arrow, None)),
        "===".value((EdgeStroke::Thick, EdgeHead::Open, None)),
    ))
    .parse_next(input)
}

/// `-- text -->` style links: an opener, label text, then an arrow or open end.
fn labelled_link<'a>(
    open: &'static str,
    arrow: &'static str,
    line: &'static str,
    stroke: EdgeStroke,
) -> impl Parser<Input<'a>, LinkParts<'a>, PError> {
    let terminator = &arrow[..1];
    preceded(
        (open, space1),
        (
            take_until(1.., terminator),
            alt((
                arrow.value(EdgeHead::Arrow),
                line.value(EdgeHead::Open),
            )),
        ),
    )
    .map(move |(text, head)| (stroke, head, Some(str::trim(text))))
}
