//! `sequenceDiagram` grammar.
//!
//! ```text
//! sequenceDiagram
//!     participant A as Alice
//!     A->>B: Hello
//!     loop Every minute
//!         B-->>A: Still here
//!     end
//!     Note right of B: thinking
//! ```
//!
//! Statements are separated by newlines only; a trailing `;` is dropped.

use winnow::{
    Parser,
    ascii::{Caseless, space0, space1},
    combinator::{alt, cut_err, opt, preceded, separated},
};

use merrow_core::{
    identifier::Id,
    semantic::{BlockKind, Diagram, LineType, NotePlacement, SequenceEvent, SequenceModel},
};

use super::{
    Expected, Input, PResult, Statement, identifier, padded, parse_statement, rest_of_line,
    statements, unexpected,
};
use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

#[derive(Debug, PartialEq, Eq)]
enum SeqStatement<'a> {
    Participant(&'a str, Option<&'a str>),
    Message(&'a str, LineType, &'a str, &'a str),
    Note(NotePlacement, Vec<&'a str>, &'a str),
    Open(BlockKind, &'a str),
    Else(&'a str),
    End,
}

/// Parses a `sequenceDiagram` definition.
pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let stmts: Vec<_> = statements(source, 0, false)
        .into_iter()
        .map(Statement::without_semicolon)
        .collect();

    let Some((head, body)) = stmts.split_first() else {
        return Err(Diagnostic::error("definition is empty")
            .with_code(ErrorCode::E001)
            .with_help("start the definition with `sequenceDiagram`")
            .into());
    };
    parse_statement(head, header)?;

    let mut diagnostics = DiagnosticCollector::new();
    let mut model = SequenceModel::new();
    let mut open_blocks: Vec<(BlockKind, Span)> = Vec::new();

    for stmt in body {
        let Some(parsed) = diagnostics.collect(parse_one(stmt)) else {
            continue;
        };
        let event = match parsed {
            SeqStatement::Participant(id, alias) => {
                model.add_actor(Id::new(id), alias.map(str::to_string));
                continue;
            }
            SeqStatement::Message(from, line, to, text) => SequenceEvent::Message {
                from: Id::new(from),
                to: Id::new(to),
                text: text.to_string(),
                line,
            },
            SeqStatement::Note(placement, actors, text) => SequenceEvent::Note {
                actors: actors.into_iter().map(Id::new).collect(),
                placement,
                text: text.to_string(),
            },
            SeqStatement::Open(kind, label) => {
                open_blocks.push((kind, stmt.span));
                SequenceEvent::BlockStart {
                    kind,
                    label: label.to_string(),
                }
            }
            SeqStatement::Else(label) => {
                if !matches!(open_blocks.last(), Some((BlockKind::Alt, _))) {
                    diagnostics.emit(unbalanced(stmt, "`else` outside of an `alt` block"));
                    continue;
                }
                SequenceEvent::BlockElse {
                    label: label.to_string(),
                }
            }
            SeqStatement::End => {
                if open_blocks.pop().is_none() {
                    diagnostics.emit(unbalanced(stmt, "`end` without an open block"));
                    continue;
                }
                SequenceEvent::BlockEnd
            }
        };
        model.add_event(event);
    }

    for (kind, span) in open_blocks {
        diagnostics.emit(
            Diagnostic::error(format!("`{}` block is never closed", kind.keyword()))
                .with_code(ErrorCode::E102)
                .with_label(span, "opened here")
                .with_help("close the block with `end`"),
        );
    }

    diagnostics.finish(model).map(Diagram::Sequence)
}

fn unbalanced(stmt: &Statement<'_>, message: &str) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E103)
        .with_label(stmt.span, ErrorCode::E103.description())
}

/// Picks the statement parser from the leading keyword.
fn parse_one<'a>(stmt: &Statement<'a>) -> Result<SeqStatement<'a>, Diagnostic> {
    let keyword = stmt.keyword();
    match keyword.to_ascii_lowercase().as_str() {
        "participant" => parse_statement(stmt, participant),
        "note" => parse_statement(stmt, note),
        "loop" => parse_statement(stmt, block_open("loop", BlockKind::Loop)),
        "opt" => parse_statement(stmt, block_open("opt", BlockKind::Opt)),
        "alt" => parse_statement(stmt, block_open("alt", BlockKind::Alt)),
        "else" => parse_statement(stmt, preceded(Caseless("else"), rest_of_line))
            .map(SeqStatement::Else),
        "end" if stmt.text.eq_ignore_ascii_case("end") => Ok(SeqStatement::End),
        "sequencediagram" => Err(unexpected(stmt, "duplicate `sequenceDiagram` header")),
        _ => parse_statement(stmt, message),
    }
}

fn header(input: &mut Input<'_>) -> PResult<()> {
    Caseless("sequenceDiagram")
        .void()
        .context(
            Expected::new(ErrorCode::E001, "expected a `sequenceDiagram` header")
                .with_help("start the definition with `sequenceDiagram`"),
        )
        .parse_next(input)
}

fn participant<'a>(input: &mut Input<'a>) -> PResult<SeqStatement<'a>> {
    preceded(
        (Caseless("participant"), space1),
        cut_err((
            identifier,
            opt(preceded((space1, Caseless("as"), space1), rest_of_line)),
        ))
        .context(
            Expected::new(ErrorCode::E101, "incomplete participant declaration")
                .with_help("write `participant <id>` or `participant <id> as <alias>`"),
        ),
    )
    .map(|(id, alias)| SeqStatement::Participant(id, alias.filter(|a| !a.is_empty())))
    .parse_next(input)
}

fn note<'a>(input: &mut Input<'a>) -> PResult<SeqStatement<'a>> {
    preceded(
        (Caseless("note"), space1),
        cut_err((
            placement,
            preceded(space1, separated(1..=2, identifier, padded(','))),
            preceded(padded(':'), rest_of_line),
        ))
        .context(
            Expected::new(ErrorCode::E101, "incomplete note").with_help(
                "write `Note left of A: text`, `Note right of A: text` or `Note over A,B: text`",
            ),
        ),
    )
    .map(|(placement, actors, text)| SeqStatement::Note(placement, actors, text))
    .parse_next(input)
}

fn placement(input: &mut Input<'_>) -> PResult<NotePlacement> {
    alt((
        (Caseless("left"), space1, Caseless("of")).value(NotePlacement::LeftOf),
        (Caseless("right"), space1, Caseless("of")).value(NotePlacement::RightOf),
        Caseless("over").value(NotePlacement::Over),
    ))
    .parse_next(input)
}

fn block_open<'a>(
    keyword: &'static str,
    kind: BlockKind,
) -> impl Parser<Input<'a>, SeqStatement<'a>, super::PError> {
    preceded(Caseless(keyword), rest_of_line).map(move |label| SeqStatement::Open(kind, label))
}

fn message<'a>(input: &mut Input<'a>) -> PResult<SeqStatement<'a>> {
    (
        identifier,
        space0,
        cut_err(arrow).context(
            Expected::new(ErrorCode::E100, "expected a message arrow")
                .with_help("messages look like `A->>B: text`"),
        ),
        space0,
        cut_err(identifier).context(
            Expected::new(ErrorCode::E101, "message has no receiver")
                .with_help("name the receiving actor after the arrow"),
        ),
        opt(preceded(padded(':'), rest_of_line)),
    )
        .map(|(from, _, line, _, to, text)| {
            SeqStatement::Message(from, line, to, text.unwrap_or(""))
        })
        .parse_next(input)
}

fn arrow(input: &mut Input<'_>) -> PResult<LineType> {
    alt((
        "-->>".value(LineType::Dotted),
        "->>".value(LineType::Solid),
        "--x".value(LineType::DottedCross),
        "-x".value(LineType::SolidCross),
        "-->".value(LineType::DottedOpen),
        "->".value(LineType::SolidOpen),
    ))
    .parse_next(input)
}
