//! `info` grammar: the header plus an optional `showInfo` statement.

use winnow::{Parser, ascii::Caseless};

use merrow_core::semantic::{Diagram, InfoModel};

use super::{Expected, Input, PResult, parse_statement, statements, unexpected};
use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

pub fn parse(source: &str) -> Result<Diagram, ParseError> {
    let stmts = statements(source, 0, true);
    let Some((head, body)) = stmts.split_first() else {
        return Err(Diagnostic::error("definition is empty")
            .with_code(ErrorCode::E001)
            .with_help("start the definition with `info`")
            .into());
    };

    let mut diagnostics = DiagnosticCollector::new();
    let mut show_info = false;

    // `info showInfo` may share the header line.
    let mut words = head.text.split_whitespace();
    parse_statement(head, header)
        .or_else(|err| match (words.next(), words.next(), words.next()) {
            (Some(keyword), Some("showInfo"), None) if keyword.eq_ignore_ascii_case("info") => {
                show_info = true;
                Ok(())
            }
            _ => Err(err),
        })?;

    for stmt in body {
        if stmt.text == "showInfo" {
            show_info = true;
        } else {
            let message = format!("unexpected `{}` in info diagram", stmt.text);
            diagnostics.emit(unexpected(stmt, message));
        }
    }

    diagnostics.finish(Diagram::Info(InfoModel::new(show_info)))
}

fn header(input: &mut Input<'_>) -> PResult<()> {
    Caseless("info")
        .void()
        .context(
            Expected::new(ErrorCode::E001, "expected an `info` header")
                .with_help("start the definition with `info`"),
        )
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show_info(source: &str) -> bool {
        match parse(source).unwrap() {
            Diagram::Info(model) => model.show_info(),
            other => panic!("expected info, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_plain_info() {
        assert!(!show_info("info"));
    }

    #[test]
    fn test_show_info() {
        assert!(show_info("info\nshowInfo"));
        assert!(show_info("INFO showInfo"));
    }

    #[test]
    fn test_rejects_other_statements() {
        let err = parse("info\nA->B").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E100));
    }
}
