//! Statement-level grammars for each diagram kind.
//!
//! Every grammar follows the same shape: the definition is split into
//! [`Statement`]s, the first statement must be the diagram header, and each
//! remaining statement is parsed on its own with winnow. A statement that
//! fails is reported through the [`DiagnosticCollector`] and parsing moves on
//! to the next one, so one run reports every broken line.

pub(crate) mod dot;
pub(crate) mod flowchart;
pub(crate) mod gantt;
pub(crate) mod info;
pub(crate) mod sequence;

use winnow::{
    Parser,
    ascii::space0,
    combinator::{delimited, trace},
    error::{ContextError, ErrMode, ModalResult},
    stream::LocatingSlice,
    token::{take_till, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode},
    span::Span,
};

pub(crate) type Input<'a> = LocatingSlice<&'a str>;
pub(crate) type PResult<O> = ModalResult<O, ContextError<Expected>>;
pub(crate) type PError = ErrMode<ContextError<Expected>>;

/// What a statement parser was looking for when it failed.
///
/// Attached to winnow errors with `.context(...)` and turned into a
/// [`Diagnostic`] by [`parse_statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Expected {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
}

impl Expected {
    pub const fn new(code: ErrorCode, message: &'static str) -> Self {
        Self {
            code,
            message,
            help: None,
        }
    }

    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

/// One trimmed statement and its location in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Statement<'a> {
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Statement<'a> {
    fn new(source: &'a str, start: usize, end: usize, base: usize) -> Option<Self> {
        let raw = &source[start..end];
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        if text.is_empty() || text.starts_with("%%") {
            return None;
        }
        let start = base + start + leading;
        Some(Self {
            text,
            span: Span::new(start..start + text.len()),
        })
    }

    /// First whitespace-delimited word of the statement.
    pub fn keyword(&self) -> &'a str {
        self.text
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or_default()
    }

    /// The statement with a trailing `;` removed.
    pub fn without_semicolon(self) -> Self {
        let text = self.text.strip_suffix(';').unwrap_or(self.text).trim_end();
        Self {
            text,
            span: Span::new(self.span.start()..self.span.start() + text.len()),
        }
    }

    /// Span of a sub-slice of this statement's text.
    pub fn span_of(&self, part: &str) -> Span {
        let offset = (part.as_ptr() as usize)
            .saturating_sub(self.text.as_ptr() as usize)
            .min(self.text.len());
        Span::new(offset..offset + part.len()).shifted(self.span.start())
    }
}

/// Splits `source` into statements.
///
/// Newlines always separate statements; `;` does too when `semicolons` is
/// set. Separators inside double quotes or any bracket pair do not count.
/// Blank statements and `%%` comments are dropped. `base` is added to every
/// span, for grammars that split a sub-slice of the definition.
pub(crate) fn statements(source: &str, base: usize, semicolons: bool) -> Vec<Statement<'_>> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in source.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' | '{' if !in_quotes => depth += 1,
            ']' | ')' | '}' if !in_quotes => depth = depth.saturating_sub(1),
            '\n' => {
                // A line break always ends quoting and brackets.
                in_quotes = false;
                depth = 0;
                result.extend(Statement::new(source, start, index, base));
                start = index + 1;
            }
            ';' if semicolons && !in_quotes && depth == 0 => {
                result.extend(Statement::new(source, start, index, base));
                start = index + 1;
            }
            _ => {}
        }
    }
    result.extend(Statement::new(source, start, source.len(), base));
    result
}

/// Runs `parser` over a whole statement.
///
/// The parser must consume the statement completely. Failures become a
/// diagnostic labelled from the failure point to the end of the statement;
/// without a context they are reported as an unexpected token.
pub(crate) fn parse_statement<'a, O, P>(
    statement: &Statement<'a>,
    mut parser: P,
) -> Result<O, Diagnostic>
where
    P: Parser<Input<'a>, O, PError>,
{
    parser
        .parse(LocatingSlice::new(statement.text))
        .map_err(|err| {
            let offset = err.offset().min(statement.text.len());
            let end = statement.text.len().max(offset + 1);
            let span = Span::new(offset..end).shifted(statement.span.start());

            match err.inner().context().next() {
                Some(expected) => {
                    let mut diag = Diagnostic::error(expected.message)
                        .with_code(expected.code)
                        .with_label(span, expected.code.description());
                    if let Some(help) = expected.help {
                        diag = diag.with_help(help);
                    }
                    diag
                }
                None => Diagnostic::error(format!(
                    "unexpected token in `{}`",
                    statement.text
                ))
                .with_code(ErrorCode::E100)
                .with_label(span, ErrorCode::E100.description()),
            }
        })
}

/// Reports a statement that no grammar rule accepts.
pub(crate) fn unexpected(statement: &Statement<'_>, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message)
        .with_code(ErrorCode::E100)
        .with_label(statement.span, ErrorCode::E100.description())
}

/// A vertex, actor or task identifier.
pub(crate) fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    trace(
        "identifier",
        take_while(1.., |c: char| c.is_alphanumeric() || c == '_'),
    )
    .parse_next(input)
}

pub(crate) fn skip_space(input: &mut Input<'_>) -> PResult<()> {
    space0.void().parse_next(input)
}

/// The rest of the statement, trimmed.
pub(crate) fn rest_of_line<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_till(0.., |_: char| false)
        .map(str::trim)
        .parse_next(input)
}

/// Surrounding whitespace around `parser`.
pub(crate) fn padded<'a, O, P>(parser: P) -> impl Parser<Input<'a>, O, PError>
where
    P: Parser<Input<'a>, O, PError>,
{
    delimited(space0, parser, space0)
}

/// Removes one pair of surrounding double quotes.
pub(crate) fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}
