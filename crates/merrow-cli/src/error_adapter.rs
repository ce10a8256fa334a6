//! Presents [`MerrowError`]s as miette reports.
//!
//! A failed parse carries every problem found in the definition; each one
//! becomes its own [`Reportable`] pointing into the source. Every other
//! error becomes a single report without a snippet.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use merrow::MerrowError;
use merrow_parser::{
    Span,
    error::{Diagnostic, Severity},
};

/// One report shown to the user.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A grammar diagnostic and the definition it points into.
    Diagnostic { diag: &'a Diagnostic, src: &'a str },
    /// An error without source location.
    Error(&'a MerrowError),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic { diag, .. } => f.write_str(diag.message()),
            Reportable::Error(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic { .. } => None,
            Reportable::Error(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic { diag, .. } => diag
                .code()
                .map(|code| Box::new(code) as Box<dyn fmt::Display>),
            Reportable::Error(err) => {
                error_code(err).map(|code| Box::new(code) as Box<dyn fmt::Display>)
            }
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Diagnostic { diag, .. } => Some(match diag.severity() {
                Severity::Error => MietteSeverity::Error,
                Severity::Warning => MietteSeverity::Warning,
            }),
            Reportable::Error(_) => Some(MietteSeverity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic { diag, .. } => diag
                .help()
                .or_else(|| diag.code().map(|code| code.description()))
                .map(|help| Box::new(help) as Box<dyn fmt::Display>),
            Reportable::Error(MerrowError::Config(_)) => Some(Box::new(
                "configuration files are TOML with one table per diagram type",
            ) as Box<dyn fmt::Display>),
            Reportable::Error(MerrowError::Unrecognized(_)) => Some(Box::new(
                "start with a diagram keyword such as graph, flowchart, digraph, sequenceDiagram, gantt or info",
            ) as Box<dyn fmt::Display>),
            Reportable::Error(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic { src, .. } => Some(src as &dyn miette::SourceCode),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Reportable::Diagnostic { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }

        Some(Box::new(diag.labels().iter().map(|label| {
            let message = Some(label.message().to_string());
            let span = to_source_span(label.span());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Splits an error into the reports shown to the user, one per grammar
/// diagnostic.
pub fn to_reportables(err: &MerrowError) -> Vec<Reportable<'_>> {
    match err {
        MerrowError::Parse { err: parse_err, src } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic { diag, src })
            .collect(),
        _ => vec![Reportable::Error(err)],
    }
}

fn error_code(err: &MerrowError) -> Option<&'static str> {
    match err {
        MerrowError::Io(_) => Some("merrow::io"),
        MerrowError::Parse { .. } => None,
        MerrowError::Render(_) => Some("merrow::render"),
        MerrowError::Scene(_) => Some("merrow::scene"),
        MerrowError::Config(_) => Some("merrow::config"),
        MerrowError::Unrecognized(_) => Some("merrow::unrecognized"),
    }
}

fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}
