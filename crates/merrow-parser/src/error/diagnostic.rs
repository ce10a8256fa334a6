//! A single error or warning with source locations.

use std::fmt;

use crate::{
    error::{ErrorCode, Label, Severity},
    span::Span,
};

/// One problem found in a diagram definition.
///
/// Built with a fluent API:
///
/// ```
/// # use merrow_parser::error::{Diagnostic, ErrorCode};
/// # use merrow_parser::Span;
/// let diag = Diagnostic::error("unknown task `a1`")
///     .with_code(ErrorCode::E202)
///     .with_label(Span::new(20..28), "referenced here");
/// assert!(diag.severity().is_error());
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds the primary label, pointing at the offending text.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Adds a label pointing at related text.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_code() {
        let diag = Diagnostic::error("missing direction").with_code(ErrorCode::E002);
        assert_eq!(diag.to_string(), "error[E002]: missing direction");
    }

    #[test]
    fn test_display_without_code() {
        let diag = Diagnostic::warning("empty section");
        assert_eq!(diag.to_string(), "warning: empty section");
    }

    #[test]
    fn test_labels_keep_order_and_kind() {
        let diag = Diagnostic::error("`end` closes nothing")
            .with_label(Span::new(40..43), "unmatched `end`")
            .with_secondary_label(Span::new(0..4), "last block closed here")
            .with_help("remove the extra `end`");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_primary());
        assert!(diag.labels()[1].is_secondary());
        assert_eq!(diag.help(), Some("remove the extra `end`"));
    }
}
