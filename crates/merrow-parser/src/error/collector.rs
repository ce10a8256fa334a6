//! Accumulates diagnostics across the statements of one definition.
//!
//! Grammars keep parsing after a bad statement so a single run reports every
//! problem, then call [`DiagnosticCollector::finish`].

use crate::error::{Diagnostic, ParseError};

#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.has_errors |= diagnostic.severity().is_error();
        self.diagnostics.push(diagnostic);
    }

    /// Records the error of `result`, if any, and returns its value.
    pub fn collect<T>(&mut self, result: Result<T, Diagnostic>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                self.emit(diagnostic);
                None
            }
        }
    }

    /// Returns `value` unless an error was emitted.
    ///
    /// Warnings alone do not fail the parse; they are logged instead.
    pub fn finish<T>(self, value: T) -> Result<T, ParseError> {
        if self.has_errors {
            return Err(ParseError::new(self.diagnostics));
        }
        for warning in &self.diagnostics {
            log::warn!(warning:% = warning; "Diagram definition warning");
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_without_diagnostics() {
        assert_eq!(DiagnosticCollector::new().finish(7).unwrap(), 7);
    }

    #[test]
    fn test_warning_does_not_fail() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("unused"));
        assert!(collector.finish(()).is_ok());
    }

    #[test]
    fn test_errors_are_all_kept() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("first"));
        collector.emit(Diagnostic::warning("aside"));
        assert_eq!(collector.collect::<()>(Err(Diagnostic::error("second"))), None);

        let err = collector.finish(()).unwrap_err();
        assert_eq!(err.diagnostics().len(), 3);
    }
}
