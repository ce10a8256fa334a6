//! Error codes of the Merrow grammars.
//!
//! Codes are grouped by what went wrong:
//! - `E0xx` - Diagram header
//! - `E1xx` - Statement structure
//! - `E2xx` - Gantt time resolution

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Header Errors (E0xx)
    // =========================================================================
    /// Unexpected header.
    ///
    /// The first statement does not open the diagram kind being parsed,
    /// e.g. a flowchart grammar fed `sequenceDiagram`.
    E001,

    /// Invalid direction.
    ///
    /// The `graph` header is missing its direction or names an unknown one.
    /// Valid directions are `TB`, `TD`, `BT`, `LR` and `RL`.
    E002,

    // =========================================================================
    // Statement Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete statement.
    ///
    /// A statement stopped before it was complete, such as an edge with no
    /// target vertex.
    E101,

    /// Unterminated block.
    ///
    /// A `{`, `loop`, `opt` or `alt` was opened and never closed.
    E102,

    /// Unbalanced block keyword.
    ///
    /// An `end` with no open block, or an `else` outside of `alt`.
    E103,

    // =========================================================================
    // Gantt Errors (E2xx)
    // =========================================================================
    /// Invalid date.
    ///
    /// A task start does not match the chart's `dateFormat`.
    E200,

    /// Invalid duration.
    ///
    /// Durations are a number followed by `s`, `m`, `h`, `d` or `w`.
    E201,

    /// Unknown task reference.
    ///
    /// An `after` clause names a task id that has not been defined.
    E202,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unexpected header",
            ErrorCode::E002 => "invalid direction",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete statement",
            ErrorCode::E102 => "unterminated block",
            ErrorCode::E103 => "unbalanced block keyword",
            ErrorCode::E200 => "invalid date",
            ErrorCode::E201 => "invalid duration",
            ErrorCode::E202 => "unknown task reference",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ErrorCode::E103.to_string(), "E103");
        assert_eq!(ErrorCode::E202.as_str(), "E202");
    }

    #[test]
    fn test_descriptions_are_lowercase() {
        for code in [ErrorCode::E001, ErrorCode::E101, ErrorCode::E201] {
            let description = code.description();
            assert_eq!(description, description.to_lowercase());
        }
    }
}
