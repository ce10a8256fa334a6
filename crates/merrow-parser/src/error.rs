//! Diagnostics reported by the Merrow grammars.
//!
//! Every grammar reports problems as [`Diagnostic`]s: a severity, an optional
//! [`ErrorCode`], labeled source spans and an optional help line. The
//! diagnostics of one parse are returned together as a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use merrow_parser::error::{Diagnostic, ErrorCode};
//! # use merrow_parser::Span;
//!
//! let diag = Diagnostic::error("edge has no target vertex")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(9..11), "dangling edge")
//!     .with_help("add a vertex after the arrow, e.g. `a --> b`");
//! assert_eq!(diag.to_string(), "error[E101]: edge has no target vertex");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
