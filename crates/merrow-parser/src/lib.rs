//! # Merrow Parser
//!
//! Type detection and grammars for Merrow diagram definitions.
//!
//! [`detect_type`] classifies a definition by its leading keyword. Each
//! grammar is a plain `fn(&str) -> Result<Diagram, ParseError>`, so callers
//! bind kinds to grammars in their own dispatch table.
//!
//! ## Usage
//!
//! ```
//! # use merrow_parser::{detect_type, parse_flowchart, error::ParseError};
//! # use merrow_core::kind::DiagramKind;
//! fn main() -> Result<(), ParseError> {
//!     let source = "graph LR\n  a[Start] --> b{Ready?}";
//!
//!     assert_eq!(detect_type(source), Some(DiagramKind::Flowchart));
//!     let diagram = parse_flowchart(source)?;
//!     assert_eq!(diagram.kind(), DiagramKind::Flowchart);
//!     Ok(())
//! }
//! ```
//!
//! Failures carry every problem found, each with an [`error::ErrorCode`] and
//! labeled [`Span`]s into the source.

mod detect;
pub mod error;
mod grammar;
mod span;

pub use detect::{DETECTION_RULES, RULES_VERSION, detect_type};
pub use grammar::{
    dot::parse as parse_dot,
    flowchart::parse as parse_flowchart,
    gantt::{DEFAULT_DATE_FORMAT, parse as parse_gantt, parse_date, parse_duration},
    info::parse as parse_info,
    sequence::parse as parse_sequence,
};
pub use span::Span;
