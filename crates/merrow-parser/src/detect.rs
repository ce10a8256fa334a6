//! Diagram type detection.
//!
//! [`detect_type`] classifies a definition by its first significant token,
//! checked against [`DETECTION_RULES`] in order. The table is versioned by
//! [`RULES_VERSION`]; any change to its order or keywords bumps the version.

use log::debug;

use merrow_core::kind::DiagramKind;

/// Version of [`DETECTION_RULES`].
pub const RULES_VERSION: u32 = 1;

/// Keyword to kind rules. The first rule whose keyword equals the leading
/// token (ignoring ASCII case) wins.
pub const DETECTION_RULES: &[(&str, DiagramKind)] = &[
    ("sequenceDiagram", DiagramKind::Sequence),
    ("digraph", DiagramKind::FlowchartDot),
    ("info", DiagramKind::Info),
    ("gantt", DiagramKind::Gantt),
    ("graph", DiagramKind::Flowchart),
    ("flowchart", DiagramKind::Flowchart),
];

/// Classifies a diagram definition.
///
/// Blank lines, leading whitespace and `%%` comment lines are skipped. The
/// leading token ends at whitespace, `;`, `{` or the end of the text.
///
/// # Example
///
/// ```
/// use merrow_core::kind::DiagramKind;
/// use merrow_parser::detect_type;
///
/// assert_eq!(detect_type("  GRAPH TD\na-->b"), Some(DiagramKind::Flowchart));
/// assert_eq!(detect_type("%% comment\ngantt"), Some(DiagramKind::Gantt));
/// assert_eq!(detect_type("pie title Pets"), None);
/// ```
pub fn detect_type(text: &str) -> Option<DiagramKind> {
    let token = leading_token(text)?;

    let kind = DETECTION_RULES
        .iter()
        .find(|(keyword, _)| keyword.eq_ignore_ascii_case(token))
        .map(|(_, kind)| *kind);

    if kind.is_none() {
        debug!(token, rules_version = RULES_VERSION; "No diagram type matches definition");
    }
    kind
}

/// The first token of the first line that is neither blank nor a comment.
pub(crate) fn leading_token(text: &str) -> Option<&str> {
    let line = text
        .lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))?;

    let end = line
        .find(|c: char| c.is_whitespace() || c == ';' || c == '{')
        .unwrap_or(line.len());
    Some(&line[..end])
}
