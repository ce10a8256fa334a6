//! The closed set of diagram grammars Merrow understands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag identifying which grammar a diagram definition is written in.
///
/// A definition is classified exactly once per render call and the tag is
/// immutable for the rest of that call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramKind {
    /// `graph TD` style flowchart.
    Flowchart,
    /// Dot-style `digraph { a -> b }` flowchart.
    FlowchartDot,
    /// `sequenceDiagram`.
    Sequence,
    /// `gantt` chart.
    Gantt,
    /// `info` diagram.
    Info,
}

impl DiagramKind {
    /// All kinds in registry order.
    pub const ALL: [DiagramKind; 5] = [
        Self::Flowchart,
        Self::FlowchartDot,
        Self::Sequence,
        Self::Gantt,
        Self::Info,
    ];

    /// Returns the configuration namespace consumed by this kind's renderer.
    ///
    /// Both flowchart grammars share the `flowchart` namespace. `info` takes
    /// no configuration.
    pub fn namespace(self) -> Option<&'static str> {
        match self {
            Self::Flowchart | Self::FlowchartDot => Some("flowchart"),
            Self::Sequence => Some("sequenceDiagram"),
            Self::Gantt => Some("gantt"),
            Self::Info => None,
        }
    }

    /// Returns a stable, human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Flowchart => "graph",
            Self::FlowchartDot => "dotGraph",
            Self::Sequence => "sequenceDiagram",
            Self::Gantt => "gantt",
            Self::Info => "info",
        }
    }

    /// Returns `true` for either flowchart grammar.
    pub fn is_flowchart(self) -> bool {
        matches!(self, Self::Flowchart | Self::FlowchartDot)
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
