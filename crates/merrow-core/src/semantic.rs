//! Parsed diagram models.
//!
//! A parser returns one [`Diagram`] value per definition. Nothing is shared
//! between parses: parsing the same grammar twice yields two independent
//! models.

mod flowchart;
mod gantt;
mod info;
mod sequence;

pub use flowchart::{
    ClassDef, ClickBinding, Direction, Edge, EdgeHead, EdgeStroke, FlowModel, FlowSyntax, Vertex,
    VertexShape,
};
pub use gantt::{GanttModel, Task, TaskStatus};
pub use info::InfoModel;
pub use sequence::{
    Actor, BlockKind, LineType, NotePlacement, SequenceEvent, SequenceModel,
};

use crate::kind::DiagramKind;

/// The model produced by parsing one diagram definition.
#[derive(Debug, Clone)]
pub enum Diagram {
    /// Either flowchart grammar; [`FlowModel::syntax`] tells which.
    Flowchart(FlowModel),
    Sequence(SequenceModel),
    Gantt(GanttModel),
    Info(InfoModel),
}

impl Diagram {
    /// Returns the kind of definition this model was parsed from.
    pub fn kind(&self) -> DiagramKind {
        match self {
            Self::Flowchart(model) => match model.syntax() {
                FlowSyntax::Graph => DiagramKind::Flowchart,
                FlowSyntax::Dot => DiagramKind::FlowchartDot,
            },
            Self::Sequence(_) => DiagramKind::Sequence,
            Self::Gantt(_) => DiagramKind::Gantt,
            Self::Info(_) => DiagramKind::Info,
        }
    }
}
