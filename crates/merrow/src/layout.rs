//! Layout engines that place diagram elements before they are drawn.
//!
//! Sequence and Gantt charts are placed by their renderers directly since
//! their geometry follows from declaration order. Flowcharts need ranking,
//! which lives here.

mod flowchart;

pub(crate) use flowchart::{Engine as FlowchartEngine, FlowLayout};
