//! Flowchart model shared by the `graph` and `digraph` grammars.

use indexmap::IndexMap;

use crate::identifier::Id;

/// Which grammar produced a [`FlowModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowSyntax {
    #[default]
    Graph,
    Dot,
}

/// Layout direction of a flowchart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Direction {
    /// Parses the direction token following `graph`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "TB" | "TD" => Some(Self::TopBottom),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    /// Returns `true` when ranks advance along the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VertexShape {
    /// `id[text]`
    #[default]
    Rect,
    /// `id(text)`
    Round,
    /// `id((text))`
    Circle,
    /// `id{text}`
    Diamond,
    /// `id>text]`
    Odd,
}

#[derive(Debug, Clone)]
pub struct Vertex {
    id: Id,
    text: Option<String>,
    shape: VertexShape,
    styles: Vec<String>,
    classes: Vec<String>,
}

impl Vertex {
    fn new(id: Id) -> Self {
        Self {
            id,
            text: None,
            shape: VertexShape::default(),
            styles: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Label text; falls back to the id when none was given.
    pub fn label(&self) -> String {
        self.text.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn shape(&self) -> VertexShape {
        self.shape
    }

    /// Inline `style` declarations, e.g. `fill:#f9f`.
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeStroke {
    #[default]
    Normal,
    Thick,
    Dotted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeHead {
    #[default]
    Arrow,
    Open,
}

#[derive(Debug, Clone)]
pub struct Edge {
    start: Id,
    end: Id,
    text: Option<String>,
    stroke: EdgeStroke,
    head: EdgeHead,
}

impl Edge {
    pub fn new(start: Id, end: Id) -> Self {
        Self {
            start,
            end,
            text: None,
            stroke: EdgeStroke::default(),
            head: EdgeHead::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_stroke(mut self, stroke: EdgeStroke) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn with_head(mut self, head: EdgeHead) -> Self {
        self.head = head;
        self
    }

    pub fn start(&self) -> Id {
        self.start
    }

    pub fn end(&self) -> Id {
        self.end
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn stroke(&self) -> EdgeStroke {
        self.stroke
    }

    pub fn head(&self) -> EdgeHead {
        self.head
    }
}

/// A `classDef` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    name: String,
    styles: Vec<String>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, styles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            styles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }
}

/// A `click` statement: an interaction the host binds after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickBinding {
    vertex: Id,
    callback: String,
    tooltip: Option<String>,
}

impl ClickBinding {
    pub fn new(vertex: Id, callback: impl Into<String>, tooltip: Option<String>) -> Self {
        Self {
            vertex,
            callback: callback.into(),
            tooltip,
        }
    }

    pub fn vertex(&self) -> Id {
        self.vertex
    }

    pub fn callback(&self) -> &str {
        &self.callback
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }
}

/// Vertices, edges and decorations of one flowchart.
///
/// Vertices keep first-mention order.
#[derive(Debug, Clone, Default)]
pub struct FlowModel {
    syntax: FlowSyntax,
    direction: Direction,
    vertices: IndexMap<Id, Vertex>,
    edges: Vec<Edge>,
    class_defs: IndexMap<String, ClassDef>,
    clicks: Vec<ClickBinding>,
}

impl FlowModel {
    pub fn new(syntax: FlowSyntax, direction: Direction) -> Self {
        Self {
            syntax,
            direction,
            ..Self::default()
        }
    }

    pub fn syntax(&self) -> FlowSyntax {
        self.syntax
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Changes the layout direction, e.g. from a dot `rankdir` attribute.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn vertex(&self, id: Id) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn class_defs(&self) -> impl Iterator<Item = &ClassDef> {
        self.class_defs.values()
    }

    pub fn clicks(&self) -> &[ClickBinding] {
        &self.clicks
    }

    /// Declares a vertex, or refines an existing one.
    ///
    /// Later mentions only override the text and shape when they carry one.
    pub fn add_vertex(&mut self, id: Id, text: Option<String>, shape: Option<VertexShape>) {
        let vertex = self.vertices.entry(id).or_insert_with(|| Vertex::new(id));
        if text.is_some() {
            vertex.text = text;
        }
        if let Some(shape) = shape {
            vertex.shape = shape;
        }
    }

    /// Adds an edge, declaring both endpoints if needed.
    pub fn add_edge(&mut self, edge: Edge) {
        self.add_vertex(edge.start, None, None);
        self.add_vertex(edge.end, None, None);
        self.edges.push(edge);
    }

    /// Appends inline style declarations to a vertex.
    pub fn add_styles(&mut self, id: Id, styles: Vec<String>) {
        self.add_vertex(id, None, None);
        if let Some(vertex) = self.vertices.get_mut(&id) {
            vertex.styles.extend(styles);
        }
    }

    /// Applies a class to a vertex.
    pub fn add_class(&mut self, id: Id, class: &str) {
        self.add_vertex(id, None, None);
        if let Some(vertex) = self.vertices.get_mut(&id)
            && !vertex.classes.iter().any(|c| c == class)
        {
            vertex.classes.push(class.to_string());
        }
    }

    /// Registers a `classDef`; a later definition of the same name wins.
    pub fn add_class_def(&mut self, class_def: ClassDef) {
        self.class_defs
            .insert(class_def.name().to_string(), class_def);
    }

    pub fn add_click(&mut self, click: ClickBinding) {
        self.clicks.push(click);
    }
}
