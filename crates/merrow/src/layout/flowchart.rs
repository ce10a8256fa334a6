//! Ranked layout for flowcharts.
//!
//! Vertices are assigned to ranks with longest-path ranking over the edge
//! graph. Cyclic graphs fall back to breadth-first layering from the roots.
//! Ranks advance along the flow direction; vertices of one rank are lined up
//! across it in first-mention order and each rank is centered on the widest.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace};
use petgraph::{
    Direction as EdgeDirection,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
};

use merrow_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    semantic::{Direction, FlowModel, Vertex, VertexShape},
};

use crate::render::estimate_text_width;

/// Placed vertices of one flowchart.
#[derive(Debug, Default)]
pub struct FlowLayout {
    vertices: IndexMap<Id, Bounds>,
    bounds: Bounds,
}

impl FlowLayout {
    pub fn vertex_bounds(&self, id: Id) -> Option<Bounds> {
        self.vertices.get(&id).copied()
    }

    /// Bounds of the whole drawing, margin included.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// The flowchart layout engine.
#[derive(Debug)]
pub struct Engine {
    font_size: f32,
    /// Space around the label inside a vertex shape
    text_padding: Size,
    /// Distance between consecutive ranks
    rank_spacing: f32,
    /// Distance between vertices of the same rank
    vertex_spacing: f32,
    margin: f32,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            font_size: 14.0,
            text_padding: Size::new(15.0, 10.0),
            rank_spacing: 50.0,
            vertex_spacing: 40.0,
            margin: 8.0,
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn calculate(&self, model: &FlowModel) -> FlowLayout {
        let graph = Self::model_to_graph(model);
        let ranks = Self::assign_ranks(&graph);
        trace!(vertices = graph.node_count(), ranks = ranks.len(); "Flowchart ranked");

        let sizes: HashMap<NodeIndex, Size> = graph
            .node_indices()
            .filter_map(|idx| model.vertex(graph[idx]).map(|v| (idx, self.vertex_size(v))))
            .collect();

        let horizontal = model.direction().is_horizontal();
        let main = |size: Size| if horizontal { size.width() } else { size.height() };
        let cross = |size: Size| if horizontal { size.height() } else { size.width() };
        let size_of = |idx: &NodeIndex| sizes.get(idx).copied().unwrap_or_default();

        let rank_extents: Vec<f32> = ranks
            .iter()
            .map(|rank| rank.iter().map(|idx| main(size_of(idx))).fold(0.0, f32::max))
            .collect();
        let rank_lengths: Vec<f32> = ranks
            .iter()
            .map(|rank| {
                let total: f32 = rank.iter().map(|idx| cross(size_of(idx))).sum();
                total + self.vertex_spacing * rank.len().saturating_sub(1) as f32
            })
            .collect();
        let widest = rank_lengths.iter().copied().fold(0.0, f32::max);
        let total_main = rank_extents.iter().sum::<f32>()
            + self.rank_spacing * rank_extents.len().saturating_sub(1) as f32;

        let reversed = matches!(
            model.direction(),
            Direction::BottomTop | Direction::RightLeft
        );

        let mut placed = HashMap::new();
        let mut main_offset = 0.0;
        for ((rank, extent), length) in ranks.iter().zip(&rank_extents).zip(&rank_lengths) {
            let mut main_center = main_offset + extent / 2.0;
            if reversed {
                main_center = total_main - main_center;
            }

            let mut cross_offset = (widest - length) / 2.0;
            for idx in rank {
                let size = size_of(idx);
                let cross_center = cross_offset + cross(size) / 2.0;
                let center = if horizontal {
                    Point::new(main_center, cross_center)
                } else {
                    Point::new(cross_center, main_center)
                };
                placed.insert(*idx, Bounds::centered(center, size));
                cross_offset += cross(size) + self.vertex_spacing;
            }
            main_offset += extent + self.rank_spacing;
        }

        // Keep first-mention order for drawing.
        let vertices: IndexMap<Id, Bounds> = graph
            .node_indices()
            .filter_map(|idx| placed.get(&idx).map(|bounds| (graph[idx], *bounds)))
            .collect();
        let bounds = vertices
            .values()
            .copied()
            .reduce(Bounds::merge)
            .unwrap_or_default()
            .inflate(self.margin);

        FlowLayout { vertices, bounds }
    }

    /// Size of the shape drawn for `vertex`.
    fn vertex_size(&self, vertex: &Vertex) -> Size {
        let label = vertex.label();
        let width = estimate_text_width(&label, self.font_size) + 2.0 * self.text_padding.width();
        let height = self.font_size + 2.0 * self.text_padding.height();

        match vertex.shape() {
            VertexShape::Rect | VertexShape::Round => Size::new(width, height),
            VertexShape::Circle => {
                let diameter = width.max(height);
                Size::new(diameter, diameter)
            }
            VertexShape::Diamond => {
                let side = (width + height) / 1.4;
                Size::new(side, side)
            }
            VertexShape::Odd => Size::new(width + height / 2.0, height),
        }
    }

    fn model_to_graph(model: &FlowModel) -> DiGraph<Id, ()> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for vertex in model.vertices() {
            let idx = graph.add_node(vertex.id());
            node_map.insert(vertex.id(), idx);
        }

        for edge in model.edges() {
            // Self loops carry no ranking information.
            if edge.start() == edge.end() {
                continue;
            }
            if let (Some(&source), Some(&target)) =
                (node_map.get(&edge.start()), node_map.get(&edge.end()))
            {
                graph.add_edge(source, target, ());
            }
        }

        graph
    }

    /// Groups the vertices into ranks, first rank first.
    fn assign_ranks(graph: &DiGraph<Id, ()>) -> Vec<Vec<NodeIndex>> {
        let ranks = match toposort(graph, None) {
            Ok(order) => Self::longest_path_ranks(graph, &order),
            Err(cycle) => {
                debug!(vertex:% = graph[cycle.node_id()]; "Flowchart has a cycle, ranking breadth-first");
                Self::breadth_first_ranks(graph)
            }
        };

        let mut layers: Vec<Vec<NodeIndex>> = Vec::new();
        for idx in graph.node_indices() {
            let rank = ranks[idx.index()];
            while layers.len() <= rank {
                layers.push(Vec::new());
            }
            layers[rank].push(idx);
        }
        layers
    }

    fn longest_path_ranks(graph: &DiGraph<Id, ()>, order: &[NodeIndex]) -> Vec<usize> {
        let mut ranks = vec![0; graph.node_count()];
        for &node in order {
            for child in graph.neighbors_directed(node, EdgeDirection::Outgoing) {
                ranks[child.index()] = ranks[child.index()].max(ranks[node.index()] + 1);
            }
        }
        ranks
    }

    fn breadth_first_ranks(graph: &DiGraph<Id, ()>) -> Vec<usize> {
        let mut ranks = vec![0; graph.node_count()];
        let mut visited = vec![false; graph.node_count()];

        let roots = graph.node_indices().filter(|&idx| {
            graph
                .neighbors_directed(idx, EdgeDirection::Incoming)
                .next()
                .is_none()
        });
        // Vertices only reachable through a cycle start their own traversal.
        let starts: Vec<NodeIndex> = roots.chain(graph.node_indices()).collect();

        for start in starts {
            if visited[start.index()] {
                continue;
            }
            let mut queue = VecDeque::from([(start, 0)]);
            while let Some((node, rank)) = queue.pop_front() {
                if visited[node.index()] {
                    continue;
                }
                visited[node.index()] = true;
                ranks[node.index()] = rank;

                for child in graph.neighbors_directed(node, EdgeDirection::Outgoing) {
                    if !visited[child.index()] {
                        queue.push_back((child, rank + 1));
                    }
                }
            }
        }
        ranks
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
