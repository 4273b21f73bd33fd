//! Raw dependency graph built during expansion.
//!
//! Backed by petgraph. The raw graph may hold several candidate versions of
//! the same identity key; conflict resolution later reduces each key to one
//! winner. Nodes record first-discovery depth, BFS discovery order and the
//! declaring parent, which the version selector uses for tie-breaks only.

use std::collections::HashMap;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use garner_core::types::{ArtifactKey, Coordinate, Scope, VersionSpec};

/// Node in the raw graph: one distinct pinned coordinate
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Pinned coordinate
    pub coordinate: Coordinate,
    /// Depth of first discovery (roots are 0)
    pub depth: usize,
    /// BFS discovery order, global across the whole expansion
    pub order: usize,
    /// Node that first declared this one; tie-break metadata, never used
    /// for traversal
    pub parent: Option<NodeIndex>,
    /// Effective scope the node was first reached with
    pub scope: Scope,
    /// Published artifact checksum from the descriptor, when present
    pub checksum: Option<String>,
}

/// Edge in the raw graph: one declared dependency occurrence
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    /// Effective scope after combination with the path above
    pub scope: Scope,
    /// Whether the declaration was optional
    pub optional: bool,
    /// Version spec as declared, before range pinning
    pub requested: VersionSpec,
}

/// Directed dependency graph with exact-coordinate dedup
#[derive(Debug, Default)]
pub struct RawGraph {
    graph: DiGraph<GraphNode, EdgeInfo>,
    node_map: HashMap<Coordinate, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl RawGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the node for an exact pinned coordinate
    pub fn lookup(&self, coordinate: &Coordinate) -> Option<NodeIndex> {
        self.node_map.get(coordinate).copied()
    }

    /// Add a node for a first-discovered coordinate. The coordinate must
    /// not already be present; re-encounters only add edges.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        debug_assert!(!self.node_map.contains_key(&node.coordinate));
        let coordinate = node.coordinate.clone();
        let index = self.graph.add_node(node);
        self.node_map.insert(coordinate, index);
        index
    }

    /// Add a dependency edge
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, info: EdgeInfo) {
        self.graph.add_edge(from, to, info);
    }

    /// Mark a node as a resolution root
    pub fn add_root(&mut self, index: NodeIndex) {
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
    }

    /// Resolution roots in request order
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Node payload by index
    pub fn node(&self, index: NodeIndex) -> &GraphNode {
        &self.graph[index]
    }

    /// All nodes in the graph
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    /// Outgoing dependency edges of a node
    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeInfo)> {
        self.graph.edges(index).map(|edge| (edge.target(), edge.weight()))
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Group candidate nodes by identity key, each group sorted by
    /// (depth, discovery order). Group order follows first discovery.
    pub fn candidates(&self) -> IndexMap<ArtifactKey, Vec<NodeIndex>> {
        let mut by_order: Vec<NodeIndex> = self.graph.node_indices().collect();
        by_order.sort_by_key(|&index| self.graph[index].order);

        let mut groups: IndexMap<ArtifactKey, Vec<NodeIndex>> = IndexMap::new();
        for index in by_order {
            let key = self.graph[index].coordinate.key();
            groups.entry(key).or_default().push(index);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|&index| {
                let node = &self.graph[index];
                (node.depth, node.order)
            });
        }
        groups
    }
}
