//! Bounded-depth route trees.
//!
//! A [`RouteView`] unrolls the network from one start vertex into a tree:
//! every successor reached gets a fresh tree vertex, so an element reachable
//! along two paths appears twice.  The depth bound makes the result finite on
//! cyclic networks.

use tq_core::{RouteElement, VertexId};

use crate::graph::{RoadGraph, RoadGraphBuilder};

/// Depth bound used when callers have no better value.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// A route tree and its root.
///
/// Invariants: acyclic; every vertex except the root has exactly one
/// incoming edge; no root-to-leaf path has more than the build depth edges.
#[derive(Clone, Debug)]
pub struct RouteView {
    pub tree: RoadGraph,
    pub root: VertexId,
}

impl RouteView {
    #[inline]
    pub fn root_element(&self) -> &RouteElement {
        self.tree.element(self.root)
    }

    /// A single-branch view over `elements`, rooted at the first one.
    pub fn linear(elements: &[RouteElement]) -> Self {
        let mut builder = RoadGraphBuilder::new();
        let mut previous = None;
        for element in elements {
            let v = builder.add_vertex(element.clone());
            if let Some(p) = previous {
                builder.add_edge(p, v);
            }
            previous = Some(v);
        }
        RouteView { tree: builder.build(), root: VertexId(0) }
    }

    /// Vertices without successors, in left-to-right order.  These are the
    /// route alternatives.
    pub fn leaves(&self) -> Vec<VertexId> {
        leaves_below(&self.tree, self.root)
    }

    #[inline]
    pub fn parent(&self, v: VertexId) -> Option<VertexId> {
        self.tree.predecessors(v).next()
    }

    /// Vertices from the root to `v`, inclusive.  `None` if `v` is not in the
    /// tree or not below the root.
    pub fn path_to(&self, v: VertexId) -> Option<Vec<VertexId>> {
        if !self.tree.contains(v) {
            return None;
        }
        let mut path = vec![v];
        let mut cursor = v;
        while cursor != self.root {
            cursor = self.parent(cursor)?;
            path.push(cursor);
            if path.len() > self.tree.vertex_count() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| self.path_to(leaf))
            .map(|p| p.len() - 1)
            .max()
            .unwrap_or(0)
    }
}

/// Leaves of the subtree below `start` (inclusive), left to right.
pub fn leaves_below(tree: &RoadGraph, start: VertexId) -> Vec<VertexId> {
    if !tree.contains(start) {
        return Vec::new();
    }
    let mut leaves = Vec::new();
    let mut stack = vec![start];
    let mut visited = 0usize;
    while let Some(v) = stack.pop() {
        visited += 1;
        if visited > tree.vertex_count() {
            break;
        }
        let children: Vec<VertexId> = tree.successors(v).collect();
        if children.is_empty() {
            leaves.push(v);
        }
        stack.extend(children.into_iter().rev());
    }
    leaves
}

/// Unroll `graph` from `start` into a tree at most `max_depth` edges deep.
///
/// Vertices are numbered in pre-order, so the root is vertex 0 and
/// [`RouteView::leaves`] lists leaves left to right.  A graph vertex without
/// successors becomes a leaf at whatever depth it is reached.  `None` if
/// `start` is not a vertex of `graph`.
pub fn build_route_view(graph: &RoadGraph, start: VertexId, max_depth: usize) -> Option<RouteView> {
    if !graph.contains(start) {
        return None;
    }
    let mut builder = RoadGraphBuilder::new();
    let mut worklist: Vec<(VertexId, Option<VertexId>, usize)> = vec![(start, None, 0)];

    while let Some((graph_vertex, parent, depth)) = worklist.pop() {
        let tree_vertex = builder.add_vertex(graph.element(graph_vertex).clone());
        if let Some(parent) = parent {
            builder.add_edge(parent, tree_vertex);
        }
        if depth < max_depth {
            let successors: Vec<VertexId> = graph.successors(graph_vertex).collect();
            for &next in successors.iter().rev() {
                worklist.push((next, Some(tree_vertex), depth + 1));
            }
        }
    }

    Some(RouteView { tree: builder.build(), root: VertexId(0) })
}
