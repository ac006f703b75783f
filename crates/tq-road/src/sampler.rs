//! Weighted random walks over route trees and root-to-target paths.

use rustc_hash::FxHashMap;

use tq_core::{EdgeId, RouteElement, UniformSource, VertexId};

use crate::graph::RoadGraph;
use crate::route_view::RouteView;
use crate::{RoadError, RoadResult};

// ── EdgeWeights ───────────────────────────────────────────────────────────────

/// Branch weight per edge, e.g. proportional to traffic-flow share.
#[derive(Clone, Debug, Default)]
pub struct EdgeWeights(FxHashMap<EdgeId, f64>);

impl EdgeWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight 1 on every edge of `graph`.
    pub fn uniform(graph: &RoadGraph) -> Self {
        Self((0..graph.edge_count() as u32).map(|i| (EdgeId(i), 1.0)).collect())
    }

    pub fn insert(&mut self, edge: EdgeId, weight: f64) {
        self.0.insert(edge, weight);
    }

    pub fn get(&self, edge: EdgeId) -> Option<f64> {
        self.0.get(&edge).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(EdgeId, f64)> for EdgeWeights {
    fn from_iter<I: IntoIterator<Item = (EdgeId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Sampling ──────────────────────────────────────────────────────────────────

/// Walk from `root` to a leaf, choosing each branch with probability
/// proportional to its edge weight.
///
/// At every vertex one value is drawn in `[0, sum)`; the first edge whose
/// running weight sum exceeds it is taken.  If every outgoing weight is zero
/// the first edge is taken.
pub fn sample_route<R: UniformSource + ?Sized>(
    tree:    &RoadGraph,
    root:    VertexId,
    weights: &EdgeWeights,
    rng:     &mut R,
) -> RoadResult<VertexId> {
    if !tree.contains(root) {
        return Err(RoadError::UnknownVertex(root));
    }

    let mut current = root;
    // A tree is walked in at most `vertex_count` steps; the bound also keeps
    // a cyclic graph passed by mistake from looping forever.
    for _ in 0..=tree.vertex_count() {
        let edges: Vec<EdgeId> = tree.out_edges(current).collect();
        let Some(&first) = edges.first() else {
            return Ok(current);
        };

        let mut branch_weights = Vec::with_capacity(edges.len());
        for &edge in &edges {
            let weight = weights.get(edge).ok_or(RoadError::MissingEdgeWeight(edge))?;
            if weight < 0.0 {
                return Err(RoadError::NegativeEdgeWeight { edge, weight });
            }
            branch_weights.push(weight);
        }

        let sum: f64 = branch_weights.iter().sum();
        let draw = rng.uniform(0.0, sum);
        let mut running = 0.0;
        let mut chosen = first;
        for (&edge, &weight) in edges.iter().zip(&branch_weights) {
            running += weight;
            if running > draw {
                chosen = edge;
                break;
            }
        }
        current = tree.target(chosen);
    }
    Ok(current)
}

// ── Paths ─────────────────────────────────────────────────────────────────────

/// Root-to-target vertex sequence in one tree, with its labels.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutePath {
    pub vertices: Vec<VertexId>,
    pub elements: Vec<RouteElement>,
}

impl RoutePath {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn target(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }
}

/// Walk predecessor edges from `target` back to `root`.
///
/// Returns `None` when `root` is never reached, which callers treat as an
/// invalid route.
pub fn reconstruct_path(tree: &RoadGraph, root: VertexId, target: VertexId) -> Option<RoutePath> {
    if !tree.contains(root) || !tree.contains(target) {
        return None;
    }
    let mut vertices = vec![target];
    let mut cursor = target;
    while cursor != root {
        cursor = tree.predecessors(cursor).next()?;
        vertices.push(cursor);
        if vertices.len() > tree.vertex_count() {
            return None;
        }
    }
    vertices.reverse();
    let elements = vertices.iter().map(|&v| tree.element(v).clone()).collect();
    Some(RoutePath { vertices, elements })
}

/// A route view plus a chosen target leaf.
#[derive(Clone, Debug)]
pub struct SampledRoute {
    pub view:   RouteView,
    pub target: VertexId,
}

impl SampledRoute {
    /// Sample a target in `view` using `weights`.
    pub fn sample<R: UniformSource + ?Sized>(
        view:    RouteView,
        weights: &EdgeWeights,
        rng:     &mut R,
    ) -> RoadResult<Self> {
        let target = sample_route(&view.tree, view.root, weights, rng)?;
        Ok(Self { view, target })
    }

    #[inline]
    pub fn root(&self) -> VertexId {
        self.view.root
    }

    pub fn path(&self) -> Option<RoutePath> {
        reconstruct_path(&self.view.tree, self.view.root, self.target)
    }
}
