//! Directed road graph and builder.
//!
//! # Data layout
//!
//! Vertices are [`RouteElement`]s.  Outgoing edges are stored in
//! **Compressed Sparse Row (CSR)** form; given a `VertexId v`, its outgoing
//! edges are the contiguous id range:
//!
//! ```text
//! vertex_out_start[v] .. vertex_out_start[v+1]
//! ```
//!
//! Edges are sorted by source vertex with a *stable* sort, so the outgoing
//! edges of one vertex keep the order in which they were added.  Route trees
//! rely on this: successor order is alternative order.
//!
//! A second, reverse CSR indexes incoming edges so predecessor lookups cost
//! O(in-degree) instead of a scan over every edge.
//!
//! The same `RoadGraph` type holds both a provider's full network (each
//! element at most once) and a route tree (elements may repeat).

use rustc_hash::FxHashMap;

use tq_core::{EdgeId, RouteElement, VertexId};

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed graph over route elements, read-only once built.
#[derive(Clone, Debug)]
pub struct RoadGraph {
    /// Label of each vertex.  Indexed by `VertexId`.
    pub elements: Vec<RouteElement>,

    /// CSR row pointer.  Length = `vertex_count + 1`.
    pub vertex_out_start: Vec<u32>,

    /// Source vertex of each edge, indexed by `EdgeId`.
    pub edge_from: Vec<VertexId>,

    /// Target vertex of each edge, indexed by `EdgeId`.
    pub edge_to: Vec<VertexId>,

    // ── Reverse index ─────────────────────────────────────────────────────
    vertex_in_start: Vec<u32>,
    in_edge_ids:     Vec<EdgeId>,

    /// First vertex carrying each element.
    lookup: FxHashMap<RouteElement, VertexId>,
}

impl RoadGraph {
    pub fn empty() -> Self {
        RoadGraphBuilder::new().build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.elements.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        v.index() < self.elements.len()
    }

    // ── Labels ────────────────────────────────────────────────────────────

    /// Label of `v`.  Panics if `v` is not a vertex of this graph.
    #[inline]
    pub fn element(&self, v: VertexId) -> &RouteElement {
        &self.elements[v.index()]
    }

    /// First vertex labelled `element`, if any.
    pub fn vertex_of(&self, element: &RouteElement) -> Option<VertexId> {
        self.lookup.get(element).copied()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing edge ids of `v`, in insertion order.
    #[inline]
    pub fn out_edges(&self, v: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.vertex_out_start[v.index()] as usize;
        let end   = self.vertex_out_start[v.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, v: VertexId) -> usize {
        let start = self.vertex_out_start[v.index()] as usize;
        let end   = self.vertex_out_start[v.index() + 1] as usize;
        end - start
    }

    /// Incoming edge ids of `v`.
    #[inline]
    pub fn in_edges(&self, v: VertexId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.vertex_in_start[v.index()] as usize;
        let end   = self.vertex_in_start[v.index() + 1] as usize;
        self.in_edge_ids[start..end].iter().copied()
    }

    #[inline]
    pub fn successors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.out_edges(v).map(|e| self.edge_to[e.index()])
    }

    #[inline]
    pub fn predecessors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.in_edges(v).map(|e| self.edge_from[e.index()])
    }

    #[inline]
    pub fn source(&self, e: EdgeId) -> VertexId {
        self.edge_from[e.index()]
    }

    #[inline]
    pub fn target(&self, e: EdgeId) -> VertexId {
        self.edge_to[e.index()]
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tq_core::RouteElement;
/// use tq_road::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// b.connect(RouteElement::new("A", true), RouteElement::new("B", true));
/// b.connect(RouteElement::new("B", true), RouteElement::new("A", true));
/// let g = b.build();
/// assert_eq!(g.vertex_count(), 2);
/// assert_eq!(g.edge_count(), 2);
/// ```
#[derive(Default)]
pub struct RoadGraphBuilder {
    elements:  Vec<RouteElement>,
    raw_edges: Vec<(VertexId, VertexId)>,
    lookup:    FxHashMap<RouteElement, VertexId>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex unconditionally, even if `element` already labels one.
    pub fn add_vertex(&mut self, element: RouteElement) -> VertexId {
        let id = VertexId(self.elements.len() as u32);
        self.lookup.entry(element.clone()).or_insert(id);
        self.elements.push(element);
        id
    }

    /// Vertex labelled `element`, adding it if absent.
    pub fn vertex(&mut self, element: RouteElement) -> VertexId {
        match self.lookup.get(&element) {
            Some(&v) => v,
            None => self.add_vertex(element),
        }
    }

    /// Add a directed edge.  Edge ids are assigned by [`build`](Self::build).
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) {
        self.raw_edges.push((from, to));
    }

    /// Add an edge between two elements, creating vertices as needed.
    /// Duplicate connections are ignored.
    pub fn connect(&mut self, from: RouteElement, to: RouteElement) {
        let a = self.vertex(from);
        let b = self.vertex(to);
        if !self.raw_edges.contains(&(a, b)) {
            self.add_edge(a, b);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.elements.len()
    }

    pub fn build(self) -> RoadGraph {
        let n = self.elements.len();
        let mut raw = self.raw_edges;
        raw.sort_by_key(|&(from, _)| from.0);

        let edge_from: Vec<VertexId> = raw.iter().map(|&(f, _)| f).collect();
        let edge_to:   Vec<VertexId> = raw.iter().map(|&(_, t)| t).collect();

        let mut vertex_out_start = vec![0u32; n + 1];
        for &(f, _) in &raw {
            vertex_out_start[f.index() + 1] += 1;
        }
        for i in 1..=n {
            vertex_out_start[i] += vertex_out_start[i - 1];
        }

        // Reverse CSR: bucket edge ids by target, preserving edge order.
        let mut vertex_in_start = vec![0u32; n + 1];
        for &t in &edge_to {
            vertex_in_start[t.index() + 1] += 1;
        }
        for i in 1..=n {
            vertex_in_start[i] += vertex_in_start[i - 1];
        }
        let mut fill = vertex_in_start.clone();
        let mut in_edge_ids = vec![EdgeId::INVALID; edge_to.len()];
        for (i, &t) in edge_to.iter().enumerate() {
            let slot = &mut fill[t.index()];
            in_edge_ids[*slot as usize] = EdgeId(i as u32);
            *slot += 1;
        }

        RoadGraph {
            elements: self.elements,
            vertex_out_start,
            edge_from,
            edge_to,
            vertex_in_start,
            in_edge_ids,
            lookup: self.lookup,
        }
    }
}
