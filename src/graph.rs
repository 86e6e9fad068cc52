//! Undirected graphs whose vertices are arbitrary hashable values.
//!
//! A vertex is identified by the value it stores.  Internally every vertex
//! also gets a dense [`VertexIndex`] (its insertion position) so that
//! adjacency lists stay compact and traversals can track visited vertices in a
//! [`RoaringBitmap`].
//!
//! Edges are undirected: connecting `a` and `b` appends `b` to the adjacency
//! list of `a` and `a` to the adjacency list of `b`.  Adjacency lists keep
//! insertion order, which is the order traversals examine neighbours in.
//! Parallel edges are kept as separate adjacency entries.  Self-loops are
//! rejected.
//!
//! ## Anti-features
//!
//! * No removal of vertices or edges.
//! * No edge weights.
//! * No directed variant.

use std::collections::VecDeque;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::io::Write;

use indexmap::IndexMap;
use roaring::RoaringBitmap;
use tracing::{debug, trace};

use crate::error::{GraphError, Result};
use crate::traversal::{BfsVerticesIterator, DfsVerticesIterator};
use crate::VertexIndex;

/// Upper bound on the number of vertices so that every index fits in a
/// [`VertexIndex`] and in a [`RoaringBitmap`].
pub const MAX_VERTEX_COUNT: usize = VertexIndex::MAX as usize;

/// Per-vertex record: the neighbours in edge insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Vertex {
    neighbours: Vec<VertexIndex>,
}

/// A mutable, single-threaded undirected graph.
#[derive(Clone)]
pub struct Graph<T> {
    vertices: IndexMap<T, Vertex>,
    edge_count: usize,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self {
            vertices: IndexMap::default(),
            edge_count: 0,
        }
    }
}

impl<T: PartialEq> PartialEq for Graph<T> {
    /// Two graphs are equal when they were built with the same vertices in the
    /// same order and have identical adjacency lists.
    fn eq(&self, other: &Self) -> bool {
        self.edge_count == other.edge_count && self.vertices.iter().eq(other.vertices.iter())
    }
}

impl<T: Eq> Eq for Graph<T> {}

impl<T: Debug> Debug for Graph<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vertices: Vec<&T> = self.iter_vertices().collect();
        let edges: Vec<(&T, &T)> = self.iter_edges().collect();
        write!(
            f,
            "Graph::from_edges_iter(vec!{:?}, vec!{:?})",
            vertices, edges
        )
    }
}

impl<T> Graph<T> {
    /// Constructs an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs an empty graph with room for `vertex_capacity` vertices
    /// before reallocating.
    pub fn with_capacity(vertex_capacity: usize) -> Self {
        Self {
            vertices: IndexMap::with_capacity(vertex_capacity),
            edge_count: 0,
        }
    }

    #[inline]
    pub fn get_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of successful [`Graph::add_edge`] calls.  Parallel edges count
    /// separately.
    #[inline]
    pub fn get_edge_count(&self) -> usize {
        self.edge_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates over vertex values in insertion order.
    pub fn iter_vertices(&self) -> impl Iterator<Item = &T> + '_ {
        self.vertices.keys()
    }

    /// Each edge is emitted once, as `(u, v)` where `u` was inserted before
    /// `v`.  Parallel edges are emitted once per [`Graph::add_edge`] call.
    pub fn iter_edges(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.iter_edge_indices()
            .filter_map(move |(u, v)| Some((self.value_at(u)?, self.value_at(v)?)))
    }

    pub(crate) fn iter_edge_indices(&self) -> impl Iterator<Item = (VertexIndex, VertexIndex)> + '_ {
        (0..).zip(self.vertices.values()).flat_map(|(u, vertex)| {
            vertex
                .neighbours
                .iter()
                .filter(move |v| **v > u)
                .map(move |v| (u, *v))
        })
    }

    pub(crate) fn value_at(&self, u: VertexIndex) -> Option<&T> {
        self.vertices.get_index(u as usize).map(|(value, _)| value)
    }

    pub(crate) fn neighbours_at(&self, u: VertexIndex) -> &[VertexIndex] {
        self.vertices
            .get_index(u as usize)
            .map_or(&[], |(_, vertex)| vertex.neighbours.as_slice())
    }

    /// Counts the connected components.  An isolated vertex is a component on
    /// its own.
    pub fn connected_component_count(&self) -> usize {
        let mut visited = RoaringBitmap::new();
        let mut count = 0;
        // MAX_VERTEX_COUNT guarantees the length fits.
        for seed in 0..self.vertices.len() as VertexIndex {
            if visited.contains(seed) {
                continue;
            }
            visited.insert(seed);
            let mut bfs = BfsVerticesIterator {
                graph: self,
                visited,
                to_visit: VecDeque::from([seed]),
            };
            while bfs.next().is_some() {}
            visited = bfs.visited;
            count += 1;
        }
        count
    }
}

impl<T: Hash + Eq + Debug> Graph<T> {
    /// Constructs a graph by inserting `vertices` and then connecting every
    /// pair in `edges`, both in iteration order.  Stops at the first rejected
    /// insertion.
    pub fn from_edges_iter<V, E>(vertices: V, edges: E) -> Result<Self, T>
    where
        V: IntoIterator<Item = T>,
        E: IntoIterator<Item = (T, T)>,
    {
        let vertices = vertices.into_iter();
        let mut graph = Self::with_capacity(vertices.size_hint().0);
        for value in vertices {
            graph.add_vertex(value)?;
        }
        for (left, right) in edges {
            graph.add_edge(left, right)?;
        }
        Ok(graph)
    }

    pub fn contains_vertex(&self, value: &T) -> bool {
        self.vertices.contains_key(value)
    }

    pub(crate) fn index_of(&self, value: &T) -> Option<VertexIndex> {
        // MAX_VERTEX_COUNT guarantees every index fits.
        self.vertices
            .get_index_of(value)
            .map(|index| index as VertexIndex)
    }

    /// Inserts a new vertex with no neighbours.
    ///
    /// Fails with [`GraphError::DuplicateVertex`] if `value` is already a
    /// vertex.  Panics if the graph already holds [`MAX_VERTEX_COUNT`]
    /// vertices.
    pub fn add_vertex(&mut self, value: T) -> Result<(), T> {
        if self.vertices.contains_key(&value) {
            return Err(rejected(GraphError::DuplicateVertex(value)));
        }
        assert!(
            self.vertices.len() < MAX_VERTEX_COUNT,
            "graph is limited to {} vertices",
            MAX_VERTEX_COUNT
        );
        trace!(vertex = ?value, index = self.vertices.len(), "adding vertex");
        self.vertices.insert(value, Vertex::default());
        Ok(())
    }

    /// Connects two existing, distinct vertices.
    ///
    /// Both endpoints are looked up before anything is modified, so a failed
    /// call never leaves a one-sided edge.  Calling this twice for the same
    /// pair creates a parallel edge.
    pub fn add_edge(&mut self, value1: T, value2: T) -> Result<(), T> {
        let (u, v) = match (self.index_of(&value1), self.index_of(&value2)) {
            (Some(u), Some(v)) => (u, v),
            (u, v) => {
                let mut missing = Vec::with_capacity(2);
                if u.is_none() {
                    missing.push(value1);
                }
                if v.is_none() {
                    missing.push(value2);
                }
                return Err(rejected(GraphError::MissingVertex { missing }));
            }
        };
        if u == v {
            return Err(rejected(GraphError::SelfLoop(value1)));
        }
        trace!(left = ?value1, right = ?value2, "adding edge");
        self.vertices[u as usize].neighbours.push(v);
        self.vertices[v as usize].neighbours.push(u);
        self.edge_count += 1;
        Ok(())
    }

    /// Iterates over the neighbours of `value` in edge insertion order, or
    /// returns `None` if `value` is not a vertex.
    pub fn iter_neighbours(&self, value: &T) -> Option<impl Iterator<Item = &T> + '_> {
        let vertex = self.vertices.get(value)?;
        Some(
            vertex
                .neighbours
                .iter()
                .filter_map(move |v| self.value_at(*v)),
        )
    }

    /// Length of the adjacency list of `value`, parallel edges included.
    pub fn get_degree(&self, value: &T) -> Option<usize> {
        self.vertices.get(value).map(|vertex| vertex.neighbours.len())
    }

    fn start_index(&self, start: T) -> Result<VertexIndex, T> {
        self.index_of(&start).ok_or_else(|| {
            rejected(GraphError::MissingVertex {
                missing: vec![start],
            })
        })
    }

    /// Visit all vertices reachable from `start` in a depth-first-search
    /// (DFS) preorder.  See [`Graph::depth_first_search`].
    pub fn iter_vertices_dfs(&self, start: T) -> Result<DfsVerticesIterator<'_, T>, T> {
        let start = self.start_index(start)?;
        trace!(start, "starting depth-first traversal");
        Ok(DfsVerticesIterator::new(self, start))
    }

    /// Visit all vertices reachable from `start` in a breadth-first-search
    /// (BFS) order.
    pub fn iter_vertices_bfs(&self, start: T) -> Result<BfsVerticesIterator<'_, T>, T> {
        let start = self.start_index(start)?;
        trace!(start, "starting breadth-first traversal");
        Ok(BfsVerticesIterator::new(self, start))
    }

    /// Returns the vertices reachable from `start` in DFS preorder.
    ///
    /// `start` comes first.  Then, for each neighbour of `start` in edge
    /// insertion order that has not been visited by the time it is examined,
    /// that neighbour's own DFS sequence follows.  Vertices in other connected
    /// components are never included.
    pub fn depth_first_search(&self, start: T) -> Result<Vec<T>, T>
    where
        T: Clone,
    {
        Ok(self.iter_vertices_dfs(start)?.cloned().collect())
    }
}

impl<T: Display> Graph<T> {
    /// Outputs the graph in the [Graphviz DOT](https://graphviz.org/) format.
    pub fn to_dot<W: Write>(&self, output: &mut W) -> std::result::Result<(), std::io::Error> {
        writeln!(output, "graph ugraph_{} {{", self.get_vertex_count())?;

        for (index, value) in self.iter_vertices().enumerate() {
            let label = value.to_string().replace('"', "\\\"");
            writeln!(output, "\t_{}[label=\"{}\"];", index, label)?;
        }

        writeln!(output)?;

        for (left, right) in self.iter_edge_indices() {
            writeln!(output, "\t_{} -- _{};", left, right)?;
        }

        writeln!(output, "}}")?;
        Ok(())
    }

    pub fn to_dot_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> std::result::Result<(), std::io::Error> {
        let mut file = std::fs::File::create(path)?;
        self.to_dot(&mut file)?;
        Ok(())
    }
}

fn rejected<T: Debug>(error: GraphError<T>) -> GraphError<T> {
    debug!(%error, "graph operation rejected");
    error
}
