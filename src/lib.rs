//! Undirected graphs over arbitrary hashable vertex values, with vertex and
//! edge insertion and depth-first traversal.
//!
//! ```
//! use roaring_ugraph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.add_vertex(1).unwrap();
//! graph.add_vertex(2).unwrap();
//! graph.add_vertex(3).unwrap();
//! graph.add_edge(1, 2).unwrap();
//! graph.add_edge(1, 3).unwrap();
//! assert_eq!(graph.depth_first_search(1).unwrap(), vec![1, 2, 3]);
//! ```
//!
//! Operations on vertices that do not exist, duplicate vertices, and
//! self-loops are rejected with a [`GraphError`] and leave the graph
//! untouched.

pub mod error;
pub mod graph;
pub mod strategy;
pub mod traversal;

/// Dense, insertion-ordered position of a vertex inside a [`Graph`].
pub type VertexIndex = u32;

pub use error::GraphError;
pub use graph::Graph;
pub use strategy::arb_graph;
pub use traversal::{BfsVerticesIterator, DfsVerticesIterator};
