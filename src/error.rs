//! Errors returned by [`crate::Graph`] operations.

use thiserror::Error;

/// Reasons a graph operation was rejected.
///
/// Every variant carries the offending vertex value(s).  A rejected operation
/// never leaves the graph partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError<T> {
    /// [`crate::Graph::add_vertex`] was called with a value already present.
    #[error("vertex {0:?} already exists")]
    DuplicateVertex(T),

    /// One or more referenced vertices do not exist, listed in argument order.
    #[error("missing vertices: {missing:?}")]
    MissingVertex { missing: Vec<T> },

    /// [`crate::Graph::add_edge`] was asked to connect a vertex to itself.
    #[error("self-loop on vertex {0:?} is not allowed")]
    SelfLoop(T),
}

pub type Result<V, T> = std::result::Result<V, GraphError<T>>;
