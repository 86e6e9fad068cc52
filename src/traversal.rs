use std::collections::VecDeque;

use roaring::RoaringBitmap;

use crate::{Graph, VertexIndex};

/// See [`Graph::iter_vertices_dfs`].
///
/// Keeps one `(vertex, cursor)` frame per vertex on the current DFS path,
/// where `cursor` is the position of the next neighbour to examine.  This
/// reproduces the visiting order of the textbook recursive DFS exactly while
/// using heap memory instead of the call stack.
pub struct DfsVerticesIterator<'a, T> {
    graph: &'a Graph<T>,
    visited: RoaringBitmap,
    stack: Vec<(VertexIndex, usize)>,
    start: Option<VertexIndex>,
}

impl<'a, T> DfsVerticesIterator<'a, T> {
    pub(crate) fn new(graph: &'a Graph<T>, start: VertexIndex) -> Self {
        Self {
            graph,
            visited: RoaringBitmap::new(),
            stack: Vec::new(),
            start: Some(start),
        }
    }

    fn enter(&mut self, u: VertexIndex) -> Option<&'a T> {
        self.visited.insert(u);
        self.stack.push((u, 0));
        self.graph.value_at(u)
    }
}

impl<'a, T> Iterator for DfsVerticesIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            return self.enter(start);
        }
        loop {
            let (u, cursor) = self.stack.last_mut()?;
            let Some(&v) = self.graph.neighbours_at(*u).get(*cursor) else {
                // Every neighbour of u has been examined; backtrack.
                self.stack.pop();
                continue;
            };
            *cursor += 1;
            if self.visited.contains(v) {
                cov_mark::hit!(dfs_skips_visited_neighbour);
                continue;
            }
            return self.enter(v);
        }
    }
}

/// See [`Graph::iter_vertices_bfs`].
pub struct BfsVerticesIterator<'a, T> {
    pub(crate) graph: &'a Graph<T>,
    pub(crate) visited: RoaringBitmap,
    pub(crate) to_visit: VecDeque<VertexIndex>,
}

impl<'a, T> BfsVerticesIterator<'a, T> {
    pub(crate) fn new(graph: &'a Graph<T>, start: VertexIndex) -> Self {
        let mut visited = RoaringBitmap::new();
        visited.insert(start);
        Self {
            graph,
            visited,
            to_visit: VecDeque::from([start]),
        }
    }
}

impl<'a, T> Iterator for BfsVerticesIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.to_visit.pop_front()?;
        for &v in self.graph.neighbours_at(u) {
            // Vertices are marked when queued so each one is queued once.
            if self.visited.insert(v) {
                self.to_visit.push_back(v);
            }
        }
        self.graph.value_at(u)
    }
}
