//! [`proptest`] support: random undirected graphs that shrink well.
//!
//! Generated graphs hold the vertices `0..n` and connect every unordered pair
//! with probability 1/2.  Candidate edges are numbered row-major over the
//! strictly upper triangle of the adjacency matrix, so a set of edges is just
//! a [`RoaringBitmap`] of slot numbers.
//!
//! Shrinking first drops vertices (relabelling the survivors to stay dense),
//! then drops edges.  Both use [`ChunkRemovalValueTree`].

use std::cmp::min;
use std::ops::Range;

use proptest::strategy::{NewTree, Strategy, ValueTree};
use proptest::test_runner::{Reason, TestRunner};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use roaring::RoaringBitmap;

use crate::Graph;

/// Number of candidate edges between `vertex_count` vertices.
#[inline]
pub fn edge_slot_capacity(vertex_count: u16) -> u32 {
    let n = u32::from(vertex_count);
    (n * n - n) / 2
}

pub fn arb_graph(vertex_count: impl Into<Range<u16>>) -> UndirectedGraphStrategy {
    UndirectedGraphStrategy {
        vertex_count: vertex_count.into(),
    }
}

#[derive(Debug, Clone)]
pub struct UndirectedGraphStrategy {
    vertex_count: Range<u16>,
}

impl Strategy for UndirectedGraphStrategy {
    type Tree = UndirectedGraphValueTree;

    type Value = Graph<u32>;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        if self.vertex_count.is_empty() {
            panic!(
                "arb_graph needs a non-empty vertex count range, got {}..{}",
                self.vertex_count.start, self.vertex_count.end
            );
        }
        let vertex_count =
            Uniform::new(self.vertex_count.start, self.vertex_count.end).sample(runner.rng());
        let slots = (0..edge_slot_capacity(vertex_count)).filter(|_| runner.rng().gen_bool(0.5));
        let edges =
            RoaringBitmap::from_sorted_iter(slots).map_err(|e| Reason::from(e.to_string()))?;
        let mut vertices = RoaringBitmap::new();
        vertices.insert_range(0..u32::from(vertex_count));

        Ok(UndirectedGraphValueTree {
            vertex_count,
            vertices: ChunkRemovalValueTree::new(vertices),
            edges: ChunkRemovalValueTree::new(edges),
            shrinking_edges: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UndirectedGraphValueTree {
    vertex_count: u16,
    vertices: ChunkRemovalValueTree,
    edges: ChunkRemovalValueTree,
    shrinking_edges: bool,
}

impl ValueTree for UndirectedGraphValueTree {
    type Value = Graph<u32>;

    fn current(&self) -> Self::Value {
        let vertices = self.vertices.current();
        let edges = self.edges.current();

        let mut labels: Vec<Option<u32>> = Vec::with_capacity(usize::from(self.vertex_count));
        let mut next_label = 0;
        for u in 0..u32::from(self.vertex_count) {
            if vertices.contains(u) {
                labels.push(Some(next_label));
                next_label += 1;
            } else {
                labels.push(None);
            }
        }

        let mut graph = Graph::with_capacity(vertices.len() as usize);
        for label in 0..next_label {
            graph
                .add_vertex(label)
                .expect("labels are distinct");
        }

        let mut slot = 0;
        for (u, u_label) in labels.iter().enumerate() {
            for v_label in &labels[u + 1..] {
                if edges.contains(slot) {
                    if let (Some(left), Some(right)) = (u_label, v_label) {
                        graph
                            .add_edge(*left, *right)
                            .expect("edge connects two distinct existing vertices");
                    }
                }
                slot += 1;
            }
        }

        graph
    }

    fn simplify(&mut self) -> bool {
        if !self.shrinking_edges {
            if self.vertices.simplify() {
                return true;
            }
            self.shrinking_edges = true;
        }
        self.edges.simplify()
    }

    fn complicate(&mut self) -> bool {
        if !self.shrinking_edges {
            if self.vertices.complicate() {
                return true;
            }
            // The vertex tree is back at its smallest failing set.
            self.shrinking_edges = true;
            return self.edges.simplify();
        }
        self.edges.complicate()
    }
}

/// Shrinks a bitmap by removing contiguous chunks of its members, halving the
/// chunk size whenever no single chunk can be removed.
///
/// This is the subset-only half of [delta
/// debugging](https://www.st.cs.uni-saarland.de/papers/tse2002/tse2002.pdf):
/// it starts by trying the empty set, then halves, quarters and so on down to
/// single members.  Whenever a removal keeps the test failing the smaller set
/// is accepted and the search restarts at the same granularity.
#[derive(Debug, Clone)]
pub struct ChunkRemovalValueTree {
    /// Smallest set known to make the test fail.
    kept: RoaringBitmap,
    chunk_count: u64,
    next_chunk: u64,
    /// Chunk of `kept` left out of `current()`, if any.
    removed: Option<u64>,
}

impl ChunkRemovalValueTree {
    pub fn new(bitmap: RoaringBitmap) -> Self {
        Self {
            kept: bitmap,
            chunk_count: 1,
            next_chunk: 0,
            removed: None,
        }
    }

    fn propose(&mut self) -> bool {
        let len = self.kept.len();
        if len == 0 {
            return false;
        }
        loop {
            if self.next_chunk < self.chunk_count {
                self.removed = Some(self.next_chunk);
                self.next_chunk += 1;
                return true;
            }
            if self.chunk_count >= len {
                return false;
            }
            self.chunk_count = min(len, 2 * self.chunk_count);
            self.next_chunk = 0;
        }
    }
}

impl ValueTree for ChunkRemovalValueTree {
    type Value = RoaringBitmap;

    fn current(&self) -> Self::Value {
        let Some(chunk) = self.removed else {
            return self.kept.clone();
        };
        // Proportional bounds: every chunk is non-empty while chunk_count <= len.
        let len = self.kept.len();
        let removed = chunk * len / self.chunk_count..(chunk + 1) * len / self.chunk_count;
        (0u64..)
            .zip(self.kept.iter())
            .filter(|(rank, _)| !removed.contains(rank))
            .map(|(_, member)| member)
            .collect()
    }

    fn simplify(&mut self) -> bool {
        if self.removed.is_some() {
            // The last removal still fails the test: keep it.
            self.kept = self.current();
            self.removed = None;
            self.chunk_count = min(self.chunk_count, self.kept.len().max(1));
            self.next_chunk = 0;
        }
        self.propose()
    }

    fn complicate(&mut self) -> bool {
        if self.removed.take().is_none() {
            return false;
        }
        self.propose()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::test_runner::{TestError, TestRunner};

    use super::*;

    fn runner_with_shrink_iters(max_shrink_iters: u32) -> TestRunner {
        TestRunner::new(ProptestConfig {
            max_shrink_iters,
            ..Default::default()
        })
    }

    #[test]
    fn initial_current_is_the_full_set() {
        let bitmap = RoaringBitmap::from_iter(0..100);
        let tree = ChunkRemovalValueTree::new(bitmap.clone());
        assert_eq!(tree.current(), bitmap);
    }

    #[test]
    fn shrinks_to_nothing_immediately() {
        let mut runner = runner_with_shrink_iters(2);
        let tree = ChunkRemovalValueTree::new(RoaringBitmap::from_iter(0..100));
        let result = runner.run_one(tree, |_| Err(TestCaseError::Fail("always".into())));
        assert_eq!(
            result,
            Err(TestError::Fail("always".into(), RoaringBitmap::new()))
        );
    }

    proptest! {
        #[test]
        fn shrinks_to_exactly_the_failing_members(failing in proptest::collection::vec(0..64u32, 1..6)) {
            let tree = ChunkRemovalValueTree::new(RoaringBitmap::from_iter(0..64));
            let mut runner = runner_with_shrink_iters(1024);
            let result = runner.run_one(tree, |bitmap| {
                if failing.iter().all(|member| bitmap.contains(*member)) {
                    Err(TestCaseError::Fail("contains all failing members".into()))
                } else {
                    Ok(())
                }
            });
            prop_assert_eq!(
                result,
                Err(TestError::Fail(
                    "contains all failing members".into(),
                    RoaringBitmap::from_iter(failing.iter().copied())
                ))
            );
        }

        #[test]
        fn generated_vertices_are_dense(graph in arb_graph(0..30)) {
            let vertices: Vec<u32> = graph.iter_vertices().copied().collect();
            let expected: Vec<u32> = (0..graph.get_vertex_count() as u32).collect();
            prop_assert_eq!(vertices, expected);
        }
    }

    /// Drives a tree the way proptest's runner does and returns the number
    /// of simplify/complicate steps taken.
    fn shrink_until_done(
        tree: &mut ChunkRemovalValueTree,
        fails: impl Fn(&RoaringBitmap) -> bool,
        max_steps: u32,
    ) -> u32 {
        let mut steps = 0;
        let mut more = tree.simplify();
        while more {
            steps += 1;
            assert!(steps <= max_steps, "shrinking took more than {} steps", max_steps);
            more = if fails(&tree.current()) {
                tree.simplify()
            } else {
                tree.complicate()
            };
        }
        steps
    }

    #[test]
    fn every_proposal_removes_at_least_one_member() {
        // 5 members split 4 ways leaves uneven chunks.
        let full = RoaringBitmap::from_iter(0..5);
        let mut tree = ChunkRemovalValueTree::new(full.clone());
        let steps = shrink_until_done(&mut tree, |bitmap| *bitmap == full, 64);
        assert!(steps <= 12);
        assert_eq!(tree.current(), full);
    }

    #[test]
    fn uneven_chunks_still_shrink_to_the_failing_members() {
        let required = RoaringBitmap::from_iter([2, 5, 6]);
        let mut tree = ChunkRemovalValueTree::new(RoaringBitmap::from_iter(0..7));
        shrink_until_done(&mut tree, |bitmap| required.is_subset(bitmap), 200);
        assert_eq!(tree.current(), required);
    }

    #[test]
    fn edge_independent_failure_shrinks_away_every_edge() {
        let mut runner = TestRunner::default();
        let result = runner.run(&arb_graph(5..6), |graph| {
            if graph.get_vertex_count() >= 5 {
                Err(TestCaseError::Fail("five vertices".into()))
            } else {
                Ok(())
            }
        });
        let minimal = match result {
            Err(TestError::Fail(_, minimal)) => minimal,
            other => panic!("expected a shrunk failure, got {:?}", other),
        };
        assert_eq!(minimal.get_vertex_count(), 5);
        assert_eq!(minimal.get_edge_count(), 0);
    }

    #[test]
    fn edge_slot_capacity_counts_unordered_pairs() {
        assert_eq!(edge_slot_capacity(0), 0);
        assert_eq!(edge_slot_capacity(1), 0);
        assert_eq!(edge_slot_capacity(4), 6);
    }

    /// Fails on graphs with a vertex of degree at least three.
    fn fail_on_degree_three(graph: Graph<u32>) -> Result<(), TestCaseError> {
        for u in graph.iter_vertices() {
            if graph.get_degree(u).unwrap_or(0) >= 3 {
                return Err(TestCaseError::Fail("has a vertex of degree three".into()));
            }
        }
        Ok(())
    }

    #[test]
    fn shrinks_full_graph_to_a_star() {
        let vertex_count = 10;
        let mut vertices = RoaringBitmap::new();
        vertices.insert_range(0..u32::from(vertex_count));
        let mut edges = RoaringBitmap::new();
        edges.insert_range(0..edge_slot_capacity(vertex_count));

        let full_graph_tree = UndirectedGraphValueTree {
            vertex_count,
            vertices: ChunkRemovalValueTree::new(vertices),
            edges: ChunkRemovalValueTree::new(edges),
            shrinking_edges: false,
        };

        let mut runner = runner_with_shrink_iters(100_000);
        let result = runner.run_one(full_graph_tree, fail_on_degree_three);

        let minimal = match result {
            Err(TestError::Fail(_, minimal)) => minimal,
            other => panic!("expected a shrunk failure, got {:?}", other),
        };
        assert_eq!(minimal.get_vertex_count(), 4);
        assert_eq!(minimal.get_edge_count(), 3);
    }
}
