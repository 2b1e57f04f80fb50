//! The relational graph over ECG leads.
//!
//! The graph is built once at startup from a [`GraphTopology`] and shared by all
//! classifications. Edges are undirected and stored with the smaller index first.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Anatomically grouped lead triads. Consecutive triads share one lead.
const LEAD_TRIADS: [[usize; 3]; 5] = [[0, 1, 2], [3, 4, 5], [5, 6, 7], [7, 8, 9], [9, 10, 11]];

/// Which edges connect the leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphTopology {
    /// Dense connections inside each lead triad, chained through shared leads.
    #[default]
    AnatomicalTriads,
    /// Every pair of distinct leads is connected.
    FullyConnected,
}

/// An immutable undirected graph over `0..lead_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadGraph {
    topology: GraphTopology,
    lead_count: usize,
    edges: Vec<(usize, usize)>,
    neighbors: Vec<Vec<usize>>,
}

impl LeadGraph {
    pub fn topology(&self) -> GraphTopology {
        self.topology
    }

    pub fn lead_count(&self) -> usize {
        self.lead_count
    }

    /// Undirected edges, each as `(i, j)` with `i < j`, sorted.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Neighbors of a lead in ascending order. Empty for out-of-range indices.
    pub fn neighbors(&self, lead: usize) -> &[usize] {
        self.neighbors.get(lead).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, lead: usize) -> usize {
        self.neighbors(lead).len()
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.binary_search(&key).is_ok()
    }

    /// Dense symmetric adjacency matrix without self-loops.
    pub fn adjacency(&self) -> Array2<f32> {
        let mut adj = Array2::zeros((self.lead_count, self.lead_count));
        for &(i, j) in &self.edges {
            adj[[i, j]] = 1.0;
            adj[[j, i]] = 1.0;
        }
        adj
    }

    /// Edge list in `(2, 2E)` layout with both directions, as graph libraries expect.
    pub fn edge_index(&self) -> Array2<i64> {
        let mut index = Array2::zeros((2, self.edges.len() * 2));
        for (k, &(i, j)) in self.edges.iter().enumerate() {
            index[[0, 2 * k]] = i as i64;
            index[[1, 2 * k]] = j as i64;
            index[[0, 2 * k + 1]] = j as i64;
            index[[1, 2 * k + 1]] = i as i64;
        }
        index
    }
}

/// Builds a [`LeadGraph`] for a configured topology.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadGraphBuilder {
    topology: GraphTopology,
}

impl LeadGraphBuilder {
    pub fn new(topology: GraphTopology) -> Self {
        Self { topology }
    }

    /// Builds the graph over `0..lead_count`.
    ///
    /// Triads that reference a lead outside the range are dropped whole.
    pub fn build(&self, lead_count: usize) -> LeadGraph {
        let mut edges = Vec::new();
        match self.topology {
            GraphTopology::AnatomicalTriads => {
                for triad in LEAD_TRIADS
                    .iter()
                    .filter(|t| t.iter().all(|&lead| lead < lead_count))
                {
                    for (a, &i) in triad.iter().enumerate() {
                        for &j in &triad[a + 1..] {
                            edges.push((i.min(j), i.max(j)));
                        }
                    }
                }
            }
            GraphTopology::FullyConnected => {
                for i in 0..lead_count {
                    for j in i + 1..lead_count {
                        edges.push((i, j));
                    }
                }
            }
        }
        edges.retain(|&(i, j)| i != j);
        edges.sort_unstable();
        edges.dedup();

        let mut neighbors = vec![Vec::new(); lead_count];
        for &(i, j) in &edges {
            neighbors[i].push(j);
            neighbors[j].push(i);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        tracing::debug!(
            "Built {:?} lead graph: {} leads, {} edges",
            self.topology,
            lead_count,
            edges.len()
        );

        LeadGraph {
            topology: self.topology,
            lead_count,
            edges,
            neighbors,
        }
    }
}
