//! Physical device connectivity.
//!
//! A [`Topology`] is the immutable coupling graph of a device: which pairs of
//! physical qubits share a link that supports two-qubit operations. On
//! construction it is validated (non-empty, in-range, irreflexive, connected)
//! and an all-pairs distance table is computed with one BFS per qubit, so
//! every later `distance()` lookup is O(1).
//!
//! # Example
//!
//! ```
//! use qmap_ir::PhysicalQubit;
//! use qmap_route::Topology;
//!
//! let line = Topology::linear(4).unwrap();
//! assert!(line.are_adjacent(PhysicalQubit(1), PhysicalQubit(2)));
//! assert_eq!(line.distance(PhysicalQubit(0), PhysicalQubit(3)), 3);
//! assert_eq!(line.diameter(), 3);
//!
//! // Disconnected devices are rejected.
//! assert!(Topology::new(3, [(0, 1)]).is_err());
//! ```

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use qmap_ir::PhysicalQubit;

use crate::error::{RouteError, RouteResult};

/// Serializable device description: a qubit count and an edge list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpec {
    /// Number of physical qubits.
    pub num_qubits: u32,
    /// Undirected links between physical qubits.
    #[serde(default)]
    pub edges: Vec<(u32, u32)>,
}

/// Immutable coupling graph with a precomputed distance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TopologySpec", into = "TopologySpec")]
pub struct Topology {
    num_qubits: u32,
    /// Normalized `(low, high)` edges, sorted and deduplicated.
    edges: Vec<(PhysicalQubit, PhysicalQubit)>,
    /// Sorted neighbor lists, indexed by physical qubit.
    adjacency: Vec<Vec<PhysicalQubit>>,
    /// `dist_matrix[a][b]` is the hop count between `a` and `b`.
    dist_matrix: Vec<Vec<u32>>,
    diameter: u32,
}

impl Topology {
    /// Largest device accepted. The distance table grows with the square of
    /// the qubit count.
    pub const MAX_QUBITS: u32 = 1 << 14;

    /// Build and validate a topology.
    ///
    /// Duplicate edges, in either direction, are ignored.
    pub fn new(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> RouteResult<Self> {
        if num_qubits == 0 {
            return Err(RouteError::InvalidTopology(
                "device must have at least one qubit".into(),
            ));
        }
        check_size(num_qubits)?;

        let mut normalized = Vec::new();
        for (a, b) in edges {
            if a >= num_qubits || b >= num_qubits {
                return Err(RouteError::InvalidTopology(format!(
                    "edge ({a}, {b}) references a qubit outside 0..{num_qubits}"
                )));
            }
            if a == b {
                return Err(RouteError::InvalidTopology(format!(
                    "self-loop on qubit {a}"
                )));
            }
            normalized.push((PhysicalQubit(a.min(b)), PhysicalQubit(a.max(b))));
        }
        normalized.sort_unstable();
        normalized.dedup();

        let n = num_qubits as usize;
        let mut graph = UnGraph::<(), ()>::with_capacity(n, normalized.len());
        for _ in 0..n {
            graph.add_node(());
        }
        graph.extend_with_edges(normalized.iter().map(|&(a, b)| (a.0, b.0)));
        let components = connected_components(&graph);
        if components != 1 {
            return Err(RouteError::InvalidTopology(format!(
                "coupling graph is disconnected ({components} components)"
            )));
        }

        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in &normalized {
            adjacency[a.index()].push(b);
            adjacency[b.index()].push(a);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        let dist_matrix = all_pairs_distances(&adjacency);
        let diameter = dist_matrix
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0);

        Ok(Self {
            num_qubits,
            edges: normalized,
            adjacency,
            dist_matrix,
            diameter,
        })
    }

    /// Linear chain `0-1-2-...`.
    pub fn linear(n: u32) -> RouteResult<Self> {
        Self::new(n, (1..n).map(|i| (i - 1, i)))
    }

    /// Closed ring; falls back to a line below three qubits.
    pub fn ring(n: u32) -> RouteResult<Self> {
        let closing = (n >= 3).then(|| (n - 1, 0));
        Self::new(n, (1..n).map(|i| (i - 1, i)).chain(closing))
    }

    /// Star with qubit 0 at the center.
    pub fn star(n: u32) -> RouteResult<Self> {
        Self::new(n, (1..n).map(|i| (0, i)))
    }

    /// Fully connected device.
    pub fn full(n: u32) -> RouteResult<Self> {
        Self::new(n, (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))))
    }

    /// Rectangular grid with row-major numbering.
    pub fn grid(rows: u32, cols: u32) -> RouteResult<Self> {
        let num_qubits = rows.checked_mul(cols).ok_or_else(|| {
            RouteError::InvalidTopology(format!("grid {rows}x{cols} overflows the qubit id range"))
        })?;
        check_size(num_qubits)?;

        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::new(num_qubits, edges)
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Normalized edge list.
    pub fn edges(&self) -> &[(PhysicalQubit, PhysicalQubit)] {
        &self.edges
    }

    /// All physical qubits in ascending order.
    pub fn qubits(&self) -> impl Iterator<Item = PhysicalQubit> {
        (0..self.num_qubits).map(PhysicalQubit)
    }

    /// Whether `qubit` exists on this device.
    #[inline]
    pub fn contains(&self, qubit: PhysicalQubit) -> bool {
        qubit.0 < self.num_qubits
    }

    /// Whether two qubits share a link. Out-of-range qubits are never adjacent.
    #[inline]
    pub fn are_adjacent(&self, p1: PhysicalQubit, p2: PhysicalQubit) -> bool {
        self.adjacency
            .get(p1.index())
            .is_some_and(|neighbors| neighbors.binary_search(&p2).is_ok())
    }

    /// Hop count between two qubits.
    ///
    /// # Panics
    ///
    /// Panics if either qubit is outside the device.
    #[inline]
    pub fn distance(&self, p1: PhysicalQubit, p2: PhysicalQubit) -> u32 {
        self.dist_matrix[p1.index()][p2.index()]
    }

    /// Sorted neighbors of a qubit; empty for out-of-range qubits.
    pub fn neighbors(&self, qubit: PhysicalQubit) -> &[PhysicalQubit] {
        self.adjacency
            .get(qubit.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Longest shortest path in the graph.
    #[inline]
    pub fn diameter(&self) -> u32 {
        self.diameter
    }

    /// Sum of distances from `qubit` to every other qubit. Lower is more central.
    pub fn eccentricity_sum(&self, qubit: PhysicalQubit) -> u64 {
        self.dist_matrix[qubit.index()]
            .iter()
            .map(|&d| u64::from(d))
            .sum()
    }

    /// Serializable description of this topology.
    pub fn spec(&self) -> TopologySpec {
        TopologySpec {
            num_qubits: self.num_qubits,
            edges: self.edges.iter().map(|&(a, b)| (a.0, b.0)).collect(),
        }
    }
}

impl TryFrom<TopologySpec> for Topology {
    type Error = RouteError;

    fn try_from(spec: TopologySpec) -> RouteResult<Self> {
        Self::new(spec.num_qubits, spec.edges)
    }
}

impl From<Topology> for TopologySpec {
    fn from(topology: Topology) -> Self {
        topology.spec()
    }
}

/// BFS from every node. The graph is known to be connected, so every entry
/// ends up finite.
fn all_pairs_distances(adjacency: &[Vec<PhysicalQubit>]) -> Vec<Vec<u32>> {
    let n = adjacency.len();
    let mut dist_matrix = vec![vec![u32::MAX; n]; n];
    let mut queue = VecDeque::with_capacity(n);

    for (src, row) in dist_matrix.iter_mut().enumerate() {
        row[src] = 0;
        queue.clear();
        queue.push_back(src);

        while let Some(current) = queue.pop_front() {
            let next = row[current] + 1;
            for neighbor in &adjacency[current] {
                let nb = neighbor.index();
                if row[nb] == u32::MAX {
                    row[nb] = next;
                    queue.push_back(nb);
                }
            }
        }
    }

    dist_matrix
}

fn check_size(num_qubits: u32) -> RouteResult<()> {
    if num_qubits > Topology::MAX_QUBITS {
        return Err(RouteError::InvalidTopology(format!(
            "{num_qubits} qubits exceeds the limit of {}",
            Topology::MAX_QUBITS
        )));
    }
    Ok(())
}
