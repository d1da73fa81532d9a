//! Initial placement of virtual qubits onto the device.
//!
//! Placement runs once, before any operation is routed. It looks at the
//! two-qubit interaction pattern of the circuit (or of a bounded prefix of
//! it, when the circuit is streamed) and picks a [`Mapping`] that keeps
//! frequently interacting qubits close together. The cost it minimizes is
//!
//! ```text
//! cost = Σ weight(v1, v2) × distance(physical(v1), physical(v2))
//! ```
//!
//! where `weight` counts two-qubit operations between a pair of virtual
//! qubits.
//!
//! Qubits first referenced after placement are placed on the fly by
//! [`allocate_late`].

use petgraph::graphmap::UnGraphMap;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use tracing::debug;

use qmap_ir::{PhysicalQubit, VirtualOperation, VirtualQubit};

use crate::config::PlacementStrategy;
use crate::error::{RouteError, RouteResult};
use crate::mapping::Mapping;
use crate::topology::Topology;

/// Weighted graph of two-qubit interactions between virtual qubits.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraphMap<VirtualQubit, u64>,
}

impl InteractionGraph {
    /// Create an empty interaction graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a sequence of operations.
    pub fn from_operations<'a>(ops: impl IntoIterator<Item = &'a VirtualOperation>) -> Self {
        let mut graph = Self::new();
        for op in ops {
            graph.record(op);
        }
        graph
    }

    /// Account for one operation: every operand becomes a node, and a
    /// two-qubit gate bumps the weight of its pair.
    pub fn record(&mut self, op: &VirtualOperation) {
        for &qubit in &op.qubits {
            self.graph.add_node(qubit);
        }
        if let Some((&a, &b)) = op.qubit_pair() {
            if a == b {
                return;
            }
            if let Some(weight) = self.graph.edge_weight_mut(a, b) {
                *weight += 1;
            } else {
                self.graph.add_edge(a, b, 1);
            }
        }
    }

    /// Referenced virtual qubits in ascending order.
    pub fn qubits(&self) -> Vec<VirtualQubit> {
        let mut qubits: Vec<_> = self.graph.nodes().collect();
        qubits.sort_unstable();
        qubits
    }

    /// Number of referenced virtual qubits.
    pub fn num_qubits(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of two-qubit operations between `a` and `b`.
    pub fn weight(&self, a: VirtualQubit, b: VirtualQubit) -> u64 {
        self.graph.edge_weight(a, b).copied().unwrap_or(0)
    }

    /// Interaction partners of `qubit` with their weights, by ascending id.
    pub fn neighbors(&self, qubit: VirtualQubit) -> Vec<(VirtualQubit, u64)> {
        if !self.graph.contains_node(qubit) {
            return Vec::new();
        }
        let mut neighbors: Vec<_> = self
            .graph
            .edges(qubit)
            .map(|(_, other, &weight)| (other, weight))
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Placement cost of `mapping`. Pairs with an unmapped side are skipped.
    pub fn cost(&self, mapping: &Mapping, topology: &Topology) -> u64 {
        self.graph
            .all_edges()
            .filter_map(|(a, b, &weight)| {
                let pa = mapping.physical_of(a)?;
                let pb = mapping.physical_of(b)?;
                Some(weight * u64::from(topology.distance(pa, pb)))
            })
            .sum()
    }
}

/// An initial placement algorithm.
pub trait Placer: Send + Sync {
    /// Get the name of this placement algorithm.
    fn name(&self) -> &str;

    /// Place every qubit of `interactions` on `topology`.
    fn place(&self, topology: &Topology, interactions: &InteractionGraph) -> RouteResult<Mapping>;
}

fn check_capacity(topology: &Topology, required: usize) -> RouteResult<()> {
    if required > topology.num_qubits() as usize {
        return Err(RouteError::CapacityExceeded {
            required,
            available: topology.num_qubits(),
        });
    }
    Ok(())
}

/// Identity placement.
///
/// Maps virtual qubit `k` to physical qubit `k`. Virtual ids outside the
/// device take the lowest idle physical qubits once every in-range id is
/// placed.
pub struct IdentityPlacement;

impl Placer for IdentityPlacement {
    fn name(&self) -> &'static str {
        "IdentityPlacement"
    }

    fn place(&self, topology: &Topology, interactions: &InteractionGraph) -> RouteResult<Mapping> {
        let qubits = interactions.qubits();
        check_capacity(topology, qubits.len())?;

        let (direct, overflow): (Vec<_>, Vec<_>) = qubits
            .into_iter()
            .partition(|v| topology.contains(PhysicalQubit(v.0)));

        let mut mapping = Mapping::identity(topology, direct)?;
        for virt in overflow {
            let phys = allocate_late(
                PlacementStrategy::Identity,
                topology,
                &mut mapping,
                virt,
                None,
            )?;
            debug!("Virtual qubit {} is outside the device, placed on {}", virt, phys);
        }
        Ok(mapping)
    }
}

/// Interaction-weighted placement.
///
/// Qubits are seeded greedily in order of decreasing interaction weight
/// (ties: lowest virtual id first). A qubit with already placed partners
/// goes to the idle physical qubit with the lowest weighted distance to
/// them; the first qubit of a connected group goes to the most central idle
/// qubit; qubits without interactions take the lowest idle qubit. The seed
/// is then refined by steepest-descent pairwise exchange, bounded by
/// `iterations` rounds. Every choice breaks ties toward the lowest physical
/// id, so the result is reproducible.
pub struct HeuristicPlacement {
    iterations: usize,
}

impl HeuristicPlacement {
    /// Create a heuristic placement with the given local search budget.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl Placer for HeuristicPlacement {
    fn name(&self) -> &'static str {
        "HeuristicPlacement"
    }

    fn place(&self, topology: &Topology, interactions: &InteractionGraph) -> RouteResult<Mapping> {
        let qubits = interactions.qubits();
        check_capacity(topology, qubits.len())?;

        let index: FxHashMap<VirtualQubit, usize> =
            qubits.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let neighbors: Vec<Vec<(usize, u64)>> = qubits
            .iter()
            .map(|&v| {
                interactions
                    .neighbors(v)
                    .into_iter()
                    .map(|(u, w)| (index[&u], w))
                    .collect()
            })
            .collect();
        let totals: Vec<u64> = neighbors
            .iter()
            .map(|ns| ns.iter().map(|&(_, w)| w).sum())
            .collect();

        let mut order: Vec<usize> = (0..qubits.len()).collect();
        order.sort_by_key(|&i| (Reverse(totals[i]), i));

        let mut search = LocalSearch {
            topology,
            neighbors: &neighbors,
            position: vec![None; qubits.len()],
            occupant: vec![None; topology.num_qubits() as usize],
        };

        for &i in &order {
            let phys = search
                .seed_position(&neighbors[i], totals[i])
                .ok_or(RouteError::CapacityExceeded {
                    required: qubits.len(),
                    available: topology.num_qubits(),
                })?;
            search.position[i] = Some(phys);
            search.occupant[phys.index()] = Some(i);
        }

        let rounds = search.refine(self.iterations);
        debug!(
            "Heuristic placement of {} qubits refined in {} rounds",
            qubits.len(),
            rounds
        );

        let positions = search.position.iter().map(|p| {
            p.ok_or_else(|| RouteError::InvalidMapping("placement left a qubit unassigned".into()))
        });
        let mut assignment = Vec::with_capacity(qubits.len());
        for (&virt, phys) in qubits.iter().zip(positions) {
            assignment.push((virt, phys?));
        }
        Mapping::new(topology, assignment)
    }
}

/// Working state of the heuristic placement, indexed by dense qubit index.
struct LocalSearch<'a> {
    topology: &'a Topology,
    neighbors: &'a [Vec<(usize, u64)>],
    position: Vec<Option<PhysicalQubit>>,
    occupant: Vec<Option<usize>>,
}

impl LocalSearch<'_> {
    fn seed_position(&self, neighbors: &[(usize, u64)], total: u64) -> Option<PhysicalQubit> {
        let placed: Vec<(PhysicalQubit, u64)> = neighbors
            .iter()
            .filter_map(|&(u, w)| self.position[u].map(|p| (p, w)))
            .collect();

        self.topology
            .qubits()
            .filter(|p| self.occupant[p.index()].is_none())
            .min_by_key(|&p| {
                let key = if !placed.is_empty() {
                    placed
                        .iter()
                        .map(|&(q, w)| w * u64::from(self.topology.distance(p, q)))
                        .sum()
                } else if total > 0 {
                    self.topology.eccentricity_sum(p)
                } else {
                    0
                };
                (key, p)
            })
    }

    /// Cost change from exchanging the occupants of `pa` and `pb`.
    #[allow(clippy::cast_possible_wrap)]
    fn exchange_delta(&self, pa: PhysicalQubit, pb: PhysicalQubit) -> i64 {
        let a = self.occupant[pa.index()];
        let b = self.occupant[pb.index()];
        let dist = |x, y| i64::from(self.topology.distance(x, y));

        let mut delta = 0i64;
        for (moved, from, to, other) in [(a, pa, pb, b), (b, pb, pa, a)] {
            let Some(i) = moved else { continue };
            for &(u, w) in &self.neighbors[i] {
                if Some(u) == other {
                    continue;
                }
                if let Some(pu) = self.position[u] {
                    delta += w as i64 * (dist(to, pu) - dist(from, pu));
                }
            }
        }
        delta
    }

    /// Apply the best improving exchange until none is left or the budget
    /// runs out. Returns the number of exchanges applied.
    fn refine(&mut self, iterations: usize) -> usize {
        let n = self.occupant.len();
        for round in 0..iterations {
            let mut best: Option<(i64, PhysicalQubit, PhysicalQubit)> = None;
            for a in 0..n {
                for b in (a + 1)..n {
                    if self.occupant[a].is_none() && self.occupant[b].is_none() {
                        continue;
                    }
                    let (pa, pb) = (PhysicalQubit::from(a), PhysicalQubit::from(b));
                    let delta = self.exchange_delta(pa, pb);
                    if delta < 0 && best.is_none_or(|(d, _, _)| delta < d) {
                        best = Some((delta, pa, pb));
                    }
                }
            }

            let Some((_, pa, pb)) = best else {
                return round;
            };
            let (a, b) = (self.occupant[pa.index()], self.occupant[pb.index()]);
            self.occupant[pa.index()] = b;
            self.occupant[pb.index()] = a;
            if let Some(a) = a {
                self.position[a] = Some(pb);
            }
            if let Some(b) = b {
                self.position[b] = Some(pa);
            }
        }
        iterations
    }
}

/// Place a virtual qubit first referenced after the initial placement.
///
/// With [`PlacementStrategy::Identity`] physical qubit `k` is preferred for
/// virtual qubit `k` while it is idle. Otherwise the idle qubit closest to
/// `anchor` (the partner's position, for a two-qubit gate) is taken, or the
/// lowest idle qubit when there is no anchor.
pub fn allocate_late(
    strategy: PlacementStrategy,
    topology: &Topology,
    mapping: &mut Mapping,
    virt: VirtualQubit,
    anchor: Option<PhysicalQubit>,
) -> RouteResult<PhysicalQubit> {
    let preferred = PhysicalQubit(virt.0);
    let phys = if strategy == PlacementStrategy::Identity && mapping.is_idle(preferred) {
        preferred
    } else {
        mapping
            .idle_qubits()
            .min_by_key(|&p| (anchor.map_or(0, |a| topology.distance(a, p)), p))
            .ok_or(RouteError::CapacityExceeded {
                required: mapping.len() + 1,
                available: topology.num_qubits(),
            })?
    };
    mapping.allocate(virt, phys)?;
    Ok(phys)
}
