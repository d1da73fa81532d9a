//! Swap routing for two-qubit operations.
//!
//! The router owns the live [`Mapping`]. For each operation it rewrites the
//! operands to physical qubits; when a two-qubit gate lands on physical
//! qubits without a direct link it runs a routing episode:
//!
//! 1. Collect candidate swaps: every link touching either operand whose
//!    swap moves that operand one hop closer to the other.
//! 2. Drop the swap that would undo the previous one in this episode.
//! 3. Score each candidate by the weighted distance of the upcoming
//!    two-qubit gates in the [`LookaheadWindow`] after the swap. Nearer
//!    gates weigh more.
//! 4. Take the lowest score, breaking ties by the lexicographically
//!    lowest physical pair, apply it and repeat until the operands are
//!    adjacent or the swap budget is spent.
//!
//! Each step shortens the operand distance by exactly one hop, so a
//! connected topology never needs more than `diameter - 1` swaps.

use tracing::{debug, trace};

use qmap_ir::{PhysicalOperation, PhysicalQubit, VirtualOperation, VirtualQubit};

use crate::config::{MapperConfig, PlacementStrategy};
use crate::error::{RouteError, RouteResult};
use crate::mapping::Mapping;
use crate::placement::allocate_late;
use crate::topology::Topology;
use crate::window::LookaheadWindow;

/// Counters collected while routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingStats {
    /// Operations received from upstream.
    pub operations: usize,
    /// Two-qubit operations that needed at least one swap.
    pub episodes: usize,
    /// Swaps inserted in total.
    pub swaps: usize,
    /// Virtual qubits placed after the initial placement.
    pub late_allocations: usize,
}

/// Incremental router holding the live mapping.
pub struct Router<'t> {
    topology: &'t Topology,
    mapping: Mapping,
    strategy: PlacementStrategy,
    swap_budget: usize,
    stats: RoutingStats,
}

impl<'t> Router<'t> {
    /// Create a router starting from `mapping`.
    pub fn new(topology: &'t Topology, mapping: Mapping, config: &MapperConfig) -> Self {
        Self {
            topology,
            mapping,
            strategy: config.initial_placement_strategy,
            swap_budget: config.swap_budget(topology),
            stats: RoutingStats::default(),
        }
    }

    /// The current mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Counters so far.
    pub fn stats(&self) -> RoutingStats {
        self.stats
    }

    /// Swap budget per routing episode.
    pub fn swap_budget(&self) -> usize {
        self.swap_budget
    }

    /// Route one operation.
    ///
    /// Returns the inserted swaps followed by the rewritten operation. On
    /// error nothing is returned, so no part of the episode reaches the
    /// output.
    pub fn route(
        &mut self,
        op: VirtualOperation,
        window: &LookaheadWindow,
    ) -> RouteResult<Vec<PhysicalOperation>> {
        op.validate()?;
        self.stats.operations += 1;
        self.place_new_operands(&op)?;

        let mut episode = Vec::new();
        if let Some((&a, &b)) = op.qubit_pair() {
            self.bring_adjacent(a, b, window, &mut episode)?;
        }

        let mapping = &self.mapping;
        let physical =
            op.try_map_qubits(|v| mapping.physical_of(v).ok_or(RouteError::Unmapped(v)))?;
        episode.push(physical);
        Ok(episode)
    }

    fn place_new_operands(&mut self, op: &VirtualOperation) -> RouteResult<()> {
        for (i, &virt) in op.qubits.iter().enumerate() {
            if self.mapping.physical_of(virt).is_some() {
                continue;
            }
            let anchor = op
                .qubit_pair()
                .map(|(&a, &b)| if i == 0 { b } else { a })
                .and_then(|partner| self.mapping.physical_of(partner));
            let phys = allocate_late(
                self.strategy,
                self.topology,
                &mut self.mapping,
                virt,
                anchor,
            )?;
            self.stats.late_allocations += 1;
            debug!("Allocated {} on {} after initial placement", virt, phys);
        }
        Ok(())
    }

    fn physical(&self, virt: VirtualQubit) -> RouteResult<PhysicalQubit> {
        self.mapping
            .physical_of(virt)
            .ok_or(RouteError::Unmapped(virt))
    }

    fn bring_adjacent(
        &mut self,
        a: VirtualQubit,
        b: VirtualQubit,
        window: &LookaheadWindow,
        episode: &mut Vec<PhysicalOperation>,
    ) -> RouteResult<()> {
        let mut previous = None;
        let mut inserted = 0;

        loop {
            let pa = self.physical(a)?;
            let pb = self.physical(b)?;
            let distance = self.topology.distance(pa, pb);
            if distance <= 1 {
                break;
            }

            let diverged = RouteError::RoutingDiverged {
                qubit1: pa,
                qubit2: pb,
                swaps: inserted,
            };
            if inserted >= self.swap_budget {
                return Err(diverged);
            }
            let (s1, s2) = self
                .select_swap(pa, pb, distance, previous, window)
                .ok_or(diverged)?;

            self.mapping.apply_swap(self.topology, s1, s2)?;
            trace!("Swap {} <-> {} while routing {} / {}", s1, s2, a, b);
            episode.push(PhysicalOperation::swap(s1, s2));
            previous = Some((s1, s2));
            inserted += 1;
        }

        if inserted > 0 {
            self.stats.episodes += 1;
            self.stats.swaps += inserted;
            debug!("Routed {} / {} with {} swaps", a, b, inserted);
        }
        Ok(())
    }

    /// Pick the next swap for the blocked pair at `pa`, `pb`.
    fn select_swap(
        &self,
        pa: PhysicalQubit,
        pb: PhysicalQubit,
        distance: u32,
        previous: Option<(PhysicalQubit, PhysicalQubit)>,
        window: &LookaheadWindow,
    ) -> Option<(PhysicalQubit, PhysicalQubit)> {
        let mut candidates = Vec::new();
        for (moving, fixed) in [(pa, pb), (pb, pa)] {
            for &neighbor in self.topology.neighbors(moving) {
                if self.topology.distance(neighbor, fixed) >= distance {
                    continue;
                }
                let swap = (moving.min(neighbor), moving.max(neighbor));
                if Some(swap) != previous {
                    candidates.push(swap);
                }
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        candidates.into_iter().min_by_key(|&swap| {
            let score = self.lookahead_cost(swap, window);
            trace!("Candidate swap {} <-> {} scores {}", swap.0, swap.1, score);
            (score, swap)
        })
    }

    /// Weighted distance of the upcoming two-qubit gates if `swap` were applied.
    ///
    /// The gate at window position `k` weighs `capacity - k`. Gates with an
    /// operand that is not placed yet are skipped.
    fn lookahead_cost(&self, swap: (PhysicalQubit, PhysicalQubit), window: &LookaheadWindow) -> u64 {
        let moved = |p: PhysicalQubit| {
            if p == swap.0 {
                swap.1
            } else if p == swap.1 {
                swap.0
            } else {
                p
            }
        };

        window
            .upcoming_pairs()
            .filter_map(|(k, u, w)| {
                let pu = moved(self.mapping.physical_of(u)?);
                let pw = moved(self.mapping.physical_of(w)?);
                let weight = (window.capacity() - k) as u64;
                Some(weight * u64::from(self.topology.distance(pu, pw)))
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: u32) -> VirtualQubit {
        VirtualQubit(id)
    }

    fn p(id: u32) -> PhysicalQubit {
        PhysicalQubit(id)
    }

    fn cx(a: u32, b: u32) -> VirtualOperation {
        VirtualOperation::two_qubit_gate("cx", v(a), v(b))
    }

    fn identity_router(topology: &Topology, n: u32) -> Router<'_> {
        let mapping = Mapping::identity(topology, (0..n).map(v)).unwrap();
        Router::new(topology, mapping, &MapperConfig::default())
    }

    #[test]
    fn test_adjacent_gate_passes_through() {
        let topology = Topology::linear(3).unwrap();
        let mut router = identity_router(&topology, 3);
        let out = router.route(cx(0, 1), &LookaheadWindow::new(4)).unwrap();
        assert_eq!(
            out,
            vec![PhysicalOperation::two_qubit_gate("cx", p(0), p(1))]
        );
        assert_eq!(router.stats().swaps, 0);
    }

    #[test]
    fn test_single_qubit_gate_rewritten() {
        let topology = Topology::linear(3).unwrap();
        let mapping = Mapping::new(&topology, [(v(4), p(2))]).unwrap();
        let mut router = Router::new(&topology, mapping, &MapperConfig::default());
        let out = router
            .route(
                VirtualOperation::single_qubit_gate("h", v(4)),
                &LookaheadWindow::new(4),
            )
            .unwrap();
        assert_eq!(out, vec![PhysicalOperation::single_qubit_gate("h", p(2))]);
    }

    #[test]
    fn test_line_of_three_inserts_one_swap() {
        let topology = Topology::linear(3).unwrap();
        let mut router = identity_router(&topology, 3);
        let out = router.route(cx(0, 2), &LookaheadWindow::new(4)).unwrap();

        assert_eq!(
            out,
            vec![
                PhysicalOperation::swap(p(0), p(1)),
                PhysicalOperation::two_qubit_gate("cx", p(1), p(2)),
            ]
        );
        assert_eq!(router.mapping().physical_of(v(0)), Some(p(1)));
        assert_eq!(router.mapping().physical_of(v(1)), Some(p(0)));
        assert_eq!(router.stats().episodes, 1);
    }

    #[test]
    fn test_lookahead_breaks_tie() {
        // Both (0,1) and (1,2) make cx(v0, v2) executable; only (1,2) keeps
        // the following cx(v1, v2) on a link.
        let topology = Topology::linear(3).unwrap();
        let mut router = identity_router(&topology, 3);

        let mut source = crate::stream::IterSource::new(vec![cx(0, 2), cx(1, 2)]);
        let mut window = LookaheadWindow::new(4);
        let first = window.advance(&mut source).unwrap().unwrap();
        let out = router.route(first, &window).unwrap();
        // After (1,2): v0@0, v2@1, v1@2 -> cx(v1, v2) adjacent, cost 4.
        // After (0,1): v1@0, v0@1, v2@2 -> cx(v1, v2) two hops, cost 8.
        assert_eq!(out[0], PhysicalOperation::swap(p(1), p(2)));
        assert_eq!(out[1], PhysicalOperation::two_qubit_gate("cx", p(0), p(1)));
    }

    #[test]
    fn test_long_route_on_line() {
        let topology = Topology::linear(6).unwrap();
        let mut router = identity_router(&topology, 6);
        assert_eq!(router.swap_budget(), 10);
        let out = router.route(cx(0, 5), &LookaheadWindow::new(0)).unwrap();

        let swaps = out.iter().filter(|op| op.is_swap()).count();
        assert_eq!(swaps, 4);
        for op in &out {
            let (&x, &y) = op.qubit_pair().unwrap();
            assert!(topology.are_adjacent(x, y));
        }
        assert!(router.mapping().is_consistent());
    }

    #[test]
    fn test_swap_budget_exhausted() {
        let topology = Topology::linear(6).unwrap();
        let mapping = Mapping::identity(&topology, (0..6).map(v)).unwrap();
        let config = MapperConfig::default().with_max_swaps(2);
        let mut router = Router::new(&topology, mapping, &config);
        assert_eq!(router.swap_budget(), 2);

        let result = router.route(cx(0, 5), &LookaheadWindow::new(0));
        assert!(matches!(
            result,
            Err(RouteError::RoutingDiverged { swaps: 2, .. })
        ));
    }

    #[test]
    fn test_late_allocation_near_partner() {
        let topology = Topology::linear(5).unwrap();
        let mapping = Mapping::new(&topology, [(v(0), p(4))]).unwrap();
        let mut router = Router::new(&topology, mapping, &MapperConfig::default());

        let out = router.route(cx(0, 9), &LookaheadWindow::new(0)).unwrap();
        assert_eq!(out, vec![PhysicalOperation::two_qubit_gate("cx", p(4), p(3))]);
        assert_eq!(router.stats().late_allocations, 1);
    }

    #[test]
    fn test_invalid_operation_rejected() {
        let topology = Topology::linear(3).unwrap();
        let mut router = identity_router(&topology, 3);
        let result = router.route(cx(1, 1), &LookaheadWindow::new(0));
        assert!(matches!(result, Err(RouteError::Ir(_))));
        assert_eq!(router.stats().operations, 0);
    }

    #[test]
    fn test_measure_over_many_qubits_not_routed() {
        let topology = Topology::linear(4).unwrap();
        let mut router = identity_router(&topology, 4);
        let out = router
            .route(
                VirtualOperation::measure([v(0), v(3)]),
                &LookaheadWindow::new(0),
            )
            .unwrap();
        assert_eq!(out, vec![PhysicalOperation::measure([p(0), p(3)])]);
    }
}
