//! The streaming mapping stage.
//!
//! [`MappingStage`] sits between an upstream [`OperationSource`] of virtual
//! operations and a downstream consumer of physical operations. It buffers
//! a bounded prefix of the stream to compute the initial placement, then
//! routes operations one at a time as downstream asks for them, pulling
//! from upstream only as far as the lookahead window needs.

use std::collections::VecDeque;

use tracing::{debug, error, info, instrument};

use qmap_ir::{PhysicalOperation, VirtualOperation};

use crate::config::MapperConfig;
use crate::error::RouteResult;
use crate::mapping::Mapping;
use crate::placement::InteractionGraph;
use crate::router::{Router, RoutingStats};
use crate::topology::Topology;
use crate::window::LookaheadWindow;

/// Upstream producer of virtual operations.
pub trait OperationSource {
    /// Next operation, or `None` at end-of-stream.
    fn pull(&mut self) -> RouteResult<Option<VirtualOperation>>;
}

/// Downstream consumer of physical operations.
pub trait OperationSink {
    /// Accept one operation.
    fn push(&mut self, op: PhysicalOperation) -> RouteResult<()>;
}

impl<S: OperationSource + ?Sized> OperationSource for &mut S {
    fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
        (**self).pull()
    }
}

impl<S: OperationSource + ?Sized> OperationSource for Box<S> {
    fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
        (**self).pull()
    }
}

impl<S: OperationSink + ?Sized> OperationSink for &mut S {
    fn push(&mut self, op: PhysicalOperation) -> RouteResult<()> {
        (**self).push(op)
    }
}

impl OperationSink for Vec<PhysicalOperation> {
    fn push(&mut self, op: PhysicalOperation) -> RouteResult<()> {
        Vec::push(self, op);
        Ok(())
    }
}

/// Infallible source over an in-memory sequence.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator<Item = VirtualOperation>> IterSource<I> {
    /// Wrap anything iterable over virtual operations.
    pub fn new(ops: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: ops.into_iter(),
        }
    }
}

impl<I: Iterator<Item = VirtualOperation>> OperationSource for IterSource<I> {
    fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
        Ok(self.iter.next())
    }
}

/// Placement and routing over a stream of operations.
///
/// Construction consumes the placement prefix and fixes the initial
/// mapping. Output is then produced lazily, either through the
/// [`Iterator`] implementation or by [`run`](Self::run) into a sink. Each
/// routing episode is computed completely before any of it is handed out.
/// The first error ends the stream: it is returned once and every later
/// call yields nothing.
pub struct MappingStage<'t, S> {
    source: S,
    window: LookaheadWindow,
    router: Router<'t>,
    initial_mapping: Mapping,
    placement_cost: u64,
    pending: VecDeque<PhysicalOperation>,
    finished: bool,
}

impl<'t, S: OperationSource> MappingStage<'t, S> {
    /// Buffer the placement prefix from `source`, place its qubits on
    /// `topology` and prepare for routing.
    #[instrument(skip_all, fields(qubits = topology.num_qubits()))]
    pub fn new(topology: &'t Topology, mut source: S, config: &MapperConfig) -> RouteResult<Self> {
        let limit = config.placement_prefix;
        let mut prefix = Vec::new();
        let mut exhausted = false;
        while limit.is_none_or(|n| prefix.len() < n) {
            match source.pull()? {
                Some(op) => prefix.push(op),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        let interactions = InteractionGraph::from_operations(&prefix);
        let placer = config.placer();
        let mapping = placer.place(topology, &interactions)?;
        let placement_cost = interactions.cost(&mapping, topology);
        info!(
            "{} placed {} qubits from {} buffered operations, cost {}",
            placer.name(),
            mapping.len(),
            prefix.len(),
            placement_cost
        );
        for (virt, phys) in mapping.iter() {
            debug!("Initial placement {} -> {}", virt, phys);
        }

        Ok(Self {
            source,
            window: LookaheadWindow::primed(config.lookahead_window_size, prefix, exhausted),
            router: Router::new(topology, mapping.clone(), config),
            initial_mapping: mapping,
            placement_cost,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Produce the next physical operation, routing more input as needed.
    pub fn next_output(&mut self) -> RouteResult<Option<PhysicalOperation>> {
        if let Some(op) = self.pending.pop_front() {
            return Ok(Some(op));
        }
        if self.finished {
            return Ok(None);
        }

        match self.step() {
            Ok(true) => Ok(self.pending.pop_front()),
            Ok(false) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                error!(kind = e.kind(), "Mapping stage aborted: {}", e);
                Err(e)
            }
        }
    }

    fn step(&mut self) -> RouteResult<bool> {
        let Some(op) = self.window.advance(&mut self.source)? else {
            return Ok(false);
        };
        let routed = self.router.route(op, &self.window)?;
        self.pending.extend(routed);
        Ok(true)
    }

    /// Drive the stage to completion, pushing every output into `sink`.
    #[instrument(skip_all)]
    pub fn run<K: OperationSink>(&mut self, mut sink: K) -> RouteResult<RoutingStats> {
        while let Some(op) = self.next_output()? {
            sink.push(op)?;
        }
        let stats = self.stats();
        info!(
            "Mapping completed: {} operations, {} swaps in {} episodes, {} late allocations",
            stats.operations, stats.swaps, stats.episodes, stats.late_allocations
        );
        Ok(stats)
    }

    /// Mapping chosen by the initial placement.
    pub fn initial_mapping(&self) -> &Mapping {
        &self.initial_mapping
    }

    /// Live mapping after everything routed so far.
    pub fn mapping(&self) -> &Mapping {
        self.router.mapping()
    }

    /// Placement cost of the initial mapping over the buffered prefix.
    pub fn placement_cost(&self) -> u64 {
        self.placement_cost
    }

    /// Routing counters so far.
    pub fn stats(&self) -> RoutingStats {
        self.router.stats()
    }
}

impl<S: OperationSource> Iterator for MappingStage<'_, S> {
    type Item = RouteResult<PhysicalOperation>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_output().transpose()
    }
}

/// A fully mapped circuit.
#[derive(Debug, Clone)]
pub struct MappedCircuit {
    /// Physical operations, swaps included, in emission order.
    pub operations: Vec<PhysicalOperation>,
    /// Mapping before the first operation.
    pub initial_mapping: Mapping,
    /// Mapping after the last operation.
    pub final_mapping: Mapping,
    /// Placement cost of the initial mapping.
    pub placement_cost: u64,
    /// Routing counters.
    pub stats: RoutingStats,
}

/// Map an in-memory circuit in one call.
pub fn map_circuit(
    topology: &Topology,
    ops: impl IntoIterator<Item = VirtualOperation>,
    config: &MapperConfig,
) -> RouteResult<MappedCircuit> {
    let mut stage = MappingStage::new(topology, IterSource::new(ops), config)?;
    let mut operations = Vec::new();
    let stats = stage.run(&mut operations)?;
    Ok(MappedCircuit {
        operations,
        initial_mapping: stage.initial_mapping().clone(),
        final_mapping: stage.mapping().clone(),
        placement_cost: stage.placement_cost(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementStrategy;
    use crate::error::RouteError;
    use qmap_ir::{PhysicalQubit, VirtualQubit};

    fn v(id: u32) -> VirtualQubit {
        VirtualQubit(id)
    }

    fn p(id: u32) -> PhysicalQubit {
        PhysicalQubit(id)
    }

    fn cx(a: u32, b: u32) -> VirtualOperation {
        VirtualOperation::two_qubit_gate("cx", v(a), v(b))
    }

    fn identity_config() -> MapperConfig {
        MapperConfig::new().with_placement(PlacementStrategy::Identity)
    }

    /// Source that records how many operations have been pulled.
    struct CountingSource {
        ops: VecDeque<VirtualOperation>,
        pulled: usize,
    }

    impl OperationSource for CountingSource {
        fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
            let op = self.ops.pop_front();
            if op.is_some() {
                self.pulled += 1;
            }
            Ok(op)
        }
    }

    /// Source that fails after its operations run out.
    struct FailingSource(VecDeque<VirtualOperation>);

    impl OperationSource for FailingSource {
        fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
            match self.0.pop_front() {
                Some(op) => Ok(Some(op)),
                None => Err(RouteError::Stream("connection reset".into())),
            }
        }
    }

    #[test]
    fn test_stage_line_of_three() {
        let topology = Topology::linear(3).unwrap();
        let mapped = map_circuit(&topology, [cx(0, 2)], &identity_config()).unwrap();

        assert_eq!(
            mapped.operations,
            vec![
                PhysicalOperation::swap(p(0), p(1)),
                PhysicalOperation::two_qubit_gate("cx", p(1), p(2)),
            ]
        );
        assert_eq!(mapped.initial_mapping.physical_of(v(0)), Some(p(0)));
        assert_eq!(mapped.final_mapping.physical_of(v(0)), Some(p(1)));
        assert_eq!(mapped.stats.swaps, 1);
    }

    #[test]
    fn test_stage_empty_stream() {
        let topology = Topology::linear(3).unwrap();
        let mapped = map_circuit(&topology, [], &MapperConfig::default()).unwrap();
        assert!(mapped.operations.is_empty());
        assert!(mapped.initial_mapping.is_empty());
        assert_eq!(mapped.stats, RoutingStats::default());
    }

    #[test]
    fn test_stage_pulls_lazily() {
        let topology = Topology::linear(4).unwrap();
        let mut source = CountingSource {
            ops: (0..10).map(|_| cx(0, 1)).collect(),
            pulled: 0,
        };
        let config = identity_config()
            .with_placement_prefix(Some(0))
            .with_lookahead(2);

        let mut stage = MappingStage::new(&topology, &mut source, &config).unwrap();
        assert!(stage.next_output().unwrap().is_some());
        drop(stage);
        assert_eq!(source.pulled, 3);
    }

    #[test]
    fn test_stage_prefix_bounds_placement() {
        let topology = Topology::linear(4).unwrap();
        let config = MapperConfig::new().with_placement_prefix(Some(1));
        let mut stage =
            MappingStage::new(&topology, IterSource::new(vec![cx(0, 1), cx(2, 3)]), &config)
                .unwrap();

        assert_eq!(stage.initial_mapping().len(), 2);
        let out: Vec<_> = stage.by_ref().collect::<RouteResult<_>>().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(stage.stats().late_allocations, 2);
        assert_eq!(stage.mapping().len(), 4);
    }

    #[test]
    fn test_stage_error_ends_stream() {
        let topology = Topology::linear(3).unwrap();
        let ops = vec![
            VirtualOperation::single_qubit_gate("h", v(0)),
            cx(1, 1),
            cx(0, 1),
        ];
        let mut stage =
            MappingStage::new(&topology, IterSource::new(ops), &identity_config()).unwrap();

        assert!(stage.next().unwrap().is_ok());
        assert!(matches!(stage.next(), Some(Err(RouteError::Ir(_)))));
        assert!(stage.next().is_none());
        assert!(stage.next().is_none());
    }

    #[test]
    fn test_stage_source_error_propagates() {
        let topology = Topology::linear(3).unwrap();
        let source = FailingSource(VecDeque::from(vec![cx(0, 1)]));
        let result = MappingStage::new(&topology, source, &MapperConfig::default());
        assert!(matches!(result, Err(RouteError::Stream(_))));
    }

    #[test]
    fn test_stage_run_into_sink() {
        let topology = Topology::ring(4).unwrap();
        let ops = vec![
            cx(0, 2),
            VirtualOperation::measure([v(0), v(1), v(2)]),
        ];
        let mut stage =
            MappingStage::new(&topology, IterSource::new(ops), &identity_config()).unwrap();

        let mut sink = Vec::new();
        let stats = stage.run(&mut sink).unwrap();
        assert_eq!(stats.operations, 2);
        assert_eq!(sink.len(), 2 + stats.swaps);
        assert_eq!(sink.last().map(|op| op.name()), Some("measure"));
    }
}
