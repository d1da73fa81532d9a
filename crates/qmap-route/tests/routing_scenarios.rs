//! Integration tests for the mapping stage on small hand-checked circuits.
//!
//! Each test drives the public API end to end: topology construction,
//! initial placement, routing and the streaming stage.

use qmap_ir::{IrError, Operation, OperationKind, PhysicalOperation, PhysicalQubit};
use qmap_ir::{VirtualOperation, VirtualQubit};
use qmap_route::{
    IterSource, MapperConfig, MappingStage, PlacementStrategy, RouteError, Topology, map_circuit,
};
use serde_json::json;

fn v(id: u32) -> VirtualQubit {
    VirtualQubit(id)
}

fn p(id: u32) -> PhysicalQubit {
    PhysicalQubit(id)
}

fn cx(a: u32, b: u32) -> VirtualOperation {
    VirtualOperation::two_qubit_gate("cx", v(a), v(b))
}

fn identity() -> MapperConfig {
    MapperConfig::new().with_placement(PlacementStrategy::Identity)
}

/// Helper: strip router swaps from an output sequence.
fn without_swaps(ops: &[PhysicalOperation]) -> Vec<&PhysicalOperation> {
    ops.iter().filter(|op| !op.is_swap()).collect()
}

// ============================================================================
// Routing
// ============================================================================

#[test]
fn test_line_requires_single_swap() {
    let topology = Topology::linear(3).unwrap();
    let mapped = map_circuit(&topology, [cx(0, 2)], &identity()).unwrap();

    assert_eq!(
        mapped.operations,
        vec![
            PhysicalOperation::swap(p(0), p(1)),
            PhysicalOperation::two_qubit_gate("cx", p(1), p(2)),
        ]
    );
    assert_eq!(mapped.final_mapping.physical_of(v(0)), Some(p(1)));
    assert_eq!(mapped.final_mapping.physical_of(v(1)), Some(p(0)));
}

#[test]
fn test_fully_connected_never_swaps() {
    let topology = Topology::full(5).unwrap();
    let circuit: Vec<_> = (0..5)
        .flat_map(|a| (0..5).filter(move |&b| b != a).map(move |b| cx(a, b)))
        .collect();

    let mapped = map_circuit(&topology, circuit.clone(), &MapperConfig::default()).unwrap();
    assert_eq!(mapped.stats.swaps, 0);
    assert_eq!(mapped.operations.len(), circuit.len());
    assert_eq!(mapped.initial_mapping, mapped.final_mapping);
}

#[test]
fn test_grid_corner_to_corner() {
    let topology = Topology::grid(3, 3).unwrap();
    let mapped = map_circuit(&topology, [cx(0, 8)], &identity()).unwrap();

    assert_eq!(mapped.stats.swaps, 3);
    for op in &mapped.operations {
        let (&a, &b) = op.qubit_pair().unwrap();
        assert!(topology.are_adjacent(a, b), "{op} is not on a link");
    }
}

#[test]
fn test_heuristic_placement_avoids_swaps_on_chain() {
    // v0-v3-v1-v2 interact as a chain; a line can host it without swaps.
    let topology = Topology::linear(4).unwrap();
    let circuit = vec![cx(0, 3), cx(3, 1), cx(1, 2), cx(0, 3), cx(3, 1), cx(1, 2)];

    let heuristic = map_circuit(&topology, circuit.clone(), &MapperConfig::default()).unwrap();
    let trivial = map_circuit(&topology, circuit, &identity()).unwrap();

    assert_eq!(heuristic.placement_cost, 6);
    assert_eq!(heuristic.stats.swaps, 0);
    assert!(trivial.placement_cost > heuristic.placement_cost);
}

#[test]
fn test_swap_budget_exhausted() {
    let topology = Topology::linear(8).unwrap();
    let config = identity().with_max_swaps(1);
    let result = map_circuit(&topology, [cx(0, 7)], &config);

    match result {
        Err(RouteError::RoutingDiverged { swaps, .. }) => assert_eq!(swaps, 1),
        other => panic!("expected RoutingDiverged, got {other:?}"),
    }
}

// ============================================================================
// Pass-through operations
// ============================================================================

#[test]
fn test_measure_and_barrier_not_routed() {
    let topology = Topology::linear(4).unwrap();
    let circuit = vec![
        VirtualOperation::barrier([v(3), v(0)]),
        VirtualOperation::measure([v(0), v(3)]),
    ];
    let mapped = map_circuit(&topology, circuit, &identity()).unwrap();

    assert_eq!(
        mapped.operations,
        vec![
            PhysicalOperation::barrier([p(3), p(0)]),
            PhysicalOperation::measure([p(0), p(3)]),
        ]
    );
}

#[test]
fn test_payload_preserved() {
    let topology = Topology::linear(3).unwrap();
    let circuit = vec![
        VirtualOperation::single_qubit_gate("rz", v(2)).with_payload(json!({"theta": 0.25})),
        cx(0, 2).with_payload(json!({"condition": "c0"})),
    ];
    let mapped = map_circuit(&topology, circuit, &identity()).unwrap();

    let gates = without_swaps(&mapped.operations);
    assert_eq!(gates.len(), 2);
    assert_eq!(gates[0].payload, Some(json!({"theta": 0.25})));
    assert_eq!(gates[1].payload, Some(json!({"condition": "c0"})));
    assert!(
        mapped
            .operations
            .iter()
            .filter(|op| op.is_swap())
            .all(|op| op.payload.is_none())
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_disconnected_topology_rejected() {
    let result = Topology::new(4, [(0, 1), (2, 3)]);
    assert!(matches!(result, Err(RouteError::InvalidTopology(_))));
}

#[test]
fn test_topology_from_json() {
    let topology: Topology =
        serde_json::from_value(json!({"numQubits": 3, "edges": [[0, 1], [2, 1]]})).unwrap();
    assert_eq!(topology.distance(p(0), p(2)), 2);

    let bad = serde_json::from_value::<Topology>(json!({"numQubits": 2, "edges": [[0, 2]]}));
    assert!(bad.is_err());
}

#[test]
fn test_capacity_exceeded_at_placement() {
    let topology = Topology::linear(3).unwrap();
    let circuit = vec![cx(0, 1), cx(2, 3)];
    let result = map_circuit(&topology, circuit, &MapperConfig::default());

    assert!(matches!(
        result,
        Err(RouteError::CapacityExceeded {
            required: 4,
            available: 3
        })
    ));
}

#[test]
fn test_identity_placement_with_out_of_range_ids() {
    let topology = Topology::linear(4).unwrap();

    for prefix in [None, Some(0)] {
        let config = identity().with_placement_prefix(prefix);
        let mapped = map_circuit(&topology, [cx(0, 5)], &config).unwrap();

        assert_eq!(
            mapped.operations,
            vec![PhysicalOperation::two_qubit_gate("cx", p(0), p(1))]
        );
        assert_eq!(mapped.final_mapping.physical_of(v(5)), Some(p(1)));
    }
}

#[test]
fn test_capacity_exceeded_on_late_allocation() {
    let topology = Topology::linear(2).unwrap();
    let config = MapperConfig::new().with_placement_prefix(Some(1));
    let circuit = vec![cx(0, 1), VirtualOperation::single_qubit_gate("h", v(2))];

    let mut stage = MappingStage::new(&topology, IterSource::new(circuit), &config).unwrap();
    assert!(stage.next().unwrap().is_ok());
    assert!(matches!(
        stage.next(),
        Some(Err(RouteError::CapacityExceeded { .. }))
    ));
    assert!(stage.next().is_none());
}

#[test]
fn test_upstream_swap_rejected() {
    let topology = Topology::linear(3).unwrap();
    let swap = Operation {
        kind: OperationKind::Swap,
        qubits: vec![v(0), v(1)],
        payload: None,
    };
    let result = map_circuit(&topology, [swap], &identity());

    match result {
        Err(err @ RouteError::Ir(IrError::ReservedOperation(_))) => {
            assert_eq!(err.kind(), "InvalidOperationError");
        }
        other => panic!("expected ReservedOperation, got {other:?}"),
    }
}

#[test]
fn test_wide_gate_rejected() {
    let topology = Topology::linear(3).unwrap();
    let ccx = VirtualOperation::gate("ccx", [v(0), v(1), v(2)]);
    let result = map_circuit(&topology, [ccx], &identity());

    assert!(matches!(
        result,
        Err(RouteError::Ir(IrError::UnsupportedArity { arity: 3, .. }))
    ));
}

#[test]
fn test_gate_without_operands_rejected() {
    let topology = Topology::linear(3).unwrap();
    let empty = VirtualOperation::gate("x", []);
    let result = map_circuit(&topology, [empty], &identity());

    assert!(matches!(
        result,
        Err(RouteError::Ir(IrError::UnsupportedArity { arity: 0, .. }))
    ));
}
