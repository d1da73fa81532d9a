//! Benchmarks for qmap placement and routing
//!
//! Run with: cargo bench -p qmap-route

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qmap_ir::{VirtualOperation, VirtualQubit};
use qmap_route::{
    HeuristicPlacement, InteractionGraph, MapperConfig, PlacementStrategy, Placer, Topology,
    map_circuit,
};
use rand::{Rng, SeedableRng};

/// Seeded random circuit of `depth` layers over `n` qubits.
fn random_circuit(n: u32, depth: u32, seed: u64) -> Vec<VirtualOperation> {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);

    let mut ops = Vec::new();
    for _ in 0..depth {
        for q in 0..n {
            ops.push(VirtualOperation::single_qubit_gate("h", VirtualQubit(q)));
        }
        for _ in 0..n / 2 {
            let a = rng.gen_range(0..n);
            let b = (a + rng.gen_range(1..n)) % n;
            ops.push(VirtualOperation::two_qubit_gate(
                "cx",
                VirtualQubit(a),
                VirtualQubit(b),
            ));
        }
    }
    ops
}

/// Benchmark heuristic placement on a grid
fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");

    for side in &[3, 5, 7] {
        let topology = Topology::grid(*side, *side).unwrap();
        let circuit = random_circuit(side * side, 10, 42);
        let interactions = InteractionGraph::from_operations(&circuit);
        let placer = HeuristicPlacement::new(128);

        group.bench_with_input(
            BenchmarkId::new("heuristic_grid", side * side),
            &interactions,
            |b, interactions| {
                b.iter(|| placer.place(black_box(&topology), black_box(interactions)));
            },
        );
    }

    group.finish();
}

/// Benchmark end-to-end mapping with different lookahead windows
fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");
    let topology = Topology::grid(5, 5).unwrap();
    let circuit = random_circuit(25, 20, 42);

    for lookahead in &[0, 4, 16] {
        let config = MapperConfig::new()
            .with_lookahead(*lookahead)
            .with_placement(PlacementStrategy::Identity);

        group.bench_with_input(
            BenchmarkId::new("grid_5x5", lookahead),
            &config,
            |b, config| {
                b.iter(|| map_circuit(&topology, black_box(circuit.clone()), config).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark routing on a line, the sparsest connected device
fn bench_linear_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_routing");

    for n in &[8, 16, 32] {
        let topology = Topology::linear(*n).unwrap();
        let circuit = random_circuit(*n, 10, 42);
        let config = MapperConfig::default();

        group.bench_with_input(BenchmarkId::new("line", n), &circuit, |b, circuit| {
            b.iter(|| map_circuit(&topology, black_box(circuit.clone()), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_placement, bench_routing, bench_linear_routing);
criterion_main!(benches);
