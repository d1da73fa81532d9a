//! Topology command implementation.

use anyhow::Result;
use console::style;

use qmap_route::Topology;

use super::common::load_topology;

/// Execute the topology command.
pub fn execute(file: Option<&str>, preset: Option<&str>, json: bool) -> Result<()> {
    let topology = load_topology(file, preset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&topology)?);
        return Ok(());
    }

    let summary = Summary::of(&topology);
    println!(
        "{} {} qubits, {} links",
        style("Topology:").cyan().bold(),
        style(topology.num_qubits()).yellow(),
        topology.edges().len()
    );
    println!("  Diameter:    {}", topology.diameter());
    println!(
        "  Degree:      min {}, max {}, mean {:.2}",
        summary.min_degree, summary.max_degree, summary.mean_degree
    );
    println!("  Most central: {}", style(summary.center).green());
    println!();
    println!("{}", style("Links:").bold());
    for qubit in topology.qubits() {
        let neighbors: Vec<String> = topology
            .neighbors(qubit)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  {:>5} -> {}", qubit.to_string(), neighbors.join(", "));
    }

    Ok(())
}

/// Connectivity figures shown in the summary.
struct Summary {
    min_degree: usize,
    max_degree: usize,
    mean_degree: f64,
    center: String,
}

impl Summary {
    fn of(topology: &Topology) -> Self {
        let degrees: Vec<usize> = topology
            .qubits()
            .map(|q| topology.neighbors(q).len())
            .collect();
        let center = topology
            .qubits()
            .min_by_key(|&q| (topology.eccentricity_sum(q), q))
            .map_or_else(|| "-".to_string(), |q| q.to_string());
        #[allow(clippy::cast_precision_loss)]
        let mean_degree = degrees.iter().sum::<usize>() as f64 / degrees.len().max(1) as f64;

        Self {
            min_degree: degrees.iter().copied().min().unwrap_or(0),
            max_degree: degrees.iter().copied().max().unwrap_or(0),
            mean_degree,
            center,
        }
    }
}
