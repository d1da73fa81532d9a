//! Map command implementation.

use anyhow::{Context, Result};
use console::style;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use tracing::info;

use qmap_route::{MapperConfig, MappingStage, PlacementStrategy, RouteError};

use super::common::{load_config, load_topology};
use crate::jsonl::{JsonLinesSink, JsonLinesSource};

/// Arguments of the map command.
pub struct MapArgs<'a> {
    pub topology: Option<&'a str>,
    pub preset: Option<&'a str>,
    pub input: &'a str,
    pub output: &'a str,
    pub config: Option<&'a str>,
    pub lookahead: Option<usize>,
    pub max_swaps: Option<usize>,
    pub placement: Option<PlacementStrategy>,
    pub placement_prefix: Option<usize>,
    pub buffer_all: bool,
}

impl MapArgs<'_> {
    /// Apply command-line overrides on top of the loaded configuration.
    fn configure(&self, mut config: MapperConfig) -> MapperConfig {
        if let Some(size) = self.lookahead {
            config = config.with_lookahead(size);
        }
        if let Some(max) = self.max_swaps {
            config = config.with_max_swaps(max);
        }
        if let Some(strategy) = self.placement {
            config = config.with_placement(strategy);
        }
        if self.buffer_all {
            config = config.with_placement_prefix(None);
        } else if let Some(prefix) = self.placement_prefix {
            config = config.with_placement_prefix(Some(prefix));
        }
        config
    }
}

/// Execute the map command.
pub fn execute(args: &MapArgs<'_>) -> Result<()> {
    let topology = load_topology(args.topology, args.preset)?;
    let config = args.configure(load_config(args.config)?);
    info!("Mapper configuration: {:?}", config);

    eprintln!(
        "{} Mapping {} onto {} qubits ({} links, diameter {})",
        style("→").cyan().bold(),
        style(display_path(args.input)).green(),
        style(topology.num_qubits()).yellow(),
        topology.edges().len(),
        topology.diameter()
    );

    let reader: Box<dyn BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(args.input)
            .with_context(|| format!("Failed to open input: {}", args.input))?;
        Box::new(BufReader::new(file))
    };
    let writer: Box<dyn Write> = if args.output == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let file = File::create(args.output)
            .with_context(|| format!("Failed to create output: {}", args.output))?;
        Box::new(BufWriter::new(file))
    };

    let mut stage =
        MappingStage::new(&topology, JsonLinesSource::new(reader), &config).map_err(abort)?;
    eprintln!(
        "  Placement: {} qubits, cost {}",
        stage.initial_mapping().len(),
        stage.placement_cost()
    );

    let mut sink = JsonLinesSink::new(writer);
    let stats = stage.run(&mut sink).map_err(abort)?;
    sink.flush().map_err(abort)?;

    eprintln!("{} Mapping complete", style("✓").green().bold());
    eprintln!(
        "  Result: {} operations in, {} out, {} swaps",
        stats.operations,
        sink.written(),
        stats.swaps
    );
    if stats.late_allocations > 0 {
        eprintln!(
            "  {} qubits placed after the placement prefix",
            stats.late_allocations
        );
    }
    eprintln!("  Output: {}", style(display_path(args.output)).green());

    Ok(())
}

/// Attach the error kind so scripts can tell failures apart.
fn abort(err: RouteError) -> anyhow::Error {
    anyhow::anyhow!("{} [{}]", err, err.kind())
}

fn display_path(path: &str) -> &str {
    if path == "-" { "<stdio>" } else { path }
}
