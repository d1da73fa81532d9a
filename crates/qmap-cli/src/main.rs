//! qmap Command-Line Interface
//!
//! Maps JSON-lines operation streams onto a device topology.
//!
//! ```text
//! qmap map --preset grid:3x3 --input circuit.jsonl --output mapped.jsonl
//! qmap topology --topology device.yaml
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qmap_route::PlacementStrategy;

mod commands;
mod jsonl;

use commands::{map, topology, version};

/// qmap - qubit placement and swap routing for constrained devices
#[derive(Parser)]
#[command(name = "qmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a stream of virtual operations onto a device
    Map {
        /// Topology file (JSON or YAML)
        #[arg(short, long, conflicts_with = "preset")]
        topology: Option<String>,

        /// Built-in topology (linear:N, ring:N, star:N, grid:RxC, full:N)
        #[arg(short, long)]
        preset: Option<String>,

        /// Input operations, one JSON object per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output file ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Mapper configuration file (JSON or YAML)
        #[arg(short, long)]
        config: Option<String>,

        /// Lookahead window size
        #[arg(long)]
        lookahead: Option<usize>,

        /// Swap budget per routing episode
        #[arg(long)]
        max_swaps: Option<usize>,

        /// Initial placement strategy (heuristic, identity)
        #[arg(long)]
        placement: Option<PlacementStrategy>,

        /// Operations buffered for the initial placement
        #[arg(long, conflicts_with = "buffer_all")]
        placement_prefix: Option<usize>,

        /// Buffer the whole input before placing
        #[arg(long)]
        buffer_all: bool,
    },

    /// Show a summary of a device topology
    Topology {
        /// Topology file (JSON or YAML)
        #[arg(short, long, conflicts_with = "preset")]
        topology: Option<String>,

        /// Built-in topology (linear:N, ring:N, star:N, grid:RxC, full:N)
        #[arg(short, long)]
        preset: Option<String>,

        /// Print the normalized topology as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry the mapped stream.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Map {
            topology,
            preset,
            input,
            output,
            config,
            lookahead,
            max_swaps,
            placement,
            placement_prefix,
            buffer_all,
        } => map::execute(&map::MapArgs {
            topology: topology.as_deref(),
            preset: preset.as_deref(),
            input: &input,
            output: &output,
            config: config.as_deref(),
            lookahead,
            max_swaps,
            placement,
            placement_prefix,
            buffer_all,
        }),

        Commands::Topology {
            topology: file,
            preset,
            json,
        } => topology::execute(file.as_deref(), preset.as_deref(), json),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
