//! Mapper configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::placement::{HeuristicPlacement, IdentityPlacement, Placer};
use crate::topology::Topology;

/// Default number of upcoming operations the router looks at.
pub const DEFAULT_LOOKAHEAD_WINDOW: usize = 16;

/// Default number of operations buffered to compute the initial placement.
pub const DEFAULT_PLACEMENT_PREFIX: usize = 4096;

/// Default number of improvement rounds for heuristic placement.
pub const DEFAULT_PLACEMENT_ITERATIONS: usize = 128;

/// Swap budget per routing episode, as a multiple of the topology diameter.
pub const SWAP_BUDGET_FACTOR: usize = 2;

/// How the initial placement is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Interaction-weighted greedy placement refined by local search.
    #[default]
    Heuristic,
    /// Virtual qubit `k` on physical qubit `k`.
    Identity,
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementStrategy::Heuristic => write!(f, "heuristic"),
            PlacementStrategy::Identity => write!(f, "identity"),
        }
    }
}

impl FromStr for PlacementStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heuristic" => Ok(PlacementStrategy::Heuristic),
            "identity" | "trivial" => Ok(PlacementStrategy::Identity),
            other => Err(format!(
                "unknown placement strategy '{other}' (expected heuristic or identity)"
            )),
        }
    }
}

/// Options recognized by the mapping stage.
///
/// Every field has a default, so partial JSON/YAML documents are accepted.
///
/// ```
/// use qmap_route::{MapperConfig, PlacementStrategy};
///
/// let config = MapperConfig::new()
///     .with_lookahead(8)
///     .with_placement(PlacementStrategy::Identity);
/// assert_eq!(config.lookahead_window_size, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MapperConfig {
    /// Upcoming operations considered when choosing a swap.
    pub lookahead_window_size: usize,
    /// Swap budget per routing episode; derived from the topology when unset.
    pub max_swaps_per_routing: Option<usize>,
    /// Initial placement strategy.
    pub initial_placement_strategy: PlacementStrategy,
    /// Operations buffered before placement; `None` reads the whole stream.
    pub placement_prefix: Option<usize>,
    /// Improvement rounds of the heuristic placement's local search.
    pub placement_iterations: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            lookahead_window_size: DEFAULT_LOOKAHEAD_WINDOW,
            max_swaps_per_routing: None,
            initial_placement_strategy: PlacementStrategy::Heuristic,
            placement_prefix: Some(DEFAULT_PLACEMENT_PREFIX),
            placement_iterations: DEFAULT_PLACEMENT_ITERATIONS,
        }
    }
}

impl MapperConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lookahead window size.
    #[must_use]
    pub fn with_lookahead(mut self, size: usize) -> Self {
        self.lookahead_window_size = size;
        self
    }

    /// Set an explicit swap budget per routing episode.
    #[must_use]
    pub fn with_max_swaps(mut self, max_swaps: usize) -> Self {
        self.max_swaps_per_routing = Some(max_swaps);
        self
    }

    /// Set the initial placement strategy.
    #[must_use]
    pub fn with_placement(mut self, strategy: PlacementStrategy) -> Self {
        self.initial_placement_strategy = strategy;
        self
    }

    /// Set how many operations are buffered for placement (`None`: all).
    #[must_use]
    pub fn with_placement_prefix(mut self, prefix: Option<usize>) -> Self {
        self.placement_prefix = prefix;
        self
    }

    /// Set the local search budget of the heuristic placement.
    #[must_use]
    pub fn with_placement_iterations(mut self, iterations: usize) -> Self {
        self.placement_iterations = iterations;
        self
    }

    /// Swap budget for one routing episode on `topology`. Never zero.
    pub fn swap_budget(&self, topology: &Topology) -> usize {
        self.max_swaps_per_routing
            .unwrap_or(topology.diameter() as usize * SWAP_BUDGET_FACTOR)
            .max(1)
    }

    /// The placement algorithm selected by this configuration.
    pub fn placer(&self) -> Box<dyn Placer> {
        match self.initial_placement_strategy {
            PlacementStrategy::Heuristic => {
                Box::new(HeuristicPlacement::new(self.placement_iterations))
            }
            PlacementStrategy::Identity => Box::new(IdentityPlacement),
        }
    }
}
