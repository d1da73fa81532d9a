//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use qmap_route::{MapperConfig, Topology};

/// Load a JSON or YAML document, picking the format by extension.
pub fn load_document<T: DeserializeOwned>(path: &str) -> Result<T> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML: {path}")),
        _ => serde_json::from_str(&source).with_context(|| format!("Failed to parse JSON: {path}")),
    }
}

/// Build a topology from a file or a preset name.
pub fn load_topology(file: Option<&str>, preset: Option<&str>) -> Result<Topology> {
    match (file, preset) {
        (Some(path), _) => load_document(path),
        (None, Some(name)) => parse_preset(name),
        (None, None) => anyhow::bail!("No topology given. Use --topology FILE or --preset NAME"),
    }
}

/// Parse a built-in topology such as `linear:5` or `grid:3x4`.
pub fn parse_preset(name: &str) -> Result<Topology> {
    let (kind, size) = name
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Preset '{name}' is missing a size, e.g. linear:5"))?;

    let count = |s: &str| -> Result<u32> {
        s.trim()
            .parse()
            .with_context(|| format!("Invalid qubit count '{s}' in preset '{name}'"))
    };

    let topology = match kind.to_lowercase().as_str() {
        "linear" | "line" => Topology::linear(count(size)?)?,
        "ring" => Topology::ring(count(size)?)?,
        "star" => Topology::star(count(size)?)?,
        "full" => Topology::full(count(size)?)?,
        "grid" => {
            let (rows, cols) = size
                .split_once(['x', 'X'])
                .ok_or_else(|| anyhow::anyhow!("Grid preset needs ROWSxCOLS, got '{size}'"))?;
            Topology::grid(count(rows)?, count(cols)?)?
        }
        other => {
            anyhow::bail!("Unknown preset: '{other}'. Available: linear, ring, star, grid, full");
        }
    };
    Ok(topology)
}

/// Load the mapper configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&str>) -> Result<MapperConfig> {
    match path {
        Some(path) => load_document(path),
        None => Ok(MapperConfig::default()),
    }
}
