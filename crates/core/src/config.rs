// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline config: the mapping from `tool_id` to module wiring (spec.md §3, §6).

use crate::error::ConfigError;
use crate::ids::{DataKey, ToolId};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One entry in the config's `tools` map.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// Identifier selecting a `ModuleContract` implementation from the registry.
    pub module: String,
    /// Ordered list of upstream `tool_id`s (or the `main_input` sentinel).
    #[serde(default)]
    pub input_from: Vec<String>,
    /// Output keys that must be retained as pipeline results.
    #[serde(default)]
    pub final_output: HashSet<DataKey>,
    /// Module-specific parameters, opaque to the core, handed to the module constructor.
    #[serde(flatten)]
    pub params: serde_json::Value,
}

/// The environment's available tools/resources, checked against each
/// module's `required_tools()`/`required_resources()` (spec.md §4.2, §4.3
/// `check_requirements`). The original `GAP_system` resolves this from the
/// platform object surrounding `NodeManager`; here it is simply a top-level
/// config section, since the core's contract with that "platform" is just
/// two name sets (see DESIGN.md Open Questions).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tools: HashSet<String>,
    #[serde(default)]
    pub resources: HashSet<String>,
}

/// Top-level pipeline config: `tool_id -> ToolConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tools: HashMap<String, ToolConfig>,
    #[serde(default)]
    pub catalog: Catalog,
}

impl Config {
    /// Load from a YAML or JSON file (selected by extension; YAML is the default
    /// shape used by the reference bioinformatics configs this system targets).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::parse(&text, path.extension().and_then(|e| e.to_str()).unwrap_or("yaml"))
    }

    pub fn parse(text: &str, extension: &str) -> Result<Self, ConfigError> {
        match extension {
            "json" => serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Validate that every `input_from` entry names either `main_input` or
    /// another configured tool, and that the dependency graph (ignoring
    /// `main_input`) is acyclic. This is the cycle-detection the original
    /// implementation never performed (spec.md §9 REDESIGN FLAGS).
    pub fn validate_structure(&self) -> Result<Vec<ToolId>, ConfigError> {
        for (tool_id, cfg) in &self.tools {
            for upstream in &cfg.input_from {
                if upstream == crate::ids::MAIN_INPUT {
                    continue;
                }
                if !self.tools.contains_key(upstream) {
                    return Err(ConfigError::UnknownUpstream(tool_id.clone(), upstream.clone()));
                }
            }
        }
        topo_sort(self)
    }
}

/// Kahn's algorithm over the `input_from` edges, excluding `main_input`.
// in_degree is keyed from config.tools itself, so every lookup below is for a key already inserted.
#[allow(clippy::expect_used)]
fn topo_sort(config: &Config) -> Result<Vec<ToolId>, ConfigError> {
    let mut in_degree: HashMap<&str, usize> = config.tools.keys().map(|k| (k.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (tool_id, cfg) in &config.tools {
        for upstream in &cfg.input_from {
            if upstream == crate::ids::MAIN_INPUT {
                continue;
            }
            *in_degree.get_mut(tool_id.as_str()).expect("tool_id present") += 1;
            dependents.entry(upstream.as_str()).or_default().push(tool_id.as_str());
        }
    }

    let mut ready: Vec<&str> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(k, _)| *k).collect();
    ready.sort_unstable();
    let mut order = Vec::with_capacity(config.tools.len());

    while let Some(node) = ready.pop() {
        order.push(ToolId::new(node));
        if let Some(children) = dependents.get(node) {
            let mut newly_ready = Vec::new();
            for child in children {
                let entry = in_degree.get_mut(child).expect("child present");
                *entry -= 1;
                if *entry == 0 {
                    newly_ready.push(*child);
                }
            }
            newly_ready.sort_unstable();
            ready.extend(newly_ready);
        }
    }

    if order.len() != config.tools.len() {
        let mut remaining: Vec<String> =
            in_degree.into_iter().filter(|(_, d)| *d > 0).map(|(k, _)| k.to_string()).collect();
        remaining.sort();
        return Err(ConfigError::Cycle(remaining));
    }

    Ok(order)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;