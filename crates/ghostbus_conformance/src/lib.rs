//! Conformance test helpers for the ghostbus generator.
//!
//! Runs JSON netlist text through the full pipeline (lower → build →
//! decode → describe) and returns every product for assertion in the
//! integration tests under `tests/`.

#![warn(missing_docs)]

use ghostbus_common::Interner;
use ghostbus_config::{ConfigError, GhostbusConfig};
use ghostbus_decode::{generate_sources, DecodeError, GeneratedFiles};
use ghostbus_descriptor::{address_map, DescriptorError};
use ghostbus_elaborate::{build_hierarchy, BuildError, Hierarchy, Node};
use ghostbus_ir::{lower, parse_netlist, IrError, NodeId};

/// The standard local bus used by most fixtures.
pub const LB_BUS: &str = r#"{"clk": "lb_clk", "addr": "lb_addr", "dout": "lb_wdata",
                            "din": "lb_rdata", "we": "lb_write", "re": "lb_re"}"#;

/// Any failure along the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed or inconsistent netlist.
    #[error(transparent)]
    Ir(#[from] IrError),
    /// Allocation or hierarchy failure.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Decode emission failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Address map failure.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// Everything one run produces.
pub struct PipelineResult {
    /// Interned names.
    pub interner: Interner,
    /// The resolved hierarchy.
    pub hierarchy: Hierarchy,
    /// Generated Verilog includes.
    pub files: GeneratedFiles,
    /// The JSON address map.
    pub map: serde_json::Value,
}

impl PipelineResult {
    /// The live node with dotted path `path`.
    pub fn node(&self, path: &str) -> Option<&Node> {
        node_by_path(&self.hierarchy, path).map(|id| self.hierarchy.node(id))
    }

    /// Text of a generated include.
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name)
    }
}

/// Parses `ghostbus.toml` text.
pub fn make_config(toml_text: &str) -> Result<GhostbusConfig, ConfigError> {
    ghostbus_config::load_config_from_str(toml_text)
}

/// Lowers and resolves `netlist` without emitting anything.
pub fn elaborate(netlist: &str, config: &GhostbusConfig) -> Result<(Hierarchy, Interner), PipelineError> {
    let interner = Interner::new();
    let design = lower(&parse_netlist(netlist)?, &interner)?;
    let hierarchy = build_hierarchy(&design, &interner, config)?;
    Ok((hierarchy, interner))
}

/// Runs the full pipeline on `netlist`.
pub fn full_pipeline(netlist: &str, config: &GhostbusConfig) -> Result<PipelineResult, PipelineError> {
    let (hierarchy, interner) = elaborate(netlist, config)?;
    let files = generate_sources(&hierarchy, &interner)?;
    let map = address_map(&hierarchy, &interner, &config.output)?;
    Ok(PipelineResult {
        interner,
        hierarchy,
        files,
        map,
    })
}

/// Runs the full pipeline with the default configuration.
pub fn default_pipeline(netlist: &str) -> Result<PipelineResult, PipelineError> {
    full_pipeline(netlist, &GhostbusConfig::default())
}

/// Finds the live node whose dotted path is `path`.
pub fn node_by_path(hierarchy: &Hierarchy, path: &str) -> Option<NodeId> {
    hierarchy
        .nodes
        .iter()
        .find(|(_, n)| !n.pruned && n.path_name() == path)
        .map(|(id, _)| id)
}

/// A single-module netlist declaring one bus plus `body` fields.
pub fn single_module(aw: u32, dw: u32, body: &str) -> String {
    format!(
        r#"{{"top": "top", "modules": [{{"name": "top",
            "buses": [{{"nets": {LB_BUS}, "address_width": {aw}, "data_width": {dw}}}],
            {body}}}]}}"#
    )
}
