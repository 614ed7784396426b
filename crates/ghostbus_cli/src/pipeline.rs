//! Shared pipeline steps for CLI commands: configuration lookup and
//! netlist → resolved hierarchy.

use std::error::Error;
use std::path::Path;

use ghostbus_common::Interner;
use ghostbus_config::GhostbusConfig;
use ghostbus_elaborate::Hierarchy;

use crate::GlobalArgs;

/// A resolved hierarchy together with the interner its names live in.
pub struct Elaborated {
    /// Interned names.
    pub interner: Interner,
    /// The resolved, absolutely addressed tree.
    pub hierarchy: Hierarchy,
}

/// Loads `--config` when given, else `ghostbus.toml` from the current
/// directory, else defaults.
pub fn resolve_config(global: &GlobalArgs) -> Result<GhostbusConfig, Box<dyn Error>> {
    let config = match &global.config {
        Some(path) => ghostbus_config::load_config_file(path)?,
        None => ghostbus_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// Reads, lowers and resolves a JSON netlist.
pub fn elaborate(netlist: &Path, config: &GhostbusConfig) -> Result<Elaborated, Box<dyn Error>> {
    let interner = Interner::new();
    let file = ghostbus_ir::load_netlist(netlist)?;
    let design = ghostbus_ir::lower(&file, &interner)?;
    log::info!(
        "loaded {} modules from {}",
        design.module_count(),
        netlist.display()
    );
    let hierarchy = ghostbus_elaborate::build_hierarchy(&design, &interner, config)?;
    Ok(Elaborated { interner, hierarchy })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    pub(crate) const NETLIST: &str = r#"{"top": "top", "modules": [
        {"name": "top",
         "buses": [{"nets": {"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata",
                             "we": "we"}, "address_width": 8, "data_width": 32}],
         "nets": [{"name": "ctrl", "width": 8}],
         "instances": [{"name": "u_a", "module": "leaf"}]},
        {"name": "leaf", "nets": [{"name": "gain", "width": 16}]}]}"#;

    #[test]
    fn explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[policy]\nreplication = \"loose\"\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(path),
        };
        let config = resolve_config(&global).unwrap();
        assert_eq!(config.policy.replication, ghostbus_config::ReplicationMode::Loose);
    }

    #[test]
    fn elaborates_netlist_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        fs::write(&path, NETLIST).unwrap();
        let e = elaborate(&path, &GhostbusConfig::default()).unwrap();
        assert_eq!(e.hierarchy.domains.len(), 1);
        assert_eq!(e.hierarchy.nodes.len(), 2);
    }

    #[test]
    fn missing_netlist_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = elaborate(&dir.path().join("nope.json"), &GhostbusConfig::default());
        assert!(result.is_err());
    }
}
