//! Configuration types deserialized from `ghostbus.toml`.

use serde::Deserialize;

/// Default number of block multipliers tried by loose replication.
pub const DEFAULT_LOOSE_SEARCH_BOUND: u32 = 10;

/// The complete generator configuration.
///
/// Every section is optional; an empty file (or no file at all) yields
/// [`GhostbusConfig::default`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GhostbusConfig {
    /// Address allocation policy.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Generated file locations and descriptor-map flavor.
    #[serde(default)]
    pub output: OutputConfig,
    /// Optional testbench memory-map generation.
    #[serde(default)]
    pub testbench: TestbenchConfig,
}

/// How replicated (generate-loop) instances are laid out.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationMode {
    /// One aligned block, replicas contiguous at stride `2^w`.
    #[default]
    Packed,
    /// Independent first-fit placements that share a constant stride.
    Loose,
}

/// Allocation policy consumed by the replication resolver.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Layout strategy for replicated instances.
    #[serde(default)]
    pub replication: ReplicationMode,
    /// Largest block multiplier tried in [`ReplicationMode::Loose`].
    #[serde(default = "default_search_bound")]
    pub loose_search_bound: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationMode::default(),
            loose_search_bound: DEFAULT_LOOSE_SEARCH_BOUND,
        }
    }
}

fn default_search_bound() -> u32 {
    DEFAULT_LOOSE_SEARCH_BOUND
}

/// Where generated sources go and how the address map is shaped.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving the generated Verilog include files.
    #[serde(default = "default_dir")]
    pub dir: String,
    /// File name of the JSON address map, relative to `dir`.
    #[serde(default = "default_map")]
    pub map: String,
    /// Emit a flat `name -> entry` map instead of a nested one.
    #[serde(default = "default_true")]
    pub flat: bool,
    /// Shorten flat names to their shortest unique suffix.
    #[serde(default = "default_true")]
    pub short: bool,
    /// Replace `.` with `_` in map keys.
    #[serde(default)]
    pub mangle: bool,
    /// Map keys to leave out of the descriptor.
    #[serde(default)]
    pub drops: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            map: default_map(),
            flat: true,
            short: true,
            mangle: false,
            drops: Vec::new(),
        }
    }
}

fn default_dir() -> String {
    "_auto".to_string()
}

fn default_map() -> String {
    "regmap.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Testbench memory-map generation.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TestbenchConfig {
    /// Output file name relative to `output.dir`; `None` disables generation.
    #[serde(default)]
    pub file: Option<String>,
    /// Seed for the random register values written by the testbench.
    #[serde(default)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn replication_mode_variants() {
        for (input, expected) in [
            ("packed", ReplicationMode::Packed),
            ("loose", ReplicationMode::Loose),
        ] {
            let toml = format!("[policy]\nreplication = \"{input}\"\n");
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.policy.replication, expected);
        }
    }

    #[test]
    fn defaults_match_empty_file() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, GhostbusConfig::default());
        assert_eq!(config.policy.loose_search_bound, 10);
        assert_eq!(config.output.dir, "_auto");
        assert!(config.output.flat);
        assert!(config.output.short);
        assert!(!config.output.mangle);
        assert!(config.testbench.file.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[output]\nmangle = true\n").unwrap();
        assert!(config.output.mangle);
        assert_eq!(config.output.map, "regmap.json");
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(load_config_from_str("[policy]\nreplicaton = \"loose\"\n").is_err());
    }
}
