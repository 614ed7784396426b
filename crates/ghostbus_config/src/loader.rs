//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::GhostbusConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "ghostbus.toml";

/// Loads `<project_dir>/ghostbus.toml`, falling back to defaults when absent.
pub fn load_config(project_dir: &Path) -> Result<GhostbusConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(GhostbusConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<GhostbusConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<GhostbusConfig, ConfigError> {
    let config: GhostbusConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GhostbusConfig) -> Result<(), ConfigError> {
    if config.policy.loose_search_bound == 0 {
        return Err(ConfigError::ValidationError(
            "policy.loose_search_bound must be at least 1".to_string(),
        ));
    }
    if config.output.map.is_empty() {
        return Err(ConfigError::MissingField("output.map".to_string()));
    }
    if config.output.short && !config.output.flat {
        return Err(ConfigError::ValidationError(
            "output.short requires output.flat".to_string(),
        ));
    }
    if let Some(file) = &config.testbench.file {
        if file.is_empty() {
            return Err(ConfigError::MissingField("testbench.file".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReplicationMode;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[policy]
replication = "loose"
loose_search_bound = 4

[output]
dir = "build/gb"
map = "mmap.json"
flat = true
short = false
mangle = true
drops = ["scratch", "debug.counter"]

[testbench]
file = "mmap_tb.vh"
seed = 1234
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.policy.replication, ReplicationMode::Loose);
        assert_eq!(config.policy.loose_search_bound, 4);
        assert_eq!(config.output.dir, "build/gb");
        assert_eq!(config.output.drops.len(), 2);
        assert_eq!(config.testbench.file.as_deref(), Some("mmap_tb.vh"));
        assert_eq!(config.testbench.seed, 1234);
    }

    #[test]
    fn zero_search_bound_errors() {
        let err = load_config_from_str("[policy]\nloose_search_bound = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_map_name_errors() {
        let err = load_config_from_str("[output]\nmap = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn short_without_flat_errors() {
        let err = load_config_from_str("[output]\nflat = false\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(load_config_from_str("[output]\nflat = false\nshort = false\n").is_ok());
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("[policy\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, GhostbusConfig::default());
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[policy]\nreplication = \"loose\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.policy.replication, ReplicationMode::Loose);
    }
}
