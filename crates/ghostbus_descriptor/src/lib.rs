//! JSON address-map descriptors for resolved ghostbus hierarchies.
//!
//! Two flavors are produced from the same tree:
//!
//! - **flat**: one object keyed by dotted hierarchy path (or alias),
//!   optionally shortened to each key's shortest unique suffix;
//! - **nested**: `{regs, modules, instanceof}` objects mirroring the
//!   instance tree.
//!
//! Both can have `.` mangled to `_` in their keys. A key produced twice is a
//! [`DescriptorError::NameCollision`], never a silent overwrite.

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod flat;
pub mod nested;
pub mod shorten;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ghostbus_common::Interner;
use ghostbus_config::OutputConfig;
use ghostbus_elaborate::Hierarchy;

pub use entry::{MapEntry, Sign};
pub use error::DescriptorError;
pub use flat::flat_map;
pub use nested::{nested_map, NestedMap};
pub use shorten::{mangle, shorten, shortest_unique};

impl NestedMap {
    /// This map with `.` replaced by `_` in every key, recursively.
    pub fn mangled(self) -> Result<Self, DescriptorError> {
        let modules = mangle(self.modules)?
            .into_iter()
            .map(|(k, v)| Ok((k, v.mangled()?)))
            .collect::<Result<_, DescriptorError>>()?;
        Ok(Self {
            regs: mangle(self.regs)?,
            modules,
            instanceof: self.instanceof,
        })
    }
}

/// Builds the address map selected by `output` as a JSON value.
///
/// Nested maps of multi-domain designs are keyed by bus name.
pub fn address_map(
    hierarchy: &Hierarchy,
    interner: &Interner,
    output: &OutputConfig,
) -> Result<serde_json::Value, DescriptorError> {
    if output.flat {
        let mut map = flat_map(hierarchy, interner, &output.drops)?;
        if output.short {
            map = shorten(map);
        }
        if output.mangle {
            map = mangle(map)?;
        }
        log::info!("flat address map with {} entries", map.len());
        return Ok(serde_json::to_value(map)?);
    }

    let mut roots = BTreeMap::new();
    for (_, domain) in hierarchy.domains.iter() {
        let mut map = nested_map(hierarchy, interner, domain.root, &output.drops)?;
        if output.mangle {
            map = map.mangled()?;
        }
        roots.insert(domain.label(interner).to_string(), map);
    }
    if roots.len() == 1 {
        if let Some((_, only)) = roots.pop_first() {
            return Ok(serde_json::to_value(only)?);
        }
    }
    Ok(serde_json::to_value(roots)?)
}

/// Writes `map` as pretty-printed JSON.
pub fn write_address_map(map: &serde_json::Value, path: &Path) -> Result<(), DescriptorError> {
    let mut text = serde_json::to_string_pretty(map)?;
    text.push('\n');
    fs::write(path, text).map_err(|source| DescriptorError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostbus_config::PolicyConfig;
    use ghostbus_elaborate::HierarchyBuilder;
    use ghostbus_ir::{lower, parse_netlist};
    use serde_json::json;

    const BUS: &str = r#"{"clk": "clk", "addr": "addr", "dout": "wdata", "din": "rdata", "we": "we"}"#;

    fn hierarchy(text: &str) -> (Hierarchy, Interner) {
        let interner = Interner::new();
        let design = lower(&parse_netlist(text).unwrap(), &interner).unwrap();
        let h = HierarchyBuilder::new(&design, &interner, &PolicyConfig::default())
            .build()
            .unwrap();
        (h, interner)
    }

    fn design(leaf_nets: &str) -> String {
        format!(
            r#"{{"top": "top", "modules": [
                {{"name": "top",
                  "buses": [{{"nets": {BUS}, "address_width": 10, "data_width": 32, "base": 4096}}],
                  "nets": [{{"name": "ctrl", "width": 8}}],
                  "instances": [{{"name": "u_a", "module": "leaf"}}, {{"name": "u_b", "module": "leaf"}}]}},
                {{"name": "leaf", "nets": [{leaf_nets}]}}]}}"#
        )
    }

    fn output(flat: bool, short: bool, mangle: bool) -> OutputConfig {
        OutputConfig {
            flat,
            short,
            mangle,
            ..OutputConfig::default()
        }
    }

    #[test]
    fn flat_keys_are_trimmed_paths() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16, "signed": true}"#));
        let map = address_map(&h, &interner, &output(true, false, false)).unwrap();
        let obj = map.as_object().unwrap();
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        // "top" is common to every register-bearing instance.
        assert_eq!(keys, ["ctrl", "u_a.gain", "u_b.gain"]);
        assert_eq!(map["ctrl"]["base_address"], json!(4096));
        assert_eq!(map["u_a.gain"]["sign"], json!("signed"));
        assert_eq!(map["u_a.gain"]["access"], json!("rw"));
    }

    #[test]
    fn flat_keys_shortened_and_mangled() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16}"#));
        let map = address_map(&h, &interner, &output(true, true, false)).unwrap();
        let keys: Vec<&str> = map.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["ctrl", "u_a.gain", "u_b.gain"]);
        let map = address_map(&h, &interner, &output(true, true, true)).unwrap();
        assert!(map.get("u_a_gain").is_some());
    }

    #[test]
    fn drops_remove_entries() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16}"#));
        let out = OutputConfig {
            short: false,
            drops: vec!["u_b.gain".to_string()],
            ..OutputConfig::default()
        };
        let map = address_map(&h, &interner, &out).unwrap();
        assert!(map.get("u_a.gain").is_some());
        assert!(map.get("u_b.gain").is_none());
    }

    #[test]
    fn alias_in_repeated_module_collides() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16, "alias": "GAIN"}"#));
        let err = address_map(&h, &interner, &output(true, true, false)).unwrap_err();
        match err {
            DescriptorError::NameCollision { keys } => assert_eq!(keys, ["GAIN"]),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn nested_mirrors_instances() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16}"#));
        let map = address_map(&h, &interner, &output(false, false, false)).unwrap();
        assert_eq!(map["instanceof"], json!("top"));
        assert!(map["regs"].get("ctrl").is_some());
        assert_eq!(map["modules"]["u_a"]["instanceof"], json!("leaf"));
        let a = &map["modules"]["u_a"]["regs"]["gain"]["base_address"];
        let b = &map["modules"]["u_b"]["regs"]["gain"]["base_address"];
        assert_ne!(a, b);
    }

    #[test]
    fn nested_replicas_keyed_by_relative_path() {
        let text = format!(
            r#"{{"top": "top", "modules": [
                {{"name": "top",
                  "buses": [{{"nets": {BUS}, "address_width": 8, "data_width": 32}}],
                  "instances": [{{"name": "u_ch", "module": "leaf",
                    "generate": {{"label": "gen_ch", "index": "i", "init": "0", "op": "<",
                                 "limit": "2", "step": "+1"}}}}]}},
                {{"name": "leaf", "nets": [{{"name": "gain", "width": 8}}]}}]}}"#
        );
        let (h, interner) = hierarchy(&text);
        let map = address_map(&h, &interner, &output(false, false, false)).unwrap();
        assert!(map["modules"].get("gen_ch_0.u_ch").is_some());
        assert!(map["modules"].get("gen_ch_1.u_ch").is_some());
        let map = address_map(&h, &interner, &output(false, false, true)).unwrap();
        assert!(map["modules"].get("gen_ch_1_u_ch").is_some());
    }

    #[test]
    fn writes_pretty_json() {
        let (h, interner) = hierarchy(&design(r#"{"name": "gain", "width": 16}"#));
        let map = address_map(&h, &interner, &OutputConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regmap.json");
        write_address_map(&map, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
        assert!(text.ends_with("}\n"));
    }
}
