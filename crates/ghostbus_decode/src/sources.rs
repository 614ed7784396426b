//! The complete set of generated Verilog include files.

use std::fs;
use std::path::Path;

use ghostbus_common::Interner;
use ghostbus_elaborate::Hierarchy;

use crate::error::DecodeError;
use crate::level::LevelDecoder;
use crate::ports::{port_binding, port_declarations};
use crate::signals::BusSignals;

/// Name of the file collecting one `define` per generated include.
pub const DEFS_FILE: &str = "defs.vh";

/// Generated files in emission order, each name present once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    files: Vec<(String, String)>,
}

impl GeneratedFiles {
    /// Text of the file called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }

    /// `(name, text)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file was generated.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Adds a file. Re-adding an identical file is a no-op; `conflict`
    /// describes the clash when the text differs.
    fn insert(
        &mut self,
        name: String,
        text: String,
        conflict: impl FnOnce() -> String,
    ) -> Result<(), DecodeError> {
        match self.files.iter().find(|(n, _)| *n == name) {
            Some((_, existing)) if *existing == text => Ok(()),
            Some(_) => Err(DecodeError::FeatureUnsupported(conflict())),
            None => {
                self.files.push((name, text));
                Ok(())
            }
        }
    }

    /// Writes every file into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<(), DecodeError> {
        let io_error = |path: &Path| {
            let path = path.display().to_string();
            move |source| DecodeError::Io { path, source }
        };
        fs::create_dir_all(dir).map_err(io_error(dir))?;
        for (name, text) in &self.files {
            let path = dir.join(name);
            fs::write(&path, text).map_err(io_error(&path))?;
            log::debug!("wrote {}", path.display());
        }
        Ok(())
    }
}

/// Emits decode, port and binding files for every domain of `hierarchy`.
pub fn generate_sources(hierarchy: &Hierarchy, interner: &Interner) -> Result<GeneratedFiles, DecodeError> {
    let mut files = GeneratedFiles::default();
    let mut owners: Vec<(String, String)> = Vec::new();
    for (domain_id, domain) in hierarchy.domains.iter() {
        let bus = BusSignals::new(domain, interner, hierarchy.is_multi_domain());
        let sfx = &bus.suffix;
        let nodes = hierarchy.domain_nodes(domain_id);
        if nodes.len() > 1 {
            files.insert(format!("ghostbus_ports{sfx}.vh"), port_declarations(&bus), || {
                format!("bus ports for '{}' declared twice", domain.label(interner))
            })?;
        }
        for id in nodes {
            let node = hierarchy.node(id);
            let module = interner.resolve(node.module_name);
            let name = format!("ghostbus_{module}{sfx}.vh");
            let text = LevelDecoder::new(hierarchy, interner, &bus, id).decode()?;
            let path = node.path_name();
            let first = owners
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, p)| p.clone());
            files.insert(name.clone(), text, || {
                format!(
                    "instances of module '{module}' decode differently ({} and {path}); \
                     every instance of a module must have the same memory map",
                    first.as_deref().unwrap_or("?")
                )
            })?;
            if first.is_none() {
                owners.push((name, path));
            }
            for child in hierarchy.children(id) {
                let inst = interner.resolve(hierarchy.node(child).instance);
                let binding = port_binding(hierarchy, interner, &bus, child)?;
                files.insert(format!("ghostbus_{module}_{inst}{sfx}.vh"), binding, || {
                    format!("instance '{inst}' of module '{module}' binds its bus differently across instances")
                })?;
            }
        }
    }

    let defs: String = files
        .iter()
        .map(|(name, _)| {
            let stem = name.trim_end_matches(".vh").trim_start_matches("ghostbus_");
            format!("`define GHOSTBUS_{stem} `include \"{name}\"\n")
        })
        .collect();
    files.insert(DEFS_FILE.to_string(), defs, || format!("{DEFS_FILE} generated twice"))?;
    log::info!("generated {} Verilog include files", files.len());
    Ok(files)
}
