//! `ghostbus generate`: netlist in, Verilog includes and address map out.
//!
//! 1. Load configuration and apply command-line overrides
//! 2. Lower and resolve the netlist
//! 3. Emit decode, port and binding includes plus `defs.vh`
//! 4. Emit the JSON address map
//! 5. Optionally emit one testbench memory map per bus domain

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use ghostbus_config::GhostbusConfig;
use ghostbus_decode::{generate_sources, testbench_map};
use ghostbus_descriptor::{address_map, write_address_map};

use crate::pipeline::{elaborate, resolve_config, Elaborated};
use crate::{GenerateArgs, GlobalArgs};

/// Runs `ghostbus generate`. Returns exit code 0 on success.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let mut config = resolve_config(global)?;
    apply_overrides(&mut config, args);
    let elaborated = elaborate(&args.netlist, &config)?;
    let out_dir = PathBuf::from(&config.output.dir);
    write_outputs(&elaborated, &config, &out_dir)?;
    if !global.quiet {
        eprintln!("   Generated {}", out_dir.display());
    }
    Ok(0)
}

fn apply_overrides(config: &mut GhostbusConfig, args: &GenerateArgs) {
    if let Some(out) = &args.out {
        config.output.dir = out.display().to_string();
    }
    if args.nested {
        config.output.flat = false;
        config.output.short = false;
    }
    if let Some(file) = &args.testbench {
        config.testbench.file = Some(file.clone());
    }
    if let Some(seed) = args.seed {
        config.testbench.seed = seed;
    }
}

/// Writes every generated artifact for `elaborated` into `out_dir`.
pub fn write_outputs(
    elaborated: &Elaborated,
    config: &GhostbusConfig,
    out_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let Elaborated { interner, hierarchy } = elaborated;

    let files = generate_sources(hierarchy, interner)?;
    files.write_to(out_dir)?;

    let map = address_map(hierarchy, interner, &config.output)?;
    write_address_map(&map, &out_dir.join(&config.output.map))?;

    if let Some(file) = &config.testbench.file {
        for (id, domain) in hierarchy.domains.iter() {
            let name = if hierarchy.is_multi_domain() {
                suffixed(file, domain.label(interner))
            } else {
                file.clone()
            };
            let text = testbench_map(hierarchy, interner, id, config.testbench.seed);
            fs::write(out_dir.join(&name), text)?;
        }
    }
    log::info!("wrote {} files to {}", files.len(), out_dir.display());
    Ok(())
}

/// `name.ext` → `name_suffix.ext`.
fn suffixed(file: &str, suffix: &str) -> String {
    match file.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{file}_{suffix}"),
    }
}
