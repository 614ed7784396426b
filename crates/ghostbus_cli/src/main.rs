//! Ghostbus CLI: generates bus decode logic and address maps from a netlist.
//!
//! `ghostbus generate` writes the Verilog include files, the JSON address
//! map and, when configured, a testbench memory map. `ghostbus map` prints
//! the resolved address space of every node.

#![warn(missing_docs)]

mod generate;
mod map;
mod pipeline;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Ghostbus: memory-mapped bus interconnect generator.
#[derive(Parser, Debug)]
#[command(name = "ghostbus", version, about = "Ghostbus interconnect generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a `ghostbus.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate decode logic, port bindings and the address map.
    Generate(GenerateArgs),
    /// Print the resolved address space of every node.
    Map(MapArgs),
}

/// Arguments for `ghostbus generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// JSON netlist produced by the front-end.
    pub netlist: PathBuf,

    /// Output directory (overrides `output.dir`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit a nested address map instead of a flat one.
    #[arg(long)]
    pub nested: bool,

    /// Also write a testbench memory map with this file name.
    #[arg(long)]
    pub testbench: Option<String>,

    /// Seed for the testbench's random register values.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `ghostbus map`.
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// JSON netlist produced by the front-end.
    pub netlist: PathBuf,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug information.
    pub verbose: bool,
    /// Optional path to a configuration file.
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Log level selected by `--quiet` / `--verbose`.
    pub fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, true) => LevelFilter::Debug,
            (false, false) => LevelFilter::Info,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    if let Err(e) = SimpleLogger::new().with_level(global.level()).init() {
        eprintln!("warning: logging unavailable: {e}");
    }

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Map(ref args) => map::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_generate_default() {
        let cli = Cli::parse_from(["ghostbus", "generate", "design.json"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.netlist, PathBuf::from("design.json"));
                assert!(args.out.is_none());
                assert!(!args.nested);
                assert!(args.testbench.is_none());
                assert!(args.seed.is_none());
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_generate_with_args() {
        let cli = Cli::parse_from([
            "ghostbus",
            "generate",
            "design.json",
            "--out",
            "build/_auto",
            "--nested",
            "--testbench",
            "mmap_tb.vh",
            "--seed",
            "42",
        ]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.out.as_deref(), Some(std::path::Path::new("build/_auto")));
                assert!(args.nested);
                assert_eq!(args.testbench.as_deref(), Some("mmap_tb.vh"));
                assert_eq!(args.seed, Some(42));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_map() {
        let cli = Cli::parse_from(["ghostbus", "map", "design.json"]);
        assert!(matches!(cli.command, Command::Map(_)));
    }

    #[test]
    fn global_flags_select_level() {
        let cli = Cli::parse_from(["ghostbus", "--quiet", "map", "d.json"]);
        assert!(cli.quiet);
        let global = GlobalArgs {
            quiet: cli.quiet,
            verbose: cli.verbose,
            config: None,
        };
        assert_eq!(global.level(), LevelFilter::Error);
        let verbose = GlobalArgs {
            quiet: false,
            verbose: true,
            config: None,
        };
        assert_eq!(verbose.level(), LevelFilter::Debug);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["ghostbus", "--config", "/path/to/ghostbus.toml", "map", "d.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/ghostbus.toml")));
    }

    #[test]
    fn netlist_is_required() {
        assert!(Cli::try_parse_from(["ghostbus", "generate"]).is_err());
    }
}
