//! Verilog decode synthesis for resolved ghostbus hierarchies.
//!
//! Every resolved node becomes one include file of decode logic for its
//! module; every parent/child edge becomes one port-binding include; a
//! `defs.vh` wraps each include in a `` `define ``. Modules below a bus top
//! receive the bus through the shared port-declaration include.

#![warn(missing_docs)]

pub mod error;
pub mod level;
pub mod ports;
pub mod signals;
pub mod sources;
pub mod testbench;
pub mod writer;

pub use error::DecodeError;
pub use level::LevelDecoder;
pub use ports::{port_binding, port_declarations, position_expr};
pub use signals::BusSignals;
pub use sources::{generate_sources, GeneratedFiles, DEFS_FILE};
pub use testbench::testbench_map;
pub use writer::VerilogWriter;
