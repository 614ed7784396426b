//! Registers and memories: the leaf elements placed in an address space.

use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};

/// Host access permitted to a register or memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Read-only.
    #[serde(rename = "r")]
    Read,
    /// Write-only.
    #[serde(rename = "w")]
    Write,
    /// Read and write.
    #[serde(rename = "rw")]
    ReadWrite,
    /// Not stated by the front-end; decoded as read-only.
    #[default]
    #[serde(rename = "unknown")]
    Unspecified,
}

impl Access {
    /// Descriptor-map spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "r",
            Access::Write => "w",
            Access::ReadWrite => "rw",
            Access::Unspecified => "unknown",
        }
    }

    /// Whether the host may read this element.
    pub fn readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite | Access::Unspecified)
    }

    /// Whether the host may write this element.
    pub fn writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// Which bus transaction a strobe net pulses on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrobeKind {
    /// Pulses for one cycle when the target register is written.
    Write,
    /// Pulses for one cycle when the target register is read.
    Read,
}

/// A single addressable control/status register.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// Net name in the declaring module.
    pub name: Ident,
    /// Data width in bits.
    pub data_width: u32,
    /// Host access.
    pub access: Access,
    /// Value after reset.
    pub initial: u64,
    /// Pinned local address.
    pub address: Option<u64>,
    /// Replacement name in the address map.
    pub alias: Option<Ident>,
    /// Two's-complement value; sign-extended on read.
    pub signed: bool,
    /// The register itself pulses to 1 for one cycle on write.
    pub pulse: bool,
    /// Nets pulsed when this register is written.
    pub write_strobes: Vec<Ident>,
    /// Nets pulsed when this register is read.
    pub read_strobes: Vec<Ident>,
    /// Declared-bus tag.
    pub bus: Option<Ident>,
}

impl Register {
    /// A read/write register with every optional attribute unset.
    pub fn new(name: Ident, data_width: u32) -> Self {
        Self {
            name,
            data_width,
            access: Access::ReadWrite,
            initial: 0,
            address: None,
            alias: None,
            signed: false,
            pulse: false,
            write_strobes: Vec::new(),
            read_strobes: Vec::new(),
            bus: None,
        }
    }

    /// Strobe nets of the given kind.
    pub fn strobes(&self, kind: StrobeKind) -> &[Ident] {
        match kind {
            StrobeKind::Write => &self.write_strobes,
            StrobeKind::Read => &self.read_strobes,
        }
    }
}

/// A RAM-like array mapped as `2^address_width` consecutive words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Array name in the declaring module.
    pub name: Ident,
    /// Word width in bits.
    pub data_width: u32,
    /// Depth as an address width.
    pub address_width: u32,
    /// Host access.
    pub access: Access,
    /// Pinned local base address.
    pub address: Option<u64>,
    /// Replacement name in the address map.
    pub alias: Option<Ident>,
    /// Words are two's-complement.
    pub signed: bool,
    /// Declared-bus tag.
    pub bus: Option<Ident>,
}
