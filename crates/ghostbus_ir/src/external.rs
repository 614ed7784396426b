//! External modules: address ranges delegated to an opaque bus-shaped instance.

use crate::bus::BusNets;
use crate::register::Access;
use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};

/// A leaf whose address range is decoded by hand-written logic.
///
/// The generator only drives the external instance's bus nets (address,
/// write data, qualified enables) and routes its read data back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalModule {
    /// Name used in the address map and generated wires.
    pub name: Ident,
    /// The external instance's own role→net binding.
    pub nets: BusNets,
    /// Address width consumed by the instance.
    pub address_width: u32,
    /// Data width of the instance.
    pub data_width: u32,
    /// Host access.
    pub access: Access,
    /// Pinned local base address.
    pub address: Option<u64>,
    /// Replacement name in the address map.
    pub alias: Option<Ident>,
    /// Declared-bus tag.
    pub bus: Option<Ident>,
}
