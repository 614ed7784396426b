//! One address-map entry.

use ghostbus_elaborate::Element;
use ghostbus_ir::Access;
use serde::{Deserialize, Serialize};

/// Two's-complement interpretation of an entry's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    /// Unsigned.
    Unsigned,
    /// Two's-complement.
    Signed,
}

impl From<bool> for Sign {
    fn from(signed: bool) -> Self {
        if signed {
            Sign::Signed
        } else {
            Sign::Unsigned
        }
    }
}

/// Host-visible description of one register, memory or external range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    /// Host access.
    pub access: Access,
    /// Address width; 0 for a single register.
    pub address_width: u32,
    /// Data width in bits.
    pub data_width: u32,
    /// Signedness.
    pub sign: Sign,
    /// Absolute base address.
    pub base_address: u64,
}

impl MapEntry {
    /// Describes `element` placed at the absolute address `base`.
    ///
    /// Submodules have no entry of their own.
    pub fn for_element(element: &Element, base: u64) -> Option<Self> {
        let (access, address_width, data_width, signed) = match element {
            Element::Register(r) => (r.access, 0, r.data_width, r.signed),
            Element::Memory(m) => (m.access, m.address_width, m.data_width, m.signed),
            Element::External(e) => (e.access, e.address_width, e.data_width, false),
            Element::Submodule(_) => return None,
        };
        Some(Self {
            access,
            address_width,
            data_width,
            sign: signed.into(),
            base_address: base,
        })
    }
}
