//! Bus declarations: the canonical role→net map of a memory-mapped bus.

use ghostbus_common::Ident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The role a net plays on a bus.
///
/// Directions are from the bus host's point of view: `dout` carries write
/// data out to the register file, `din` carries read data back in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusRole {
    /// Bus clock.
    Clk,
    /// Address.
    Addr,
    /// Write data.
    Dout,
    /// Read data.
    Din,
    /// Write enable.
    We,
    /// Write strobe (may share a net with `we`).
    Wstb,
    /// Read enable.
    Re,
    /// Read strobe (may share a net with `re`).
    Rstb,
}

impl BusRole {
    /// Every role, in declaration order.
    pub const ALL: [BusRole; 8] = [
        BusRole::Clk,
        BusRole::Addr,
        BusRole::Dout,
        BusRole::Din,
        BusRole::We,
        BusRole::Wstb,
        BusRole::Re,
        BusRole::Rstb,
    ];

    /// Lowercase role name as written in netlists.
    pub fn as_str(self) -> &'static str {
        match self {
            BusRole::Clk => "clk",
            BusRole::Addr => "addr",
            BusRole::Dout => "dout",
            BusRole::Din => "din",
            BusRole::We => "we",
            BusRole::Wstb => "wstb",
            BusRole::Re => "re",
            BusRole::Rstb => "rstb",
        }
    }

    /// Roles every bus binding must provide.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            BusRole::Clk | BusRole::Addr | BusRole::Dout | BusRole::Din | BusRole::We
        )
    }
}

impl fmt::Display for BusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net names bound to each bus role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusNets {
    /// Clock net.
    pub clk: Ident,
    /// Address net.
    pub addr: Ident,
    /// Write data net.
    pub dout: Ident,
    /// Read data net.
    pub din: Ident,
    /// Write enable net.
    pub we: Ident,
    /// Optional write strobe net.
    pub wstb: Option<Ident>,
    /// Optional read enable net.
    pub re: Option<Ident>,
    /// Optional read strobe net.
    pub rstb: Option<Ident>,
}

impl BusNets {
    /// Builds a binding from a role map, returning the first missing
    /// required role on failure.
    pub fn from_roles(roles: &BTreeMap<BusRole, Ident>) -> Result<Self, BusRole> {
        let required = |role: BusRole| roles.get(&role).copied().ok_or(role);
        Ok(Self {
            clk: required(BusRole::Clk)?,
            addr: required(BusRole::Addr)?,
            dout: required(BusRole::Dout)?,
            din: required(BusRole::Din)?,
            we: required(BusRole::We)?,
            wstb: roles.get(&BusRole::Wstb).copied(),
            re: roles.get(&BusRole::Re).copied(),
            rstb: roles.get(&BusRole::Rstb).copied(),
        })
    }

    /// Net bound to `role`, if any.
    pub fn net(&self, role: BusRole) -> Option<Ident> {
        match role {
            BusRole::Clk => Some(self.clk),
            BusRole::Addr => Some(self.addr),
            BusRole::Dout => Some(self.dout),
            BusRole::Din => Some(self.din),
            BusRole::We => Some(self.we),
            BusRole::Wstb => self.wstb,
            BusRole::Re => self.re,
            BusRole::Rstb => self.rstb,
        }
    }

    /// A write strobe that is not simply the write-enable net.
    pub fn distinct_wstb(&self) -> Option<Ident> {
        self.wstb.filter(|&net| net != self.we)
    }

    /// A read strobe that is not simply the read-enable net.
    pub fn distinct_rstb(&self) -> Option<Ident> {
        self.rstb.filter(|&net| Some(net) != self.re)
    }

    /// Bound `(role, net)` pairs in role order, each net listed once.
    pub fn bound(&self) -> Vec<(BusRole, Ident)> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for role in BusRole::ALL {
            if let Some(net) = self.net(role) {
                if !seen.contains(&net) {
                    seen.push(net);
                    out.push((role, net));
                }
            }
        }
        out
    }
}

/// A declared memory-mapped bus.
///
/// Address and data width are fixed for the whole bus; every element attached
/// to it must fit within them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    /// Bus name; `None` for the single anonymous bus of a module.
    pub name: Option<Ident>,
    /// Role→net binding.
    pub nets: BusNets,
    /// Address width in bits.
    pub address_width: u32,
    /// Data width in bits.
    pub data_width: u32,
    /// Absolute address of local address zero.
    pub base: u64,
}
