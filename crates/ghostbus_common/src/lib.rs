//! Shared foundational types used across the ghostbus interconnect generator.
//!
//! This crate provides interned identifiers, the internal error type used for
//! invariant violations, and the power-of-two width arithmetic every address
//! allocation is built on.

#![warn(missing_docs)]

pub mod bits;
pub mod ident;
pub mod result;

pub use bits::{align_up, bits, ceil_po2, is_aligned, width_of, MAX_ADDRESS_WIDTH};
pub use ident::{Ident, Interner};
pub use result::{GbResult, InternalError};
