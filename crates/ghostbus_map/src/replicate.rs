//! Constant-stride placement of generate-loop replicas.

use crate::error::MapError;
use crate::range::{AddressRange, Interval};
use crate::space::AddressSpace;
use ghostbus_common::{bits, width_of};
use ghostbus_config::{PolicyConfig, ReplicationMode};

/// Where the replicas of one group landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Replica bases in iteration order.
    pub bases: Vec<u64>,
    /// Address width occupied by each replica.
    pub width: u32,
    /// Distance between consecutive bases.
    pub stride: u64,
    /// The enclosing aligned block for packed groups.
    pub block: Option<AddressRange>,
}

impl Placement {
    /// A lone, non-replicated entry.
    pub fn single(base: u64, width: u32) -> Self {
        Self {
            bases: vec![base],
            width,
            stride: 1u64 << width,
            block: None,
        }
    }

    /// Base of the first replica.
    pub fn base(&self) -> u64 {
        self.bases.first().copied().unwrap_or(0)
    }

    /// Number of replicas.
    pub fn count(&self) -> usize {
        self.bases.len()
    }

    /// Addresses from the first replica to the end of the last.
    pub fn span(&self) -> Interval {
        let start = self.base();
        let end = self.bases.last().map_or(start, |b| b + (1u64 << self.width));
        Interval::new(start, end)
    }
}

/// Lays out replica groups according to the configured [`ReplicationMode`].
#[derive(Debug, Clone, Copy)]
pub struct ReplicationResolver {
    mode: ReplicationMode,
    search_bound: u32,
}

impl Default for ReplicationResolver {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

impl ReplicationResolver {
    /// Creates a resolver from the allocation policy.
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            mode: policy.replication,
            search_bound: policy.loose_search_bound,
        }
    }

    /// The layout strategy in use.
    pub fn mode(&self) -> ReplicationMode {
        self.mode
    }

    /// Places one replica per payload, each `2^width` addresses, at a
    /// constant stride. `start` pins the first replica (packed: the block).
    ///
    /// On error the space is left unchanged.
    pub fn place<P: Clone>(
        &self,
        space: &mut AddressSpace<P>,
        width: u32,
        payloads: Vec<P>,
        start: Option<u64>,
    ) -> Result<Placement, MapError> {
        if payloads.is_empty() {
            return Ok(Placement {
                bases: Vec::new(),
                width,
                stride: 1u64 << width.min(63),
                block: None,
            });
        }
        match (self.mode, start) {
            (ReplicationMode::Packed, _) => place_packed(space, width, payloads, start),
            (ReplicationMode::Loose, Some(start)) => place_at_stride(space, width, payloads, start),
            (ReplicationMode::Loose, None) => self.search_loose(space, width, payloads),
        }
    }

    fn search_loose<P: Clone>(
        &self,
        space: &mut AddressSpace<P>,
        width: u32,
        payloads: Vec<P>,
    ) -> Result<Placement, MapError> {
        let size = element_size(space, width)?;
        let mut tried = None;
        for multiplier in 1..=u64::from(self.search_bound) {
            let Some(trial_size) = size.checked_mul(multiplier) else {
                break;
            };
            let trial_width = width_of(trial_size);
            if tried == Some(trial_width) {
                continue;
            }
            tried = Some(trial_width);
            let mut trial = space.clone();
            let mut bases = Vec::with_capacity(payloads.len());
            for payload in &payloads {
                match trial.add(trial_width, payload.clone(), None) {
                    Ok(base) => bases.push(base),
                    Err(_) => break,
                }
            }
            if bases.len() != payloads.len() {
                continue;
            }
            if let Some(stride) = constant_stride(&bases, trial_width) {
                log::debug!(
                    "{}: {} replicas at stride {stride:#x} (multiplier {multiplier})",
                    space.label(),
                    bases.len()
                );
                *space = trial;
                return Ok(Placement {
                    bases,
                    width: trial_width,
                    stride,
                    block: None,
                });
            }
        }
        Err(MapError::UnresolvedLoopBound {
            label: space.label().to_string(),
            count: payloads.len(),
            width,
            bound: self.search_bound,
        })
    }
}

fn element_size<P>(space: &AddressSpace<P>, width: u32) -> Result<u64, MapError> {
    1u64.checked_shl(width).ok_or_else(|| MapError::OutOfBounds {
        label: space.label().to_string(),
        base: 0,
        size: u64::MAX,
        top: space.top(),
    })
}

fn no_room<P>(space: &AddressSpace<P>, width: u32) -> MapError {
    MapError::NoRoom {
        label: space.label().to_string(),
        width,
        top: space.top(),
    }
}

fn place_packed<P>(
    space: &mut AddressSpace<P>,
    width: u32,
    payloads: Vec<P>,
    start: Option<u64>,
) -> Result<Placement, MapError> {
    let size = element_size(space, width)?;
    let count = payloads.len() as u64;
    let total = count
        .checked_mul(size)
        .ok_or_else(|| no_room(space, width))?;
    let block_width = width_of(total);
    let block_base = match start {
        Some(start) => start,
        None => space
            .first_fit(block_width)
            .ok_or_else(|| no_room(space, block_width))?,
    };
    space.vet(block_base, block_width)?;
    let mut bases = Vec::with_capacity(payloads.len());
    for (i, payload) in payloads.into_iter().enumerate() {
        let base = block_base + i as u64 * size;
        bases.push(space.add(width, payload, Some(base))?);
    }
    let block = AddressRange::new(block_base, block_width);
    let mut cursor = block_base + total;
    while cursor < block.end() {
        let chunk = cursor.trailing_zeros().min(bits(block.end() - cursor) - 1);
        space.keepout(cursor, chunk)?;
        cursor += 1u64 << chunk;
    }
    Ok(Placement {
        bases,
        width,
        stride: size,
        block: Some(block),
    })
}

fn place_at_stride<P>(
    space: &mut AddressSpace<P>,
    width: u32,
    payloads: Vec<P>,
    start: u64,
) -> Result<Placement, MapError> {
    let size = element_size(space, width)?;
    let bases: Vec<u64> = (0..payloads.len() as u64)
        .map(|i| {
            i.checked_mul(size)
                .and_then(|offset| start.checked_add(offset))
                .ok_or_else(|| no_room(space, width))
        })
        .collect::<Result<_, _>>()?;
    for &base in &bases {
        space.vet(base, width)?;
    }
    for (&base, payload) in bases.iter().zip(payloads) {
        space.add(width, payload, Some(base))?;
    }
    Ok(Placement {
        bases,
        width,
        stride: size,
        block: None,
    })
}

/// The common difference of `bases`, if there is one.
fn constant_stride(bases: &[u64], width: u32) -> Option<u64> {
    match bases {
        [] | [_] => Some(1u64 << width),
        [first, second, ..] => {
            let stride = second.checked_sub(*first)?;
            bases
                .windows(2)
                .all(|w| w[1].checked_sub(w[0]) == Some(stride))
                .then_some(stride)
        }
    }
}
