//! The rack: a fixed-order registry of modules, dispatched once per tick.
//!
//! Modules are bound in ascending [`ModuleKind::rack_rank`]. A module sees the
//! current-tick output of anything bound before it and the previous-tick output
//! of anything bound after it.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::cell::Cells;
use crate::error::RackError;
use crate::types::{Module, ModuleKind};

pub const RACK_CAPACITY: usize = 16;

/// Position of a module in the rack, assigned at bind time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RackSlot(u8);

impl RackSlot {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
pub struct Rack {
    slots: ArrayVec<Box<dyn Module>, RACK_CAPACITY>,
    last_rank: Option<u8>,
}

impl Rack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module at the next slot.
    ///
    /// Fails when the rack is full, when the module is an engine stage rather
    /// than a rack module, or when its category ranks below one already bound.
    pub fn bind(&mut self, module: Box<dyn Module>) -> Result<RackSlot, RackError> {
        let kind = module.kind();
        let rank = kind.rack_rank().ok_or(RackError::NotRackModule(kind))?;

        if let Some(last) = self.last_rank {
            if rank < last {
                let after = self.slots.last().map(|m| m.kind()).unwrap_or(kind);
                return Err(RackError::OutOfOrder { kind, after });
            }
        }

        let slot = RackSlot(self.slots.len() as u8);
        self.slots
            .try_push(module)
            .map_err(|_| RackError::Full {
                capacity: RACK_CAPACITY,
            })?;
        self.last_rank = Some(rank);
        Ok(slot)
    }

    /// Run every bound module once, in bind order.
    pub fn process(&mut self, cells: &Cells) {
        for module in self.slots.iter_mut() {
            module.process(cells);
        }
    }

    pub fn reset_all(&mut self) {
        for module in self.slots.iter_mut() {
            module.reset();
        }
    }

    pub fn get(&self, slot: RackSlot) -> Option<&dyn Module> {
        self.slots.get(slot.index()).map(|m| m.as_ref())
    }

    pub fn get_mut(&mut self, slot: RackSlot) -> Option<&mut (dyn Module + 'static)> {
        self.slots.get_mut(slot.index()).map(|m| m.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Module> {
        self.slots.iter().map(|m| m.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = ModuleKind> + '_ {
        self.slots.iter().map(|m| m.kind())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
