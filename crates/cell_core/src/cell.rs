//! Signal cells and the per-engine cell arena.
//!
//! Every signal in the synthesizer lives in a [`SignalCell`]: one `f32`,
//! written by a single producer per tick and read by any number of consumers.
//! Cells are addressed through [`CellId`] handles into a fixed arena
//! ([`Cells`]) that is allocated once when the engine is built. Ports hold
//! handles, so patching a cable is a handle rewrite rather than a copy.
//!
//! Index 0 of every arena is the sentinel: a cell fixed at `0.0` that every
//! unconnected port points at. Reads never need a null check, and a module asks
//! whether a port is patched by comparing the handle with
//! [`CellId::SENTINEL`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Handle to one cell in an engine's arena.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellId(u16);

impl CellId {
    /// The "nothing patched" cell. Always reads `0.0`.
    pub const SENTINEL: CellId = CellId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

/// True when `port` still points at the sentinel.
#[inline]
pub fn is_unpatched(port: CellId) -> bool {
    port.is_sentinel()
}

/// A single `f32` sample, shared between the audio thread and control producers.
///
/// Stored as raw bits in an `AtomicU32`, so loads and stores are single-word
/// and never torn.
#[derive(Debug)]
pub struct SignalCell(AtomicU32);

impl SignalCell {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SignalCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// The frozen cell arena of one engine.
#[derive(Debug)]
pub struct Cells {
    cells: Box<[SignalCell]>,
}

impl Cells {
    #[inline]
    pub fn load(&self, id: CellId) -> f32 {
        self.cells[id.index()].load()
    }

    /// Store into a producer-owned cell. The sentinel is never a store target.
    #[inline]
    pub fn store(&self, id: CellId, value: f32) {
        debug_assert!(!id.is_sentinel(), "attempted to write the sentinel cell");
        self.cells[id.index()].store(value);
    }

    /// Current value of the sentinel. Always `0.0`.
    pub fn sentinel(&self) -> f32 {
        self.load(CellId::SENTINEL)
    }

    /// True if `id` addresses a cell of this arena.
    pub fn contains(&self, id: CellId) -> bool {
        id.index() < self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Hands out cell handles while the engine is being built.
///
/// The sentinel is allocated first, so it is always index 0.
#[derive(Debug)]
pub struct CellAllocator {
    initial: Vec<f32>,
}

impl CellAllocator {
    pub fn new() -> Self {
        Self {
            initial: vec![0.0],
        }
    }

    /// Allocate one cell holding `initial`.
    ///
    /// Panics if the arena would exceed the `u16` handle space; the topology
    /// is fixed, so this can only trip while the engine is being assembled.
    pub fn alloc(&mut self, initial: f32) -> CellId {
        let index = self.initial.len();
        assert!(index <= u16::MAX as usize, "cell arena exhausted");
        self.initial.push(initial);
        CellId(index as u16)
    }

    /// Number of cells allocated so far, sentinel included.
    pub fn len(&self) -> usize {
        self.initial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_empty()
    }

    pub fn finish(self) -> Arc<Cells> {
        let cells = self
            .initial
            .into_iter()
            .map(SignalCell::new)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Arc::new(Cells { cells })
    }
}

impl Default for CellAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn sentinel_is_index_zero_and_reads_zero() {
        let mut alloc = CellAllocator::new();
        let a = alloc.alloc(1.5);
        let cells = alloc.finish();

        assert_eq!(CellId::SENTINEL.index(), 0);
        assert_ne!(a, CellId::SENTINEL);
        assert_eq!(cells.sentinel(), 0.0);
        assert_eq!(cells.load(a), 1.5);
    }

    #[test]
    fn allocated_handles_are_distinct_and_contained() {
        let mut alloc = CellAllocator::new();
        let ids: Vec<CellId> = (0..8).map(|i| alloc.alloc(i as f32)).collect();
        let cells = alloc.finish();

        for (i, id) in ids.iter().enumerate() {
            assert!(cells.contains(*id));
            assert_eq!(cells.load(*id), i as f32);
        }
        assert_eq!(cells.len(), 9);
    }

    #[test]
    fn is_unpatched_compares_identity_not_value() {
        let mut alloc = CellAllocator::new();
        let zero_valued = alloc.alloc(0.0);
        let _cells = alloc.finish();

        assert!(is_unpatched(CellId::SENTINEL));
        assert!(!is_unpatched(zero_valued));
    }

    #[test]
    fn store_from_another_thread_is_visible() {
        let mut alloc = CellAllocator::new();
        let id = alloc.alloc(0.0);
        let cells = alloc.finish();

        let writer = Arc::clone(&cells);
        thread::spawn(move || {
            for i in 0..1000 {
                writer.store(id, i as f32);
            }
        })
        .join()
        .unwrap();

        assert_eq!(cells.load(id), 999.0);
        assert_eq!(cells.sentinel(), 0.0);
    }

    #[test]
    fn signal_cell_round_trips_special_values() {
        let cell = SignalCell::default();
        assert_eq!(cell.load(), 0.0);
        cell.store(-0.0);
        assert!(cell.load().is_sign_negative());
        cell.store(f32::INFINITY);
        assert_eq!(cell.load(), f32::INFINITY);
    }
}
