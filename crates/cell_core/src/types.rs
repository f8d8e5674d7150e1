use std::fmt::Debug;
use std::marker::PhantomData;

use arrayvec::ArrayVec;

use crate::cell::{CellAllocator, CellId, Cells, is_unpatched};

/// Upper bound on the size of any one control, input or output table.
pub const MAX_PORTS: usize = 16;

/// A closed, stable enumeration of slots (ports, sockets, controls).
///
/// Implemented with `#[derive(Indexed)]`; the derive numbers variants in
/// declaration order and names them in snake_case.
pub trait Indexed: Copy + Eq + Debug + Send + Sync + 'static {
    const COUNT: usize;
    const ALL: &'static [Self];

    fn index(self) -> usize;
    fn name(self) -> &'static str;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }
}

/// A fixed table of cell handles indexed by the enumeration `E`.
///
/// Control and input tables start out pointing at the sentinel; output tables
/// own freshly allocated cells.
#[derive(Clone, Debug)]
pub struct PortTable<E: Indexed> {
    ids: ArrayVec<CellId, MAX_PORTS>,
    _ports: PhantomData<E>,
}

impl<E: Indexed> PortTable<E> {
    /// Every slot points at the sentinel.
    pub fn unpatched() -> Self {
        const { assert!(E::COUNT <= MAX_PORTS, "port enumeration exceeds MAX_PORTS") };
        let mut ids = ArrayVec::new();
        for _ in 0..E::COUNT {
            ids.push(CellId::SENTINEL);
        }
        Self {
            ids,
            _ports: PhantomData,
        }
    }

    /// Every slot gets its own new cell, initialised to `0.0`.
    pub fn allocate(alloc: &mut CellAllocator) -> Self {
        const { assert!(E::COUNT <= MAX_PORTS, "port enumeration exceeds MAX_PORTS") };
        let mut ids = ArrayVec::new();
        for _ in 0..E::COUNT {
            ids.push(alloc.alloc(0.0));
        }
        Self {
            ids,
            _ports: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, port: E) -> CellId {
        self.ids[port.index()]
    }

    /// Point one slot at `cell`.
    #[inline]
    pub fn set(&mut self, port: E, cell: CellId) {
        self.ids[port.index()] = cell;
    }

    #[inline]
    pub fn is_unpatched(&self, port: E) -> bool {
        is_unpatched(self.get(port))
    }

    #[inline]
    pub fn load(&self, cells: &Cells, port: E) -> f32 {
        cells.load(self.get(port))
    }

    #[inline]
    pub fn store(&self, cells: &Cells, port: E, value: f32) {
        cells.store(self.get(port), value);
    }

    pub fn as_slice(&self) -> &[CellId] {
        &self.ids
    }

    pub fn as_mut_slice(&mut self) -> &mut [CellId] {
        &mut self.ids
    }
}

impl<E: Indexed> Default for PortTable<E> {
    fn default() -> Self {
        Self::unpatched()
    }
}

/// Scheduling category of a module; the rack binds categories in ascending rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleKind {
    Lfo,
    SampleHold,
    Vca,
    Chaos,
    Vco,
    Vcf,
    Delay,
    Rotor,
    // Not rack-bound: run by the engine around the rack dispatch.
    Envelope,
    Sum,
    Product,
    Mixer,
}

impl ModuleKind {
    /// Position in the rack's category order, or `None` for engine stages.
    pub fn rack_rank(self) -> Option<u8> {
        match self {
            ModuleKind::Lfo | ModuleKind::SampleHold | ModuleKind::Vca => Some(0),
            ModuleKind::Chaos => Some(1),
            ModuleKind::Vco => Some(2),
            ModuleKind::Vcf => Some(3),
            ModuleKind::Delay => Some(4),
            ModuleKind::Rotor => Some(5),
            ModuleKind::Envelope | ModuleKind::Sum | ModuleKind::Product | ModuleKind::Mixer => {
                None
            }
        }
    }
}

/// Which port table of a module a patch-bay sink addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortGroup {
    Control,
    Input,
}

/// A processing unit.
///
/// `process` reads its control and input cells, advances private state and
/// stores into its output cells. It must run in bounded time, allocate nothing
/// and never block. `reset` restores the documented default state and is safe
/// between any two `process` calls.
pub trait Module: Send {
    fn kind(&self) -> ModuleKind;
    fn process(&mut self, cells: &Cells);
    fn reset(&mut self);

    fn controls_mut(&mut self) -> &mut [CellId];
    fn inputs_mut(&mut self) -> &mut [CellId];
    fn controls(&self) -> &[CellId];
    fn inputs(&self) -> &[CellId];
    fn outputs(&self) -> &[CellId];

    fn ports_mut(&mut self, group: PortGroup) -> &mut [CellId] {
        match group {
            PortGroup::Control => self.controls_mut(),
            PortGroup::Input => self.inputs_mut(),
        }
    }
}

/// Implements the table accessors of [`Module`] for a struct with
/// `ctrl`, `inputs` and `outputs` fields of type [`PortTable`].
macro_rules! port_tables {
    () => {
        fn controls_mut(&mut self) -> &mut [crate::cell::CellId] {
            self.ctrl.as_mut_slice()
        }

        fn inputs_mut(&mut self) -> &mut [crate::cell::CellId] {
            self.inputs.as_mut_slice()
        }

        fn controls(&self) -> &[crate::cell::CellId] {
            self.ctrl.as_slice()
        }

        fn inputs(&self) -> &[crate::cell::CellId] {
            self.inputs.as_slice()
        }

        fn outputs(&self) -> &[crate::cell::CellId] {
            self.outputs.as_slice()
        }
    };
    (no_controls) => {
        fn controls_mut(&mut self) -> &mut [crate::cell::CellId] {
            &mut []
        }

        fn inputs_mut(&mut self) -> &mut [crate::cell::CellId] {
            self.inputs.as_mut_slice()
        }

        fn controls(&self) -> &[crate::cell::CellId] {
            &[]
        }

        fn inputs(&self) -> &[crate::cell::CellId] {
            self.inputs.as_slice()
        }

        fn outputs(&self) -> &[crate::cell::CellId] {
            self.outputs.as_slice()
        }
    };
    (no_inputs) => {
        fn controls_mut(&mut self) -> &mut [crate::cell::CellId] {
            self.ctrl.as_mut_slice()
        }

        fn inputs_mut(&mut self) -> &mut [crate::cell::CellId] {
            &mut []
        }

        fn controls(&self) -> &[crate::cell::CellId] {
            self.ctrl.as_slice()
        }

        fn inputs(&self) -> &[crate::cell::CellId] {
            &[]
        }

        fn outputs(&self) -> &[crate::cell::CellId] {
            self.outputs.as_slice()
        }
    };
}

pub(crate) use port_tables;
