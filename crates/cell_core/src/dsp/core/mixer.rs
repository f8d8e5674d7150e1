use crate::cell::{CellAllocator, CellId, Cells};
use crate::dsp::utils::{crossfade, fold_coefficient};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    LcToL,
    CrToR,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    L,
    C,
    R,
    LcCv,
    CrCv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    L,
    R,
}

/// Left, centre and right buses down to a stereo pair.
///
/// Each side's blend coefficient is [`fold_coefficient`] of control plus cv.
/// Left is `l * coef + c * (1 - coef)`; right is `c * coef + r * (1 - coef)`.
pub struct Mixer {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
}

impl Mixer {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
        }
    }

    pub fn left(&self) -> CellId {
        self.outputs.get(Output::L)
    }

    pub fn right(&self) -> CellId {
        self.outputs.get(Output::R)
    }
}

/// Downmix one frame. `lc` and `cr` are the raw (control + cv) values.
pub fn downmix(l: f32, c: f32, r: f32, lc: f32, cr: f32) -> (f32, f32) {
    let lc = fold_coefficient(lc);
    let cr = fold_coefficient(cr);
    (crossfade(l, c, lc), crossfade(c, r, cr))
}

impl Module for Mixer {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Mixer
    }

    fn process(&mut self, cells: &Cells) {
        let lc = self.ctrl.load(cells, Control::LcToL) + self.inputs.load(cells, Input::LcCv);
        let cr = self.ctrl.load(cells, Control::CrToR) + self.inputs.load(cells, Input::CrCv);
        let (left, right) = downmix(
            self.inputs.load(cells, Input::L),
            self.inputs.load(cells, Input::C),
            self.inputs.load(cells, Input::R),
            lc,
            cr,
        );
        self.outputs.store(cells, Output::L, left);
        self.outputs.store(cells, Output::R, right);
    }

    fn reset(&mut self) {}

    port_tables!();
}
