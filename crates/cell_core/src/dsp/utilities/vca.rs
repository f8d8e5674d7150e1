use crate::cell::{CellAllocator, Cells};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    Amp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    A,
    B,
    /// multiplies the amp control when patched
    Amp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    A,
    B,
}

/// Two-channel amplifier sharing one gain.
pub struct Vca {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
}

impl Vca {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
        }
    }
}

impl Module for Vca {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Vca
    }

    fn process(&mut self, cells: &Cells) {
        let mut gain = self.ctrl.load(cells, Control::Amp);
        if !self.inputs.is_unpatched(Input::Amp) {
            gain *= self.inputs.load(cells, Input::Amp);
        }
        self.outputs
            .store(cells, Output::A, self.inputs.load(cells, Input::A) * gain);
        self.outputs
            .store(cells, Output::B, self.inputs.load(cells, Input::B) * gain);
    }

    fn reset(&mut self) {}

    port_tables!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indexed;

    #[test]
    fn cv_multiplies_only_when_patched() {
        let mut alloc = CellAllocator::new();
        let mut vca = Vca::new(&mut alloc);
        let signal = alloc.alloc(0.8);
        let amp = alloc.alloc(0.5);
        let cv = alloc.alloc(0.0);
        let cells = alloc.finish();
        vca.inputs_mut()[Input::A.index()] = signal;
        vca.controls_mut()[Control::Amp.index()] = amp;
        let out_a = vca.outputs()[Output::A.index()];
        let out_b = vca.outputs()[Output::B.index()];

        vca.process(&cells);
        assert_eq!(cells.load(out_a), 0.4);
        assert_eq!(cells.load(out_b), 0.0);

        // a patched cv reading zero closes the amp
        vca.inputs_mut()[Input::Amp.index()] = cv;
        vca.process(&cells);
        assert_eq!(cells.load(out_a), 0.0);
    }
}
