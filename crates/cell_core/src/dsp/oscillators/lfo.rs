use crate::cell::{CellAllocator, Cells};
use crate::dsp::utils::{Waveform, wrap_phase};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    /// rate, 0..1 mapped exponentially onto 0.05..50 Hz
    Delta,
    Amp,
    Form,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    Fm,
    Am,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    A,
    /// quarter-cycle later than `A`
    B,
}

const MIN_HZ: f32 = 0.05;
const MAX_HZ: f32 = 50.0;

/// Low-frequency oscillator with a quadrature second output.
pub struct Lfo {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    phase: f32,
    sample_rate: f32,
}

impl Lfo {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn frequency(delta: f32) -> f32 {
        MIN_HZ * (MAX_HZ / MIN_HZ).powf(delta.clamp(0.0, 1.0))
    }
}

impl Module for Lfo {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Lfo
    }

    fn process(&mut self, cells: &Cells) {
        let mut delta = self.ctrl.load(cells, Control::Delta);
        if !self.inputs.is_unpatched(Input::Fm) {
            delta += self.inputs.load(cells, Input::Fm);
        }
        let mut amp = self.ctrl.load(cells, Control::Amp);
        if !self.inputs.is_unpatched(Input::Am) {
            amp *= self.inputs.load(cells, Input::Am);
        }
        let shape = Waveform::from_control(self.ctrl.load(cells, Control::Form));

        self.outputs
            .store(cells, Output::A, shape.sample(self.phase, 0.5) * amp);
        self.outputs.store(
            cells,
            Output::B,
            shape.sample(wrap_phase(self.phase + 0.25), 0.5) * amp,
        );

        self.phase = wrap_phase(self.phase + Self::frequency(delta) / self.sample_rate);
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    port_tables!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellId;
    use crate::types::Indexed;
    use std::sync::Arc;

    fn rig(delta: f32, form: f32) -> (Lfo, Arc<Cells>) {
        let mut alloc = CellAllocator::new();
        let mut lfo = Lfo::new(&mut alloc, 1000.0);
        let delta = alloc.alloc(delta);
        let amp = alloc.alloc(1.0);
        let form = alloc.alloc(form);
        let ctrl = lfo.controls_mut();
        ctrl[Control::Delta.index()] = delta;
        ctrl[Control::Amp.index()] = amp;
        ctrl[Control::Form.index()] = form;
        (lfo, alloc.finish())
    }

    fn out(lfo: &Lfo, port: Output) -> CellId {
        lfo.outputs()[port.index()]
    }

    #[test]
    fn frequency_spans_range() {
        assert!((Lfo::frequency(0.0) - MIN_HZ).abs() < 1e-6);
        assert!((Lfo::frequency(1.0) - MAX_HZ).abs() < 1e-3);
        assert!((Lfo::frequency(4.0) - MAX_HZ).abs() < 1e-3);
    }

    #[test]
    fn quadrature_output_leads_by_quarter_cycle() {
        let (mut lfo, cells) = rig(0.5, 0.0);
        lfo.process(&cells);
        // sine at phase 0 and 0.25
        assert!(cells.load(out(&lfo, Output::A)).abs() < 1e-6);
        assert!((cells.load(out(&lfo, Output::B)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unpatched_am_leaves_amplitude_alone() {
        let (mut lfo, cells) = rig(1.0, 3.0);
        lfo.process(&cells);
        assert_eq!(cells.load(out(&lfo, Output::A)), 1.0);
    }

    #[test]
    fn reset_rewinds_phase() {
        let (mut lfo, cells) = rig(1.0, 2.0);
        for _ in 0..7 {
            lfo.process(&cells);
        }
        lfo.reset();
        lfo.process(&cells);
        assert_eq!(cells.load(out(&lfo, Output::A)), -1.0);
    }
}
