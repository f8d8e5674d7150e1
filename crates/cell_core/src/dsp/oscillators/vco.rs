use std::f32::consts::TAU;

use crate::cell::{CellAllocator, Cells};
use crate::dsp::utils::{Waveform, octaves_to_hz, wrap_phase};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    /// octaves above C1
    Octave,
    /// fine tune, 0.5 is centred, full travel is one semitone either way
    Detune,
    Pll,
    Am,
    Pwm,
    Fm,
    Amp,
    Form,
    /// above 0.5 the output ignores the envelope input
    Freerun,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    Fm,
    Pwm,
    Pll,
    Am,
    /// pitch in octaves
    Detune,
    Env,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Main,
}

const FM_OCTAVES: f32 = 4.0;

/// Audio-rate oscillator.
///
/// `pll` bends the phase before shaping: by the `pll` input when one is
/// patched, otherwise by the oscillator's own sine (phase distortion).
pub struct Vco {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    phase: f32,
    sample_rate: f32,
}

impl Vco {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            phase: 0.0,
            sample_rate,
        }
    }

    fn pitch(&self, cells: &Cells) -> f32 {
        let mut octaves = self.ctrl.load(cells, Control::Octave)
            + (self.ctrl.load(cells, Control::Detune) - 0.5) / 6.0;
        if !self.inputs.is_unpatched(Input::Detune) {
            octaves += self.inputs.load(cells, Input::Detune);
        }
        if !self.inputs.is_unpatched(Input::Fm) {
            octaves +=
                self.inputs.load(cells, Input::Fm) * self.ctrl.load(cells, Control::Fm) * FM_OCTAVES;
        }
        octaves
    }

    fn bend(&self, cells: &Cells) -> f32 {
        let depth = self.ctrl.load(cells, Control::Pll);
        if self.inputs.is_unpatched(Input::Pll) {
            depth * 0.25 * (self.phase * TAU).sin()
        } else {
            depth * self.inputs.load(cells, Input::Pll)
        }
    }

    fn width(&self, cells: &Cells) -> f32 {
        let mut width = 0.5 + (self.ctrl.load(cells, Control::Pwm) - 0.5) * 0.9;
        if !self.inputs.is_unpatched(Input::Pwm) {
            width += self.inputs.load(cells, Input::Pwm) * 0.45;
        }
        width.clamp(0.05, 0.95)
    }

    fn gain(&self, cells: &Cells) -> f32 {
        let mut gain = self.ctrl.load(cells, Control::Amp);
        if !self.inputs.is_unpatched(Input::Am) {
            let depth = self.ctrl.load(cells, Control::Am);
            gain *= 1.0 - depth + depth * self.inputs.load(cells, Input::Am);
        }
        if self.ctrl.load(cells, Control::Freerun) <= 0.5 {
            gain *= self.inputs.load(cells, Input::Env);
        }
        gain
    }
}

impl Module for Vco {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Vco
    }

    fn process(&mut self, cells: &Cells) {
        let shape = Waveform::from_control(self.ctrl.load(cells, Control::Form));
        let phase = wrap_phase(self.phase + self.bend(cells));
        let sample = shape.sample(phase, self.width(cells)) * self.gain(cells);
        self.outputs.store(cells, Output::Main, sample);

        let hz = octaves_to_hz(self.pitch(cells)).min(self.sample_rate * 0.45);
        self.phase = wrap_phase(self.phase + hz / self.sample_rate);
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

    struct Rig {
        vco: Vco,
        cells: Arc<Cells>,
        freerun: CellId,
        env: CellId,
    }

    fn rig(octave: f32) -> Rig {
        let mut alloc = CellAllocator::new();
        let mut vco = Vco::new(&mut alloc, 48000.0);
        let octave = alloc.alloc(octave);
        let detune = alloc.alloc(0.5);
        let amp = alloc.alloc(1.0);
        let form = alloc.alloc(2.0);
        let freerun = alloc.alloc(1.0);
        let env = alloc.alloc(0.0);
        let ctrl = vco.controls_mut();
        ctrl[Control::Octave.index()] = octave;
        ctrl[Control::Detune.index()] = detune;
        ctrl[Control::Amp.index()] = amp;
        ctrl[Control::Form.index()] = form;
        ctrl[Control::Freerun.index()] = freerun;
        vco.inputs_mut()[Input::Env.index()] = env;
        Rig {
            vco,
            cells: alloc.finish(),
            freerun,
            env,
        }
    }

    fn main(rig: &Rig) -> f32 {
        rig.cells.load(rig.vco.outputs()[Output::Main.index()])
    }

    #[test]
    fn saw_rises_at_pitch() {
        let mut rig = rig(3.0);
        rig.vco.process(&rig.cells);
        let first = main(&rig);
        rig.vco.process(&rig.cells);
        let second = main(&rig);

        let expected_step = 2.0 * octaves_to_hz(3.0) / 48000.0;
        assert!((second - first - expected_step).abs() < 1e-4);
    }

    #[test]
    fn envelope_gates_unless_freerunning() {
        let mut rig = rig(3.0);
        rig.cells.store(rig.freerun, 0.0);
        for _ in 0..10 {
            rig.vco.process(&rig.cells);
            assert_eq!(main(&rig), 0.0);
        }
        rig.cells.store(rig.env, 0.5);
        rig.vco.process(&rig.cells);
        assert!(main(&rig).abs() > 0.0);
    }

    #[test]
    fn pulse_width_is_clamped() {
        let mut alloc = CellAllocator::new();
        let mut vco = Vco::new(&mut alloc, 48000.0);
        let pwm = alloc.alloc(5.0);
        let cells = alloc.finish();
        vco.controls_mut()[Control::Pwm.index()] = pwm;
        assert_eq!(vco.width(&cells), 0.95);
    }

    #[test]
    fn detune_input_is_in_octaves() {
        let mut alloc = CellAllocator::new();
        let mut vco = Vco::new(&mut alloc, 48000.0);
        let detune_ctrl = alloc.alloc(0.5);
        let cv = alloc.alloc(1.0);
        let cells = alloc.finish();
        vco.controls_mut()[Control::Detune.index()] = detune_ctrl;
        assert_eq!(vco.pitch(&cells), 0.0);
        vco.inputs_mut()[Input::Detune.index()] = cv;
        assert_eq!(vco.pitch(&cells), 1.0);
    }
}
