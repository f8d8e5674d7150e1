use std::f32::consts::PI;

use crate::cell::{CellAllocator, Cells};
use crate::dsp::utils::smooth_value;
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    /// 0..1, exponential over 20 Hz..20 kHz
    Cutoff,
    /// resonance 0..1
    Q,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    A,
    B,
    C,
    Cutoff,
    Q,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Lp,
    Bp,
    Hp,
}

const SMOOTHING: f32 = 0.01;

/// State-variable filter over the sum of its three audio inputs.
pub struct Vcf {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    z1_low: f32,
    z1_band: f32,
    smoothed_cutoff: f32,
    smoothed_q: f32,
    sample_rate: f32,
}

impl Vcf {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            z1_low: 0.0,
            z1_band: 0.0,
            smoothed_cutoff: 0.5,
            smoothed_q: 0.0,
            sample_rate,
        }
    }

    /// Cutoff in Hz for a normalised control, limited to where the
    /// topology stays stable.
    pub fn cutoff_hz(&self, cutoff: f32) -> f32 {
        let hz = 20.0 * 1000f32.powf(cutoff.clamp(0.0, 1.0));
        hz.min(self.sample_rate / 6.0)
    }
}

impl Module for Vcf {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Vcf
    }

    fn process(&mut self, cells: &Cells) {
        let input = self.inputs.load(cells, Input::A)
            + self.inputs.load(cells, Input::B)
            + self.inputs.load(cells, Input::C);

        let target_cutoff =
            self.ctrl.load(cells, Control::Cutoff) + self.inputs.load(cells, Input::Cutoff);
        let target_q = self.ctrl.load(cells, Control::Q) + self.inputs.load(cells, Input::Q);
        self.smoothed_cutoff = smooth_value(self.smoothed_cutoff, target_cutoff, SMOOTHING);
        self.smoothed_q = smooth_value(self.smoothed_q, target_q, SMOOTHING);

        let f = 2.0 * (PI * self.cutoff_hz(self.smoothed_cutoff) / self.sample_rate).sin();
        let damping = (1.0 - self.smoothed_q.clamp(0.0, 1.0) * 0.95).max(0.05);

        let highpass = input - self.z1_low - damping * self.z1_band;
        let bandpass = f * highpass + self.z1_band;
        let lowpass = f * bandpass + self.z1_low;

        self.z1_band = bandpass;
        self.z1_low = lowpass;

        self.outputs.store(cells, Output::Lp, lowpass.clamp(-5.0, 5.0));
        self.outputs.store(cells, Output::Bp, bandpass.clamp(-5.0, 5.0));
        self.outputs.store(cells, Output::Hp, highpass.clamp(-5.0, 5.0));
    }

    fn reset(&mut self) {
        self.z1_low = 0.0;
        self.z1_band = 0.0;
    }

    port_tables!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indexed;

    #[test]
    fn lowpass_settles_to_dc_input() {
        let mut alloc = CellAllocator::new();
        let mut vcf = Vcf::new(&mut alloc, 48000.0);
        let dc = alloc.alloc(0.25);
        let cutoff = alloc.alloc(0.6);
        let cells = alloc.finish();
        vcf.inputs_mut()[Input::A.index()] = dc;
        vcf.inputs_mut()[Input::C.index()] = dc;
        vcf.controls_mut()[Control::Cutoff.index()] = cutoff;

        for _ in 0..48000 {
            vcf.process(&cells);
        }
        let lp = cells.load(vcf.outputs()[Output::Lp.index()]);
        let hp = cells.load(vcf.outputs()[Output::Hp.index()]);
        assert!((lp - 0.5).abs() < 1e-3, "lp = {lp}");
        assert!(hp.abs() < 1e-3, "hp = {hp}");
    }

    #[test]
    fn cutoff_is_bounded_for_stability() {
        let mut alloc = CellAllocator::new();
        let vcf = Vcf::new(&mut alloc, 48000.0);
        assert!((vcf.cutoff_hz(0.0) - 20.0).abs() < 1e-3);
        assert_eq!(vcf.cutoff_hz(1.0), 8000.0);
        assert_eq!(vcf.cutoff_hz(7.0), 8000.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut alloc = CellAllocator::new();
        let mut vcf = Vcf::new(&mut alloc, 48000.0);
        let dc = alloc.alloc(1.0);
        let cells = alloc.finish();
        vcf.inputs_mut()[Input::B.index()] = dc;
        for _ in 0..100 {
            vcf.process(&cells);
        }
        vcf.reset();
        assert_eq!(vcf.z1_low, 0.0);
        assert_eq!(vcf.z1_band, 0.0);
    }
}
