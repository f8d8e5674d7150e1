use crate::cell::{CellAllocator, Cells};
use crate::dsp::utils::{Edge, LcgRng, SchmittTrigger};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    /// internal clock rate, 0..1 over 0.5..50 Hz
    Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    /// signal to sample; internal noise when unpatched
    A,
    /// trigger; replaces the internal clock when patched
    B,
    Time,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    A,
}

/// Sample and hold.
pub struct SampleHold {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    trigger: SchmittTrigger,
    clock: f32,
    held: f32,
    noise: LcgRng,
    sample_rate: f32,
}

impl SampleHold {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            trigger: SchmittTrigger::default(),
            clock: 0.0,
            held: 0.0,
            noise: LcgRng::default(),
            sample_rate,
        }
    }

    pub fn clock_hz(time: f32) -> f32 {
        0.5 * 100f32.powf(time.clamp(0.0, 1.0))
    }

    fn triggered(&mut self, cells: &Cells) -> bool {
        if self.inputs.is_unpatched(Input::B) {
            let time = self.ctrl.load(cells, Control::Time) + self.inputs.load(cells, Input::Time);
            self.clock += Self::clock_hz(time) / self.sample_rate;
            if self.clock >= 1.0 {
                self.clock -= 1.0;
                return true;
            }
            false
        } else {
            self.trigger.process(self.inputs.load(cells, Input::B)) == Edge::Rising
        }
    }
}

impl Module for SampleHold {
    fn kind(&self) -> ModuleKind {
        ModuleKind::SampleHold
    }

    fn process(&mut self, cells: &Cells) {
        // noise runs every tick so the sequence does not depend on the clock
        let noise = self.noise.next_bipolar();
        if self.triggered(cells) {
            self.held = if self.inputs.is_unpatched(Input::A) {
                noise
            } else {
                self.inputs.load(cells, Input::A)
            };
        }
        self.outputs.store(cells, Output::A, self.held);
    }

    fn reset(&mut self) {
        self.trigger.reset();
        self.clock = 0.0;
        self.held = 0.0;
        self.noise = LcgRng::default();
    }

    port_tables!();
}
