use crate::cell::{CellAllocator, Cells};
use crate::types::{Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    /// fraction of the buffer length
    Time,
    Feed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    A,
    B,
    C,
    D,
    Time,
    Feed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    A,
    B,
    C,
    D,
}

const LINES: usize = 4;
const MAX_FEEDBACK: f32 = 0.99;

/// Four delay lines sharing one time and one feedback amount.
///
/// Buffers hold one second and are allocated once, at construction.
pub struct Delay {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    lines: [Vec<f32>; LINES],
    write: usize,
}

impl Delay {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        let len = (sample_rate as usize).max(2);
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            lines: std::array::from_fn(|_| vec![0.0; len]),
            write: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.lines[0].len()
    }

    /// Delay in samples for a normalised time, at least one sample.
    pub fn delay_samples(&self, time: f32) -> f32 {
        let max = (self.capacity() - 1) as f32;
        (time.clamp(0.0, 1.0) * max).max(1.0)
    }

    fn read(&self, line: usize, delay: f32) -> f32 {
        let len = self.capacity();
        let pos = self.write as f32 + len as f32 - delay;
        let i0 = pos.floor() as usize % len;
        let i1 = (i0 + 1) % len;
        let frac = pos - pos.floor();
        let buf = &self.lines[line];
        buf[i0] + (buf[i1] - buf[i0]) * frac
    }
}

const LINE_PORTS: [(Input, Output); LINES] = [
    (Input::A, Output::A),
    (Input::B, Output::B),
    (Input::C, Output::C),
    (Input::D, Output::D),
];

impl Module for Delay {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Delay
    }

    fn process(&mut self, cells: &Cells) {
        let time = self.ctrl.load(cells, Control::Time) + self.inputs.load(cells, Input::Time);
        let feed = (self.ctrl.load(cells, Control::Feed) + self.inputs.load(cells, Input::Feed))
            .clamp(0.0, MAX_FEEDBACK);
        let delay = self.delay_samples(time);

        for (line, (input, output)) in LINE_PORTS.iter().enumerate() {
            let delayed = self.read(line, delay);
            let dry = self.inputs.load(cells, *input);
            self.lines[line][self.write] = dry + delayed * feed;
            self.outputs.store(cells, *output, delayed);
        }
        self.write = (self.write + 1) % self.capacity();
    }

    fn reset(&mut self) {
        for line in self.lines.iter_mut() {
            line.fill(0.0);
        }
        self.write = 0;
    }

    port_tables!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Indexed;

    #[test]
    fn impulse_comes_back_after_delay() {
        let mut alloc = CellAllocator::new();
        let mut delay = Delay::new(&mut alloc, 101.0);
        let impulse = alloc.alloc(1.0);
        let time = alloc.alloc(0.1);
        let cells = alloc.finish();
        delay.inputs_mut()[Input::B.index()] = impulse;
        delay.controls_mut()[Control::Time.index()] = time;
        let out = delay.outputs()[Output::B.index()];
        let other = delay.outputs()[Output::A.index()];

        assert!((delay.delay_samples(0.1) - 10.0).abs() < 1e-4);

        delay.process(&cells);
        cells.store(impulse, 0.0);
        let mut heard = Vec::new();
        for _ in 0..12 {
            delay.process(&cells);
            heard.push(cells.load(out));
            assert_eq!(cells.load(other), 0.0);
        }
        let peak = heard
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(9));
        assert!(heard[9] > 0.99);
    }

    #[test]
    fn feedback_is_capped() {
        let mut alloc = CellAllocator::new();
        let mut delay = Delay::new(&mut alloc, 100.0);
        let signal = alloc.alloc(1.0);
        let feed = alloc.alloc(3.0);
        let cells = alloc.finish();
        delay.inputs_mut()[Input::A.index()] = signal;
        delay.controls_mut()[Control::Feed.index()] = feed;

        for _ in 0..10_000 {
            delay.process(&cells);
        }
        let out = cells.load(delay.outputs()[Output::A.index()]);
        assert!(out.is_finite());
        assert!(out <= 1.0 / (1.0 - MAX_FEEDBACK) + 1e-2);
    }

    #[test]
    fn reset_silences_lines() {
        let mut alloc = CellAllocator::new();
        let mut delay = Delay::new(&mut alloc, 100.0);
        let signal = alloc.alloc(1.0);
        let cells = alloc.finish();
        delay.inputs_mut()[Input::D.index()] = signal;
        for _ in 0..50 {
            delay.process(&cells);
        }
        delay.reset();
        assert!(delay.lines.iter().all(|l| l.iter().all(|v| *v == 0.0)));
    }
}
