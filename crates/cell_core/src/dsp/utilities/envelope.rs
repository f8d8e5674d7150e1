use crate::cell::{CellAllocator, Cells};
use crate::types::{Indexed, Module, ModuleKind, PortTable, port_tables};

/// The five moving nodes of the envelope; the first node is fixed at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Segment {
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    TimeA,
    TimeH,
    TimeD,
    TimeS,
    TimeR,
    ValueA,
    ValueH,
    ValueD,
    ValueS,
    ValueR,
    CurveA,
    CurveH,
    CurveD,
    CurveS,
    CurveR,
    /// multiplies every segment time
    Scale,
}

impl Control {
    /// Segment length in seconds.
    pub fn time(segment: Segment) -> Self {
        Self::ALL[segment.index()]
    }

    /// Level reached at the end of the segment.
    pub fn value(segment: Segment) -> Self {
        Self::ALL[Segment::COUNT + segment.index()]
    }

    /// 0.5 is linear, lower bows toward the start level, higher toward the end.
    pub fn curve(segment: Segment) -> Self {
        Self::ALL[2 * Segment::COUNT + segment.index()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    Off,
    Running(Segment),
}

/// Six-node segment envelope.
///
/// Runs its five segments once after [`Envelope::start`] and then switches
/// off. The engine restarts any envelope that is off, so in the rack it
/// cycles continuously.
pub struct Envelope {
    ctrl: PortTable<Control>,
    outputs: PortTable<Output>,
    stage: Stage,
    from: f32,
    level: f32,
    elapsed: f32,
    sample_rate: f32,
}

impl Envelope {
    pub fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            ctrl: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            stage: Stage::Off,
            from: 0.0,
            level: 0.0,
            elapsed: 0.0,
            sample_rate,
        }
    }

    /// Restart from the first node.
    pub fn start(&mut self) {
        self.stage = Stage::Running(Segment::Attack);
        self.from = 0.0;
        self.level = 0.0;
        self.elapsed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Off
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    fn advance(&mut self, from: Segment, target: f32) {
        self.from = target;
        self.level = target;
        self.elapsed = 0.0;
        self.stage = match Segment::from_index(from.index() + 1) {
            Some(next) => Stage::Running(next),
            None => Stage::Off,
        };
    }
}

fn shape(t: f32, curve: f32) -> f32 {
    t.powf(2f32.powf((0.5 - curve.clamp(0.0, 1.0)) * 4.0))
}

impl Module for Envelope {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Envelope
    }

    fn process(&mut self, cells: &Cells) {
        if let Stage::Running(segment) = self.stage {
            let scale = self.ctrl.load(cells, Control::Scale).max(0.0);
            let length = self.ctrl.load(cells, Control::time(segment)).max(0.0)
                * scale
                * self.sample_rate;
            let target = self.ctrl.load(cells, Control::value(segment));

            self.elapsed += 1.0;
            if self.elapsed >= length {
                self.advance(segment, target);
            } else {
                let t = shape(self.elapsed / length, self.ctrl.load(cells, Control::curve(segment)));
                self.level = self.from + (target - self.from) * t;
            }
        }
        self.outputs.store(cells, Output::Out, self.level);
    }

    fn reset(&mut self) {
        self.stage = Stage::Off;
        self.from = 0.0;
        self.level = 0.0;
        self.elapsed = 0.0;
    }

    port_tables!(no_inputs);
}
