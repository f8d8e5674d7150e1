//! The control bus: potentiometer and parameter cells, and the handle the
//! control thread uses to drive them.
//!
//! Pots are the continuous front-panel knobs; params are the slower settings
//! (octaves, waveforms, envelope shapes). Each has its own cell, allocated
//! once at construction. The engine binds module control ports straight to
//! these cells, so a control-rate write is visible to the next `process` that
//! reads it with no copy in between.

use std::sync::Arc;

use parking_lot::Mutex;
use rtrb::Producer;

use crate::cell::{CellAllocator, CellId, Cells};
use crate::commands::PatchCommand;
use crate::dsp::chaos::{ResetRequest, Variant};
use crate::dsp::utilities::envelope;
use crate::error::{ConfigError, PatchError};
use crate::patch::Socket;
use crate::types::Indexed;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Indexed)]
pub enum Pot {
    VcoAFine,
    VcoBFine,
    VcoCFine,
    VcoDFine,
    VcoAWarp,
    VcoBWarp,
    VcoCWarp,
    VcoDWarp,
    VcoAAm,
    VcoBAm,
    VcoCAm,
    VcoDAm,
    VcoAPw,
    VcoBPw,
    VcoCPw,
    VcoDPw,
    VcoAFm,
    VcoBFm,
    VcoCFm,
    VcoDFm,
    VcoAAmp,
    VcoBAmp,
    VcoCAmp,
    VcoDAmp,
    VcfACut,
    VcfBCut,
    VcfARes,
    VcfBRes,
    VcaA,
    VcaB,
    AngleX,
    AngleY,
    AngleZ,
    LcToL,
    CrToR,
    ChsATune,
    ChsBTune,
    ChsAWarp,
    ChsBWarp,
    ChsAAmp,
    ChsBAmp,
    VcdTime,
    VcdFeed,
    SnhA,
    SnhB,
    LfoAFreq,
    LfoBFreq,
    LfoAAm,
    LfoBAm,
    Volume,
}

impl Pot {
    /// The pot of the same row belonging to unit `unit` (0 = A).
    ///
    /// Only meaningful on an `A` pot; panics past the end of the row's block.
    pub fn unit(self, unit: usize) -> Self {
        Self::ALL[self.index() + unit]
    }

    pub fn default_value(self) -> f32 {
        use Pot::*;
        match self {
            VcoAFine | VcoBFine | VcoCFine | VcoDFine => 0.5,
            VcoAPw | VcoBPw | VcoCPw | VcoDPw => 0.5,
            VcoAAmp | VcoBAmp | VcoCAmp | VcoDAmp => 0.5,
            VcfACut | VcfBCut => 0.5,
            VcfARes | VcfBRes => 0.2,
            VcaA | VcaB => 1.0,
            LcToL | CrToR => 0.25,
            ChsATune | ChsBTune => 0.1,
            ChsAAmp | ChsBAmp => 1.0,
            VcdTime => 0.25,
            VcdFeed => 0.3,
            SnhA | SnhB => 0.5,
            LfoAFreq | LfoBFreq => 0.3,
            LfoAAm | LfoBAm => 1.0,
            Volume => 0.7,
            VcoAWarp | VcoBWarp | VcoCWarp | VcoDWarp => 0.0,
            VcoAAm | VcoBAm | VcoCAm | VcoDAm => 0.0,
            VcoAFm | VcoBFm | VcoCFm | VcoDFm => 0.0,
            AngleX | AngleY | AngleZ => 0.0,
            ChsAWarp | ChsBWarp => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Indexed)]
pub enum Param {
    VcoAOct,
    VcoBOct,
    VcoCOct,
    VcoDOct,
    VcoAForm,
    VcoBForm,
    VcoCForm,
    VcoDForm,
    VcoAFreerun,
    VcoBFreerun,
    VcoCFreerun,
    VcoDFreerun,
    ChsAForm,
    ChsBForm,
    LfoAForm,
    LfoBForm,

    EnvATimeA,
    EnvATimeH,
    EnvATimeD,
    EnvATimeS,
    EnvATimeR,
    EnvAValueA,
    EnvAValueH,
    EnvAValueD,
    EnvAValueS,
    EnvAValueR,
    EnvAFormA,
    EnvAFormH,
    EnvAFormD,
    EnvAFormS,
    EnvAFormR,

    EnvBTimeA,
    EnvBTimeH,
    EnvBTimeD,
    EnvBTimeS,
    EnvBTimeR,
    EnvBValueA,
    EnvBValueH,
    EnvBValueD,
    EnvBValueS,
    EnvBValueR,
    EnvBFormA,
    EnvBFormH,
    EnvBFormD,
    EnvBFormS,
    EnvBFormR,

    EnvCTimeA,
    EnvCTimeH,
    EnvCTimeD,
    EnvCTimeS,
    EnvCTimeR,
    EnvCValueA,
    EnvCValueH,
    EnvCValueD,
    EnvCValueS,
    EnvCValueR,
    EnvCFormA,
    EnvCFormH,
    EnvCFormD,
    EnvCFormS,
    EnvCFormR,

    EnvDTimeA,
    EnvDTimeH,
    EnvDTimeD,
    EnvDTimeS,
    EnvDTimeR,
    EnvDValueA,
    EnvDValueH,
    EnvDValueD,
    EnvDValueS,
    EnvDValueR,
    EnvDFormA,
    EnvDFormH,
    EnvDFormD,
    EnvDFormS,
    EnvDFormR,

    EnvAScale,
    EnvBScale,
    EnvCScale,
    EnvDScale,
}

/// Number of per-segment params of one envelope (time, value and curve of
/// five segments). The scale params sit after all four blocks.
const ENV_BLOCK: usize = envelope::Control::COUNT - 1;

impl Param {
    /// See [`Pot::unit`].
    pub fn unit(self, unit: usize) -> Self {
        Self::ALL[self.index() + unit]
    }

    /// The param envelope `env` binds to its control `ctrl`.
    pub fn envelope(env: usize, ctrl: envelope::Control) -> Self {
        if ctrl == envelope::Control::Scale {
            Param::EnvAScale.unit(env)
        } else {
            Self::ALL[Param::EnvATimeA.index() + env * ENV_BLOCK + ctrl.index()]
        }
    }

    pub fn default_value(self) -> f32 {
        use envelope::{Control as Env, Segment};

        match self {
            Param::VcoAOct | Param::VcoBOct | Param::VcoCOct | Param::VcoDOct => 2.0,
            Param::VcoAFreerun | Param::VcoBFreerun | Param::VcoCFreerun | Param::VcoDFreerun => {
                1.0
            }
            Param::EnvAScale | Param::EnvBScale | Param::EnvCScale | Param::EnvDScale => 1.0,
            p if p.index() >= Param::EnvATimeA.index() => {
                let ctrl = Env::ALL[(p.index() - Param::EnvATimeA.index()) % ENV_BLOCK];
                let segment = Segment::ALL[ctrl.index() % Segment::COUNT];
                match ctrl.index() / Segment::COUNT {
                    0 => match segment {
                        Segment::Attack => 0.01,
                        Segment::Hold => 0.05,
                        Segment::Decay => 0.2,
                        Segment::Sustain => 0.3,
                        Segment::Release => 0.4,
                    },
                    1 => match segment {
                        Segment::Attack | Segment::Hold => 1.0,
                        Segment::Decay | Segment::Sustain => 0.6,
                        Segment::Release => 0.0,
                    },
                    _ => 0.5,
                }
            }
            _ => 0.0,
        }
    }
}

/// Which of the two chaos maps a request addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Indexed)]
pub enum ChaosUnit {
    A,
    B,
}

/// The pot and param cells of one engine.
#[derive(Clone, Debug)]
pub struct ControlBus {
    pots: Vec<CellId>,
    params: Vec<CellId>,
}

impl ControlBus {
    /// Allocate every pot and param cell at its default value.
    pub fn allocate(alloc: &mut CellAllocator) -> Self {
        Self {
            pots: Pot::ALL
                .iter()
                .map(|p| alloc.alloc(p.default_value()))
                .collect(),
            params: Param::ALL
                .iter()
                .map(|p| alloc.alloc(p.default_value()))
                .collect(),
        }
    }

    #[inline]
    pub fn pot(&self, pot: Pot) -> CellId {
        self.pots[pot.index()]
    }

    #[inline]
    pub fn param(&self, param: Param) -> CellId {
        self.params[param.index()]
    }
}

/// Control-rate producer handle for one engine.
///
/// Cheap to clone and `Send + Sync`: pot and param writes are atomic cell
/// stores, and patch commands go through the engine's bounded queue.
#[derive(Clone)]
pub struct ControlSurface {
    cells: Arc<Cells>,
    bus: Arc<ControlBus>,
    chaos_resets: [Arc<ResetRequest>; 2],
    commands: Arc<Mutex<Producer<PatchCommand>>>,
}

impl ControlSurface {
    pub(crate) fn new(
        cells: Arc<Cells>,
        bus: Arc<ControlBus>,
        chaos_resets: [Arc<ResetRequest>; 2],
        commands: Producer<PatchCommand>,
    ) -> Self {
        Self {
            cells,
            bus,
            chaos_resets,
            commands: Arc::new(Mutex::new(commands)),
        }
    }

    pub fn set_pot(&self, pot: Pot, value: f32) {
        self.cells.store(self.bus.pot(pot), value);
    }

    pub fn pot(&self, pot: Pot) -> f32 {
        self.cells.load(self.bus.pot(pot))
    }

    pub fn set_param(&self, param: Param, value: f32) {
        self.cells.store(self.bus.param(param), value);
    }

    pub fn param(&self, param: Param) -> f32 {
        self.cells.load(self.bus.param(param))
    }

    /// Set a pot or param by its snake_case name.
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteControl {
                name: name.to_string(),
                value,
            });
        }
        if let Some(pot) = Pot::from_name(name) {
            self.set_pot(pot, value);
        } else if let Some(param) = Param::from_name(name) {
            self.set_param(param, value);
        } else {
            return Err(ConfigError::UnknownControl(name.to_string()));
        }
        Ok(())
    }

    /// Select a new equation set for one chaos map.
    ///
    /// The request carries the variant, so each switch is latched once and
    /// as itself. The form param is updated to match for readback.
    pub fn switch_chaos_variant(&self, unit: ChaosUnit, variant: Variant) {
        self.set_param(Param::ChsAForm.unit(unit.index()), variant.index() as f32);
        self.chaos_resets[unit.index()].request_variant(variant);
    }

    /// Queue a cable from `source` to `sink`, applied at the next tick.
    pub fn patch(&self, source: Socket, sink: Socket) -> Result<(), PatchError> {
        if !source.is_source() {
            return Err(PatchError::NotASource(source));
        }
        if !sink.is_sink() {
            return Err(PatchError::NotASink(sink));
        }
        self.send(PatchCommand::Connect { source, sink })
    }

    /// Queue removal of whatever cable feeds `sink`.
    pub fn unpatch(&self, sink: Socket) -> Result<(), PatchError> {
        if !sink.is_sink() {
            return Err(PatchError::NotASink(sink));
        }
        self.send(PatchCommand::Disconnect { sink })
    }

    fn send(&self, cmd: PatchCommand) -> Result<(), PatchError> {
        let mut tx = self.commands.lock();
        tx.push(cmd).map_err(|_| PatchError::QueueFull)
    }
}
