//! The engine: owns every module and the patch bay, wires them once, and runs
//! the per-sample pipeline.
//!
//! Tick order is fixed:
//!
//! 1. pending patch commands are applied
//! 2. each envelope that is off is restarted, then every envelope advances
//! 3. the rack runs in bind order
//! 4. the two sums, then the product, then the mixer
//! 5. the mixer's pair is scaled by the volume pot and DC-blocked per channel
//!
//! Sums, product and mixer see current-tick rack outputs because they run
//! strictly after the rack.

use std::sync::Arc;

use rtrb::{Consumer, RingBuffer};

use crate::cell::{CellAllocator, CellId, Cells};
use crate::commands::PatchCommand;
use crate::config::EngineConfig;
use crate::control::{ChaosUnit, ControlBus, ControlSurface, Param, Pot};
use crate::dsp::chaos::{self, ChaosMap};
use crate::dsp::core::dc_block::DcBlocker;
use crate::dsp::core::mixer::{self, Mixer};
use crate::dsp::core::product::{self, Product};
use crate::dsp::core::sum::{self, Sum};
use crate::dsp::filters::vcf::{self, Vcf};
use crate::dsp::oscillators::lfo::{self, Lfo};
use crate::dsp::oscillators::vco::{self, Vco};
use crate::dsp::utilities::delay::{self, Delay};
use crate::dsp::utilities::envelope::{self, Envelope};
use crate::dsp::utilities::rotor::{self, Rotor};
use crate::dsp::utilities::sample_and_hold::{self, SampleHold};
use crate::dsp::utilities::vca::{self, Vca};
use crate::error::{ConfigError, PatchError, RackError};
use crate::patch::{Cable, Jack, Owner, PatchBay, Socket as S};
use crate::rack::{Rack, RackSlot};
use crate::types::{Indexed, Module, PortGroup};

pub const ENVELOPES: usize = 4;
pub const VCOS: usize = 4;

/// One stereo output sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

/// Sinks and sources of one module, as `(socket, port)` pairs.
struct Sockets<I: 'static, O: 'static> {
    sinks: &'static [(S, I)],
    sources: &'static [(S, O)],
}

const LFO_SOCKETS: [Sockets<lfo::Input, lfo::Output>; 2] = [
    Sockets {
        sinks: &[(S::LfoAInFreq, lfo::Input::Fm), (S::LfoAInAm, lfo::Input::Am)],
        sources: &[(S::LfoAOutA, lfo::Output::A), (S::LfoAOutB, lfo::Output::B)],
    },
    Sockets {
        sinks: &[(S::LfoBInFreq, lfo::Input::Fm), (S::LfoBInAm, lfo::Input::Am)],
        sources: &[(S::LfoBOutA, lfo::Output::A), (S::LfoBOutB, lfo::Output::B)],
    },
];

const SNH_SOCKETS: [Sockets<sample_and_hold::Input, sample_and_hold::Output>; 2] = {
    use sample_and_hold::{Input, Output};
    [
        Sockets {
            sinks: &[
                (S::SnhAInA, Input::A),
                (S::SnhAInB, Input::B),
                (S::SnhATime, Input::Time),
            ],
            sources: &[(S::SnhAOut, Output::A)],
        },
        Sockets {
            sinks: &[
                (S::SnhBInA, Input::A),
                (S::SnhBInB, Input::B),
                (S::SnhBTime, Input::Time),
            ],
            sources: &[(S::SnhBOut, Output::A)],
        },
    ]
};

const VCA_SOCKETS: [Sockets<vca::Input, vca::Output>; 2] = {
    use vca::{Input, Output};
    [
        Sockets {
            sinks: &[
                (S::VcaAInA, Input::A),
                (S::VcaAInB, Input::B),
                (S::VcaAInCv, Input::Amp),
            ],
            sources: &[(S::VcaAOutA, Output::A), (S::VcaAOutB, Output::B)],
        },
        Sockets {
            sinks: &[
                (S::VcaBInA, Input::A),
                (S::VcaBInB, Input::B),
                (S::VcaBInCv, Input::Amp),
            ],
            sources: &[(S::VcaBOutA, Output::A), (S::VcaBOutB, Output::B)],
        },
    ]
};

const CHS_SOCKETS: [Sockets<chaos::Input, chaos::Output>; 2] = {
    use chaos::{Input, Output};
    [
        Sockets {
            sinks: &[(S::ChsAInWm, Input::Warp), (S::ChsAInEc, Input::Fm)],
            sources: &[
                (S::ChsAOutX, Output::X),
                (S::ChsAOutY, Output::Y),
                (S::ChsAOutZ, Output::Z),
            ],
        },
        Sockets {
            sinks: &[(S::ChsBInWm, Input::Warp), (S::ChsBInEc, Input::Fm)],
            sources: &[
                (S::ChsBOutX, Output::X),
                (S::ChsBOutY, Output::Y),
                (S::ChsBOutZ, Output::Z),
            ],
        },
    ]
};

const VCO_SOCKETS: [Sockets<vco::Input, vco::Output>; VCOS] = {
    use vco::{Input, Output};
    [
        Sockets {
            sinks: &[
                (S::VcoAInFm, Input::Fm),
                (S::VcoAInPw, Input::Pwm),
                (S::VcoAInSh, Input::Pll),
                (S::VcoAInAm, Input::Am),
                (S::VcoAInEc, Input::Detune),
            ],
            sources: &[(S::VcoAOut, Output::Main)],
        },
        Sockets {
            sinks: &[
                (S::VcoBInFm, Input::Fm),
                (S::VcoBInPw, Input::Pwm),
                (S::VcoBInSh, Input::Pll),
                (S::VcoBInAm, Input::Am),
                (S::VcoBInEc, Input::Detune),
            ],
            sources: &[(S::VcoBOut, Output::Main)],
        },
        Sockets {
            sinks: &[
                (S::VcoCInFm, Input::Fm),
                (S::VcoCInPw, Input::Pwm),
                (S::VcoCInSh, Input::Pll),
                (S::VcoCInAm, Input::Am),
                (S::VcoCInEc, Input::Detune),
            ],
            sources: &[(S::VcoCOut, Output::Main)],
        },
        Sockets {
            sinks: &[
                (S::VcoDInFm, Input::Fm),
                (S::VcoDInPw, Input::Pwm),
                (S::VcoDInSh, Input::Pll),
                (S::VcoDInAm, Input::Am),
                (S::VcoDInEc, Input::Detune),
            ],
            sources: &[(S::VcoDOut, Output::Main)],
        },
    ]
};

const VCF_SOCKETS: [Sockets<vcf::Input, vcf::Output>; 2] = {
    use vcf::{Input, Output};
    [
        Sockets {
            sinks: &[
                (S::VcfAInA, Input::A),
                (S::VcfAInB, Input::B),
                (S::VcfAInC, Input::C),
                (S::VcfACutIn, Input::Cutoff),
                (S::VcfAQIn, Input::Q),
            ],
            sources: &[
                (S::VcfAOutLp, Output::Lp),
                (S::VcfAOutBp, Output::Bp),
                (S::VcfAOutHp, Output::Hp),
            ],
        },
        Sockets {
            sinks: &[
                (S::VcfBInA, Input::A),
                (S::VcfBInB, Input::B),
                (S::VcfBInC, Input::C),
                (S::VcfBCutIn, Input::Cutoff),
                (S::VcfBQIn, Input::Q),
            ],
            sources: &[
                (S::VcfBOutLp, Output::Lp),
                (S::VcfBOutBp, Output::Bp),
                (S::VcfBOutHp, Output::Hp),
            ],
        },
    ]
};

const VCD_SOCKETS: Sockets<delay::Input, delay::Output> = {
    use delay::{Input, Output};
    Sockets {
        sinks: &[
            (S::VcdInA, Input::A),
            (S::VcdInB, Input::B),
            (S::VcdInC, Input::C),
            (S::VcdInD, Input::D),
            (S::VcdInTime, Input::Time),
            (S::VcdInFeed, Input::Feed),
        ],
        sources: &[
            (S::VcdOutA, Output::A),
            (S::VcdOutB, Output::B),
            (S::VcdOutC, Output::C),
            (S::VcdOutD, Output::D),
        ],
    }
};

const ROT_SOCKETS: Sockets<rotor::Input, rotor::Output> = {
    use rotor::{Input, Output};
    Sockets {
        sinks: &[
            (S::LcrCvL, Input::Cvx),
            (S::LcrCvC, Input::Cvy),
            (S::LcrCvR, Input::Cvz),
            (S::LcrInLA, Input::Ax),
            (S::LcrInCA, Input::Ay),
            (S::LcrInRA, Input::Az),
            (S::LcrInLB, Input::Bx),
            (S::LcrInCB, Input::By),
            (S::LcrInRB, Input::Bz),
        ],
        sources: &[
            (S::LcrOutLA, Output::Ax),
            (S::LcrOutCA, Output::Ay),
            (S::LcrOutRA, Output::Az),
            (S::LcrOutLB, Output::Bx),
            (S::LcrOutCB, Output::By),
            (S::LcrOutRB, Output::Bz),
        ],
    }
};

const SUM_SOCKETS: [Sockets<sum::Input, sum::Output>; 2] = {
    use sum::{Input, Output};
    [
        Sockets {
            sinks: &[(S::SumAInA, Input::A), (S::SumAInB, Input::B)],
            sources: &[(S::SumAOutA, Output::Sum), (S::SumAOutB, Output::Difference)],
        },
        Sockets {
            sinks: &[(S::SumBInA, Input::A), (S::SumBInB, Input::B)],
            sources: &[(S::SumBOutA, Output::Sum), (S::SumBOutB, Output::Difference)],
        },
    ]
};

const PCT_SOCKETS: Sockets<product::Input, product::Output> = Sockets {
    sinks: &[
        (S::PctInA, product::Input::A),
        (S::PctInB, product::Input::B),
        (S::PctInC, product::Input::C),
    ],
    sources: &[(S::PctOutA, product::Output::Out)],
};

const MIX_SINKS: [(S, mixer::Input); 5] = [
    (S::MixLcCv, mixer::Input::LcCv),
    (S::MixCrCv, mixer::Input::CrCv),
    (S::MixInL, mixer::Input::L),
    (S::MixInC, mixer::Input::C),
    (S::MixInR, mixer::Input::R),
];

const ENV_SOURCES: [S; ENVELOPES] = [S::EnvAOut, S::EnvBOut, S::EnvCOut, S::EnvDOut];

/// Rack modules, built but not yet wired.
struct RackModules {
    lfo: [Lfo; 2],
    snh: [SampleHold; 2],
    vca: [Vca; 2],
    chs: [ChaosMap; 2],
    vco: [Vco; VCOS],
    vcf: [Vcf; 2],
    vcd: Delay,
    rot: Rotor,
}

impl RackModules {
    fn new(alloc: &mut CellAllocator, sample_rate: f32) -> Self {
        Self {
            lfo: std::array::from_fn(|_| Lfo::new(alloc, sample_rate)),
            snh: std::array::from_fn(|_| SampleHold::new(alloc, sample_rate)),
            vca: std::array::from_fn(|_| Vca::new(alloc)),
            chs: std::array::from_fn(|_| ChaosMap::new(alloc)),
            vco: std::array::from_fn(|_| Vco::new(alloc, sample_rate)),
            vcf: std::array::from_fn(|_| Vcf::new(alloc, sample_rate)),
            vcd: Delay::new(alloc, sample_rate),
            rot: Rotor::new(alloc),
        }
    }
}

fn wire<E: Indexed>(ports: &mut [CellId], port: E, cell: CellId) {
    ports[port.index()] = cell;
}

pub struct Engine {
    sample_rate: f32,
    cells: Arc<Cells>,
    bus: Arc<ControlBus>,
    rack: Rack,
    chaos: [RackSlot; 2],
    envelopes: [Envelope; ENVELOPES],
    sums: [Sum; 2],
    product: Product,
    mixer: Mixer,
    dc_block: [DcBlocker; 2],
    bay: PatchBay,
    commands: Consumer<PatchCommand>,
}

impl Engine {
    /// Build, wire and configure an engine, returning it with the control
    /// handle that feeds it.
    pub fn new(config: EngineConfig) -> Result<(Self, ControlSurface), ConfigError> {
        config.validate()?;
        let sample_rate = config.sample_rate;

        let mut alloc = CellAllocator::new();
        let bus = Arc::new(ControlBus::allocate(&mut alloc));
        let modules = RackModules::new(&mut alloc, sample_rate);
        let envelopes = std::array::from_fn(|_| Envelope::new(&mut alloc, sample_rate));
        let sums = std::array::from_fn(|_| Sum::new(&mut alloc));
        let product = Product::new(&mut alloc);
        let mixer = Mixer::new(&mut alloc);
        let cells = alloc.finish();

        let chaos_resets = [modules.chs[0].reset_request(), modules.chs[1].reset_request()];
        let (producer, consumer) = RingBuffer::new(config.command_capacity);

        let mut engine = Self {
            sample_rate,
            cells: Arc::clone(&cells),
            bus: Arc::clone(&bus),
            rack: Rack::new(),
            chaos: [RackSlot::default(); 2],
            envelopes,
            sums,
            product,
            mixer,
            dc_block: [DcBlocker::new(config.dc_block_coefficient); 2],
            bay: PatchBay::new(),
            commands: consumer,
        };
        engine.connect_bus(modules)?;

        let surface = ControlSurface::new(cells, bus, chaos_resets, producer);
        for (pot, value) in config.pot_values()? {
            surface.set_pot(pot, value);
        }
        for (param, value) in config.param_values()? {
            surface.set_param(param, value);
        }
        for cable in &config.cables {
            engine.connect(cable.source, cable.sink)?;
        }

        let (sinks, sources) = engine.bay.bound();
        tracing::info!(
            sample_rate,
            cells = engine.cells.len(),
            rack = engine.rack.len(),
            sinks,
            sources,
            cables = config.cables.len(),
            "engine wired"
        );
        Ok((engine, surface))
    }

    /// The one-time wiring pass.
    ///
    /// Binds every control port to its pot or param cell, every socket to its
    /// port, and every rack module into the rack in category order.
    fn connect_bus(&mut self, mut m: RackModules) -> Result<(), RackError> {
        let bus = Arc::clone(&self.bus);

        for (i, env) in self.envelopes.iter_mut().enumerate() {
            let ctrl = env.controls_mut();
            for control in envelope::Control::ALL {
                wire(ctrl, *control, bus.param(Param::envelope(i, *control)));
            }
            self.bay
                .bind_source(ENV_SOURCES[i], env.outputs()[envelope::Output::Out.index()]);
        }

        for (i, unit) in m.lfo.iter_mut().enumerate() {
            let ctrl = unit.controls_mut();
            wire(ctrl, lfo::Control::Delta, bus.pot(Pot::LfoAFreq.unit(i)));
            wire(ctrl, lfo::Control::Amp, bus.pot(Pot::LfoAAm.unit(i)));
            wire(ctrl, lfo::Control::Form, bus.param(Param::LfoAForm.unit(i)));
        }
        for (i, unit) in m.snh.iter_mut().enumerate() {
            wire(
                unit.controls_mut(),
                sample_and_hold::Control::Time,
                bus.pot(Pot::SnhA.unit(i)),
            );
        }
        for (i, unit) in m.vca.iter_mut().enumerate() {
            wire(unit.controls_mut(), vca::Control::Amp, bus.pot(Pot::VcaA.unit(i)));
        }
        for (i, unit) in m.chs.iter_mut().enumerate() {
            let ctrl = unit.controls_mut();
            wire(ctrl, chaos::Control::Tune, bus.pot(Pot::ChsATune.unit(i)));
            wire(ctrl, chaos::Control::Warp, bus.pot(Pot::ChsAWarp.unit(i)));
            wire(ctrl, chaos::Control::Amp, bus.pot(Pot::ChsAAmp.unit(i)));
            wire(ctrl, chaos::Control::Form, bus.param(Param::ChsAForm.unit(i)));
        }
        for (i, unit) in m.vco.iter_mut().enumerate() {
            let ctrl = unit.controls_mut();
            wire(ctrl, vco::Control::Octave, bus.param(Param::VcoAOct.unit(i)));
            wire(ctrl, vco::Control::Detune, bus.pot(Pot::VcoAFine.unit(i)));
            wire(ctrl, vco::Control::Pll, bus.pot(Pot::VcoAWarp.unit(i)));
            wire(ctrl, vco::Control::Am, bus.pot(Pot::VcoAAm.unit(i)));
            wire(ctrl, vco::Control::Pwm, bus.pot(Pot::VcoAPw.unit(i)));
            wire(ctrl, vco::Control::Fm, bus.pot(Pot::VcoAFm.unit(i)));
            wire(ctrl, vco::Control::Amp, bus.pot(Pot::VcoAAmp.unit(i)));
            wire(ctrl, vco::Control::Form, bus.param(Param::VcoAForm.unit(i)));
            wire(ctrl, vco::Control::Freerun, bus.param(Param::VcoAFreerun.unit(i)));
            // each oscillator is gated by the envelope of the same letter
            let env = self.envelopes[i].outputs()[envelope::Output::Out.index()];
            wire(unit.inputs_mut(), vco::Input::Env, env);
        }
        for (i, unit) in m.vcf.iter_mut().enumerate() {
            let ctrl = unit.controls_mut();
            wire(ctrl, vcf::Control::Cutoff, bus.pot(Pot::VcfACut.unit(i)));
            wire(ctrl, vcf::Control::Q, bus.pot(Pot::VcfARes.unit(i)));
        }
        let ctrl = m.vcd.controls_mut();
        wire(ctrl, delay::Control::Time, bus.pot(Pot::VcdTime));
        wire(ctrl, delay::Control::Feed, bus.pot(Pot::VcdFeed));
        let ctrl = m.rot.controls_mut();
        wire(ctrl, rotor::Control::X, bus.pot(Pot::AngleX));
        wire(ctrl, rotor::Control::Y, bus.pot(Pot::AngleY));
        wire(ctrl, rotor::Control::Z, bus.pot(Pot::AngleZ));
        let ctrl = self.mixer.controls_mut();
        wire(ctrl, mixer::Control::LcToL, bus.pot(Pot::LcToL));
        wire(ctrl, mixer::Control::CrToR, bus.pot(Pot::CrToR));

        // Rack, in category order.
        let RackModules {
            lfo,
            snh,
            vca,
            chs,
            vco,
            vcf,
            vcd,
            rot,
        } = m;
        for (module, sockets) in lfo.into_iter().zip(&LFO_SOCKETS) {
            self.mount(module, sockets)?;
        }
        for (module, sockets) in snh.into_iter().zip(&SNH_SOCKETS) {
            self.mount(module, sockets)?;
        }
        for (module, sockets) in vca.into_iter().zip(&VCA_SOCKETS) {
            self.mount(module, sockets)?;
        }
        for (i, (module, sockets)) in chs.into_iter().zip(&CHS_SOCKETS).enumerate() {
            self.chaos[i] = self.mount(module, sockets)?;
        }
        for (module, sockets) in vco.into_iter().zip(&VCO_SOCKETS) {
            self.mount(module, sockets)?;
        }
        for (module, sockets) in vcf.into_iter().zip(&VCF_SOCKETS) {
            self.mount(module, sockets)?;
        }
        self.mount(vcd, &VCD_SOCKETS)?;
        self.mount(rot, &ROT_SOCKETS)?;

        // Stages after the rack.
        for (i, sockets) in SUM_SOCKETS.iter().enumerate() {
            let outputs = self.sums[i].outputs();
            for (socket, port) in sockets.sources {
                self.bay.bind_source(*socket, outputs[port.index()]);
            }
            for (socket, port) in sockets.sinks {
                self.bay.bind_sink(*socket, Jack::input(Owner::Sum(i as u8), *port));
            }
        }
        for (socket, port) in PCT_SOCKETS.sources {
            self.bay
                .bind_source(*socket, self.product.outputs()[port.index()]);
        }
        for (socket, port) in PCT_SOCKETS.sinks {
            self.bay.bind_sink(*socket, Jack::input(Owner::Product, *port));
        }
        for (socket, port) in MIX_SINKS {
            self.bay.bind_sink(socket, Jack::input(Owner::Mixer, port));
        }

        Ok(())
    }

    /// Bind `module` into the next rack slot and its sockets to that slot.
    fn mount<M, I, O>(&mut self, module: M, sockets: &Sockets<I, O>) -> Result<RackSlot, RackError>
    where
        M: Module + 'static,
        I: Indexed,
        O: Indexed,
    {
        for (socket, port) in sockets.sources {
            self.bay.bind_source(*socket, module.outputs()[port.index()]);
        }
        let slot = self.rack.bind(Box::new(module))?;
        for (socket, port) in sockets.sinks {
            self.bay
                .bind_sink(*socket, Jack::input(Owner::Rack(slot), *port));
        }
        Ok(slot)
    }

    /// Run one sample of the pipeline.
    ///
    /// Allocates nothing and takes no locks.
    pub fn tick(&mut self) -> Frame {
        profiling::scope!("tick");

        {
            profiling::scope!("process_commands");
            while let Ok(cmd) = self.commands.pop() {
                // socket roles were checked when the command was queued
                let _ = self.apply(cmd);
            }
        }

        let cells: &Cells = &self.cells;
        {
            profiling::scope!("envelopes");
            for env in self.envelopes.iter_mut() {
                if !env.is_active() {
                    env.start();
                }
                env.process(cells);
            }
        }
        {
            profiling::scope!("rack");
            self.rack.process(cells);
        }
        {
            profiling::scope!("mix");
            for sum in self.sums.iter_mut() {
                sum.process(cells);
            }
            self.product.process(cells);
            self.mixer.process(cells);
        }

        let volume = cells.load(self.bus.pot(Pot::Volume));
        let left = cells.load(self.mixer.left()) * volume;
        let right = cells.load(self.mixer.right()) * volume;
        Frame {
            left: self.dc_block[0].process(left),
            right: self.dc_block[1].process(right),
        }
    }

    /// Fill an interleaved stereo buffer, one frame per pair.
    ///
    /// With the `tracy` feature each call ends a Tracy frame.
    pub fn render(&mut self, out: &mut [f32]) {
        for pair in out.chunks_exact_mut(2) {
            let frame = self.tick();
            pair[0] = frame.left;
            pair[1] = frame.right;
        }
        #[cfg(feature = "tracy")]
        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }
    }

    /// Reset every module and both DC blockers. Routing and controls are kept.
    pub fn reset(&mut self) {
        self.rack.reset_all();
        for env in self.envelopes.iter_mut() {
            env.reset();
        }
        for sum in self.sums.iter_mut() {
            sum.reset();
        }
        self.product.reset();
        self.mixer.reset();
        for dc in self.dc_block.iter_mut() {
            dc.reset();
        }
    }

    /// Patch a cable now, replacing whatever fed `sink`.
    pub fn connect(&mut self, source: S, sink: S) -> Result<(), PatchError> {
        self.apply(PatchCommand::Connect { source, sink })?;
        tracing::debug!(source = source.name(), sink = sink.name(), "patched");
        Ok(())
    }

    /// Point `sink` back at the sentinel.
    pub fn disconnect(&mut self, sink: S) -> Result<(), PatchError> {
        self.apply(PatchCommand::Disconnect { sink })?;
        tracing::debug!(sink = sink.name(), "unpatched");
        Ok(())
    }

    fn apply(&mut self, cmd: PatchCommand) -> Result<(), PatchError> {
        match cmd {
            PatchCommand::Connect { source, sink } => {
                let (cell, jack) = self.bay.route(source, sink)?;
                *self.port_mut(jack).ok_or(PatchError::NotASink(sink))? = cell;
                self.bay.record(sink, Some(source));
            }
            PatchCommand::Disconnect { sink } => {
                let jack = self.bay.sink(sink).ok_or(PatchError::NotASink(sink))?;
                *self.port_mut(jack).ok_or(PatchError::NotASink(sink))? = CellId::SENTINEL;
                self.bay.record(sink, None);
            }
        }
        Ok(())
    }

    fn module(&self, owner: Owner) -> Option<&dyn Module> {
        match owner {
            Owner::Rack(slot) => self.rack.get(slot),
            Owner::Sum(i) => self.sums.get(i as usize).map(|m| m as &dyn Module),
            Owner::Product => Some(&self.product as &dyn Module),
            Owner::Mixer => Some(&self.mixer as &dyn Module),
        }
    }

    fn module_mut(&mut self, owner: Owner) -> Option<&mut (dyn Module + 'static)> {
        match owner {
            Owner::Rack(slot) => self.rack.get_mut(slot),
            Owner::Sum(i) => self
                .sums
                .get_mut(i as usize)
                .map(|m| m as &mut (dyn Module + 'static)),
            Owner::Product => Some(&mut self.product as &mut (dyn Module + 'static)),
            Owner::Mixer => Some(&mut self.mixer as &mut (dyn Module + 'static)),
        }
    }

    fn port(&self, jack: Jack) -> Option<CellId> {
        let module = self.module(jack.owner)?;
        let ports = match jack.group {
            PortGroup::Control => module.controls(),
            PortGroup::Input => module.inputs(),
        };
        ports.get(jack.index as usize).copied()
    }

    fn port_mut(&mut self, jack: Jack) -> Option<&mut CellId> {
        self.module_mut(jack.owner)?
            .ports_mut(jack.group)
            .get_mut(jack.index as usize)
    }

    /// Current value at a socket: the cell a source publishes, or the cell a
    /// sink's port currently reads.
    pub fn read(&self, socket: S) -> Option<f32> {
        let cell = match self.bay.source(socket) {
            Some(cell) => cell,
            None => self.port(self.bay.sink(socket)?)?,
        };
        Some(self.cells.load(cell))
    }

    /// Cell a sink socket's port currently points at.
    pub fn sink_cell(&self, sink: S) -> Option<CellId> {
        self.port(self.bay.sink(sink)?)
    }

    pub fn source_cell(&self, source: S) -> Option<CellId> {
        self.bay.source(source)
    }

    /// Source currently feeding `sink`.
    pub fn patched_from(&self, sink: S) -> Option<S> {
        self.bay.patched_from(sink)
    }

    pub fn cables(&self) -> Vec<Cable> {
        self.bay.cables().collect()
    }

    /// Every control and input handle of every module.
    pub fn port_cells(&self) -> Vec<CellId> {
        let rack = self.rack.iter();
        let stages = self
            .envelopes
            .iter()
            .map(|m| m as &dyn Module)
            .chain(self.sums.iter().map(|m| m as &dyn Module))
            .chain([&self.product as &dyn Module, &self.mixer as &dyn Module]);
        rack.chain(stages)
            .flat_map(|m| m.controls().iter().chain(m.inputs()).copied())
            .collect()
    }

    /// Rack slot of a chaos map.
    pub fn chaos_slot(&self, unit: ChaosUnit) -> RackSlot {
        self.chaos[unit.index()]
    }

    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    pub fn cells(&self) -> &Arc<Cells> {
        &self.cells
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
