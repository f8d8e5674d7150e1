//! Chaotic attractor integrator.
//!
//! Four three-dimensional systems, each advanced by one explicit Euler step per
//! tick. The step size comes from `tune` (plus `fm`), one system coefficient
//! comes from `warp`, and `form` selects the system when a reset is requested.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::cell::{CellAllocator, CellId, Cells};
use crate::types::{Indexed, Module, ModuleKind, PortTable, port_tables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Control {
    Tune,
    Warp,
    Amp,
    Form,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Input {
    Warp,
    Fm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Indexed)]
pub enum Output {
    X,
    Y,
    Z,
}

/// A variant-switch request crossing from the control thread to the audio thread.
///
/// One writer, one reader. A request is observed by exactly one `take`, and a
/// request made while another is pending replaces it. A request can name its
/// variant, so what is latched never depends on when `form` was written.
#[derive(Debug, Default)]
pub struct ResetRequest(AtomicU8);

/// What a taken [`ResetRequest`] latches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Latch {
    /// Read the `form` control at the time of the reset.
    Form,
    Variant(Variant),
}

const IDLE: u8 = 0;
const FROM_FORM: u8 = 1;
const FIRST_VARIANT: u8 = 2;

impl ResetRequest {
    pub fn new() -> Self {
        Self(AtomicU8::new(IDLE))
    }

    /// Reset and latch whatever `form` reads when the request is taken.
    pub fn request(&self) {
        self.0.store(FROM_FORM, Ordering::Release);
    }

    /// Reset into `variant`.
    pub fn request_variant(&self, variant: Variant) {
        self.0
            .store(FIRST_VARIANT + variant.index() as u8, Ordering::Release);
    }

    /// Clears the request, returning what it latches if one was pending.
    pub fn take(&self) -> Option<Latch> {
        match self.0.swap(IDLE, Ordering::AcqRel) {
            IDLE => None,
            FROM_FORM => Some(Latch::Form),
            code => Variant::from_index((code - FIRST_VARIANT) as usize).map(Latch::Variant),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire) != IDLE
    }
}

/// A point in phase space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True when every coordinate has left the representable range (inf or NaN).
    pub fn diverged(&self) -> bool {
        !self.x.is_finite() && !self.y.is_finite() && !self.z.is_finite()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// `dt = (tune + fm * fm_depth) * time_scale + floor`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepLaw {
    pub fm_depth: f32,
    pub time_scale: f32,
    pub floor: f32,
}

impl StepLaw {
    #[inline]
    pub fn dt(&self, tune: f32, fm: f32) -> f32 {
        (tune + fm * self.fm_depth) * self.time_scale + self.floor
    }
}

/// `coef = (w + pre) * gain + base`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpLaw {
    pub pre: f32,
    pub gain: f32,
    pub base: f32,
}

impl WarpLaw {
    #[inline]
    pub fn coefficient(&self, w: f32) -> f32 {
        (w + self.pre) * self.gain + self.base
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Indexed,
)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Sprott's four-coefficient system; warp sets `c`.
    #[default]
    Sprott,
    /// Helmholtz oscillator; warp sets the damping `delta`.
    Helmholtz,
    /// Halvorsen's cyclically symmetric attractor; warp sets `a`.
    Halvorsen,
    /// Three-scroll unified chaotic system; warp sets `e`.
    Tsucs,
}

/// Control ranges over which every variant stays bounded indefinitely.
///
/// Below `tune = 0.1` a negative `fm` can reverse time for the dissipative
/// systems, and a large `warp` with a long step drives Sprott unstable.
pub const NOMINAL_TUNE: RangeInclusive<f32> = 0.1..=1.0;
pub const NOMINAL_WARP: RangeInclusive<f32> = 0.0..=0.5;
pub const NOMINAL_FM: RangeInclusive<f32> = -1.0..=1.0;

const SPROTT_A: f32 = 0.8;
const SPROTT_B: f32 = 0.5;
const SPROTT_D: f32 = 1.0;

const HELMHOLTZ_GAMMA: f32 = 5.11;

const TSUCS_A: f32 = 40.0;
const TSUCS_B: f32 = 0.5;
const TSUCS_C: f32 = 20.0;
const TSUCS_D: f32 = 0.833;

impl Variant {
    /// Round a form control to a variant, clamping out-of-range values.
    pub fn from_control(form: f32) -> Self {
        let index = form.round().max(0.0) as usize;
        Self::ALL[index.min(Self::COUNT - 1)]
    }

    /// Safe starting point the registers are reset to.
    pub fn origin(self) -> Point {
        match self {
            Variant::Sprott => Point::new(0.1, 0.1, 0.1),
            Variant::Helmholtz => Point::new(0.1, 0.1, 0.1),
            Variant::Halvorsen => Point::new(0.1, 0.0, 0.0),
            Variant::Tsucs => Point::new(1.0, 1.0, 1.0),
        }
    }

    pub fn step_law(self) -> StepLaw {
        match self {
            Variant::Sprott => StepLaw {
                fm_depth: 0.1,
                time_scale: 0.2,
                floor: 0.0001,
            },
            Variant::Helmholtz => StepLaw {
                fm_depth: 0.1,
                time_scale: 0.2,
                floor: 0.01,
            },
            Variant::Halvorsen => StepLaw {
                fm_depth: 0.01,
                time_scale: 0.02,
                floor: 0.00001,
            },
            Variant::Tsucs => StepLaw {
                fm_depth: 0.01,
                time_scale: 0.01,
                floor: 0.00001,
            },
        }
    }

    pub fn warp_law(self) -> WarpLaw {
        match self {
            Variant::Sprott => WarpLaw {
                pre: 0.0,
                gain: 1.0,
                base: 0.1,
            },
            Variant::Helmholtz => WarpLaw {
                pre: -0.5,
                gain: 0.03,
                base: 0.55,
            },
            Variant::Halvorsen => WarpLaw {
                pre: 0.0,
                gain: 1.0,
                base: 1.4,
            },
            Variant::Tsucs => WarpLaw {
                pre: 0.0,
                gain: 0.125,
                base: 0.55,
            },
        }
    }

    /// Output normalisation to roughly unit amplitude.
    pub fn scale(self) -> f32 {
        match self {
            Variant::Sprott => 0.4,
            Variant::Helmholtz => 3.0,
            Variant::Halvorsen => 0.5,
            Variant::Tsucs => 0.05,
        }
    }

    /// Added to each register before scaling.
    pub fn offset(self) -> Point {
        match self {
            Variant::Tsucs => Point::new(0.0, 0.0, -45.0),
            _ => Point::default(),
        }
    }

    /// One Euler step of this variant's equations. Each coordinate update
    /// sees the coordinates already updated this step.
    #[inline]
    pub fn step(self, p: &mut Point, dt: f32, coef: f32) {
        match self {
            Variant::Sprott => {
                let c = coef;
                p.x += dt * p.y * SPROTT_A;
                p.y += dt * (-p.y * p.z - p.x);
                p.z += dt * (SPROTT_B * p.y * p.y - c * p.x - SPROTT_D);
            }
            Variant::Helmholtz => {
                let delta = coef;
                p.x += dt * p.y;
                p.y += dt * HELMHOLTZ_GAMMA * p.z;
                p.z += dt * (-p.z - delta * p.y - p.x - p.x * p.x);
            }
            Variant::Halvorsen => {
                let a = coef;
                p.x += dt * (-a * p.x - 4.0 * p.y - 4.0 * p.z - p.y * p.y);
                p.y += dt * (-a * p.y - 4.0 * p.z - 4.0 * p.x - p.z * p.z);
                p.z += dt * (-a * p.z - 4.0 * p.x - 4.0 * p.y - p.x * p.x);
            }
            Variant::Tsucs => {
                let e = coef;
                p.x += dt * (TSUCS_A * (p.y - p.x) + TSUCS_B * p.x * p.z);
                p.y += dt * (TSUCS_C * p.y - p.x * p.z);
                p.z += dt * (TSUCS_D * p.z + p.x * p.y - e * p.x * p.x);
            }
        }
    }
}

/// The chaos map module.
///
/// The variant is latched only when a pending [`ResetRequest`] is taken, at
/// the start of `process`, either from the request itself or from the `form`
/// control. Between requests the latched variant runs every tick regardless
/// of `form`.
pub struct ChaosMap {
    ctrl: PortTable<Control>,
    inputs: PortTable<Input>,
    outputs: PortTable<Output>,
    variant: Variant,
    point: Point,
    dt: f32,
    coef: f32,
    reset: Arc<ResetRequest>,
}

impl ChaosMap {
    pub fn new(alloc: &mut CellAllocator) -> Self {
        let variant = Variant::default();
        Self {
            ctrl: PortTable::unpatched(),
            inputs: PortTable::unpatched(),
            outputs: PortTable::allocate(alloc),
            variant,
            point: variant.origin(),
            dt: 0.0,
            coef: 0.0,
            reset: Arc::new(ResetRequest::new()),
        }
    }

    /// Handle the control thread uses to request a variant switch.
    pub fn reset_request(&self) -> Arc<ResetRequest> {
        Arc::clone(&self.reset)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn set_point(&mut self, point: Point) {
        self.point = point;
    }

    /// Step size used by the last `process`.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn output(&self, port: Output) -> CellId {
        self.outputs.get(port)
    }

    fn warp_term(&self, cells: &Cells) -> f32 {
        let warp = self.ctrl.load(cells, Control::Warp);
        if self.inputs.is_unpatched(Input::Warp) {
            warp
        } else {
            warp * self.inputs.load(cells, Input::Warp).abs()
        }
    }
}

impl Module for ChaosMap {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Chaos
    }

    fn process(&mut self, cells: &Cells) {
        if let Some(latch) = self.reset.take() {
            self.variant = match latch {
                Latch::Form => Variant::from_control(self.ctrl.load(cells, Control::Form)),
                Latch::Variant(variant) => variant,
            };
            self.point = self.variant.origin();
        }

        let tune = self.ctrl.load(cells, Control::Tune);
        let fm = self.inputs.load(cells, Input::Fm);
        self.dt = self.variant.step_law().dt(tune, fm);
        self.coef = self.variant.warp_law().coefficient(self.warp_term(cells));

        self.variant.step(&mut self.point, self.dt, self.coef);

        if self.point.diverged() {
            // outputs keep last tick's values
            self.point = self.variant.origin();
            return;
        }

        let gain = self.ctrl.load(cells, Control::Amp) * self.variant.scale();
        let offset = self.variant.offset();
        self.outputs
            .store(cells, Output::X, (self.point.x + offset.x) * gain);
        self.outputs
            .store(cells, Output::Y, (self.point.y + offset.y) * gain);
        self.outputs
            .store(cells, Output::Z, (self.point.z + offset.z) * gain);
    }

    fn reset(&mut self) {
        self.point = self.variant.origin();
        self.dt = 0.0;
        self.coef = 0.0;
    }

    port_tables!();
}
