//! Chaos map integration tests: long-run stability over control ranges and
//! divergence recovery, driven through the public module API.

use std::sync::Arc;

use cell_core::cell::{CellAllocator, CellId, Cells};
use cell_core::dsp::chaos::{
    ChaosMap, Control, Input, NOMINAL_FM, NOMINAL_TUNE, NOMINAL_WARP, Output, Point, Variant,
};
use cell_core::{Indexed, Module};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TICKS: usize = 100_000;

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Rig {
    chaos: ChaosMap,
    cells: Arc<Cells>,
    tune: CellId,
    warp: CellId,
    fm: CellId,
    warp_cv: CellId,
}

/// A chaos map with every control and both inputs bound to their own cells,
/// switched to `variant`.
fn rig(variant: Variant) -> Rig {
    let mut alloc = CellAllocator::new();
    let mut chaos = ChaosMap::new(&mut alloc);
    let tune = alloc.alloc(0.0);
    let warp = alloc.alloc(0.0);
    let amp = alloc.alloc(1.0);
    let form = alloc.alloc(variant.index() as f32);
    let fm = alloc.alloc(0.0);
    let warp_cv = alloc.alloc(0.0);

    let ctrl = chaos.controls_mut();
    ctrl[Control::Tune.index()] = tune;
    ctrl[Control::Warp.index()] = warp;
    ctrl[Control::Amp.index()] = amp;
    ctrl[Control::Form.index()] = form;
    chaos.inputs_mut()[Input::Fm.index()] = fm;
    chaos.reset_request().request();

    Rig {
        chaos,
        cells: alloc.finish(),
        tune,
        warp,
        fm,
        warp_cv,
    }
}

fn outputs(rig: &Rig) -> [f32; 3] {
    [
        rig.cells.load(rig.chaos.output(Output::X)),
        rig.cells.load(rig.chaos.output(Output::Y)),
        rig.cells.load(rig.chaos.output(Output::Z)),
    ]
}

// ─── Bounded integration ──────────────────────────────────────────────────────

#[test]
fn registers_stay_finite_over_nominal_control_ranges() {
    let mut rng = StdRng::seed_from_u64(0x5eed_c4a0);

    for variant in Variant::ALL {
        for trial in 0..8 {
            let mut rig = rig(*variant);
            let tune: f32 = rng.gen_range(NOMINAL_TUNE);
            let warp: f32 = rng.gen_range(NOMINAL_WARP);
            let fm: f32 = rng.gen_range(NOMINAL_FM);
            rig.cells.store(rig.tune, tune);
            rig.cells.store(rig.warp, warp);
            rig.cells.store(rig.fm, fm);

            // odd trials scale warp through the input
            if trial % 2 == 1 {
                let cv: f32 = rng.gen_range(-1.0..=1.0);
                rig.cells.store(rig.warp_cv, cv);
                rig.chaos.inputs_mut()[Input::Warp.index()] = rig.warp_cv;
            }

            for tick in 0..TICKS {
                rig.chaos.process(&rig.cells);
                assert!(
                    rig.chaos.point().is_finite(),
                    "{variant:?} went non-finite at tick {tick} (tune {tune}, warp {warp}, fm {fm})"
                );
            }
            assert_eq!(rig.chaos.variant(), *variant);
            assert!(outputs(&rig).iter().all(|v| v.is_finite()));
        }
    }
}

// ─── Divergence recovery ──────────────────────────────────────────────────────

#[test]
fn forced_overflow_recovers_on_next_tick() {
    for variant in Variant::ALL {
        let mut rig = rig(*variant);
        rig.cells.store(rig.tune, 0.3);
        for _ in 0..50 {
            rig.chaos.process(&rig.cells);
        }
        let held = outputs(&rig);

        rig.chaos
            .set_point(Point::new(f32::INFINITY, f32::NEG_INFINITY, f32::NAN));
        rig.chaos.process(&rig.cells);

        assert_eq!(rig.chaos.point(), variant.origin(), "{variant:?}");
        assert_eq!(outputs(&rig), held, "{variant:?}");

        for _ in 0..1000 {
            rig.chaos.process(&rig.cells);
        }
        assert!(rig.chaos.point().is_finite(), "{variant:?}");
    }
}
