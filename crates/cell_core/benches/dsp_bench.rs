//! Criterion benchmarks for cell_core
//!
//! Run with: cargo bench -p cell_core
//!
//! Measures single chaos maps per variant and the full engine tick, idle and
//! with a dense patch, to establish baselines and detect regressions.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cell_core::cell::CellAllocator;
use cell_core::dsp::chaos::{ChaosMap, Control, Output};
use cell_core::{Engine, EngineConfig, Indexed, Module, Socket, Variant};

const FRAMES_PER_ITER: u64 = 480; // 10ms worth

/// Cables exercising every stage of the pipeline.
const DENSE_PATCH: &[(Socket, Socket)] = &[
    (Socket::LfoAOutA, Socket::ChsAInWm),
    (Socket::LfoBOutA, Socket::ChsBInEc),
    (Socket::ChsAOutX, Socket::VcoAInFm),
    (Socket::ChsAOutY, Socket::VcoBInPw),
    (Socket::ChsBOutZ, Socket::VcoCInAm),
    (Socket::VcoAOut, Socket::VcfAInA),
    (Socket::VcoBOut, Socket::VcfAInB),
    (Socket::VcoCOut, Socket::VcfBInA),
    (Socket::VcoDOut, Socket::VcfBInB),
    (Socket::SnhAOut, Socket::VcfACutIn),
    (Socket::VcfAOutLp, Socket::VcdInA),
    (Socket::VcfBOutBp, Socket::VcdInB),
    (Socket::VcdOutA, Socket::LcrInLA),
    (Socket::VcdOutB, Socket::LcrInRA),
    (Socket::ChsBOutX, Socket::LcrCvL),
    (Socket::LcrOutLA, Socket::SumAInA),
    (Socket::LcrOutRA, Socket::SumAInB),
    (Socket::SumAOutA, Socket::PctInA),
    (Socket::EnvAOut, Socket::PctInB),
    (Socket::PctOutA, Socket::MixInL),
    (Socket::SumAOutB, Socket::MixInR),
    (Socket::VcfBOutHp, Socket::MixInC),
];

fn engine(cables: &[(Socket, Socket)]) -> Engine {
    let (mut engine, _surface) = Engine::new(EngineConfig::default()).unwrap();
    for (source, sink) in cables {
        engine.connect(*source, *sink).unwrap();
    }
    engine
}

// ============================================================================
// Chaos Map Benchmarks
// ============================================================================

fn bench_chaos(c: &mut Criterion) {
    let mut group = c.benchmark_group("chaos");
    group.throughput(Throughput::Elements(FRAMES_PER_ITER));

    for variant in Variant::ALL {
        let mut alloc = CellAllocator::new();
        let mut chaos = ChaosMap::new(&mut alloc);
        let controls = [
            (Control::Tune, 0.3),
            (Control::Warp, 0.2),
            (Control::Amp, 1.0),
            (Control::Form, variant.index() as f32),
        ];
        for (control, value) in controls {
            chaos.controls_mut()[control.index()] = alloc.alloc(value);
        }
        let cells = alloc.finish();
        chaos.reset_request().request();
        let x = chaos.output(Output::X);

        group.bench_function(BenchmarkId::new("process", variant.name()), |b| {
            b.iter(|| {
                for _ in 0..FRAMES_PER_ITER {
                    chaos.process(&cells);
                }
                black_box(cells.load(x))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Engine Benchmarks
// ============================================================================

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(FRAMES_PER_ITER));

    for (name, cables) in [("idle", &[][..]), ("dense", DENSE_PATCH)] {
        let mut engine = engine(cables);
        group.bench_function(BenchmarkId::new("tick", name), |b| {
            b.iter(|| {
                for _ in 0..FRAMES_PER_ITER {
                    black_box(engine.tick());
                }
            })
        });
    }

    let mut engine = engine(DENSE_PATCH);
    let mut buf = vec![0.0f32; FRAMES_PER_ITER as usize * 2];
    group.bench_function("render", |b| {
        b.iter(|| {
            engine.render(&mut buf);
            black_box(buf[0])
        })
    });

    group.finish();
}

criterion_group!(benches, bench_chaos, bench_engine);
criterion_main!(benches);
