//! Engine and optimizer benchmarks.
//!
//! Compares the decision-diagram engine against the word-table engine on the
//! same random formulas, measures sifting, and runs whole optimization schedules.
//!
//! Run with:
//! ```bash
//! cargo bench --bench engine
//! ```

use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use transduction_rs::aig::Aig;
use transduction_rs::bdd::Bdd;
use transduction_rs::config::{EngineConfig, EngineKind, Params};
use transduction_rs::engine::{Engine, Func};
use transduction_rs::signal::Signal;
use transduction_rs::transduction::{transduce, Strategy};
use transduction_rs::truth_table::TruthTable;

// ============================================================================
// Helpers
// ============================================================================

/// Build a random formula out of `num_ops` AND/OR/XOR steps and return every intermediate result.
fn build_random_formula<E: Engine>(engine: &Rc<E>, num_ops: usize, seed: u64) -> Vec<Func<E>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut nodes: Vec<Func<E>> = (0..engine.num_vars())
        .map(|v| Func::var(engine, v).not_cond(rng.random_bool(0.5)))
        .collect();
    for _ in 0..num_ops {
        let a = &nodes[rng.random_range(0..nodes.len())];
        let b = &nodes[rng.random_range(0..nodes.len())];
        let r = match rng.random_range(0..3) {
            0 => a.and(b),
            1 => a.or(b),
            _ => a.xor(b),
        };
        nodes.push(r);
    }
    nodes
}

fn new_engine<E: Engine>(num_vars: usize) -> Rc<E> {
    let engine = Rc::new(E::new(num_vars, &EngineConfig::default()).unwrap());
    engine.turn_on_ref();
    engine
}

fn random_aig(seed: u64, inputs: usize, gates: usize, outputs: usize) -> Aig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut aig = Aig::new(inputs);
    let mut signals: Vec<Signal> = (0..inputs).map(|k| aig.input(k)).collect();
    for _ in 0..gates {
        let a = signals[rng.random_range(0..signals.len())].not_cond(rng.random_bool(0.5));
        let b = signals[rng.random_range(0..signals.len())].not_cond(rng.random_bool(0.5));
        let s = aig.and(a, b);
        signals.push(s);
    }
    for k in 0..outputs {
        let s = signals[signals.len() - 1 - k];
        aig.add_output(s.not_cond(rng.random_bool(0.5)));
    }
    aig.cleanup()
}

// ============================================================================
// Benchmark: random formulas on both engines
// ============================================================================

fn bench_random_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/random_formula");

    let num_ops = 500;
    group.throughput(Throughput::Elements(num_ops as u64));

    for num_vars in [8, 12, 16] {
        group.bench_with_input(BenchmarkId::new("bdd", num_vars), &num_vars, |b, &num_vars| {
            b.iter(|| {
                let bdd = new_engine::<Bdd>(num_vars);
                build_random_formula(&bdd, num_ops, 42).len()
            });
        });
        group.bench_with_input(BenchmarkId::new("truth_table", num_vars), &num_vars, |b, &num_vars| {
            b.iter(|| {
                let tt = new_engine::<TruthTable>(num_vars);
                build_random_formula(&tt, num_ops, 42).len()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: sifting
// ============================================================================

fn bench_sifting(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/sifting");
    group.sample_size(10);

    for num_vars in [10, 14] {
        group.bench_with_input(BenchmarkId::new("sift_all", num_vars), &num_vars, |b, &num_vars| {
            b.iter(|| {
                let bdd = new_engine::<Bdd>(num_vars);
                let roots = build_random_formula(&bdd, 300, 7);
                let stats = bdd.sift_all_variables();
                (roots.len(), stats.final_size)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: optimization schedules
// ============================================================================

fn bench_transduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("transduction/schedule");
    group.sample_size(10);

    let aig = random_aig(1, 10, 300, 8);
    let strategies = [
        ("cspf", Strategy::Cspf),
        ("mspf", Strategy::Mspf),
        ("resub", Strategy::Resub { mspf: false }),
        ("resub_mono", Strategy::ResubMono { mspf: false }),
    ];

    for engine in [EngineKind::DecisionDiagram, EngineKind::WordTable] {
        let params = Params::default().with_engine(engine).with_verbosity(0);
        for (name, strategy) in strategies {
            group.bench_with_input(BenchmarkId::new(name, format!("{:?}", engine)), &strategy, |b, &strategy| {
                b.iter(|| transduce(&aig, None, &params, strategy).unwrap().1);
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_random_formula, bench_sifting, bench_transduction);
criterion_main!(benches);
