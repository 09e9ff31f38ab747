use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use transduction_rs::aig::Aig;
use transduction_rs::config::{EngineConfig, EngineKind, FaninSort, GcMode, Params};
use transduction_rs::signal::Signal;
use transduction_rs::transduction::{transduce, Strategy};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Mode {
    Cspf,
    Mspf,
    Resub,
    ResubMono,
    ResubShared,
    RepeatAll,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Sort {
    None,
    Topological,
    OneCountSingle,
    OneCountBoth,
    PseudoRandom,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of primary inputs.
    #[arg(long, value_name = "INT", default_value = "8")]
    inputs: usize,

    /// Number of random AND gates.
    #[arg(long, value_name = "INT", default_value = "200")]
    gates: usize,

    /// Number of primary outputs.
    #[arg(long, value_name = "INT", default_value = "8")]
    outputs: usize,

    /// Seed of the random circuit.
    #[arg(long, value_name = "INT", default_value = "42")]
    seed: u64,

    /// Optimization schedule.
    #[arg(long, value_enum, default_value = "repeat-all")]
    mode: Mode,

    /// Use MSPF where the schedule allows it.
    #[arg(long)]
    mspf: bool,

    /// Use the word-table engine instead of decision diagrams.
    #[arg(long)]
    word_table: bool,

    /// Fanin sorting criterion.
    #[arg(long, value_enum, default_value = "topological")]
    sort: Sort,

    /// Shuffle primary inputs with this seed.
    #[arg(long, value_name = "INT")]
    shuffle: Option<u64>,

    /// Keep the circuit depth within its initial level.
    #[arg(long)]
    level: bool,

    /// Garbage collection mode (0, 1 or 2).
    #[arg(long, value_name = "INT", default_value = "1")]
    gc: u32,

    /// Verbosity of the optimizer.
    #[arg(short, long, value_name = "INT", default_value = "1")]
    verbose: u32,
}

fn random_circuit(args: &Cli) -> Aig {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut aig = Aig::new(args.inputs);
    let mut signals: Vec<Signal> = (0..args.inputs).map(|k| aig.input(k)).collect();
    for _ in 0..args.gates {
        // Prefer recent signals so the circuit gets some depth.
        let lo = signals.len().saturating_sub(4 * args.inputs);
        let a = signals[rng.random_range(lo..signals.len())].not_cond(rng.random_bool(0.5));
        let b = signals[rng.random_range(0..signals.len())].not_cond(rng.random_bool(0.5));
        let s = aig.and(a, b);
        signals.push(s);
    }
    for k in 0..args.outputs {
        let s = signals[signals.len() - 1 - k % signals.len()];
        aig.add_output(s.not_cond(rng.random_bool(0.5)));
    }
    aig.cleanup()
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let aig = random_circuit(&args);
    println!(
        "circuit: {} inputs, {} outputs, {} ands, depth {}",
        aig.num_inputs(),
        aig.num_outputs(),
        aig.num_ands(),
        aig.depth()
    );

    let gc_mode = GcMode::from_level(args.gc).ok_or_else(|| color_eyre::eyre::eyre!("unknown gc mode {}", args.gc))?;
    let fanin_sort = match args.sort {
        Sort::None => FaninSort::None,
        Sort::Topological => FaninSort::Topological,
        Sort::OneCountSingle => FaninSort::OneCountSingle,
        Sort::OneCountBoth => FaninSort::OneCountBoth,
        Sort::PseudoRandom => FaninSort::PseudoRandom,
    };
    let params = Params::default()
        .with_engine(if args.word_table {
            EngineKind::WordTable
        } else {
            EngineKind::DecisionDiagram
        })
        .with_engine_config(EngineConfig::default().with_gc_mode(gc_mode))
        .with_fanin_sort(fanin_sort)
        .with_pi_shuffle_seed(args.shuffle)
        .with_level_aware(args.level)
        .with_verbosity(args.verbose);

    let mspf = args.mspf;
    let strategy = match args.mode {
        Mode::Cspf => Strategy::Cspf,
        Mode::Mspf => Strategy::Mspf,
        Mode::Resub => Strategy::Resub { mspf },
        Mode::ResubMono => Strategy::ResubMono { mspf },
        Mode::ResubShared => Strategy::ResubShared { mspf },
        Mode::RepeatAll => Strategy::RepeatAll {
            first_merge: true,
            mspf_merge: mspf,
            mspf_resub: mspf,
            inner: true,
            outer: true,
        },
    };
    println!("strategy = {:?}", strategy);

    let time_optimize = std::time::Instant::now();
    let (optimized, delta) = transduce(&aig, None, &params, strategy)?;
    println!("optimized in {:.3} s", time_optimize.elapsed().as_secs_f64());
    println!(
        "result: {} ands (was {}), depth {} (was {}), wire delta {}",
        optimized.num_ands(),
        aig.num_ands(),
        optimized.depth(),
        aig.depth(),
        delta
    );

    if args.inputs <= 16 {
        let mut mismatches = 0;
        for bits in 0..1u32 << args.inputs {
            let v: Vec<bool> = (0..args.inputs).map(|k| bits >> k & 1 != 0).collect();
            if aig.evaluate(&v) != optimized.evaluate(&v) {
                mismatches += 1;
            }
        }
        println!("exhaustive check: {} mismatches", mismatches);
    }

    println!("\nAll done in {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
