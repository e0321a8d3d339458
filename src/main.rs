//! Benchmark CLI for the block-sparse LU factorization.
//!
//! Generates the structural matrix, factorizes it under the selected
//! schedule(s), verifies each result against the sequential reference, and
//! reports PASS/FAIL with the RMS error. Exit status: 0 on PASS, 1 on a
//! verification mismatch, 2 on invalid configuration, 101 on allocation
//! failure.

use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};

use sparselu::error::{Error, Result};
use sparselu::grid::BlockGrid;
use sparselu::verify::{self, Verification};
use sparselu::{factorize, matgen, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScheduleArg {
    /// Phase-synchronized fork-join schedule.
    Barrier,
    /// Fine-grained dependency-tracked schedule.
    Dependency,
    /// Run both schedules and verify each.
    Both,
}

impl ScheduleArg {
    fn strategies(self) -> &'static [Strategy] {
        match self {
            ScheduleArg::Barrier => &[Strategy::Barrier],
            ScheduleArg::Dependency => &[Strategy::Dependency],
            ScheduleArg::Both => &[Strategy::Barrier, Strategy::Dependency],
        }
    }
}

/// Block-sparse LU factorization benchmark.
#[derive(Debug, Parser)]
#[command(name = "sparselu", version, about)]
struct Args {
    /// Blocks per matrix dimension.
    #[arg(long, default_value_t = 16)]
    blocks: usize,

    /// Elements per block dimension.
    #[arg(long, default_value_t = 8)]
    block_size: usize,

    /// Seed of the deterministic value stream.
    #[arg(long, default_value_t = matgen::DEFAULT_SEED)]
    seed: u32,

    /// Scheduling strategy to run.
    #[arg(long, value_enum, default_value_t = ScheduleArg::Both)]
    schedule: ScheduleArg,

    /// Worker threads (0 uses the pool's default).
    #[cfg(feature = "rayon")]
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// RMS tolerance for verification.
    #[arg(long, default_value_t = verify::DEFAULT_TOLERANCE)]
    tolerance: f64,
}

fn run_strategy(
    initial: &BlockGrid,
    reference: &BlockGrid,
    strategy: Strategy,
    tolerance: f64,
) -> Result<Verification> {
    let mut grid = initial.clone();
    let start = Instant::now();
    factorize(&mut grid, strategy)?;
    let elapsed = start.elapsed();
    log::info!(
        "{} schedule factorized in {:.3?} ({} blocks allocated)",
        strategy.name(),
        elapsed,
        grid.allocated()
    );
    Ok(verify::compare(&grid, reference, tolerance))
}

fn run(args: &Args) -> Result<()> {
    let initial = matgen::generate(args.blocks, args.block_size, args.seed)?;
    println!(
        "matrix: {} x {} ({} x {} blocks of {} x {})",
        args.blocks * args.block_size,
        args.blocks * args.block_size,
        args.blocks,
        args.blocks,
        args.block_size,
        args.block_size
    );

    let mut reference = initial.clone();
    verify::reference_factorize(&mut reference)?;

    let mut failed: Option<Error> = None;
    for &strategy in args.schedule.strategies() {
        let outcome = run_strategy(&initial, &reference, strategy, args.tolerance)?;
        println!(
            "{:<12} {} (RMS error: {:.2e})",
            strategy.name(),
            if outcome.pass() { "PASS" } else { "FAIL" },
            outcome.rms
        );
        if let Err(err) = outcome.into_result() {
            failed = Some(err);
        }
    }
    match failed {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    #[cfg(feature = "rayon")]
    if args.threads > 0 {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
        {
            eprintln!("Error: could not build thread pool: {}", err);
            return ExitCode::from(2);
        }
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
