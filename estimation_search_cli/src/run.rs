//! Dispatches a parsed [`Cli`] to the selected engine or driver, printing the
//! found plan and statistics — mirroring `tsalign/src/align.rs`'s
//! `execute_with_alphabet` dispatch function.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estimation_search::EngineConfig;
use estimation_search::clock::SystemClock;
use estimation_search::drivers::{anytime_beauty, iterated_sync};
use estimation_search::engines::SearchStatus;
use estimation_search::engines::beauty::BeautyEngine;
use estimation_search::engines::synchronic::SynchronicEngine;
use estimation_search::open_list::EstimatedGOpenList;
use estimation_search::task::{EstimatedGEvaluator, NoPruning};
use log::{LevelFilter, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use crate::graph::{DagTask, GraphFile};

#[derive(Parser)]
pub struct Cli {
    /// Verbosity of the terminal logger.
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// A TOML file describing the weighted DAG to search (`initial`, `goal`,
    /// `edges`).
    graph: PathBuf,

    /// A TOML file with an `EngineConfig`. Defaults omitted options to
    /// `EngineConfig::default()`.
    #[clap(long, short = 'c')]
    config: Option<PathBuf>,

    /// Seeds the Stochastic ladder's RNG, for reproducible demo runs.
    #[clap(long, default_value_t = 0)]
    seed: u64,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the Beauty engine once.
    Beauty,
    /// Run the SynchronicEstimationSearch engine once.
    Synchronic,
    /// Run the IteratedSync driver.
    IteratedSync,
    /// Run the AnytimeBeauty driver.
    AnytimeBeauty,
}

pub fn cli(cli: Cli) -> Result<i32> {
    TermLogger::init(
        cli.log_level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("initialising terminal logger")?;

    let graph = GraphFile::load(&cli.graph)?;
    let task = DagTask::from_file(graph);

    let cfg = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading engine config {path:?}"))?;
            toml::from_str(&text).with_context(|| format!("parsing engine config {path:?}"))?
        }
        None => EngineConfig::default(),
    };

    info!("Conducting search over {:?} with mode {}", cli.graph, mode_name(&cli.mode));

    match cli.mode {
        Mode::Beauty => run_beauty(task, &cfg),
        Mode::Synchronic => run_synchronic(task, &cfg, cli.seed),
        Mode::IteratedSync => run_iterated_sync(task, &cfg, cli.seed),
        Mode::AnytimeBeauty => run_anytime_beauty(task, &cfg),
    }
}

fn mode_name(mode: &Mode) -> &'static str {
    match mode {
        Mode::Beauty => "beauty",
        Mode::Synchronic => "synchronic",
        Mode::IteratedSync => "iterated-sync",
        Mode::AnytimeBeauty => "anytime-beauty",
    }
}

fn run_beauty(task: DagTask, cfg: &EngineConfig) -> Result<i32> {
    let mut engine = BeautyEngine::new(task, EstimatedGEvaluator, EstimatedGOpenList::new(), NoPruning, cfg)?;
    match engine.search() {
        SearchStatus::Solved(result) => {
            println!("SOLVED plan={:?} real_g={} l_low={} l_high={} opt={}",
                result.plan, result.real_g, result.l_low, result.l_high, result.opt);
            print_statistics(engine.statistics());
            Ok(0)
        }
        SearchStatus::Failed => {
            println!("FAILED");
            print_statistics(engine.statistics());
            Ok(1)
        }
    }
}

fn run_synchronic(task: DagTask, cfg: &EngineConfig, seed: u64) -> Result<i32> {
    let rng = Box::new(SmallRng::seed_from_u64(seed));
    let mut engine = SynchronicEngine::new(
        task,
        EstimatedGEvaluator,
        EstimatedGOpenList::new(),
        NoPruning,
        SystemClock,
        rng,
        cfg,
        cfg.epsilon,
    )?;
    match engine.search() {
        SearchStatus::Solved(result) => {
            println!(
                "SOLVED plan={:?} real_g={} min_g={} max_g={} uncertainty_ratio={:.4} solved_within_epsilon={}",
                result.plan, result.real_g, result.min_g, result.max_g, result.uncertainty_ratio, result.solved_within_epsilon
            );
            print_statistics(engine.statistics());
            Ok(0)
        }
        SearchStatus::Failed => {
            println!("FAILED");
            print_statistics(engine.statistics());
            Ok(1)
        }
    }
}

fn run_iterated_sync(task: DagTask, cfg: &EngineConfig, seed: u64) -> Result<i32> {
    let rng = Box::new(SmallRng::seed_from_u64(seed));
    let result = iterated_sync::run(
        task,
        EstimatedGEvaluator,
        EstimatedGOpenList::new(),
        NoPruning,
        SystemClock,
        rng,
        cfg,
    );
    match result {
        Ok(result) => {
            println!(
                "{:?} plan={:?} real_g={} best_uncertainty_bound={:.4} iterations={}",
                result.status, result.plan, result.real_g, result.best_uncertainty_bound, result.iterations
            );
            print_statistics(&result.statistics);
            Ok(if matches!(result.status, estimation_search::drivers::DriverStatus::Solved) { 0 } else { 1 })
        }
        Err(error) => {
            eprintln!("error: {error}");
            Ok(exit_code_for(&error))
        }
    }
}

fn run_anytime_beauty(task: DagTask, cfg: &EngineConfig) -> Result<i32> {
    let result = anytime_beauty::run(task, EstimatedGEvaluator, EstimatedGOpenList::new(), NoPruning, cfg);
    match result {
        Ok(result) => {
            println!(
                "{:?} plan={:?} real_g={} l_low={} l_high={} opt={} iterations={}",
                result.status, result.plan, result.real_g, result.l_low, result.l_high, result.opt, result.iterations
            );
            print_statistics(&result.statistics);
            Ok(if matches!(result.status, estimation_search::drivers::DriverStatus::Solved) { 0 } else { 1 })
        }
        Err(error) => {
            eprintln!("error: {error}");
            Ok(exit_code_for(&error))
        }
    }
}

fn print_statistics(stats: &estimation_search::SearchStatistics) {
    println!(
        "expanded={} evaluated={} estimated_edges={} generated={} reopened={} pruned={} dead_ends={}",
        stats.expanded(),
        stats.evaluated_states(),
        stats.estimated_edges(),
        stats.generated(),
        stats.reopened(),
        stats.pruned_states(),
        stats.dead_ends(),
    );
}

/// `SEARCH_INPUT_ERROR` / `SEARCH_CRITICAL_ERROR`, Fast-Downward-style exit
/// codes distinguishing configuration errors from control-flow errors.
pub fn exit_code_for(error: &estimation_search::Error) -> i32 {
    match error {
        estimation_search::Error::EmptyEngineConfigs | estimation_search::Error::LazyEvaluatorNotCaching => 10,
        estimation_search::Error::IterationLimitExceeded { .. } => 11,
    }
}
