use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use peg_solver::arena::DEFAULT_ARENA_CAPACITY;
use peg_solver::engine::Configuration;
use peg_solver::solver::{
    solve, Goal, SearchConfig, SearchOutcome, SearchStatus, DEFAULT_PROGRESS_INTERVAL,
};
use peg_solver::utils::parse_configuration;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("start_source")
        .required(true)
        .args(["start", "start_file", "random"]),
))]
struct Args {
    /// Start board: `0b` binary, decimal bits, or rows separated by `/`
    #[arg(short, long)]
    start: Option<String>,

    /// Path to a file holding the start board (one row per line)
    #[arg(long)]
    start_file: Option<PathBuf>,

    /// Build the start board by playing this many random moves from a full board with one hole
    #[arg(long)]
    random: Option<usize>,

    /// Seed used with --random
    #[arg(long, default_value_t = 514514)]
    seed: u64,

    /// Target board to search for, in the same formats as --start
    #[arg(short, long, conflicts_with = "target_file")]
    target: Option<String>,

    /// Path to a file holding the target board
    #[arg(long)]
    target_file: Option<PathBuf>,

    /// Stop once a board with at most this many marbles is found [default: 1]
    #[arg(long)]
    threshold: Option<u32>,

    /// Maximum number of nodes held by the search arena at once
    #[arg(long, default_value_t = DEFAULT_ARENA_CAPACITY)]
    capacity: usize,

    /// Log progress every N checked states (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
    .target(env_logger::Target::Stderr)
    .init();
}

fn read_board_file(path: &Path) -> Result<Configuration> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    parse_configuration(&content)
        .with_context(|| format!("Invalid board in {}", path.display()))
}

fn read_board_arg(value: &str) -> Result<Configuration> {
    parse_configuration(value).with_context(|| format!("Invalid board '{}'", value))
}

fn read_start(args: &Args) -> Result<Configuration> {
    if let Some(value) = &args.start {
        return read_board_arg(value);
    }
    if let Some(path) = &args.start_file {
        return read_board_file(path);
    }
    match args.random {
        Some(moves) => Ok(Configuration::random_playout(args.seed, moves)),
        None => anyhow::bail!("a start board is required"),
    }
}

fn read_target(args: &Args) -> Result<Option<Configuration>> {
    if let Some(value) = &args.target {
        return read_board_arg(value).map(Some);
    }
    args.target_file
        .as_deref()
        .map(read_board_file)
        .transpose()
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn print_report(goal: &Goal, outcome: &SearchOutcome) {
    match (outcome.status, goal) {
        (SearchStatus::Solved, Goal::Threshold(_)) => println!(
            "Found a solution with only {} marble{} remaining!",
            outcome.best_count,
            plural(outcome.best_count)
        ),
        (SearchStatus::Solved, Goal::Target(_)) => println!("Found the target configuration!"),
        (SearchStatus::Exhausted, Goal::Threshold(threshold)) => println!(
            "Exhausted all child states; could not find a solution with {} marble{}{}.",
            threshold,
            plural(*threshold),
            if *threshold == 1 { "" } else { " or less" }
        ),
        (SearchStatus::Exhausted, Goal::Target(_)) => {
            println!("Exhausted all child states; the target configuration is not reachable.")
        }
    }

    println!(
        "\nBest state: {} marble{} (bits {:#b})\n{}\n",
        outcome.best_count,
        plural(outcome.best_count),
        outcome.best.bits(),
        outcome.best
    );

    if outcome.chain.is_empty() {
        println!("No improving state was found; there is no solution chain.");
    } else {
        println!(
            "Solution chain ({} states, {} moves):",
            outcome.chain.len(),
            outcome.chain.move_count()
        );
        let moves = outcome.chain.moves();
        if moves.is_none() {
            log::warn!("Solution chain has a step that is not a single move");
        }
        for (i, config) in outcome.chain.iter().enumerate() {
            match moves.as_deref() {
                _ if i == 0 => println!("[0] start, {} marbles", config.marble_count()),
                Some(moves) => {
                    println!("[{}] move {}, {} marbles", i, moves[i - 1], config.marble_count())
                }
                None => println!("[{}] {} marbles", i, config.marble_count()),
            }
            println!("{}\n", config);
        }
    }

    println!(
        "Info: Checked {} states. Generated {} states. Max arena length {}.",
        outcome.stats.checked, outcome.stats.generated, outcome.stats.max_arena_len
    );
}

fn run(args: &Args) -> Result<()> {
    let start = read_start(args)?;
    let target = read_target(args)?;
    let goal = Goal::from_options(target, args.threshold)?;
    let config = SearchConfig::default()
        .with_goal(goal)
        .with_arena_capacity(args.capacity)
        .with_progress_interval(args.progress_every);

    println!("Initial board state ({} marbles):\n{}\n", start.marble_count(), start);
    if let Goal::Target(target) = goal {
        println!("Target board state ({} marbles):\n{}\n", target.marble_count(), target);
    }

    let outcome = solve(start, config).context("Search aborted")?;
    print_report(&goal, &outcome);
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(&args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}
