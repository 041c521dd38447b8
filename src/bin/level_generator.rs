use std::{io::Write, path::PathBuf, time::Instant};

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use itertools::Itertools;
use log::{info, warn};

use diamond_escape::{
    board::GRID_SIZE,
    generator::{Acceptance, Generated, Generator},
    level_io,
    solver::{SearchLimits, Solver},
};

/// Generates solvable puzzle levels and writes them as JSON.
#[derive(Parser)]
struct Cli {
    /// Number of levels to generate.
    #[arg(short = 'n', long = "count", default_value_t = 1)]
    count: i32,

    /// Starting level id.
    #[arg(long, default_value_t = 1)]
    start_id: i32,

    /// Combined output file name.
    #[arg(short, long, default_value = "levels.json")]
    output: String,

    /// Output directory.
    #[arg(short, long, default_value = "simulation_json")]
    dir: PathBuf,

    /// Generation retries per level before falling back.
    #[arg(short, long, default_value_t = 10)]
    retries: u32,

    /// Skip the solvability check (faster generation).
    #[arg(short, long)]
    skip_check: bool,

    /// Per-level detail output.
    #[arg(short, long)]
    verbose: bool,

    /// RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_or_readline() -> anyhow::Result<Cli> {
    // Args were provided (try to parse, exit on fail)
    if std::env::args_os().len() > 1 {
        return Ok(Cli::parse());
    }

    let mut cmd = Cli::command().no_binary_name(true);

    println!("No CLI arguments were provided");
    println!("Specify arguments via stdin:");
    println!("{}", cmd.render_long_help());

    std::io::stdout().flush().context("could not write to stdout")?;
    let mut buffer = String::new();
    std::io::stdin().read_line(&mut buffer).context("could not read stdin")?;

    let args = shlex::split(buffer.trim()).context("invalid quoting")?;
    let matches = cmd.try_get_matches_from(args).context("failed to parse args")?;

    Cli::from_arg_matches(&matches).context("failed to parse args")
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = parse_or_readline()?;

    let solver = Solver::with_limits(GRID_SIZE, SearchLimits::for_generation());

    // First Ctrl-C stops the search loops cooperatively; the second
    // aborts outright.
    if let Err(err) = ctrlc::set_handler({
        let interrupter = solver.interrupter();
        let mut is_repeat = false;
        move || {
            if is_repeat {
                warn!("Aborting immediately");
                std::process::exit(-1);
            }
            is_repeat = true;
            warn!("Stopping...");
            interrupter.interrupt();
        }
    }) {
        warn!("Failed to set interrupt handler! {}", err);
    }

    let mut generator = Generator::new(GRID_SIZE, cli.seed);

    info!(
        "generating {} level(s) from id {} ({} retries, solvability check {})",
        cli.count,
        cli.start_id,
        cli.retries,
        if cli.skip_check { "off" } else { "on" }
    );

    let started = Instant::now();
    let mut levels = Vec::new();
    let mut accepted: Vec<i32> = Vec::new();
    let mut fallbacks: Vec<i32> = Vec::new();

    for id in cli.start_id..cli.start_id + cli.count {
        let Generated { level, acceptance } = generator.generate_solvable(
            id,
            &solver,
            cli.retries,
            cli.skip_check,
        );

        if cli.verbose {
            println!("Level {id}: {} tiles, {}", level.tiles.len(), describe(acceptance));
            if let Some(dog) = level.dog() {
                println!(
                    "  dog at ({}, {}), {}x{}, facing {}",
                    dog.col, dog.row, dog.col_span, dog.row_span, dog.direction
                );
            }
        }

        match acceptance {
            Acceptance::Fallback => fallbacks.push(id),
            _ => accepted.push(id),
        }
        levels.push(level);

        if solver.is_interrupted() {
            warn!("interrupted, stopping after level {id}");
            break;
        }
    }

    println!();
    println!("Generation complete:");
    println!("  - levels requested: {}", cli.count);
    println!("  - levels generated: {}", levels.len());
    println!("  - elapsed: {:.2} s", started.elapsed().as_secs_f64());
    if !accepted.is_empty() {
        println!("  - accepted: {}", accepted.iter().join(", "));
    }
    if !fallbacks.is_empty() {
        println!("  - fallback boards: {}", fallbacks.iter().join(", "));
    }

    level_io::save_levels(&cli.dir, &cli.output, &levels)
        .context("failed to write level files")?;
    info!("wrote {} level file(s) to {}", levels.len(), cli.dir.display());

    if !fallbacks.is_empty() || solver.is_interrupted() {
        std::process::exit(1);
    }
    Ok(())
}

fn describe(acceptance: Acceptance) -> String {
    match acceptance {
        Acceptance::Solved { attempts: 1 } => "solvable".to_owned(),
        Acceptance::Solved { attempts } => format!("solvable after {attempts} attempts"),
        Acceptance::Unchecked => "unchecked".to_owned(),
        Acceptance::Fallback => "fallback board".to_owned(),
    }
}
