use std::{path::PathBuf, time::Instant};

use clap::Parser;
use itertools::Itertools;
use log::warn;
use owo_colors::OwoColorize;

use diamond_escape::{
    board::GRID_SIZE,
    level_io,
    solver::{SearchLimits, SearchOutcome, Solver},
};

/// Checks every stored level for validity and solvability.
#[derive(Parser)]
struct Cli {
    /// Directory holding level_<id>.json files.
    #[arg(short, long, default_value = "simulation_json")]
    dir: PathBuf,

    /// Try re-facing wolves on unsolvable boards and report the fix.
    #[arg(short, long)]
    repair: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let solver = Solver::with_limits(GRID_SIZE, SearchLimits::for_generation());
    let files = level_io::scan_levels_dir(&cli.dir)?;
    println!("Found {} level file(s) in {}", files.len(), cli.dir.display());

    let mut solvable: Vec<i32> = Vec::new();
    let mut unsolvable: Vec<i32> = Vec::new();
    let mut undecided: Vec<i32> = Vec::new();
    let mut broken = 0usize;

    for path in &files {
        let mut level = match level_io::read_level(path) {
            Ok(level) => level,
            Err(err) => {
                warn!("skipping {}: {:#}", path.display(), err);
                broken += 1;
                continue;
            }
        };

        print!("Level {:>4} ({:>3} tiles)... ", level.id, level.tiles.len());

        if let Err(err) = level.validate(GRID_SIZE) {
            println!("{}: {}", "INVALID".red(), err);
            broken += 1;
            continue;
        }

        let started = Instant::now();
        let report = solver.solve_dfs(&level);
        let elapsed = started.elapsed().as_millis();

        match report.outcome {
            SearchOutcome::Solvable | SearchOutcome::Solved(_) => {
                println!("{} ({elapsed} ms)", "SOLVABLE".green());
                solvable.push(level.id);
            }
            SearchOutcome::Budgeted => {
                // A budget cut is an unknown verdict, not a proof.
                println!("{} ({elapsed} ms)", "UNDECIDED (budget)".yellow());
                undecided.push(level.id);
            }
            SearchOutcome::Exhausted => {
                println!("{} ({elapsed} ms)", "NOT SOLVABLE".red());
                if cli.repair && solver.repair(&mut level) {
                    println!("         repairable by re-facing a wolf");
                }
                unsolvable.push(level.id);
            }
        }
    }

    println!();
    println!("Validation summary:");
    println!("  - checked: {}", files.len());
    println!("  - solvable: {}", solvable.len());
    println!("  - unsolvable: {}", unsolvable.len());
    println!("  - undecided: {}", undecided.len());
    println!("  - invalid or unreadable: {broken}");
    if !unsolvable.is_empty() {
        println!("  - unsolvable ids: {}", unsolvable.iter().join(", "));
    }
    if !undecided.is_empty() {
        println!("  - undecided ids: {}", undecided.iter().join(", "));
    }

    if broken > 0 || !unsolvable.is_empty() || !undecided.is_empty() {
        std::process::exit(1);
    }
    println!("All levels are solvable.");
    Ok(())
}
