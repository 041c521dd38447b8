use std::{collections::BTreeMap, path::PathBuf};

use clap::Parser;
use log::warn;
use owo_colors::OwoColorize;

use diamond_escape::{
    analyzer::{self, Difficulty, Metrics},
    board::GRID_SIZE,
    level_io,
    solver::{SearchLimits, Solver},
};

/// Reports difficulty metrics for every stored level.
#[derive(Parser)]
struct Cli {
    /// Directory holding level_<id>.json files.
    #[arg(short, long, default_value = "simulation_json")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    let solver = Solver::with_limits(GRID_SIZE, SearchLimits::for_generation());
    let files = level_io::scan_levels_dir(&cli.dir)?;
    println!("Analyzing {} level(s) from {}", files.len(), cli.dir.display());
    println!();
    println!(
        "{:<7}{:<7}{:<8}{:<9}{:<11}{:<10}{:<9}{:<8}Rating",
        "Level", "Tiles", "Wolves", "Optimal", "Branching", "DeadEnds", "Width", "Score",
    );
    println!("{}", "-".repeat(84));

    let mut broken = 0usize;
    let mut rows: Vec<(i32, usize, Metrics)> = Vec::new();

    for path in &files {
        let level = match level_io::read_level(path) {
            Ok(level) => level,
            Err(err) => {
                warn!("skipping {}: {:#}", path.display(), err);
                broken += 1;
                continue;
            }
        };

        let metrics = analyzer::analyze(&level, &solver);
        println!(
            "{:<7}{:<7}{:<8}{:<9}{:<11}{:<10}{:<9}{:<8.2}{}",
            level.id,
            level.tiles.len(),
            level.wolf_count(),
            metrics.optimal_moves,
            metrics.branching_factor,
            metrics.dead_end_states,
            metrics.solution_width,
            metrics.difficulty_score,
            metrics.difficulty,
        );
        rows.push((level.id, level.tiles.len(), metrics));
    }

    if rows.is_empty() {
        warn!("nothing analyzed");
        std::process::exit(1);
    }

    println!();
    println!("Difficulty distribution:");
    let mut buckets: BTreeMap<Difficulty, usize> = BTreeMap::new();
    for (_, _, metrics) in &rows {
        *buckets.entry(metrics.difficulty).or_default() += 1;
    }
    for (difficulty, count) in &buckets {
        println!("  {difficulty}: {count} level(s)");
    }

    let solved: Vec<&Metrics> =
        rows.iter().map(|(_, _, m)| m).filter(|m| m.optimal_moves >= 0).collect();
    let avg_tiles =
        rows.iter().map(|(_, tiles, _)| *tiles as f64).sum::<f64>() / rows.len() as f64;
    println!();
    println!("Average tiles per level: {avg_tiles:.1}");
    if !solved.is_empty() {
        let avg_moves =
            solved.iter().map(|m| m.optimal_moves as f64).sum::<f64>() / solved.len() as f64;
        println!("Average optimal solution length: {avg_moves:.1}");
    }

    // Tile counts are expected to ramp up with the level id; flag clear
    // regressions.
    let mut smooth = true;
    for pair in rows.windows(2) {
        let (prev_id, prev_tiles, _) = &pair[0];
        let (id, tiles, _) = &pair[1];
        if (*tiles as i64) < (*prev_tiles as i64) - 5 {
            println!(
                "{} level {} has far fewer tiles than level {}",
                "warning:".yellow(),
                id,
                prev_id
            );
            smooth = false;
        }
    }
    if smooth {
        println!("Difficulty progression: tiles ramp up smoothly across levels");
    }

    if broken > 0 {
        std::process::exit(1);
    }
    Ok(())
}
