//! Difficulty metrics for a board.
//!
//! Everything here is a deterministic function of the initial position
//! plus one optimal BFS solution; the scalar score is a thin weighted
//! sum over values the searches already produced.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::{
    board::{self, Level},
    solver::{SearchOutcome, Solver, apply_move},
};

/// Score bucket boundaries: 10 / 25 / 45 / 70.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[derive(Serialize)]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub fn from_score(score: f64) -> Self {
        if score < 10.0 {
            Difficulty::VeryEasy
        } else if score < 25.0 {
            Difficulty::Easy
        } else if score < 45.0 {
            Difficulty::Medium
        } else if score < 70.0 {
            Difficulty::Hard
        } else {
            Difficulty::VeryHard
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Difficulty::VeryEasy => "Very Easy",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Metrics {
    /// BFS solution length, `-1` when BFS found no escape in budget.
    pub optimal_moves: i32,
    /// Count of legal moves from the initial position.
    pub branching_factor: usize,
    /// Mean per-tile count of legal slides (0 or 1 per tile).
    pub average_move_options: f64,
    /// Wolf tiles per diamond cell.
    pub wolf_density: f64,
    /// Smallest gap between the dog's footprint and any grid edge.
    pub dog_distance_to_edge: i32,
    /// Mean Euclidean distance per move along the BFS solution.
    pub path_complexity: f64,
    /// DFS branches that revisited a state or ran out of moves.
    pub dead_end_states: usize,
    /// States BFS dequeued before finding its solution, 0 without one.
    pub solution_width: usize,
    pub difficulty_score: f64,
    pub difficulty: Difficulty,
}

impl Metrics {
    /// The weighted difficulty sum, normalised by tile mobility.
    pub fn weighted_score(&self) -> f64 {
        let mut score = 0.0;
        score += self.optimal_moves as f64 * 2.0;
        score += self.branching_factor as f64 * 0.5;
        score += self.wolf_density * 100.0;
        score += (10 - self.dog_distance_to_edge) as f64 * 1.5;
        score += self.dead_end_states as f64 * 0.01;
        score += self.solution_width as f64 * 0.02;
        score += self.path_complexity * 0.5;
        score / (self.average_move_options + 1.0)
    }
}

/// Runs both searches over `level` and derives the full metric set.
pub fn analyze(level: &Level, solver: &Solver) -> Metrics {
    let n = solver.grid_size();
    let bfs = solver.solve_bfs(level);
    let dfs = solver.solve_dfs(level);

    let (optimal_moves, path_complexity, solution_width) = match &bfs.outcome {
        SearchOutcome::Solved(path) => {
            (path.len() as i32, path_complexity(level, path), bfs.states_explored)
        }
        _ => (-1, 0.0, 0),
    };

    let moves = solver.possible_moves(&level.tiles);
    let average_move_options = if level.tiles.is_empty() {
        0.0
    } else {
        moves.len() as f64 / level.tiles.len() as f64
    };

    let mut metrics = Metrics {
        optimal_moves,
        branching_factor: moves.len(),
        average_move_options,
        wolf_density: level.wolf_count() as f64 / board::cell_count(n) as f64,
        dog_distance_to_edge: dog_distance_to_edge(level, n),
        path_complexity,
        dead_end_states: dfs.dead_ends,
        solution_width,
        difficulty_score: 0.0,
        difficulty: Difficulty::VeryEasy,
    };
    metrics.difficulty_score = metrics.weighted_score();
    metrics.difficulty = Difficulty::from_score(metrics.difficulty_score);
    metrics
}

fn dog_distance_to_edge(level: &Level, n: i32) -> i32 {
    match level.dog() {
        None => 0,
        Some(dog) => (dog.col - 1)
            .min(n - dog.right())
            .min(dog.row - 1)
            .min(n - dog.bottom()),
    }
}

/// Mean Euclidean distance per move, replaying the solution so each
/// move measures from the tile's position at that point in the path.
fn path_complexity(level: &Level, path: &[crate::solver::Move]) -> f64 {
    if path.is_empty() {
        return 0.0;
    }
    let mut tiles = level.tiles.clone();
    let mut total = 0.0;
    for &mv in path {
        let delta = mv.to - tiles[mv.tile].origin();
        total += f64::hypot(delta.col as f64, delta.row as f64);
        apply_move(&mut tiles, mv);
    }
    total / path.len() as f64
}

#[cfg(test)]
mod tests {
    use assertables::assert_in_delta;
    use test_case::test_case;

    use super::*;
    use crate::{
        board::GRID_SIZE,
        tile::{Direction::*, Tile, UnitType::*},
    };

    #[test]
    fn lone_dog_metric_snapshot() {
        let mut level = Level::new(1);
        level.tiles = vec![Tile::new(8, 8, 1, 1, Dog, UpRight)];
        let solver = Solver::new(GRID_SIZE);

        let m = analyze(&level, &solver);
        assert_eq!(m.branching_factor, 1);
        assert_in_delta!(m.average_move_options, 1.0, 1e-9);
        assert_in_delta!(m.wolf_density, 0.0, 1e-9);
        assert_eq!(m.dog_distance_to_edge, 6);
        assert_eq!(m.optimal_moves, 1);
        // One slide from (8, 8) to the exit cell (14, 2).
        assert_in_delta!(m.path_complexity, 72f64.sqrt(), 1e-9);
        assert!(m.path_complexity > 0.0);
        assert_eq!(m.solution_width, 1);
    }

    #[test]
    fn unsolvable_board_flags_optimal_moves() {
        let mut level = Level::new(1);
        level.tiles = vec![
            Tile::new(8, 8, 1, 1, Dog, UpRight),
            Tile::new(9, 7, 1, 1, Wolf, DownLeft),
        ];
        let solver = Solver::new(GRID_SIZE);

        let m = analyze(&level, &solver);
        assert_eq!(m.optimal_moves, -1);
        assert_in_delta!(m.path_complexity, 0.0, 1e-9);
        assert_eq!(m.solution_width, 0);
        assert_eq!(m.branching_factor, 0);
    }

    #[test]
    fn weighted_score_reproduces_the_documented_formula() {
        let m = Metrics {
            optimal_moves: 6,
            branching_factor: 8,
            average_move_options: 0.5,
            wolf_density: 0.2,
            dog_distance_to_edge: 4,
            path_complexity: 3.0,
            dead_end_states: 200,
            solution_width: 500,
            difficulty_score: 0.0,
            difficulty: Difficulty::VeryEasy,
        };
        // (2*6 + 0.5*8 + 100*0.2 + 1.5*(10-4) + 0.01*200 + 0.02*500 + 0.5*3) / 1.5
        let expected = (12.0 + 4.0 + 20.0 + 9.0 + 2.0 + 10.0 + 1.5) / 1.5;
        assert_in_delta!(m.weighted_score(), expected, 1e-9);
    }

    #[test_case(0.0 => Difficulty::VeryEasy)]
    #[test_case(9.99 => Difficulty::VeryEasy)]
    #[test_case(10.0 => Difficulty::Easy)]
    #[test_case(25.0 => Difficulty::Medium)]
    #[test_case(44.9 => Difficulty::Medium)]
    #[test_case(45.0 => Difficulty::Hard)]
    #[test_case(70.0 => Difficulty::VeryHard)]
    #[test_case(120.0 => Difficulty::VeryHard)]
    fn score_buckets(score: f64) -> Difficulty {
        Difficulty::from_score(score)
    }
}
