//! Random board generation under per-level difficulty parameters.
//!
//! Generation is a loop of candidates gated by the existence search:
//! place the dog, wall it off, scatter wolves over a shuffled cell
//! walk, validate, and ask the solver. Rejections degrade the
//! difficulty knobs step by step; when the retry budget runs out, a
//! minimal board that is trivially solvable takes the level's place so
//! callers always receive something playable.

use log::{debug, warn};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    board::{self, Level},
    math::Point,
    solver::Solver,
    tile::{Direction, Tile, UnitType},
};

const DIRECTION_CYCLE: [Direction; 4] =
    [Direction::UpLeft, Direction::UpRight, Direction::DownLeft, Direction::DownRight];

/// Difficulty knobs for one level id.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DifficultyParams {
    /// Side of the centred sub-diamond the fill walk is restricted to.
    pub effective_grid: i32,
    /// Largest span a scattered wolf may have on either axis.
    pub max_tile_size: i32,
    /// Wolf tiles per hundred walkable cells.
    pub density: i32,
    /// Draw facings at random instead of cycling UL/UR/DL/DR.
    pub random_directions: bool,
}

impl DifficultyParams {
    /// The tuning table keyed by level id.
    pub fn for_level(id: i32) -> Self {
        match id {
            ..=1 => DifficultyParams {
                effective_grid: 6,
                max_tile_size: 1,
                density: 6,
                random_directions: false,
            },
            2..=3 => DifficultyParams {
                effective_grid: 6,
                max_tile_size: 2,
                density: 35 + 5 * (id - 2),
                random_directions: false,
            },
            4..=6 => DifficultyParams {
                effective_grid: 8,
                max_tile_size: 2,
                density: 50 + 3 * (id - 4),
                random_directions: id >= 5,
            },
            7..=10 => DifficultyParams {
                effective_grid: 10,
                max_tile_size: 3,
                density: 60 + 2 * (id - 7),
                random_directions: true,
            },
            _ => DifficultyParams {
                effective_grid: 14,
                max_tile_size: 3,
                density: 70,
                random_directions: true,
            },
        }
    }

    /// The trivially solvable floor used when generation gives up.
    pub const fn fallback() -> Self {
        DifficultyParams {
            effective_grid: 6,
            max_tile_size: 1,
            density: 30,
            random_directions: false,
        }
    }
}

/// How `generate_solvable` arrived at its board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Acceptance {
    /// The existence search accepted the candidate on this attempt.
    Solved { attempts: u32 },
    /// Accepted unchecked (solvability check skipped).
    Unchecked,
    /// The retry budget ran out; this is the minimal fallback board.
    Fallback,
}

pub struct Generated {
    pub level: Level,
    pub acceptance: Acceptance,
}

pub struct Generator {
    grid_size: i32,
    rng: StdRng,
}

impl Generator {
    /// Pass a seed for reproducible runs, `None` for an entropy seed.
    pub fn new(grid_size: i32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Generator { grid_size, rng }
    }

    /// Generates a board for `level_id`, retrying and degrading the
    /// difficulty knobs until validation and the existence search
    /// accept a candidate.
    pub fn generate_solvable(
        &mut self,
        level_id: i32,
        solver: &Solver,
        max_retries: u32,
        skip_check: bool,
    ) -> Generated {
        let mut params = DifficultyParams::for_level(level_id);

        for attempt in 1..=max_retries {
            if solver.is_interrupted() {
                warn!("level {level_id}: generation interrupted");
                break;
            }

            let level = self.generate(level_id, params);
            match level.validate(self.grid_size) {
                Err(err) => {
                    debug!("level {level_id} attempt {attempt}: invalid candidate: {err}");
                }
                Ok(()) if skip_check => {
                    return Generated { level, acceptance: Acceptance::Unchecked };
                }
                Ok(()) => {
                    if solver.solve_dfs(&level).outcome.is_solvable() {
                        debug!("level {level_id}: accepted on attempt {attempt}");
                        return Generated { level, acceptance: Acceptance::Solved { attempts: attempt } };
                    }
                    debug!("level {level_id} attempt {attempt}: candidate not solvable");
                }
            }

            // Soften the parameters as rejections pile up.
            if attempt % 5 == 0 {
                params.density = (params.density - 5).max(25);
            }
            if attempt == 15 {
                params.effective_grid = (params.effective_grid - 1).max(2);
            }
            if attempt == 20 {
                params.max_tile_size = (params.max_tile_size - 1).max(1);
            }
        }

        warn!(
            "level {level_id}: no solvable candidate within {max_retries} attempts, \
             using the minimal fallback board"
        );
        let level = self.generate(level_id, DifficultyParams::fallback());
        Generated { level, acceptance: Acceptance::Fallback }
    }

    /// One unvalidated candidate board.
    fn generate(&mut self, level_id: i32, params: DifficultyParams) -> Level {
        let n = self.grid_size;
        let centre = Point::new(board::center(n), board::center(n));
        let mut tiles: Vec<Tile> = Vec::new();
        let mut placed = 0usize;

        // The dog sits on the centre cell with a random facing.
        let dog_facing = DIRECTION_CYCLE[self.rng.gen_range(0..4)];
        tiles.push(self.tile(centre, 1, 1, UnitType::Dog, dog_facing));

        // A blocker one step along the dog's facing keeps boards from
        // collapsing into one-move solves.
        let ahead = centre + dog_facing.delta();
        if board::in_diamond(ahead, n) {
            let facing = self.wolf_facing(params, placed);
            tiles.push(self.tile(ahead, 1, 1, UnitType::Wolf, facing));
            placed += 1;
        }

        let mut walk = effective_cells(n, params.effective_grid);
        walk.shuffle(&mut self.rng);
        let target = params.density.max(0) as usize * walk.len() / 100;

        for cell in walk {
            if placed >= target {
                break;
            }
            if covered(&tiles, cell) {
                continue;
            }

            let mut candidates: Vec<(i32, i32)> = [(2, 1), (1, 2), (1, 1)]
                .into_iter()
                .filter(|&(w, h)| w.max(h) <= params.max_tile_size)
                .collect();
            candidates.shuffle(&mut self.rng);

            let (col_span, row_span) = candidates
                .into_iter()
                .find(|&(w, h)| self.fits(&tiles, cell, w, h))
                .unwrap_or((1, 1));
            let facing = self.wolf_facing(params, placed);
            tiles.push(self.tile(cell, col_span, row_span, UnitType::Wolf, facing));
            placed += 1;
        }

        let mut level = Level::new(level_id);
        level.name = format!("Level {level_id}");
        level.unlocked = level_id == 1;
        level.tiles = tiles;
        level
    }

    fn wolf_facing(&mut self, params: DifficultyParams, placed: usize) -> Direction {
        if params.random_directions {
            DIRECTION_CYCLE[self.rng.gen_range(0..4)]
        } else {
            DIRECTION_CYCLE[placed % 4]
        }
    }

    /// A footprint fits when every cell is inside the diamond and free.
    fn fits(&self, tiles: &[Tile], at: Point, col_span: i32, row_span: i32) -> bool {
        (0..col_span).all(|dc| {
            (0..row_span).all(|dr| {
                let p = Point::new(at.col + dc, at.row + dr);
                board::in_diamond(p, self.grid_size) && !covered(tiles, p)
            })
        })
    }

    fn tile(
        &mut self,
        at: Point,
        col_span: i32,
        row_span: i32,
        unit: UnitType,
        direction: Direction,
    ) -> Tile {
        let mut tile = Tile::new(at.col, at.row, col_span, row_span, unit, direction);
        tile.id = format!(
            "{}_{}",
            self.rng.gen_range(100_000..=999_999),
            self.rng.gen_range(100_000..=999_999)
        );
        tile
    }
}

fn covered(tiles: &[Tile], p: Point) -> bool {
    tiles.iter().any(|t| t.contains(p))
}

/// Diamond cells whose row and column both lie inside the centred
/// `effective`-wide band, row-major.
fn effective_cells(n: i32, effective: i32) -> Vec<Point> {
    let start = (n - effective) / 2 + 1;
    let end = start + effective - 1;
    (start..=end)
        .filter_map(|row| board::row_cols(row, n).map(|(lo, hi)| (row, lo.max(start), hi.min(end))))
        .flat_map(|(row, lo, hi)| (lo..=hi).map(move |col| Point::new(col, row)))
        .collect()
}
