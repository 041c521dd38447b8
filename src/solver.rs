//! Bounded search over the sliding-tile state graph.
//!
//! Both searches share one move operator: a tile slides along its own
//! diagonal facing, one cell at a time, until the next step would
//! overlap another tile (it stops on the last free cell) or would push
//! any footprint cell off the grid (the tile disappears from play).
//! Cells outside the diamond but inside the grid do not block a slide.
//!
//! Applying a disappearing move removes the tile from the sequence;
//! escape is therefore detected by the absence of a dog tile. BFS
//! explores the graph in FIFO order and returns a shortest escape path.
//! DFS only answers existence, trying dog slides before wolf slides
//! since the dog's own escape is the goal.
//!
//! Every loop honours a cooperative terminate flag fed by the run
//! deadline and by [`Interrupter::interrupt`]; a search cut short by
//! depth, state or time budget reports [`SearchOutcome::Budgeted`],
//! never "unsolvable".

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use enum_iterator::all;
use log::debug;

use crate::{
    board::Level,
    math::Point,
    tile::{Direction, Tile, UnitType},
};

/// A single slide of one tile.
///
/// `to` is where the tile's origin lands; for a disappearing slide it
/// is the last in-grid position before the tile left the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Move {
    pub tile: usize,
    pub to: Point,
    pub disappeared: bool,
}

/// Canonical search identity of a position: `(col, row, unit)` per
/// tile, in board order. Spans and facings never change during play,
/// so they stay out of the key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StateKey(Vec<(i32, i32, UnitType)>);

impl StateKey {
    pub fn of(tiles: &[Tile]) -> Self {
        StateKey(tiles.iter().map(|t| (t.col, t.row, t.unit)).collect())
    }
}

/// Hard caps on a single search run.
#[derive(Copy, Clone, Debug)]
pub struct SearchLimits {
    /// Maximum DFS recursion depth.
    pub max_depth: usize,
    /// Maximum states: dequeued states for BFS, visited states for DFS.
    pub max_states: usize,
    pub timeout: Option<Duration>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits { max_depth: 1000, max_states: 100_000, timeout: Some(Duration::from_secs(10)) }
    }
}

impl SearchLimits {
    /// Tighter caps used while gating freshly generated boards.
    pub const fn for_generation() -> Self {
        SearchLimits { max_depth: 500, max_states: 50_000, timeout: Some(Duration::from_secs(10)) }
    }
}

/// Terminal result of one search run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SearchOutcome {
    /// A shortest escape path (BFS).
    Solved(Vec<Move>),
    /// An escape exists; no path is reported (DFS).
    Solvable,
    /// The reachable state space was exhausted without an escape.
    Exhausted,
    /// A depth, state or time budget cut the search short; solvability
    /// is unknown.
    Budgeted,
}

impl SearchOutcome {
    pub fn is_solvable(&self) -> bool {
        matches!(self, SearchOutcome::Solved(_) | SearchOutcome::Solvable)
    }
}

/// Outcome of a run plus the counters the difficulty metrics feed on.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// BFS: dequeued states. DFS: distinct visited states.
    pub states_explored: usize,
    /// DFS only: branches that revisited a state or ran out of moves.
    pub dead_ends: usize,
}

/// Cooperative cancellation handle for a [`Solver`].
#[derive(Clone, Debug)]
pub struct Interrupter(Arc<AtomicBool>);

impl Interrupter {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Book-keeping for one search run. `stop` is the sticky terminate
/// flag; `cut` records that some budget trimmed the search.
struct Run {
    cancel: Arc<AtomicBool>,
    deadline: Option<Instant>,
    stop: bool,
    cut: bool,
}

impl Run {
    /// Cheap poll of the external cancel flag only.
    fn cancelled(&mut self) -> bool {
        if !self.stop && self.cancel.load(Ordering::Relaxed) {
            self.stop = true;
            self.cut = true;
        }
        self.stop
    }

    /// Clock poll; trips the terminate flag past the deadline.
    fn check_clock(&mut self) -> bool {
        if self.cancelled() {
            return true;
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            self.stop = true;
            self.cut = true;
        }
        self.stop
    }
}

pub struct Solver {
    grid_size: i32,
    limits: SearchLimits,
    cancel: Arc<AtomicBool>,
}

impl Solver {
    pub fn new(grid_size: i32) -> Self {
        Self::with_limits(grid_size, SearchLimits::default())
    }

    pub fn with_limits(grid_size: i32, limits: SearchLimits) -> Self {
        Solver { grid_size, limits, cancel: Arc::new(AtomicBool::new(false)) }
    }

    pub const fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter(self.cancel.clone())
    }

    /// True once an [`Interrupter`] fired; later runs fail fast until
    /// the process decides what to do.
    pub fn is_interrupted(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn start_run(&self) -> Run {
        Run {
            cancel: self.cancel.clone(),
            deadline: self.limits.timeout.map(|t| Instant::now() + t),
            stop: false,
            cut: false,
        }
    }

    /// Breadth-first escape search. On success the returned path has
    /// minimum length and ends with the dog's disappearing slide.
    pub fn solve_bfs(&self, level: &Level) -> SearchReport {
        let mut run = self.start_run();
        let mut visited: HashSet<StateKey> = HashSet::new();
        let mut queue: VecDeque<(Vec<Tile>, Vec<Move>)> = VecDeque::new();
        let mut dequeued = 0usize;

        if !has_dog(&level.tiles) {
            return SearchReport {
                outcome: SearchOutcome::Solved(Vec::new()),
                states_explored: 0,
                dead_ends: 0,
            };
        }

        visited.insert(StateKey::of(&level.tiles));
        queue.push_back((level.tiles.clone(), Vec::new()));

        while let Some((tiles, path)) = queue.pop_front() {
            dequeued += 1;
            if dequeued > self.limits.max_states {
                run.cut = true;
                break;
            }
            if run.check_clock() {
                break;
            }

            for mv in self.possible_moves(&tiles) {
                if run.cancelled() {
                    break;
                }

                let mut next = tiles.clone();
                let moved = apply_move(&mut next, mv);

                if mv.disappeared && moved.is_dog() {
                    let mut solution = path.clone();
                    solution.push(mv);
                    debug!("bfs: escape in {} moves after {} states", solution.len(), dequeued);
                    return SearchReport {
                        outcome: SearchOutcome::Solved(solution),
                        states_explored: dequeued,
                        dead_ends: 0,
                    };
                }

                if visited.insert(StateKey::of(&next)) {
                    let mut extended = path.clone();
                    extended.push(mv);
                    queue.push_back((next, extended));
                }
            }
        }

        let outcome = if run.cut { SearchOutcome::Budgeted } else { SearchOutcome::Exhausted };
        debug!("bfs: no escape, {} states, {:?}", dequeued, outcome);
        SearchReport { outcome, states_explored: dequeued, dead_ends: 0 }
    }

    /// Depth-first existence search with dog slides tried first.
    pub fn solve_dfs(&self, level: &Level) -> SearchReport {
        let mut run = self.start_run();
        let mut visited: HashSet<StateKey> = HashSet::new();
        let mut tiles = level.tiles.clone();
        let mut solution: Vec<Move> = Vec::new();
        let mut dead_ends = 0usize;

        let found = self.dfs(&mut tiles, 0, &mut visited, &mut solution, &mut dead_ends, &mut run);

        let outcome = if found {
            SearchOutcome::Solvable
        } else if run.cut {
            SearchOutcome::Budgeted
        } else {
            SearchOutcome::Exhausted
        };
        debug!("dfs: {:?} after {} states, {} dead ends", outcome, visited.len(), dead_ends);
        SearchReport { outcome, states_explored: visited.len(), dead_ends }
    }

    /// Recursive worker behind [`solve_dfs`][Self::solve_dfs]. When it
    /// returns `true`, `solution` holds a full escape path whose final
    /// move is the dog's disappearing slide.
    fn dfs(
        &self,
        tiles: &mut Vec<Tile>,
        depth: usize,
        visited: &mut HashSet<StateKey>,
        solution: &mut Vec<Move>,
        dead_ends: &mut usize,
        run: &mut Run,
    ) -> bool {
        if depth > self.limits.max_depth || visited.len() > self.limits.max_states {
            run.cut = true;
            return false;
        }
        if run.check_clock() {
            return false;
        }

        if !visited.insert(StateKey::of(tiles)) {
            *dead_ends += 1;
            return false;
        }

        if !has_dog(tiles) {
            return true;
        }

        let (dog_moves, wolf_moves): (Vec<Move>, Vec<Move>) =
            self.possible_moves(tiles).into_iter().partition(|m| tiles[m.tile].unit.is_dog());

        for mv in dog_moves.into_iter().chain(wolf_moves) {
            if run.cancelled() {
                return false;
            }

            if mv.disappeared {
                let tile = tiles.remove(mv.tile);
                let escaped = tile.unit.is_dog();
                solution.push(mv);
                if escaped || self.dfs(tiles, depth + 1, visited, solution, dead_ends, run) {
                    return true;
                }
                solution.pop();
                tiles.insert(mv.tile, tile);
            } else {
                let from = tiles[mv.tile].origin();
                tiles[mv.tile].col = mv.to.col;
                tiles[mv.tile].row = mv.to.row;
                solution.push(mv);
                if self.dfs(tiles, depth + 1, visited, solution, dead_ends, run) {
                    return true;
                }
                solution.pop();
                tiles[mv.tile].col = from.col;
                tiles[mv.tile].row = from.row;
            }
        }

        *dead_ends += 1;
        false
    }

    /// Every legal slide from this position, visiting tiles in board
    /// order. Each tile contributes at most one move: the slide along
    /// its own facing. The order is an observable contract; it decides
    /// which escape path DFS reports first.
    pub fn possible_moves(&self, tiles: &[Tile]) -> Vec<Move> {
        (0..tiles.len()).filter_map(|i| self.slide(tiles, i)).collect()
    }

    /// Slide result for tile `i`, or `None` when it cannot leave its
    /// position.
    fn slide(&self, tiles: &[Tile], i: usize) -> Option<Move> {
        let tile = &tiles[i];
        let step = tile.direction.delta();
        let mut at = tile.origin();

        loop {
            let next = at + step;
            if self.off_grid(next, tile.col_span, tile.row_span) {
                return Some(Move { tile: i, to: at, disappeared: true });
            }
            if collides(tiles, i, next, tile.col_span, tile.row_span) {
                return (at != tile.origin()).then_some(Move { tile: i, to: at, disappeared: false });
            }
            at = next;
        }
    }

    fn off_grid(&self, origin: Point, col_span: i32, row_span: i32) -> bool {
        origin.col < 1
            || origin.col + col_span - 1 > self.grid_size
            || origin.row < 1
            || origin.row + row_span - 1 > self.grid_size
    }

    /// Tries to make an unsolvable board solvable by re-facing one
    /// wolf. Keeps the first facing that passes the existence search;
    /// restores the original facing when none helps.
    pub fn repair(&self, level: &mut Level) -> bool {
        if self.solve_dfs(level).outcome.is_solvable() {
            return true;
        }
        for i in 0..level.tiles.len() {
            if level.tiles[i].unit.is_dog() {
                continue;
            }
            let original = level.tiles[i].direction;
            for dir in all::<Direction>() {
                level.tiles[i].direction = dir;
                if self.solve_dfs(level).outcome.is_solvable() {
                    return true;
                }
            }
            level.tiles[i].direction = original;
        }
        false
    }
}

/// Applies a move to the tile sequence, removing the tile when it slid
/// off the grid. Returns the unit that moved.
pub fn apply_move(tiles: &mut Vec<Tile>, mv: Move) -> UnitType {
    if mv.disappeared {
        tiles.remove(mv.tile).unit
    } else {
        let tile = &mut tiles[mv.tile];
        tile.col = mv.to.col;
        tile.row = mv.to.row;
        tile.unit
    }
}

pub fn has_dog(tiles: &[Tile]) -> bool {
    tiles.iter().any(|t| t.unit.is_dog())
}

fn collides(tiles: &[Tile], exclude: usize, origin: Point, col_span: i32, row_span: i32) -> bool {
    let right = origin.col + col_span - 1;
    let bottom = origin.row + row_span - 1;
    tiles.iter().enumerate().any(|(j, other)| {
        j != exclude
            && origin.col <= other.right()
            && right >= other.col
            && origin.row <= other.bottom()
            && bottom >= other.row
    })
}

#[cfg(test)]
mod tests {
    use assertables::assert_in_delta;
    use test_case::test_case;

    use super::*;
    use crate::{
        board::GRID_SIZE,
        tile::{Direction::*, UnitType::*},
    };

    fn level_of(tiles: Vec<Tile>) -> Level {
        let mut level = Level::new(1);
        level.tiles = tiles;
        level
    }

    fn lone_dog() -> Level {
        level_of(vec![Tile::new(8, 8, 1, 1, Dog, UpRight)])
    }

    fn blocked_then_cleared() -> Level {
        level_of(vec![
            Tile::new(8, 8, 1, 1, Dog, UpRight),
            Tile::new(9, 7, 1, 1, Wolf, UpRight),
        ])
    }

    #[test]
    fn lone_dog_escapes_in_one_move() {
        let solver = Solver::new(GRID_SIZE);
        let level = lone_dog();

        let report = solver.solve_bfs(&level);
        let SearchOutcome::Solved(path) = &report.outcome else {
            panic!("expected a solution, got {:?}", report.outcome);
        };
        assert_eq!(path.len(), 1);
        assert!(path[0].disappeared);
        // UR from (8, 8): last in-grid origin before leaving is (14, 2).
        assert_eq!(path[0].to, Point::new(14, 2));

        assert!(solver.solve_dfs(&level).outcome.is_solvable());
    }

    #[test]
    fn blocked_dog_escapes_after_the_wolf_clears() {
        let solver = Solver::new(GRID_SIZE);
        let level = blocked_then_cleared();

        let report = solver.solve_bfs(&level);
        let SearchOutcome::Solved(path) = &report.outcome else {
            panic!("expected a solution, got {:?}", report.outcome);
        };
        assert_eq!(path.len(), 2);
        // The wolf (index 1) leaves first, then the dog (index 0).
        assert_eq!(path[0], Move { tile: 1, to: Point::new(14, 2), disappeared: true });
        assert_eq!(path[1], Move { tile: 0, to: Point::new(14, 2), disappeared: true });
    }

    #[test]
    fn solver_never_mutates_its_input() {
        let solver = Solver::new(GRID_SIZE);
        let level = blocked_then_cleared();
        let snapshot = level.clone();
        solver.solve_bfs(&level);
        solver.solve_dfs(&level);
        assert_eq!(level, snapshot);
    }

    #[test]
    fn enumeration_respects_facings_and_blocks() {
        let solver = Solver::new(GRID_SIZE);
        let level = blocked_then_cleared();

        // The dog is blocked one step ahead; only the wolf can slide.
        let moves = solver.possible_moves(&level.tiles);
        assert_eq!(moves, vec![Move { tile: 1, to: Point::new(14, 2), disappeared: true }]);
        assert!(moves.iter().all(|m| m.disappeared || level.tiles[m.tile].origin() != m.to));
    }

    #[test]
    fn mutually_blocked_tiles_exhaust_immediately() {
        let solver = Solver::new(GRID_SIZE);
        // The wolf faces back into the dog; neither can slide.
        let level = level_of(vec![
            Tile::new(8, 8, 1, 1, Dog, UpRight),
            Tile::new(9, 7, 1, 1, Wolf, DownLeft),
        ]);
        assert!(solver.possible_moves(&level.tiles).is_empty());

        let report = solver.solve_bfs(&level);
        assert_eq!(report.outcome, SearchOutcome::Exhausted);
        assert_eq!(report.states_explored, 1);
        assert_eq!(solver.solve_dfs(&level).outcome, SearchOutcome::Exhausted);
    }

    #[test_case(UpLeft)]
    #[test_case(UpRight)]
    #[test_case(DownLeft)]
    #[test_case(DownRight)]
    fn lone_dog_on_a_unit_grid_escapes(dir: Direction) {
        let solver = Solver::new(1);
        let level = level_of(vec![Tile::new(1, 1, 1, 1, Dog, dir)]);
        let report = solver.solve_bfs(&level);
        let SearchOutcome::Solved(path) = report.outcome else {
            panic!("expected a solution");
        };
        assert_eq!(path.len(), 1);
        assert!(path[0].disappeared);
    }

    fn packed_diamond() -> Level {
        // Every diamond cell carries a 1x1 wolf facing down-right, with
        // the dog on the centre cell.
        let centre = crate::board::center(GRID_SIZE);
        let tiles = crate::board::cells(GRID_SIZE)
            .map(|p| {
                let unit = if p == Point::new(centre, centre) { Dog } else { Wolf };
                Tile::new(p.col, p.row, 1, 1, unit, DownRight)
            })
            .collect();
        level_of(tiles)
    }

    #[test]
    fn tight_state_budget_reports_budgeted_not_unsolvable() {
        let limits = SearchLimits { max_depth: 500, max_states: 100, timeout: None };
        let solver = Solver::with_limits(GRID_SIZE, limits);
        let level = packed_diamond();
        assert_eq!(solver.solve_bfs(&level).outcome, SearchOutcome::Budgeted);
        assert_eq!(solver.solve_dfs(&level).outcome, SearchOutcome::Budgeted);
    }

    #[test]
    fn zero_timeout_budgets_out() {
        let limits = SearchLimits { timeout: Some(Duration::ZERO), ..SearchLimits::default() };
        let solver = Solver::with_limits(GRID_SIZE, limits);
        assert_eq!(solver.solve_bfs(&lone_dog()).outcome, SearchOutcome::Budgeted);
    }

    #[test]
    fn interrupter_stops_a_search_before_it_starts() {
        let solver = Solver::new(GRID_SIZE);
        solver.interrupter().interrupt();
        assert!(solver.is_interrupted());
        assert_eq!(solver.solve_bfs(&lone_dog()).outcome, SearchOutcome::Budgeted);
    }

    #[test]
    fn state_keys_track_positions_and_units() {
        let a = lone_dog();
        let b = lone_dog();
        assert_eq!(StateKey::of(&a.tiles), StateKey::of(&b.tiles));

        let mut moved = lone_dog();
        moved.tiles[0].col += 1;
        assert_ne!(StateKey::of(&a.tiles), StateKey::of(&moved.tiles));

        let mut reunit = lone_dog();
        reunit.tiles[0].unit = Wolf;
        assert_ne!(StateKey::of(&a.tiles), StateKey::of(&reunit.tiles));

        let mut set = HashSet::new();
        assert!(set.insert(StateKey::of(&a.tiles)));
        assert!(!set.insert(StateKey::of(&b.tiles)));
        assert!(set.insert(StateKey::of(&moved.tiles)));
    }

    #[test]
    fn bfs_solution_replays_into_valid_boards() {
        let solver = Solver::new(GRID_SIZE);
        let level = blocked_then_cleared();
        let SearchOutcome::Solved(path) = solver.solve_bfs(&level).outcome else {
            panic!("expected a solution");
        };

        let mut replay = level.clone();
        for mv in path {
            apply_move(&mut replay.tiles, mv);
            for (i, a) in replay.tiles.iter().enumerate() {
                assert!(!solver.off_grid(a.origin(), a.col_span, a.row_span));
                for b in replay.tiles.iter().skip(i + 1) {
                    assert!(!a.overlaps(b));
                }
            }
        }
        assert!(replay.dog_escaped(GRID_SIZE));
        assert!(!has_dog(&replay.tiles));
    }

    #[test]
    fn dfs_path_always_ends_with_the_dog_leaving() {
        let solver = Solver::new(GRID_SIZE);
        let level = blocked_then_cleared();

        let mut run = solver.start_run();
        let mut tiles = level.tiles.clone();
        let mut visited = HashSet::new();
        let mut solution = Vec::new();
        let mut dead_ends = 0;
        assert!(solver.dfs(&mut tiles, 0, &mut visited, &mut solution, &mut dead_ends, &mut run));

        let last = solution.last().copied().expect("dfs found an escape without moves");
        assert!(last.disappeared);

        // Replaying the full path clears the dog off the board, and the
        // BFS answer is never longer than the DFS one.
        let mut replay = level.tiles.clone();
        for mv in &solution {
            apply_move(&mut replay, *mv);
        }
        assert!(!has_dog(&replay));

        let SearchOutcome::Solved(optimal) = solver.solve_bfs(&level).outcome else {
            panic!("expected a solution");
        };
        assert!(optimal.len() <= solution.len());
    }

    #[test]
    fn repair_refaces_a_wolf_to_unblock_the_dog() {
        let solver = Solver::new(GRID_SIZE);
        // Dog and wolf face each other across adjacent cells; unsolvable
        // until the wolf is re-faced.
        let mut level = level_of(vec![
            Tile::new(8, 8, 1, 1, Dog, UpRight),
            Tile::new(9, 7, 1, 1, Wolf, DownLeft),
        ]);
        assert_eq!(solver.solve_dfs(&level).outcome, SearchOutcome::Exhausted);
        assert!(solver.repair(&mut level));
        assert!(solver.solve_dfs(&level).outcome.is_solvable());
    }

    #[test]
    fn disappearing_moves_far_from_the_edge_cover_real_distance() {
        // Guards the move payload the metrics replay: the recorded
        // landing cell of a vanishing slide is the pre-exit position.
        let solver = Solver::new(GRID_SIZE);
        let SearchOutcome::Solved(path) = solver.solve_bfs(&lone_dog()).outcome else {
            panic!("expected a solution");
        };
        let delta = path[0].to - Point::new(8, 8);
        assert_in_delta!(f64::hypot(delta.col as f64, delta.row as f64), 72f64.sqrt(), 1e-9);
    }
}
