//! Engine for a sliding-tile escape puzzle played on the diamond-shaped
//! region of a square grid.
//!
//! Wolves and a single dog occupy rectangular footprints; each tile
//! slides along its fixed diagonal facing until blocked, or off the
//! grid and out of play. The [`solver`] decides whether the dog can
//! escape, the [`generator`] produces solvable boards at a requested
//! difficulty, and the [`analyzer`] measures how hard a board is.

pub mod analyzer;
pub mod board;
pub mod generator;
pub mod level_io;
pub mod math;
pub mod solver;
pub mod tile;
