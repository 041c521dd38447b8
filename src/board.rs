//! The diamond board: geometry, the level type and its invariants.
//!
//! The playable region of the `n`-by-`n` grid is a rhombus centred on
//! `(center(n), center(n))`. Placement and generation are restricted to
//! the rhombus; sliding is only restricted by the grid itself.

use thiserror::Error;

use crate::{
    math::Point,
    tile::{Tile, UnitType},
};

/// Side length of the standard playing grid.
pub const GRID_SIZE: i32 = 14;

/// Centre coordinate of an `n`-sized grid, on both axes.
pub const fn center(n: i32) -> i32 {
    (n + 1) / 2
}

/// Inclusive column range of the diamond on `row`, or `None` when the
/// row lies outside the grid.
///
/// The formula is load-bearing: stored boards were produced against it,
/// so it must not drift. Width on a row is `n - |row - center|`,
/// centred horizontally.
pub const fn row_cols(row: i32, n: i32) -> Option<(i32, i32)> {
    if row < 1 || row > n {
        return None;
    }
    let width = n - (row - center(n)).abs();
    let start = (n - width) / 2 + 1;
    Some((start, start + width - 1))
}

pub const fn in_diamond(p: Point, n: i32) -> bool {
    match row_cols(p.row, n) {
        Some((lo, hi)) => p.col >= lo && p.col <= hi,
        None => false,
    }
}

/// Number of cells inside the diamond.
pub fn cell_count(n: i32) -> usize {
    (1..=n).filter_map(|row| row_cols(row, n)).map(|(lo, hi)| (hi - lo + 1) as usize).sum()
}

/// All diamond cells in row-major order.
pub fn cells(n: i32) -> impl Iterator<Item = Point> {
    (1..=n).flat_map(move |row| {
        let (lo, hi) = row_cols(row, n).unwrap_or((1, 0));
        (lo..=hi).map(move |col| Point::new(col, row))
    })
}

/// Why a board failed validation. Cell lists name the offending cells.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile cells outside the diamond: {cells:?}")]
    OutsideDiamond { cells: Vec<Point> },
    #[error("overlapping tiles at cells {cells:?}")]
    Overlap { cells: Vec<Point> },
    #[error("no dog tile on the board")]
    MissingDog,
    #[error("more than one dog tile on the board")]
    DuplicateDog,
    #[error("dog footprint crosses the grid edge at {cells:?}")]
    DogOutsideGrid { cells: Vec<Point> },
}

/// A puzzle board plus its external metadata.
///
/// Tiles are kept in a stable order; searches identify tiles by their
/// index into this sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub id: i32,
    pub name: String,
    /// External category string, `"normal"` for generated boards.
    pub kind: String,
    pub time_limit: i32,
    pub unlocked: bool,
    pub stars: i32,
    pub score: i32,
    pub tiles: Vec<Tile>,
}

impl Level {
    pub fn new(id: i32) -> Self {
        Level {
            id,
            name: String::new(),
            kind: "normal".to_owned(),
            time_limit: 0,
            unlocked: false,
            stars: 0,
            score: 0,
            tiles: Vec::new(),
        }
    }

    /// Index of the dog tile. The tile count is small, so a scan beats
    /// carrying an invalidation-prone cached position.
    pub fn dog_index(&self) -> Option<usize> {
        self.tiles.iter().position(|t| t.unit.is_dog())
    }

    pub fn dog(&self) -> Option<&Tile> {
        self.dog_index().map(|i| &self.tiles[i])
    }

    pub fn wolf_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.unit == UnitType::Wolf).count()
    }

    /// True once no dog remains on the board, or the one that does has a
    /// footprint crossing the grid edge. Searches rely on the removed
    /// form: an escaped dog is deleted from the tile sequence.
    pub fn dog_escaped(&self, n: i32) -> bool {
        match self.dog() {
            None => true,
            Some(dog) => !dog.in_grid(n),
        }
    }

    /// Checks the four board invariants: every footprint inside the
    /// diamond, footprints pairwise disjoint, exactly one dog, and the
    /// dog strictly inside the grid.
    pub fn validate(&self, n: i32) -> Result<(), BoardError> {
        let outside: Vec<Point> =
            self.tiles.iter().flat_map(Tile::cells).filter(|&p| !in_diamond(p, n)).collect();
        if !outside.is_empty() {
            return Err(BoardError::OutsideDiamond { cells: outside });
        }

        let mut used: Vec<Point> = Vec::new();
        let mut clashes: Vec<Point> = Vec::new();
        for tile in &self.tiles {
            for cell in tile.cells() {
                if used.contains(&cell) {
                    clashes.push(cell);
                } else {
                    used.push(cell);
                }
            }
        }
        if !clashes.is_empty() {
            return Err(BoardError::Overlap { cells: clashes });
        }

        let dogs = self.tiles.iter().filter(|t| t.unit.is_dog()).count();
        match dogs {
            0 => return Err(BoardError::MissingDog),
            1 => {}
            _ => return Err(BoardError::DuplicateDog),
        }

        if let Some(dog) = self.dog() {
            if !dog.in_grid(n) {
                let crossing: Vec<Point> = dog
                    .cells()
                    .filter(|p| p.col < 1 || p.col > n || p.row < 1 || p.row > n)
                    .collect();
                return Err(BoardError::DogOutsideGrid { cells: crossing });
            }
        }

        Ok(())
    }
}
