//! Tiles and their footprint geometry.

use std::fmt::{Display, Formatter};

use derive_more::with_trait::IsVariant;
use enum_iterator::Sequence;
use enum_map::Enum;
use serde::{Deserialize, Serialize};

use crate::math::Point;

/// The four diagonal facings a tile can slide along.
///
/// Declaration order is the enumeration order wherever moves or facings
/// are listed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(Sequence, Enum)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Unit step along this diagonal.
    pub const fn delta(self) -> Point {
        use Direction::*;
        match self {
            UpLeft => Point::new(-1, -1),
            UpRight => Point::new(1, -1),
            DownLeft => Point::new(-1, 1),
            DownRight => Point::new(1, 1),
        }
    }

    pub const fn as_str(self) -> &'static str {
        use Direction::*;
        match self {
            UpLeft => "up_left",
            UpRight => "up_right",
            DownLeft => "down_left",
            DownRight => "down_right",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What occupies a tile. At most one dog exists per board.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[derive(IsVariant)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Dog,
    Wolf,
}

impl Display for UnitType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.is_dog() { "dog" } else { "wolf" })
    }
}

/// Descriptive footprint class; carries no gameplay meaning.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileShape {
    Single,
    Horizontal,
    Vertical,
}

/// One sliding piece: an axis-aligned rectangle of cells with a fixed
/// diagonal facing.
///
/// The footprint is the closed rectangle from `(col, row)` to
/// `(right(), bottom())`. The `id` exists only for external identity;
/// the search never looks at it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub id: String,
    pub col: i32,
    pub row: i32,
    pub col_span: i32,
    pub row_span: i32,
    pub unit: UnitType,
    pub direction: Direction,
}

impl Tile {
    pub fn new(
        col: i32,
        row: i32,
        col_span: i32,
        row_span: i32,
        unit: UnitType,
        direction: Direction,
    ) -> Self {
        Tile { id: String::new(), col, row, col_span, row_span, unit, direction }
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.col, self.row)
    }

    /// Rightmost occupied column.
    pub const fn right(&self) -> i32 {
        self.col + self.col_span - 1
    }

    /// Bottommost occupied row.
    pub const fn bottom(&self) -> i32 {
        self.row + self.row_span - 1
    }

    pub const fn contains(&self, p: Point) -> bool {
        p.col >= self.col && p.col <= self.right() && p.row >= self.row && p.row <= self.bottom()
    }

    /// Whole footprint inside the `1..=n` grid square.
    pub const fn in_grid(&self, n: i32) -> bool {
        self.col >= 1 && self.right() <= n && self.row >= 1 && self.bottom() <= n
    }

    /// Closed-interval rectangle overlap with another tile's footprint.
    pub const fn overlaps(&self, other: &Tile) -> bool {
        self.col <= other.right()
            && self.right() >= other.col
            && self.row <= other.bottom()
            && self.bottom() >= other.row
    }

    /// Every cell of the footprint, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Point> + '_ {
        (self.row..=self.bottom())
            .flat_map(move |row| (self.col..=self.right()).map(move |col| Point::new(col, row)))
    }

    /// Shape class derived from the spans.
    pub const fn shape(&self) -> TileShape {
        match (self.col_span > 1, self.row_span > 1) {
            (true, false) => TileShape::Horizontal,
            (false, true) => TileShape::Vertical,
            _ => TileShape::Single,
        }
    }
}

#[cfg(test)]
macro_rules! tile {
    (1x1 @ $col:literal, $row:literal) => {
        Tile::new($col, $row, 1, 1, UnitType::Wolf, Direction::UpRight)
    };
    (2x1 @ $col:literal, $row:literal) => {
        Tile::new($col, $row, 2, 1, UnitType::Wolf, Direction::UpRight)
    };
    (1x2 @ $col:literal, $row:literal) => {
        Tile::new($col, $row, 1, 2, UnitType::Wolf, Direction::UpRight)
    };
    (2x2 @ $col:literal, $row:literal) => {
        Tile::new($col, $row, 2, 2, UnitType::Wolf, Direction::UpRight)
    };
}

#[cfg(test)]
mod tests {
    use test_case::{test_case, test_matrix};

    use super::*;

    #[test_case(tile!(1x1 @ 2, 3), tile!(1x1 @ 2, 3))]
    #[test_matrix(
        [tile!(2x1 @ 5, 5)],
        [
            tile!(1x1 @ 5, 5), tile!(1x1 @ 6, 5),
            tile!(2x1 @ 4, 5), tile!(2x1 @ 6, 5),
            tile!(1x2 @ 6, 4), tile!(1x2 @ 5, 5)
        ]
    )]
    #[test_matrix(
        [tile!(2x2 @ 5, 5)],
        [tile!(1x1 @ 6, 6), tile!(2x1 @ 4, 6), tile!(1x2 @ 6, 4)]
    )]
    fn overlap_yes(a: Tile, b: Tile) {
        assert!(a.overlaps(&b), "footprints should overlap: {:?} {:?}", a, b);
        assert!(b.overlaps(&a), "footprints should overlap (reverse): {:?} {:?}", b, a);
    }

    #[test_case(tile!(1x1 @ 2, 3), tile!(1x1 @ 3, 3))]
    #[test_matrix(
        [tile!(2x1 @ 5, 5)],
        [
            tile!(1x1 @ 4, 5), tile!(1x1 @ 7, 5), tile!(1x1 @ 5, 4),
            tile!(2x1 @ 3, 5), tile!(2x1 @ 7, 5),
            tile!(1x2 @ 5, 6), tile!(1x2 @ 6, 3)
        ]
    )]
    fn overlap_no(a: Tile, b: Tile) {
        assert!(!a.overlaps(&b), "footprints should not overlap: {:?} {:?}", a, b);
        assert!(!b.overlaps(&a), "footprints should not overlap (reverse): {:?} {:?}", b, a);
    }

    #[test_case(1, 1 => TileShape::Single)]
    #[test_case(2, 1 => TileShape::Horizontal)]
    #[test_case(3, 1 => TileShape::Horizontal)]
    #[test_case(1, 2 => TileShape::Vertical)]
    #[test_case(2, 2 => TileShape::Single)]
    fn shape_follows_spans(col_span: i32, row_span: i32) -> TileShape {
        Tile::new(1, 1, col_span, row_span, UnitType::Wolf, Direction::UpLeft).shape()
    }

    #[test]
    fn footprint_cells_cover_the_rectangle() {
        let t = tile!(2x1 @ 4, 9);
        let cells: Vec<_> = t.cells().collect();
        assert_eq!(cells, vec![Point::new(4, 9), Point::new(5, 9)]);
        assert!(cells.iter().all(|&p| t.contains(p)));
        assert!(!t.contains(Point::new(6, 9)));
    }

    #[test]
    fn direction_deltas_are_diagonal_units() {
        for dir in enum_iterator::all::<Direction>() {
            let d = dir.delta();
            assert_eq!(d.col.abs(), 1);
            assert_eq!(d.row.abs(), 1);
        }
    }
}
