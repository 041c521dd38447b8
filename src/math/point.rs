use std::{
    fmt::{Display, Formatter},
    ops::{Add, Neg, Sub},
};

use serde::{Deserialize, Serialize};

/// A cell on the playing grid, or a cell-to-cell delta.
///
/// Columns grow rightward and rows grow downward; the playing grid
/// itself is 1-based on both axes.
#[derive(Debug, Copy, Clone, Default)]
#[derive(PartialEq, Eq, Hash, Ord, PartialOrd)]
#[derive(Serialize, Deserialize)]
pub struct Point {
    pub col: i32,
    pub row: i32,
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl Point {
    pub const fn new(col: i32, row: i32) -> Self {
        Point { col, row }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.col + rhs.col, self.row + rhs.row)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.col, -self.row)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        self + (-rhs)
    }
}
