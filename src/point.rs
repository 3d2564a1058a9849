#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// A trie node's position in preorder/postorder space
pub type Coord = usize;

/// A node of the trie projected onto the plane as `(preorder, postorder)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    /// The parent of the trie root during search. Every real node lies
    /// in its south-east quadrant.
    pub const VIRTUAL_ROOT: Point = Point { x: 0, y: Coord::MAX };

    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn preorder(&self) -> Coord {
        self.x
    }

    pub fn postorder(&self) -> Coord {
        self.y
    }

    /// Whether `other` lies strictly inside the subtree rooted here.
    pub fn encloses(&self, other: &Point) -> bool {
        other.x > self.x && other.y < self.y
    }

    pub fn is_north_east_of(&self, origin: &Point) -> bool {
        self.x >= origin.x && self.y >= origin.y
    }

    pub fn is_south_east_of(&self, origin: &Point) -> bool {
        self.x >= origin.x && self.y <= origin.y
    }
}

impl From<(Coord, Coord)> for Point {
    fn from(value: (Coord, Coord)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<Point> for (Coord, Coord) {
    fn from(value: Point) -> Self {
        (value.x, value.y)
    }
}
