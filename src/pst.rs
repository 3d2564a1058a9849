use std::{error::Error, fmt::Display, str::FromStr};

use crate::point::{Coord, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    NorthEast,
    SouthEast,
}

impl Quadrant {
    fn contains(&self, origin: &Point, point: &Point) -> bool {
        match self {
            Self::NorthEast => point.is_north_east_of(origin),
            Self::SouthEast => point.is_south_east_of(origin),
        }
    }

    /// Whether the y bound stored at a subtree root rules the whole subtree out
    fn excludes(&self, origin: &Point, bound: &Point, max_level: bool) -> bool {
        match self {
            Self::NorthEast => max_level && bound.y < origin.y,
            Self::SouthEast => !max_level && bound.y > origin.y,
        }
    }
}

fn floor_log2(n: usize) -> usize {
    (usize::BITS - 1 - n.leading_zeros()) as usize
}

fn level_of(slot: usize) -> usize {
    floor_log2(slot + 1)
}

/// Swap the extremal y point of the 1-based inclusive range `start..=end`
/// into the 1-based `slot`. Minimums keep the first candidate, maximums the
/// last.
fn place_extremal(points: &mut [Point], start: usize, end: usize, slot: usize, take_max: bool) {
    let mut best = start;
    for i in (start + 1)..=end {
        let (current, candidate) = (points[best - 1].y, points[i - 1].y);
        if take_max {
            if current <= candidate {
                best = i;
            }
        } else if current > candidate {
            best = i;
        }
    }
    points.swap(best - 1, slot - 1);
}

/// Select the roots of every subtree on `level`. The unplaced points must be
/// sorted by x from the level's first slot onward.
fn place_level(points: &mut [Point], level: usize, height: usize, last_level_size: usize) {
    let first_slot = 1usize << level;
    let full_leaves = 1usize << (height - level);
    let n_full = last_level_size / full_leaves;
    let full_size = (full_leaves << 1) - 1;
    let partial_size = full_leaves - 1 + last_level_size - n_full * full_leaves;
    let short_size = full_leaves - 1;
    let take_max = level % 2 == 1;

    for j in 1..=n_full {
        place_extremal(
            points,
            first_slot + (j - 1) * full_size,
            first_slot + j * full_size - 1,
            first_slot + j - 1,
            take_max,
        );
    }
    if n_full < first_slot {
        let start = first_slot + n_full * full_size;
        place_extremal(points, start, start + partial_size - 1, first_slot + n_full, take_max);
        let rest = start + partial_size;
        for j in 1..(first_slot - n_full) {
            place_extremal(
                points,
                rest + (j - 1) * short_size,
                rest + j * short_size - 1,
                first_slot + n_full + j,
                take_max,
            );
        }
    }
}

/// A static min-max priority search tree over `(preorder, postorder)` points.
///
/// The points are stored as an implicit complete binary tree. Within every
/// subtree the points of the left child precede those of the right child in
/// x, and the root of the subtree holds the minimum y of the subtree on even
/// levels and the maximum y on odd levels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinMaxPST {
    nodes: Vec<Point>,
    /// Largest x in each node's subtree, derived from `nodes`
    max_x: Vec<Coord>,
}

impl MinMaxPST {
    pub fn build(mut points: Vec<Point>) -> Self {
        points.sort_unstable();
        let n = points.len();
        if n > 1 {
            let height = floor_log2(n);
            let last_level_size = n - ((1 << height) - 1);
            for level in 0..height {
                place_level(&mut points, level, height, last_level_size);
                points[(1 << (level + 1)) - 1..].sort_unstable();
            }
        }
        Self::from_tree_order(points)
    }

    /// Wrap points that are already arranged in tree order, as produced by
    /// [`MinMaxPST::build`].
    pub fn from_tree_order(nodes: Vec<Point>) -> Self {
        let mut max_x = vec![0; nodes.len()];
        for i in (0..nodes.len()).rev() {
            let mut m = nodes[i].x;
            for child in [2 * i + 1, 2 * i + 2] {
                if let Some(x) = max_x.get(child) {
                    m = m.max(*x);
                }
            }
            max_x[i] = m;
        }
        Self { nodes, max_x }
    }

    /// The point with the smallest x such that `x >= origin.x` and `y >= origin.y`
    pub fn leftmost_ne(&self, origin: Point) -> Option<Point> {
        self.leftmost(0, &origin, Quadrant::NorthEast)
    }

    /// The point with the smallest x such that `x >= origin.x` and `y <= origin.y`
    pub fn leftmost_se(&self, origin: Point) -> Option<Point> {
        self.leftmost(0, &origin, Quadrant::SouthEast)
    }

    fn leftmost(&self, slot: usize, origin: &Point, quadrant: Quadrant) -> Option<Point> {
        let point = *self.nodes.get(slot)?;
        if self.max_x[slot] < origin.x {
            return None;
        }
        if quadrant.excludes(origin, &point, level_of(slot) % 2 == 1) {
            return None;
        }

        let own = quadrant.contains(origin, &point).then_some(point);
        let below = self
            .leftmost(2 * slot + 1, origin, quadrant)
            .or_else(|| self.leftmost(2 * slot + 2, origin, quadrant));

        match (own, below) {
            (Some(own), Some(below)) if below.x < own.x => Some(below),
            (Some(own), _) => Some(own),
            (None, below) => below,
        }
    }

    /// The points in tree order
    pub fn points(&self) -> &[Point] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.nodes.iter()
    }
}

impl FromIterator<Point> for MinMaxPST {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::build(iter.into_iter().collect())
    }
}

impl Display for MinMaxPST {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.nodes.len())?;
        for p in self.nodes.iter() {
            write!(f, "({},{})", p.x, p.y)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PSTParsingError {
    MissingSize,
    InvalidSize(String),
    InvalidPoint(String),
    SizeMismatch { expected: usize, found: usize },
}

impl Display for PSTParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::MissingSize => "Search tree is missing its size prefix".to_string(),
            Self::InvalidSize(size) => format!("Invalid search tree size \"{}\"", size),
            Self::InvalidPoint(point) => format!("Invalid point \"{}\", expected (x,y)", point),
            Self::SizeMismatch { expected, found } => {
                format!("Search tree declares {} points but holds {}", expected, found)
            }
        };
        f.write_str(&text)
    }
}

impl Error for PSTParsingError {}

fn parse_point(text: &str) -> Result<Point, PSTParsingError> {
    let invalid = || PSTParsingError::InvalidPoint(text.to_string());
    let (x, y) = text.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok(Point::new(x, y))
}

impl FromStr for MinMaxPST {
    type Err = PSTParsingError;

    /// Parse `n:(x0,y0)(x1,y1)...`, keeping the points in the order given
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (size, body) = s.split_once(':').ok_or(PSTParsingError::MissingSize)?;
        let size: usize = size
            .trim()
            .parse()
            .map_err(|_| PSTParsingError::InvalidSize(size.to_string()))?;

        let body = body.trim();
        let mut nodes = Vec::with_capacity(size);
        if !body.is_empty() {
            let inner = body
                .strip_prefix('(')
                .and_then(|b| b.strip_suffix(')'))
                .ok_or_else(|| PSTParsingError::InvalidPoint(body.to_string()))?;
            for point in inner.split(")(") {
                nodes.push(parse_point(point)?);
            }
        }
        if nodes.len() != size {
            return Err(PSTParsingError::SizeMismatch {
                expected: size,
                found: nodes.len(),
            });
        }
        Ok(Self::from_tree_order(nodes))
    }
}
