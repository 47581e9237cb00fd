use cgmath::{MetricSpace, Point2, Vector2};

/// An integer tile coordinate on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    /// Creates a new tile coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The travel direction from this tile to another.
    pub fn delta(&self, other: Tile) -> Vector2<i32> {
        Vector2::new(other.x - self.x, other.y - self.y)
    }

    /// The Euclidean distance to another tile.
    pub fn distance(&self, other: Tile) -> f64 {
        Point2::new(self.x as f64, self.y as f64).distance(Point2::new(other.x as f64, other.y as f64))
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One directed edge between two tiles.
///
/// Segments are independent: a bidirectional road is two separate
/// one-way segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub from: Tile,
    pub to: Tile,
}

impl Segment {
    /// Creates a segment from its endpoints.
    pub const fn new(from: Tile, to: Tile) -> Self {
        Self { from, to }
    }

    /// The traversal weight of the segment.
    pub fn weight(&self) -> f64 {
        self.from.distance(self.to)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn weights_are_euclidean() {
        assert_approx_eq!(Segment::new(Tile::new(0, 0), Tile::new(1, 0)).weight(), 1.0);
        assert_approx_eq!(
            Segment::new(Tile::new(0, 0), Tile::new(1, 1)).weight(),
            std::f64::consts::SQRT_2
        );
    }

    #[test]
    fn opposite_deltas_negate() {
        let a = Tile::new(4, 7);
        let b = Tile::new(5, 7);
        assert_eq!(a.delta(b), -b.delta(a));
    }
}
