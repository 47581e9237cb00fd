use crate::Tile;

/// What a grid cell is occupied by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileKind {
    #[default]
    Empty,
    Road,
    Building,
}

impl TileKind {
    /// The stable numeric code used by external renderers.
    pub fn code(&self) -> u8 {
        match self {
            TileKind::Empty => 0,
            TileKind::Road => 1,
            TileKind::Building => 2,
        }
    }
}

/// A rectangular grid of tiles, stored row-major.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<TileKind>,
}

impl TileGrid {
    /// Creates an empty grid of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![TileKind::Empty; width * height],
        }
    }

    /// The grid width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The grid height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Gets the kind of tile at a coordinate, or `None` if out of bounds.
    pub fn get(&self, tile: Tile) -> Option<TileKind> {
        self.index(tile).map(|idx| self.cells[idx])
    }

    /// Sets the kind of tile at a coordinate.
    /// Returns `false` without mutating if the coordinate is out of bounds.
    pub fn set(&mut self, tile: Tile, kind: TileKind) -> bool {
        match self.index(tile) {
            Some(idx) => {
                self.cells[idx] = kind;
                true
            }
            None => false,
        }
    }

    /// Resets a cell to [TileKind::Empty].
    /// Returns `false` if the coordinate is out of bounds.
    pub fn clear(&mut self, tile: Tile) -> bool {
        self.set(tile, TileKind::Empty)
    }

    /// The cells in row-major order.
    pub fn cells(&self) -> &[TileKind] {
        &self.cells
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        let in_bounds = tile.x >= 0
            && (tile.x as usize) < self.width
            && tile.y >= 0
            && (tile.y as usize) < self.height;
        in_bounds.then(|| tile.y as usize * self.width + tile.x as usize)
    }
}
