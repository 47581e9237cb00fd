use crate::grid::TileGrid;
use crate::{Color, DemandId, Tile, VehicleId};

/// The status of a single vehicle.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub position: Tile,
    pub previous: Tile,
    /// The tile the vehicle will try to enter next, if any.
    pub next: Option<Tile>,
    pub destination: Option<Tile>,
    pub active: bool,
    pub color: Color,
    /// Whether the vehicle was blocked by arbitration this tick.
    pub waiting: bool,
}

/// The status of a single demand source.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DemandSummary {
    pub id: DemandId,
    pub tile: Tile,
    /// The number of queued tokens awaiting fulfilment.
    pub pending: usize,
}

/// An immutable snapshot of the simulation for external consumers.
///
/// Snapshots are value copies taken once per step call; they never alias
/// live simulation state, so render or agent code cannot corrupt the
/// simulation through one.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    /// A copy of the tile grid.
    pub grid: TileGrid,
    /// Per-vehicle status records.
    pub vehicles: Vec<VehicleRecord>,
    /// Per-demand-source summaries.
    pub demand: Vec<DemandSummary>,
    /// The aggregate score: total demand fulfilled.
    pub score: u64,
    /// Completed logic ticks.
    pub tick: u64,
    /// Elapsed simulated time in seconds.
    pub time: f64,
    /// Whether the failure condition has been reached.
    pub game_over: bool,
}
