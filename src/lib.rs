pub use cgmath;
pub use clock::TickClock;
pub use demand::DemandSource;
pub use garage::{DispatchError, Garage};
pub use grid::{TileGrid, TileKind};
pub use network::RoadNetwork;
pub use simulation::{DemandPolicy, EditAction, Simulation, SimulationConfig};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use snapshot::{DemandSummary, VehicleRecord, WorldState};
pub use tile::{Segment, Tile};
pub use vehicle::{TaskState, Vehicle};

mod arbiter;
mod clock;
mod demand;
mod garage;
mod grid;
mod network;
mod simulation;
mod snapshot;
mod tile;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
    /// Unique ID of a [Garage].
    pub struct GarageId;
    /// Unique ID of a [DemandSource].
    pub struct DemandId;
}

/// A demand colour. Garages only serve demand sources of their own colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
type GarageSet = SlotMap<GarageId, Garage>;
type DemandSet = SlotMap<DemandId, DemandSource>;
