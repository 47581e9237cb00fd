use crate::network::RoadNetwork;
use crate::vehicle::{TaskState, Vehicle};
use crate::{Color, GarageId, Tile, VehicleId, VehicleSet};
use log::trace;
use smallvec::SmallVec;

/// Why a dispatch attempt failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The idle pool is empty.
    NoVehicle,
    /// No path exists from the garage to the target tile.
    Unreachable,
}

/// A fixed-capacity pool of vehicles tied to one tile and one demand colour.
///
/// Every vehicle is in exactly one of two places at any time: the garage's
/// idle pool, or out on a task and registered with the movement arbiter.
/// [Garage::dispatch] and [Garage::receive] are the only operations that
/// move a vehicle between the two.
pub struct Garage {
    /// The garage's ID.
    id: GarageId,
    /// The tile the garage occupies.
    tile: Tile,
    /// The demand colour this garage serves.
    color: Color,
    /// The total number of vehicles owned by the garage.
    capacity: usize,
    /// The vehicles currently available for dispatch.
    idle: SmallVec<[VehicleId; 4]>,
}

impl Garage {
    /// Creates a garage and mints its vehicles into the vehicle set.
    pub(crate) fn new(
        id: GarageId,
        tile: Tile,
        color: Color,
        capacity: usize,
        vehicles: &mut VehicleSet,
    ) -> Self {
        let idle = (0..capacity)
            .map(|_| vehicles.insert_with_key(|vid| Vehicle::new(vid, id, tile, color)))
            .collect();
        Self {
            id,
            tile,
            color,
            capacity,
            idle,
        }
    }

    /// Gets the garage's ID.
    pub fn id(&self) -> GarageId {
        self.id
    }

    /// The tile the garage occupies.
    pub fn tile(&self) -> Tile {
        self.tile
    }

    /// The demand colour this garage serves.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The total number of vehicles owned by the garage.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of vehicles available for dispatch.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// The number of vehicles currently out on a task.
    pub fn dispatched_count(&self) -> usize {
        self.capacity - self.idle.len()
    }

    /// Dispatches an idle vehicle to the target tile.
    ///
    /// Fails without touching the idle pool if no vehicle is available or
    /// the target is unreachable from the garage tile. On success the
    /// returned vehicle has its route installed and must be registered with
    /// the movement arbiter by the caller.
    pub(crate) fn dispatch(
        &mut self,
        vehicles: &mut VehicleSet,
        network: &RoadNetwork,
        target: Tile,
    ) -> Result<VehicleId, DispatchError> {
        let Some(&vid) = self.idle.last() else {
            return Err(DispatchError::NoVehicle);
        };
        let route = network
            .shortest_path(self.tile, target)
            .ok_or(DispatchError::Unreachable)?;
        self.idle.pop();
        let vehicle = &mut vehicles[vid];
        vehicle.set_route(route);
        vehicle.set_destination(Some(target));
        vehicle.set_task(TaskState::EnRouteToDemand);
        trace!("garage {:?} dispatched {:?} to {:?}", self.id, vid, target);
        Ok(vid)
    }

    /// Takes a vehicle back into the idle pool on arrival at the garage.
    /// The vehicle's position is forced to the garage tile.
    pub(crate) fn receive(&mut self, vehicle: &mut Vehicle) {
        vehicle.park(self.tile);
        self.idle.push(vehicle.id());
    }
}
