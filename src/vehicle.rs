use crate::{Color, GarageId, Tile, VehicleId};

/// The task a vehicle is currently performing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskState {
    /// Held in its garage's idle pool.
    Idle,
    /// Driving towards a demand source.
    EnRouteToDemand,
    /// Driving back to its garage.
    ReturningHome,
}

/// A simulated vehicle.
///
/// Vehicles are created once at garage construction and cycle through
/// their task states for the lifetime of the simulation; they are never
/// destroyed.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID.
    id: VehicleId,
    /// The tile the vehicle currently occupies.
    position: Tile,
    /// The tile the vehicle occupied before its last advance.
    previous: Tile,
    /// The route being followed. The first tile is where the route began.
    route: Vec<Tile>,
    /// The index into `route` of the current position.
    cursor: usize,
    /// The demand colour this vehicle serves.
    color: Color,
    /// The current task.
    task: TaskState,
    /// The garage the vehicle belongs to.
    home: GarageId,
    /// The tile being driven to, if any.
    destination: Option<Tile>,
    /// Whether the vehicle is moving along a route.
    active: bool,
    /// Whether the vehicle was blocked by arbitration this tick.
    waiting: bool,
}

impl Vehicle {
    /// Creates an idle vehicle sitting at its garage tile.
    pub(crate) fn new(id: VehicleId, home: GarageId, tile: Tile, color: Color) -> Self {
        Self {
            id,
            position: tile,
            previous: tile,
            route: vec![],
            cursor: 0,
            color,
            task: TaskState::Idle,
            home,
            destination: None,
            active: false,
            waiting: false,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The tile the vehicle currently occupies.
    pub fn position(&self) -> Tile {
        self.position
    }

    /// The tile the vehicle occupied before its last advance.
    pub fn previous(&self) -> Tile {
        self.previous
    }

    /// The demand colour this vehicle serves.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The current task.
    pub fn task(&self) -> TaskState {
        self.task
    }

    /// The garage the vehicle belongs to.
    pub fn home(&self) -> GarageId {
        self.home
    }

    /// The tile being driven to, if any.
    pub fn destination(&self) -> Option<Tile> {
        self.destination
    }

    /// Whether the vehicle is moving along a route.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the vehicle was blocked by arbitration this tick.
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// The tile the vehicle would occupy after one more advance, or `None`
    /// if it is already at the end of its route.
    pub fn peek_next(&self) -> Option<Tile> {
        self.peek_ahead(1)
    }

    /// The tile `steps` advances ahead on the route, if it extends that far.
    pub(crate) fn peek_ahead(&self, steps: usize) -> Option<Tile> {
        if !self.active {
            return None;
        }
        self.route.get(self.cursor + steps).copied()
    }

    /// Installs a new route and marks the vehicle active.
    /// The route must begin at the vehicle's current position.
    pub(crate) fn set_route(&mut self, route: Vec<Tile>) {
        debug_assert_eq!(route.first(), Some(&self.position));
        self.cursor = 0;
        self.active = !route.is_empty();
        self.route = route;
    }

    /// Moves the cursor forward one step if any remain. On reaching the
    /// final tile of the route the vehicle goes inactive.
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.route.get(self.cursor + 1).copied() {
            self.previous = self.position;
            self.position = next;
            self.cursor += 1;
        }
        if self.cursor + 1 >= self.route.len() {
            self.active = false;
        }
    }

    pub(crate) fn set_task(&mut self, task: TaskState) {
        self.task = task;
    }

    pub(crate) fn set_destination(&mut self, destination: Option<Tile>) {
        self.destination = destination;
    }

    pub(crate) fn set_waiting(&mut self, waiting: bool) {
        self.waiting = waiting;
    }

    /// Drops the current route without changing position, for a vehicle
    /// held aside while no path home exists.
    pub(crate) fn clear_route(&mut self) {
        self.route.clear();
        self.cursor = 0;
        self.active = false;
    }

    /// Returns the vehicle to its garage tile and clears all routing state.
    pub(crate) fn park(&mut self, tile: Tile) {
        self.position = tile;
        self.previous = tile;
        self.route.clear();
        self.cursor = 0;
        self.destination = None;
        self.task = TaskState::Idle;
        self.active = false;
        self.waiting = false;
    }
}
