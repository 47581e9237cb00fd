use crate::arbiter::MovementArbiter;
use crate::clock::TickClock;
use crate::demand::DemandSource;
use crate::garage::Garage;
use crate::grid::{TileGrid, TileKind};
use crate::network::RoadNetwork;
use crate::snapshot::{DemandSummary, VehicleRecord, WorldState};
use crate::vehicle::{TaskState, Vehicle};
use crate::{Color, DemandId, DemandSet, GarageId, GarageSet, Tile, VehicleId, VehicleSet};
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

/// A network-edit command, applied at the start of a step before any tick
/// runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditAction {
    AddRoad { from: Tile, to: Tile },
    RemoveRoad { from: Tile, to: Tile },
}

/// How the source receiving a newly generated demand token is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DemandPolicy {
    /// Picked uniformly at random among the existing sources.
    #[default]
    Uniform,
    /// Deterministic rotation through the sources.
    RoundRobin,
}

/// Tunable parameters of a simulation.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Logic ticks per simulated second.
    pub tick_rate: f64,
    /// Whole ticks between demand token generations; 0 disables generation.
    pub generation_interval: u64,
    /// How the source receiving a new token is chosen.
    pub demand_policy: DemandPolicy,
    /// Maximum queued tokens per source; overload starts above half this.
    pub queue_limit: usize,
    /// Accumulated overload seconds before the game is lost.
    pub failure_threshold: f64,
    /// The most logic ticks a single step call may run.
    pub max_ticks_per_step: usize,
    /// Seed for the arbitration and demand RNG; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 15.0,
            generation_interval: 10,
            demand_policy: DemandPolicy::default(),
            queue_limit: 10,
            failure_threshold: 60.0,
            max_ticks_per_step: 5,
            seed: None,
        }
    }
}

/// A tile-based road traffic simulation.
pub struct Simulation {
    /// The tile grid.
    grid: TileGrid,
    /// The road network.
    network: RoadNetwork,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The garages.
    garages: GarageSet,
    /// The demand sources.
    demand: DemandSet,
    /// The per-tick movement arbiter.
    arbiter: MovementArbiter,
    /// The fixed-timestep clock.
    clock: TickClock,
    /// Randomness for arbitration order and demand placement.
    rng: StdRng,
    /// Vehicles awaiting a return path home.
    stranded: Vec<VehicleId>,
    /// Rotation cursor for [DemandPolicy::RoundRobin].
    next_source: usize,
    /// Completed logic ticks.
    tick: u64,
    /// The aggregate score: total demand fulfilled.
    score: u64,
    /// Whether the failure condition has been reached.
    game_over: bool,
    config: SimulationConfig,
}

impl Simulation {
    /// Creates a simulation over a `width` x `height` tile grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_config(width, height, SimulationConfig::default())
    }

    /// Creates a simulation with explicit configuration.
    pub fn with_config(width: usize, height: usize, config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            grid: TileGrid::new(width, height),
            network: RoadNetwork::new(),
            vehicles: VehicleSet::default(),
            garages: GarageSet::default(),
            demand: DemandSet::default(),
            arbiter: MovementArbiter::default(),
            clock: TickClock::new(config.tick_rate, config.max_ticks_per_step),
            rng,
            stranded: vec![],
            next_source: 0,
            tick: 0,
            score: 0,
            game_over: false,
            config,
        }
    }

    /// Adds a garage with `capacity` vehicles at the given tile.
    pub fn add_garage(&mut self, tile: Tile, color: Color, capacity: usize) -> GarageId {
        let vehicles = &mut self.vehicles;
        let id = self
            .garages
            .insert_with_key(|id| Garage::new(id, tile, color, capacity, vehicles));
        info!("added garage {:?} at {:?} ({:?}, capacity {})", id, tile, color, capacity);
        id
    }

    /// Adds a demand source at the given tile.
    pub fn add_demand_source(&mut self, tile: Tile, color: Color) -> DemandId {
        let limit = self.config.queue_limit;
        let id = self
            .demand
            .insert_with_key(|id| DemandSource::new(id, tile, color, limit));
        info!("added demand source {:?} at {:?} ({:?})", id, tile, color);
        id
    }

    /// Manually enqueues a demand token at the given source.
    /// Returns the token id, or `None` if the source does not exist.
    pub fn generate_demand(&mut self, id: DemandId) -> Option<u64> {
        self.demand.get_mut(id).map(|source| source.generate())
    }

    /// Marks a tile with a building or road footprint.
    /// Returns `false` if the tile is out of bounds.
    pub fn set_tile(&mut self, tile: Tile, kind: TileKind) -> bool {
        self.grid.set(tile, kind)
    }

    /// The tile grid.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// The road network.
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Mutable access to the road network, for constructing roads outside
    /// the step loop. Within a step the network only changes through the
    /// edit action.
    pub fn network_mut(&mut self) -> &mut RoadNetwork {
        &mut self.network
    }

    /// Gets a reference to the garage with the given ID.
    pub fn get_garage(&self, id: GarageId) -> &Garage {
        &self.garages[id]
    }

    /// Gets a reference to the demand source with the given ID.
    pub fn get_demand(&self, id: DemandId) -> &DemandSource {
        &self.demand[id]
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id]
    }

    /// Returns an iterator over all the garages in the simulation.
    pub fn garages(&self) -> impl Iterator<Item = (GarageId, &Garage)> {
        self.garages.iter()
    }

    /// Returns an iterator over all the demand sources in the simulation.
    pub fn demand_sources(&self) -> impl Iterator<Item = (DemandId, &DemandSource)> {
        self.demand.iter()
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// The demand colours currently in play.
    pub fn colors_in_use(&self) -> Vec<Color> {
        self.garages
            .values()
            .map(Garage::color)
            .chain(self.demand.values().map(DemandSource::color))
            .unique()
            .collect()
    }

    /// The aggregate score.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Completed logic ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether the failure condition has been reached.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Builds an immutable world-state snapshot.
    pub fn world_state(&self) -> WorldState {
        let vehicles = self
            .vehicles
            .iter()
            .map(|(id, vehicle)| VehicleRecord {
                id,
                position: vehicle.position(),
                previous: vehicle.previous(),
                next: vehicle.peek_next(),
                destination: vehicle.destination(),
                active: vehicle.is_active(),
                color: vehicle.color(),
                waiting: vehicle.is_waiting(),
            })
            .collect();
        let demand = self
            .demand
            .iter()
            .map(|(id, source)| DemandSummary {
                id,
                tile: source.tile(),
                pending: source.pending(),
            })
            .collect();
        WorldState {
            grid: self.grid.clone(),
            vehicles,
            demand,
            score: self.score,
            tick: self.tick,
            time: self.tick as f64 * self.clock.tick_duration(),
            game_over: self.game_over,
        }
    }

    /// Executes a simulation step.
    ///
    /// The edit action, if any, is applied before any tick runs. With no
    /// `dt` exactly one logic tick executes; with `dt` the clock converts
    /// the elapsed real time into up to
    /// [SimulationConfig::max_ticks_per_step] ticks. Overload failure
    /// timers are paced by real time, not ticks.
    ///
    /// Returns the world-state snapshot, a reward (currently always zero),
    /// the game-over flag and a metadata map. Once the game is over,
    /// further calls return immediately with the terminal state.
    pub fn step(
        &mut self,
        action: Option<EditAction>,
        dt: Option<f64>,
    ) -> (WorldState, f64, bool, serde_json::Value) {
        if self.game_over {
            return (self.world_state(), 0.0, true, json!({ "ticks": 0 }));
        }

        let edit_ok = action.map(|action| self.apply_edit(action));

        let ticks = match dt {
            None => {
                self.logic_tick();
                self.tick_failure_timers(self.clock.tick_duration());
                1
            }
            Some(dt) => {
                self.tick_failure_timers(dt);
                let ticks = self.clock.advance(dt);
                for _ in 0..ticks {
                    self.logic_tick();
                }
                ticks
            }
        };

        let info = json!({ "ticks": ticks, "edit_applied": edit_ok });
        (self.world_state(), 0.0, self.game_over, info)
    }

    fn apply_edit(&mut self, action: EditAction) -> bool {
        match action {
            EditAction::AddRoad { from, to } => {
                let added = self.network.add_segment(from, to);
                if !added {
                    debug!("road {:?} -> {:?} already exists", from, to);
                }
                added
            }
            EditAction::RemoveRoad { from, to } => {
                let removed = self.network.remove_segment(from, to);
                if !removed {
                    debug!("no road {:?} -> {:?} to remove", from, to);
                }
                removed
            }
        }
    }

    fn tick_failure_timers(&mut self, dt: f64) {
        let threshold = self.config.failure_threshold;
        for source in self.demand.values_mut() {
            if source.tick_failure_timer(dt, threshold) && !self.game_over {
                warn!("demand {:?} exceeded the failure threshold, game over", source.id());
                self.game_over = true;
            }
        }
    }

    /// Runs one logic tick.
    fn logic_tick(&mut self) {
        self.retry_stranded();
        let finished = self.arbiter.update(&mut self.vehicles, &mut self.rng);
        self.process_arrivals(finished);
        self.generate_demand_tick();
        self.reconcile_dispatch();
        self.tick += 1;
        self.score = self.demand.values().map(DemandSource::fulfilled).sum();
    }

    /// Handles the vehicles that finished their route this tick.
    fn process_arrivals(&mut self, finished: Vec<VehicleId>) {
        for id in finished {
            let Some(vehicle) = self.vehicles.get(id) else {
                continue;
            };
            match vehicle.task() {
                TaskState::EnRouteToDemand => {
                    let tile = vehicle.position();
                    let color = vehicle.color();
                    if let Some(source) = self
                        .demand
                        .values_mut()
                        .find(|s| s.tile() == tile && s.color() == color)
                    {
                        if !source.fulfill() {
                            debug!("vehicle {:?} arrived at {:?} with no pending demand", id, tile);
                        }
                    }
                    self.route_home(id);
                }
                TaskState::ReturningHome => {
                    let home = vehicle.home();
                    if let Some(garage) = self.garages.get_mut(home) {
                        garage.receive(&mut self.vehicles[id]);
                    }
                }
                // Idle vehicles are never registered with the arbiter.
                TaskState::Idle => {}
            }
        }
    }

    /// Routes a vehicle back to its garage, or holds it aside for retry on
    /// later ticks if no path home currently exists.
    fn route_home(&mut self, id: VehicleId) {
        let vehicle = &self.vehicles[id];
        let Some(garage) = self.garages.get(vehicle.home()) else {
            return;
        };
        let home_tile = garage.tile();
        match self.network.shortest_path(vehicle.position(), home_tile) {
            Some(route) => {
                let vehicle = &mut self.vehicles[id];
                vehicle.set_route(route);
                vehicle.set_destination(Some(home_tile));
                vehicle.set_task(TaskState::ReturningHome);
                self.arbiter.register(id);
            }
            None => {
                debug!("vehicle {:?} stranded at {:?}, no path home", id, vehicle.position());
                let vehicle = &mut self.vehicles[id];
                vehicle.clear_route();
                vehicle.set_task(TaskState::ReturningHome);
                vehicle.set_waiting(true);
                self.stranded.push(id);
            }
        }
    }

    /// Retries pathfinding for vehicles stranded without a way home.
    fn retry_stranded(&mut self) {
        if self.stranded.is_empty() {
            return;
        }
        let stranded = std::mem::take(&mut self.stranded);
        for id in stranded {
            self.route_home(id);
        }
    }

    /// Possibly generates one new demand token this tick.
    fn generate_demand_tick(&mut self) {
        let interval = self.config.generation_interval;
        if interval == 0 || self.tick == 0 || self.tick % interval != 0 || self.demand.is_empty() {
            return;
        }
        let index = match self.config.demand_policy {
            DemandPolicy::Uniform => self.rng.gen_range(0..self.demand.len()),
            DemandPolicy::RoundRobin => {
                let index = self.next_source % self.demand.len();
                self.next_source = self.next_source.wrapping_add(1);
                index
            }
        };
        if let Some(source) = self.demand.values_mut().nth(index) {
            source.generate();
        }
    }

    /// Attempts one dispatch per queued token that has no vehicle assigned
    /// yet, against the garages of the matching colour.
    fn reconcile_dispatch(&mut self) {
        let demand_ids: Vec<DemandId> = self.demand.keys().collect();
        for demand_id in demand_ids {
            let (tile, color, needed) = {
                let source = &self.demand[demand_id];
                (source.tile(), source.color(), source.undispatched())
            };
            'tokens: for _ in 0..needed {
                for garage in self.garages.values_mut() {
                    if garage.color() != color {
                        continue;
                    }
                    if let Ok(vehicle_id) = garage.dispatch(&mut self.vehicles, &self.network, tile)
                    {
                        self.arbiter.register(vehicle_id);
                        self.demand[demand_id].mark_dispatched();
                        continue 'tokens;
                    }
                }
                // No garage can serve this source right now.
                break;
            }
        }
    }
}
