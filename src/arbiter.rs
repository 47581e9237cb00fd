use crate::{Segment, Tile, VehicleId, VehicleSet};
use cgmath::Vector2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// A vehicle's claim on a tile during arbitration.
#[derive(Clone, Copy)]
struct Occupant {
    vehicle: VehicleId,
    /// The direction of travel, or `None` for a vehicle at its route end.
    /// Route-end occupants block all entry; otherwise a tile admits only
    /// traffic running exactly opposite to its occupants.
    dir: Option<Vector2<i32>>,
}

/// Advances every active vehicle by at most one tile per tick, arbitrating
/// access to shared tiles and directed segments.
///
/// Vehicles are visited in an order shuffled fresh each tick so no vehicle
/// holds perpetual right-of-way. Moves are applied sequentially and the
/// occupancy maps updated in place, so a vehicle processed later in the
/// tick sees the moves already made and a queue can flow through in a
/// single tick rather than one vehicle per tick.
#[derive(Default)]
pub(crate) struct MovementArbiter {
    /// The vehicles currently moving along routes.
    active: Vec<VehicleId>,
}

impl MovementArbiter {
    /// Registers a vehicle for per-tick movement.
    pub fn register(&mut self, id: VehicleId) {
        if !self.active.contains(&id) {
            self.active.push(id);
        }
    }

    /// The number of vehicles being arbitrated.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Runs one tick of movement resolution.
    /// Returns the vehicles that finished their route this tick.
    pub fn update(&mut self, vehicles: &mut VehicleSet, rng: &mut StdRng) -> Vec<VehicleId> {
        let mut tiles: HashMap<Tile, SmallVec<[Occupant; 2]>> = HashMap::new();
        let mut segments: HashSet<Segment> = HashSet::new();

        for &id in &self.active {
            let vehicle = &vehicles[id];
            let pos = vehicle.position();
            let next = vehicle.peek_next();
            tiles.entry(pos).or_default().push(Occupant {
                vehicle: id,
                dir: next.map(|n| pos.delta(n)),
            });
            if let Some(next) = next {
                segments.insert(Segment::new(pos, next));
            }
        }

        let mut order = self.active.clone();
        order.shuffle(rng);

        let mut finished = vec![];
        for id in order {
            let vehicle = &vehicles[id];
            let pos = vehicle.position();
            let Some(next) = vehicle.peek_next() else {
                // Route already exhausted: finish in place and release the
                // tile claim.
                release(&mut tiles, pos, id);
                vehicles[id].advance();
                finished.push(id);
                continue;
            };
            let dir = pos.delta(next);

            // Car following: the segment this vehicle would occupy after
            // moving must have been vacated by the vehicle ahead.
            let blocked = vehicle
                .peek_ahead(2)
                .map_or(false, |after| segments.contains(&Segment::new(next, after)))
                // The desired tile admits only exactly-opposite traffic;
                // two vehicles passing head-on share the tile safely.
                || tiles.get(&next).map_or(false, |occupants| {
                    occupants
                        .iter()
                        .any(|o| o.vehicle != id && o.dir != Some(-dir))
                });

            if blocked {
                vehicles[id].set_waiting(true);
                continue;
            }

            release(&mut tiles, pos, id);
            segments.remove(&Segment::new(pos, next));

            let vehicle = &mut vehicles[id];
            vehicle.advance();
            vehicle.set_waiting(false);

            let onward = vehicle.peek_next();
            tiles.entry(next).or_default().push(Occupant {
                vehicle: id,
                // The direction actually travelled this tick, so later
                // claimants test against the move that was made.
                dir: onward.map(|_| dir),
            });
            match onward {
                Some(onward) => {
                    segments.insert(Segment::new(next, onward));
                }
                None => finished.push(id),
            }
        }

        self.active.retain(|id| !finished.contains(id));
        finished
    }
}

fn release(tiles: &mut HashMap<Tile, SmallVec<[Occupant; 2]>>, tile: Tile, id: VehicleId) {
    if let Some(occupants) = tiles.get_mut(&tile) {
        occupants.retain(|o| o.vehicle != id);
        if occupants.is_empty() {
            tiles.remove(&tile);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::Vehicle;
    use crate::{Color, GarageId};
    use rand::SeedableRng;

    fn vehicle(vehicles: &mut VehicleSet, route: Vec<Tile>) -> VehicleId {
        let start = route[0];
        let id = vehicles
            .insert_with_key(|id| Vehicle::new(id, GarageId::default(), start, Color::Red));
        vehicles[id].set_route(route);
        id
    }

    #[test]
    fn opposite_vehicles_swap_tiles() {
        let mut vehicles = VehicleSet::default();
        let a = vehicle(&mut vehicles, vec![Tile::new(0, 0), Tile::new(1, 0)]);
        let b = vehicle(&mut vehicles, vec![Tile::new(1, 0), Tile::new(0, 0)]);
        let mut arbiter = MovementArbiter::default();
        arbiter.register(a);
        arbiter.register(b);

        let mut rng = StdRng::seed_from_u64(1);
        let finished = arbiter.update(&mut vehicles, &mut rng);

        assert_eq!(vehicles[a].position(), Tile::new(1, 0));
        assert_eq!(vehicles[b].position(), Tile::new(0, 0));
        assert_eq!(finished.len(), 2);
        assert_eq!(arbiter.active_count(), 0);
    }

    #[test]
    fn crossing_vehicles_contest_the_shared_tile() {
        let mut vehicles = VehicleSet::default();
        let a = vehicle(
            &mut vehicles,
            vec![Tile::new(0, 1), Tile::new(1, 1), Tile::new(2, 1)],
        );
        let b = vehicle(
            &mut vehicles,
            vec![Tile::new(1, 0), Tile::new(1, 1), Tile::new(1, 2)],
        );
        let mut arbiter = MovementArbiter::default();
        arbiter.register(a);
        arbiter.register(b);

        let mut rng = StdRng::seed_from_u64(1);
        arbiter.update(&mut vehicles, &mut rng);

        // Whoever went first won the crossing; the other waited in place.
        let moved = [a, b]
            .iter()
            .filter(|&&id| vehicles[id].position() == Tile::new(1, 1))
            .count();
        assert_eq!(moved, 1);
        let waiting = [a, b].iter().filter(|&&id| vehicles[id].is_waiting()).count();
        assert_eq!(waiting, 1);
    }

    #[test]
    fn follower_never_shares_a_tile_with_its_leader() {
        let mut vehicles = VehicleSet::default();
        let leader = vehicle(&mut vehicles, vec![Tile::new(1, 0), Tile::new(2, 0)]);
        let follower = vehicle(
            &mut vehicles,
            vec![Tile::new(0, 0), Tile::new(1, 0), Tile::new(2, 0)],
        );
        let mut arbiter = MovementArbiter::default();
        arbiter.register(leader);
        arbiter.register(follower);

        let mut rng = StdRng::seed_from_u64(1);
        arbiter.update(&mut vehicles, &mut rng);

        // The leader finishes at (2, 0). Depending on the visit order the
        // follower either slots into the vacated tile or waits a tick, but
        // it never ends up sharing a tile with the stopped leader.
        assert_eq!(vehicles[leader].position(), Tile::new(2, 0));
        let behind = vehicles[follower].position();
        assert_ne!(behind, vehicles[leader].position());
        assert!(behind == Tile::new(0, 0) || behind == Tile::new(1, 0));
        if behind == Tile::new(0, 0) {
            assert!(vehicles[follower].is_waiting());
        }
    }
}
