use crate::{Color, DemandId, Tile};
use log::{debug, warn};
use std::collections::VecDeque;

/// A location generating demand tokens of one colour.
///
/// Tokens queue in FIFO order until a vehicle arrives to fulfil them.
/// A source whose queue grows past half its limit is overloaded; staying
/// overloaded for too long is the simulation's one losing condition.
pub struct DemandSource {
    /// The source's ID.
    id: DemandId,
    /// The tile the source occupies.
    tile: Tile,
    /// The demand colour.
    color: Color,
    /// Queued token ids, oldest first.
    queue: VecDeque<u64>,
    /// The id assigned to the most recently generated token.
    last_token: u64,
    /// Total tokens generated.
    generated: u64,
    /// Total tokens fulfilled.
    fulfilled: u64,
    /// Queued tokens already assigned a vehicle.
    dispatched: usize,
    /// Queue length limit; overload starts above half of it.
    queue_limit: usize,
    /// Whether the queue currently exceeds half its limit.
    overloaded: bool,
    /// Accumulated simulated seconds spent overloaded.
    failure_timer: f64,
}

impl DemandSource {
    pub(crate) fn new(id: DemandId, tile: Tile, color: Color, queue_limit: usize) -> Self {
        Self {
            id,
            tile,
            color,
            queue: VecDeque::new(),
            last_token: 0,
            generated: 0,
            fulfilled: 0,
            dispatched: 0,
            queue_limit,
            overloaded: false,
            failure_timer: 0.0,
        }
    }

    /// Gets the source's ID.
    pub fn id(&self) -> DemandId {
        self.id
    }

    /// The tile the source occupies.
    pub fn tile(&self) -> Tile {
        self.tile
    }

    /// The demand colour.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The number of queued tokens awaiting fulfilment.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Total tokens generated so far.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Total tokens fulfilled so far.
    pub fn fulfilled(&self) -> u64 {
        self.fulfilled
    }

    /// The number of queued tokens that already have a vehicle en route.
    pub fn dispatched_count(&self) -> usize {
        self.dispatched
    }

    /// Whether the queue exceeds half its limit.
    pub fn is_overloaded(&self) -> bool {
        self.overloaded
    }

    /// Accumulated simulated seconds spent overloaded.
    pub fn failure_timer(&self) -> f64 {
        self.failure_timer
    }

    /// Appends a new demand token and returns its id.
    pub(crate) fn generate(&mut self) -> u64 {
        self.last_token += 1;
        self.queue.push_back(self.last_token);
        self.generated += 1;
        self.update_overload();
        debug!(
            "demand {:?} queued token {} ({} pending)",
            self.id,
            self.last_token,
            self.queue.len()
        );
        self.last_token
    }

    /// Dequeues the oldest token on vehicle arrival and releases its
    /// dispatch slot. Returns `false` if no demand is pending.
    pub(crate) fn fulfill(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(_) => {
                self.fulfilled += 1;
                self.dispatched = self.dispatched.saturating_sub(1);
                self.update_overload();
                true
            }
            None => false,
        }
    }

    /// Records that a vehicle has been assigned to one queued token.
    pub(crate) fn mark_dispatched(&mut self) {
        self.dispatched += 1;
    }

    /// The number of queued tokens still awaiting a vehicle.
    pub(crate) fn undispatched(&self) -> usize {
        self.queue.len().saturating_sub(self.dispatched)
    }

    /// Advances the overload failure timer by `dt` simulated seconds.
    ///
    /// The timer accumulates only while the source is overloaded, and is
    /// reset to zero the moment the overload clears. Returns `true` once
    /// the accumulated time reaches `threshold`.
    pub(crate) fn tick_failure_timer(&mut self, dt: f64, threshold: f64) -> bool {
        if self.overloaded {
            self.failure_timer += dt;
            if self.failure_timer >= threshold {
                warn!(
                    "demand {:?} overloaded for {:.1}s, past the failure threshold",
                    self.id, self.failure_timer
                );
                return true;
            }
        } else {
            self.failure_timer = 0.0;
        }
        false
    }

    fn update_overload(&mut self) {
        self.overloaded = self.queue.len() > self.queue_limit / 2;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn source(queue_limit: usize) -> DemandSource {
        DemandSource::new(DemandId::default(), Tile::new(3, 3), Color::Red, queue_limit)
    }

    #[test]
    fn tokens_fulfil_in_fifo_order() {
        let mut source = source(10);
        let first = source.generate();
        let second = source.generate();
        assert!(first < second);
        assert!(source.fulfill());
        assert_eq!(source.pending(), 1);
        assert!(source.fulfill());
        assert!(!source.fulfill());
        assert_eq!(source.fulfilled(), 2);
        assert_eq!(source.generated(), 2);
    }

    #[test]
    fn dispatch_slots_are_released_on_fulfilment() {
        let mut source = source(10);
        source.generate();
        source.generate();
        assert_eq!(source.undispatched(), 2);
        source.mark_dispatched();
        source.mark_dispatched();
        assert_eq!(source.undispatched(), 0);
        source.fulfill();
        assert_eq!(source.dispatched_count(), 1);
        assert_eq!(source.undispatched(), 0);
    }

    #[test]
    fn overload_starts_above_half_the_queue_limit() {
        let mut source = source(10);
        for _ in 0..5 {
            source.generate();
        }
        assert!(!source.is_overloaded());
        source.generate();
        assert!(source.is_overloaded());
    }

    #[test]
    fn failure_timer_resets_when_overload_clears() {
        let mut source = source(10);
        for _ in 0..6 {
            source.generate();
        }
        assert!(!source.tick_failure_timer(30.0, 60.0));
        assert_eq!(source.failure_timer(), 30.0);

        // Dropping back to the limit clears the timer entirely.
        source.fulfill();
        assert!(!source.tick_failure_timer(1.0, 60.0));
        assert_eq!(source.failure_timer(), 0.0);

        // Overloading again starts from scratch.
        source.generate();
        assert!(!source.tick_failure_timer(59.0, 60.0));
        assert!(source.tick_failure_timer(1.0, 60.0));
    }
}
