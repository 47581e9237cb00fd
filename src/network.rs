use crate::{Segment, Tile};
use pathfinding::directed::dijkstra::dijkstra;
use std::collections::HashMap;

/// Quantisation applied to segment weights for the shortest-path search.
const COST_SCALE: f64 = 1000.0;

/// A directed weighted graph of road segments over tile coordinates.
///
/// Adjacency lists are kept sorted by target tile, so path queries are
/// deterministic for a fixed graph and ties between equal-weight routes
/// are always broken the same way.
#[derive(Clone, Debug, Default)]
pub struct RoadNetwork {
    /// Adjacency lists with the Euclidean weight of each segment.
    edges: HashMap<Tile, Vec<(Tile, f64)>>,
    /// The number of directed segments in the graph.
    count: usize,
}

impl RoadNetwork {
    /// Creates an empty road network.
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts a directed segment weighted by the Euclidean distance
    /// between its endpoints.
    ///
    /// Returns `false` if the segment already exists; the graph holds at
    /// most one segment per ordered pair of tiles.
    pub fn add_segment(&mut self, from: Tile, to: Tile) -> bool {
        let list = self.edges.entry(from).or_default();
        match list.binary_search_by_key(&to, |&(t, _)| t) {
            Ok(_) => false,
            Err(idx) => {
                list.insert(idx, (to, from.distance(to)));
                self.count += 1;
                true
            }
        }
    }

    /// Removes a directed segment.
    /// Returns `false` if the segment does not exist.
    pub fn remove_segment(&mut self, from: Tile, to: Tile) -> bool {
        let Some(list) = self.edges.get_mut(&from) else {
            return false;
        };
        match list.binary_search_by_key(&to, |&(t, _)| t) {
            Ok(idx) => {
                list.remove(idx);
                if list.is_empty() {
                    self.edges.remove(&from);
                }
                self.count -= 1;
                true
            }
            Err(_) => false,
        }
    }

    /// Direct adjacency test.
    pub fn has_segment(&self, from: Tile, to: Tile) -> bool {
        self.edges
            .get(&from)
            .map_or(false, |list| list.binary_search_by_key(&to, |&(t, _)| t).is_ok())
    }

    /// The number of directed segments in the network.
    pub fn segment_count(&self) -> usize {
        self.count
    }

    /// Returns an iterator over all the segments in the network.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, list)| list.iter().map(move |&(to, _)| Segment::new(*from, to)))
    }

    /// Finds the minimum-total-weight path between two tiles, inclusive of
    /// both endpoints, or `None` if they are disconnected.
    pub fn shortest_path(&self, from: Tile, to: Tile) -> Option<Vec<Tile>> {
        let (path, _) = dijkstra(&from, |tile| self.successors(*tile), |tile| *tile == to)?;
        Some(path)
    }

    fn successors(&self, tile: Tile) -> impl Iterator<Item = (Tile, u64)> + '_ {
        self.edges
            .get(&tile)
            .into_iter()
            .flatten()
            .map(|&(to, weight)| (to, (COST_SCALE * weight).round() as u64))
    }

    /// Clears all segments.
    pub fn reset(&mut self) {
        self.edges.clear();
        self.count = 0;
    }
}
