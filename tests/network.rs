//! Tests of road-network editing and pathfinding.

use motorway_sim::{EditAction, RoadNetwork, Simulation, Tile};
use serde_json::json;

fn tile(x: i32, y: i32) -> Tile {
    Tile::new(x, y)
}

#[test]
fn duplicate_insert_is_rejected() {
    let mut network = RoadNetwork::new();
    assert!(network.add_segment(tile(0, 0), tile(1, 0)));
    assert!(!network.add_segment(tile(0, 0), tile(1, 0)));
    assert_eq!(network.segment_count(), 1);
}

#[test]
fn removing_a_missing_segment_fails() {
    let mut network = RoadNetwork::new();
    network.add_segment(tile(0, 0), tile(1, 0));
    assert!(!network.remove_segment(tile(1, 0), tile(0, 0)));
    assert_eq!(network.segment_count(), 1);
    assert!(network.remove_segment(tile(0, 0), tile(1, 0)));
    assert_eq!(network.segment_count(), 0);
}

#[test]
fn segments_are_directed() {
    let mut network = RoadNetwork::new();
    network.add_segment(tile(0, 0), tile(1, 0));
    assert!(network.has_segment(tile(0, 0), tile(1, 0)));
    assert!(!network.has_segment(tile(1, 0), tile(0, 0)));
    assert_eq!(network.shortest_path(tile(1, 0), tile(0, 0)), None);
}

#[test]
fn shortest_path_includes_both_endpoints() {
    let mut network = RoadNetwork::new();
    for x in 0..5 {
        network.add_segment(tile(x, 0), tile(x + 1, 0));
    }
    let path = network.shortest_path(tile(0, 0), tile(5, 0)).unwrap();
    assert_eq!(path.first(), Some(&tile(0, 0)));
    assert_eq!(path.last(), Some(&tile(5, 0)));
    assert_eq!(path.len(), 6);
}

#[test]
fn path_prefers_lower_total_weight() {
    // The diagonal shortcut beats two axis-aligned steps.
    let mut network = RoadNetwork::new();
    network.add_segment(tile(0, 0), tile(1, 0));
    network.add_segment(tile(1, 0), tile(1, 1));
    network.add_segment(tile(0, 0), tile(1, 1));
    let path = network.shortest_path(tile(0, 0), tile(1, 1)).unwrap();
    assert_eq!(path, vec![tile(0, 0), tile(1, 1)]);
}

#[test]
fn repeated_queries_return_the_same_path() {
    // A grid block with many equal-length routes between its corners.
    let mut network = RoadNetwork::new();
    for x in 0..3 {
        for y in 0..4 {
            network.add_segment(tile(x, y), tile(x + 1, y));
        }
    }
    for x in 0..4 {
        for y in 0..3 {
            network.add_segment(tile(x, y), tile(x, y + 1));
        }
    }
    let first = network.shortest_path(tile(0, 0), tile(3, 3)).unwrap();
    let second = network.shortest_path(tile(0, 0), tile(3, 3)).unwrap();
    assert_eq!(first.len(), 7);
    assert_eq!(first, second);
}

#[test]
fn disconnected_tiles_have_no_path() {
    let mut network = RoadNetwork::new();
    network.add_segment(tile(0, 0), tile(1, 0));
    network.add_segment(tile(5, 5), tile(6, 5));
    assert_eq!(network.shortest_path(tile(0, 0), tile(6, 5)), None);
}

#[test]
fn reset_clears_all_segments() {
    let mut network = RoadNetwork::new();
    network.add_segment(tile(0, 0), tile(1, 0));
    network.add_segment(tile(1, 0), tile(2, 0));
    network.reset();
    assert_eq!(network.segment_count(), 0);
    assert!(!network.has_segment(tile(0, 0), tile(1, 0)));
    assert_eq!(network.shortest_path(tile(0, 0), tile(2, 0)), None);
}

#[test]
fn path_to_own_tile_is_trivial() {
    let network = RoadNetwork::new();
    assert_eq!(network.shortest_path(tile(3, 3), tile(3, 3)), Some(vec![tile(3, 3)]));
}

#[test]
fn edit_actions_report_no_ops() {
    let mut sim = Simulation::new(10, 10);
    let add = EditAction::AddRoad {
        from: tile(0, 0),
        to: tile(1, 0),
    };

    let (_, _, _, info) = sim.step(Some(add), None);
    assert_eq!(info["edit_applied"], json!(true));
    // The second insert of the same directed edge is rejected and the
    // graph is left unchanged.
    let (_, _, _, info) = sim.step(Some(add), None);
    assert_eq!(info["edit_applied"], json!(false));
    assert_eq!(sim.network().segment_count(), 1);

    let remove = EditAction::RemoveRoad {
        from: tile(5, 5),
        to: tile(6, 5),
    };
    let (_, _, _, info) = sim.step(Some(remove), None);
    assert_eq!(info["edit_applied"], json!(false));
    assert_eq!(sim.network().segment_count(), 1);
}
