//! Tests for field clamping, propagation and the worker transport.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use formica_core::enums::{EntityKind, PheromoneKind};
use formica_core::profiles::Registry;
use formica_core::types::{EntityId, GridBounds, GridPos};

use crate::field::PheromoneField;
use crate::propagation::{
    compute_steady_state, disperse, flood_fill, reverse_flood_fill, PheromoneSource,
};
use crate::terrain::Terrain;
use crate::worker::{PheromoneWorker, WorkerError, WorkerInit, WorkerLink, WorkerRequest};

fn setup(width: i32, height: i32) -> (Arc<Registry>, PheromoneField, Terrain) {
    let registry = Arc::new(Registry::standard());
    let bounds = GridBounds::new(width, height);
    let field = PheromoneField::new(bounds, &registry);
    (registry, field, Terrain::new(bounds))
}

fn light(x: i32, y: i32, quantity: f64) -> PheromoneSource {
    PheromoneSource::new(PheromoneKind::Light, GridPos::new(x, y), quantity)
}

// ---- Field ----

#[test]
fn test_set_clamps_to_profile_maximum() {
    let (_, mut field, _) = setup(10, 10);
    field.set(PheromoneKind::Light, GridPos::new(1, 1), 10_000.0);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(1, 1)), 350.0);

    field.set(PheromoneKind::Heat, GridPos::new(2, 2), -5.0);
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(2, 2)), 0.0);
    assert_eq!(field.cell_count(PheromoneKind::Heat), 0);

    field.set(PheromoneKind::Heat, GridPos::new(20, 2), 5.0);
    assert_eq!(field.cell_count(PheromoneKind::Heat), 0, "out of bounds ignored");
}

#[test]
fn test_diff_reports_cleared_cells() {
    let (_, mut field, _) = setup(10, 10);
    field.set(PheromoneKind::Light, GridPos::new(1, 1), 10.0);
    let before = field.clone();
    field.set(PheromoneKind::Light, GridPos::new(1, 1), 0.0);
    field.set(PheromoneKind::Light, GridPos::new(2, 1), 4.0);

    let update = field.diff(&before, &[PheromoneKind::Light]);
    assert_eq!(update.changes.len(), 2);

    let mut replica = before.clone();
    replica.apply(&update);
    assert_eq!(replica.get(PheromoneKind::Light, GridPos::new(1, 1)), 0.0);
    assert_eq!(replica.get(PheromoneKind::Light, GridPos::new(2, 1)), 4.0);
}

// ---- Flood fill ----

#[test]
fn test_flood_fill_attenuates_with_distance() {
    let (registry, mut field, terrain) = setup(20, 20);
    flood_fill(&mut field, &terrain, &registry, &[light(10, 10, 350.0)]);

    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(10, 10)), 350.0);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(11, 10)), 349.0);
    // Manhattan distance 5 through open ground.
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(13, 12)), 345.0);
}

#[test]
fn test_flood_fill_keeps_stronger_existing_value() {
    let (registry, mut field, terrain) = setup(20, 20);
    flood_fill(&mut field, &terrain, &registry, &[light(5, 5, 350.0)]);
    flood_fill(&mut field, &terrain, &registry, &[light(6, 5, 100.0)]);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(6, 5)), 349.0);
}

#[test]
fn test_flood_fill_never_crosses_a_wall() {
    let (registry, mut field, mut terrain) = setup(12, 12);
    for y in 0..12 {
        terrain.insert(GridPos::new(6, y), EntityKind::Stone);
    }
    flood_fill(&mut field, &terrain, &registry, &[light(2, 5, 350.0)]);

    for y in 0..12 {
        for x in 6..12 {
            assert_eq!(
                field.get(PheromoneKind::Light, GridPos::new(x, y)),
                0.0,
                "light leaked to ({x},{y})"
            );
        }
    }
    assert!(field.get(PheromoneKind::Light, GridPos::new(5, 5)) > 0.0);
}

#[test]
fn test_source_on_blocking_cell_is_still_written() {
    let (registry, mut field, mut terrain) = setup(5, 5);
    terrain.insert(GridPos::new(2, 2), EntityKind::Dirt);
    flood_fill(&mut field, &terrain, &registry, &[light(2, 2, 50.0)]);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(2, 2)), 50.0);
}

#[test]
fn test_reverse_flood_fill_clears_removed_source() {
    let (registry, mut field, terrain) = setup(30, 30);
    let sources = [light(5, 5, 350.0), light(25, 25, 20.0)];
    compute_steady_state(&mut field, &terrain, &registry, &sources);
    assert!(field.get(PheromoneKind::Light, GridPos::new(6, 6)) > 300.0);

    reverse_flood_fill(
        &mut field,
        &terrain,
        &registry,
        &[PheromoneKind::Light],
        &sources[1..],
    );
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(6, 6)), 0.0);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(25, 25)), 20.0);

    reverse_flood_fill(&mut field, &terrain, &registry, &[PheromoneKind::Light], &[]);
    assert_eq!(field.cell_count(PheromoneKind::Light), 0);
}

// ---- Dispersion ----

#[test]
fn test_disperse_spreads_and_decays_heat() {
    let (registry, mut field, terrain) = setup(10, 10);
    let centre = GridPos::new(5, 5);
    field.set(PheromoneKind::Heat, centre, 150.0);

    disperse(&mut field, &terrain, &registry);
    assert_eq!(field.get(PheromoneKind::Heat, centre), 149.0);
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(6, 6)), 135.0);
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(7, 5)), 0.0);

    disperse(&mut field, &terrain, &registry);
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(7, 5)), 120.0);
}

#[test]
fn test_disperse_respects_blocking_terrain() {
    let (registry, mut field, mut terrain) = setup(10, 10);
    terrain.insert(GridPos::new(6, 5), EntityKind::Iron);
    field.set(PheromoneKind::Heat, GridPos::new(5, 5), 150.0);
    disperse(&mut field, &terrain, &registry);
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(6, 5)), 0.0);
    assert!(field.get(PheromoneKind::Heat, GridPos::new(6, 4)) > 0.0);
}

#[test]
fn test_disperse_leaves_steady_state_kinds_alone() {
    let (registry, mut field, terrain) = setup(10, 10);
    field.set(PheromoneKind::Light, GridPos::new(3, 3), 100.0);
    disperse(&mut field, &terrain, &registry);
    assert_eq!(field.get(PheromoneKind::Light, GridPos::new(3, 3)), 100.0);
    assert_eq!(field.cell_count(PheromoneKind::Light), 1);
}

#[derive(Debug, Clone)]
enum FieldOp {
    Flood(i32, i32, f64),
    Reverse(i32, i32, f64),
    Heat(i32, i32, f64),
    Disperse,
}

fn field_op() -> impl Strategy<Value = FieldOp> {
    prop_oneof![
        (0..16i32, 0..16i32, -50.0..2000.0f64).prop_map(|(x, y, q)| FieldOp::Flood(x, y, q)),
        (0..16i32, 0..16i32, -50.0..2000.0f64).prop_map(|(x, y, q)| FieldOp::Reverse(x, y, q)),
        (0..16i32, 0..16i32, -50.0..2000.0f64).prop_map(|(x, y, q)| FieldOp::Heat(x, y, q)),
        Just(FieldOp::Disperse),
    ]
}

proptest! {
    #[test]
    fn prop_quantities_stay_within_bounds(ops in proptest::collection::vec(field_op(), 1..25)) {
        let (registry, mut field, mut terrain) = setup(16, 16);
        terrain.insert(GridPos::new(8, 8), EntityKind::Stone);
        for op in ops {
            match op {
                FieldOp::Flood(x, y, q) => flood_fill(&mut field, &terrain, &registry, &[light(x, y, q)]),
                FieldOp::Reverse(x, y, q) => reverse_flood_fill(
                    &mut field, &terrain, &registry, &[PheromoneKind::Light], &[light(x, y, q)],
                ),
                FieldOp::Heat(x, y, q) => flood_fill(
                    &mut field, &terrain, &registry,
                    &[PheromoneSource::new(PheromoneKind::Heat, GridPos::new(x, y), q)],
                ),
                FieldOp::Disperse => disperse(&mut field, &terrain, &registry),
            }
            for profile in registry.pheromones() {
                for (_, q) in field.layer(profile.kind) {
                    prop_assert!(q > 0.0 && q <= profile.max_quantity);
                }
            }
        }
    }

    #[test]
    fn prop_walled_region_stays_dark(wall_x in 2..14i32, sx in 0..16i32, sy in 0..16i32, q in 1.0..350.0f64) {
        let (registry, mut field, mut terrain) = setup(16, 16);
        for y in 0..16 {
            terrain.insert(GridPos::new(wall_x, y), EntityKind::Steel);
        }
        prop_assume!(sx != wall_x);
        flood_fill(&mut field, &terrain, &registry, &[light(sx, sy, q)]);
        for (pos, _) in field.layer(PheromoneKind::Light) {
            prop_assert_eq!(pos.x < wall_x, sx < wall_x);
        }
    }
}

// ---- Worker ----

fn init_request(field: PheromoneField, terrain: Terrain) -> WorkerRequest {
    WorkerRequest::Init(Box::new(WorkerInit {
        field,
        terrain,
        emitters: Default::default(),
    }))
}

#[test]
fn test_worker_ignores_requests_before_init() {
    let (registry, _, _) = setup(10, 10);
    let mut worker = PheromoneWorker::new(registry);
    assert!(worker.handle(WorkerRequest::DispersePheromones).is_none());
    assert!(!worker.is_initialized());
}

#[test]
fn test_worker_flood_fill_reports_changed_cells() {
    let (registry, field, terrain) = setup(10, 10);
    let mut worker = PheromoneWorker::new(Arc::clone(&registry));
    worker.handle(init_request(field.clone(), terrain));

    let update = worker
        .handle(WorkerRequest::FloodFill(vec![light(0, 0, 3.0)]))
        .unwrap();
    // 3 at the source, 2 on two neighbours, 1 on three cells.
    assert_eq!(update.changes.len(), 6);

    let mut authoritative = field;
    authoritative.apply(&update);
    assert_eq!(authoritative.get(PheromoneKind::Light, GridPos::new(1, 1)), 1.0);
}

#[test]
fn test_worker_holds_dispersing_emitter_cells() {
    let (registry, field, terrain) = setup(10, 10);
    let mut worker = PheromoneWorker::new(registry);
    worker.handle(init_request(field, terrain));
    let source = PheromoneSource::new(PheromoneKind::Heat, GridPos::new(4, 4), 150.0)
        .from_emitter(EntityId(9));
    worker.handle(WorkerRequest::FloodFill(vec![source]));

    for _ in 0..5 {
        worker.handle(WorkerRequest::DispersePheromones);
    }
    let field = worker.field().unwrap();
    assert_eq!(field.get(PheromoneKind::Heat, GridPos::new(4, 4)), 150.0);
    assert!(field.get(PheromoneKind::Heat, GridPos::new(6, 4)) > 0.0);
}

#[test]
fn test_inline_link_posts_updates_for_later_drain() {
    let (registry, field, terrain) = setup(10, 10);
    let mut link = WorkerLink::inline(registry);
    assert!(!link.is_threaded());
    link.send(init_request(field, terrain)).unwrap();
    link.send(WorkerRequest::FloodFill(vec![light(3, 3, 5.0)])).unwrap();

    let updates = link.drain_updates();
    assert_eq!(updates.len(), 1);
    assert!(link.drain_updates().is_empty());
}

#[test]
fn test_threaded_worker_round_trip() {
    let (registry, field, terrain) = setup(20, 20);
    let mut link = WorkerLink::spawn(registry, 8).unwrap();
    assert!(link.is_threaded());
    link.send(init_request(field.clone(), terrain)).unwrap();
    link.send(WorkerRequest::FloodFill(vec![light(10, 10, 350.0)]))
        .unwrap();

    let update = link
        .recv_update_timeout(Duration::from_secs(5))
        .expect("worker should answer a flood fill");
    let mut authoritative = field;
    authoritative.apply(&update);
    assert_eq!(authoritative.get(PheromoneKind::Light, GridPos::new(10, 12)), 348.0);
}

#[test]
fn test_full_queue_hands_request_back() {
    let (registry, mut field, terrain) = setup(200, 200);
    for x in 0..200 {
        for y in 0..200 {
            field.set(PheromoneKind::Heat, GridPos::new(x, y), 150.0);
        }
    }
    let mut link = WorkerLink::spawn(registry, 1).unwrap();
    link.send(init_request(field, terrain)).unwrap();
    let mut saw_full = false;
    for _ in 0..10_000 {
        match link.send(WorkerRequest::DispersePheromones) {
            Ok(()) => {}
            Err(WorkerError::Full(request)) => {
                assert!(matches!(request, WorkerRequest::DispersePheromones));
                saw_full = true;
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(saw_full, "a one-slot queue should eventually fill");
}
