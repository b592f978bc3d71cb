//! Integration tests for the vesicle layer.
//!
//! Tests verify:
//! - Association weights cover the whole footprint
//! - Collision rejections cascade until every position is legal
//! - Confinements only bind vesicles in their state
//! - Brownian vesicles respect bounds, membranes and each other

use cell_automaton_x::geometry::{Bounds, DVec2, Polygon};
use cell_automaton_x::{
    associate_vesicle, AutomatonGraph, BrownianMotion, CellCoordinate, DirectedTransport,
    DisplacementModule, EpochScale, Neighborhood, Simulation, SimulationParameters, Vesicle,
    VesicleId, VesicleLayer, VesicleState,
};
use rand::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn layer_in_box(width: f64, height: f64) -> VesicleLayer {
    let mut layer = VesicleLayer::new(3);
    layer.set_bounds(Bounds::new(DVec2::ZERO, DVec2::new(width, height)));
    layer
}

fn step(layer: &mut VesicleLayer, modules: &[Box<dyn DisplacementModule>]) -> usize {
    layer.propose_displacements(modules, &EpochScale::new(1e-3, 1.0));
    let rejected = layer.resolve_collisions();
    layer.commit_positions();
    rejected
}

fn position(layer: &VesicleLayer, id: VesicleId) -> DVec2 {
    layer.vesicle(id).unwrap().position()
}

// ============================================================================
// Association
// ============================================================================

#[test]
fn test_association_weights_sum_to_one() {
    init_logging();
    let graph = AutomatonGraph::rectangular(5, 5, 1.0, Neighborhood::Moore);
    let mut rng = StdRng::seed_from_u64(17);

    for index in 0..500 {
        let radius = rng.gen_range(0.01..0.45);
        let center = DVec2::new(
            rng.gen_range(radius..5.0 - radius),
            rng.gen_range(radius..5.0 - radius),
        );
        let vesicle = Vesicle::new(VesicleId(index), center, radius);
        let weights = associate_vesicle(&graph, &vesicle);

        assert!(!weights.is_empty());
        let total: f64 = weights.values().sum();
        assert!(
            (total - 1.0).abs() < 1e-9,
            "vesicle at {} with radius {}: total weight {}",
            center,
            radius,
            total
        );
        for (coordinate, weight) in &weights {
            assert!(graph.contains(*coordinate));
            assert!(*weight >= 0.0);
        }
    }
}

#[test]
fn test_association_follows_moving_vesicle() {
    let mut parameters = SimulationParameters::default();
    parameters.spatial.columns = 3;
    parameters.spatial.rows = 1;
    parameters.time.time_step_sec = 1e-3;
    let mut simulation = Simulation::from_parameters(&parameters).unwrap();
    simulation.add_displacement_module(DirectedTransport::new(
        "kinesin",
        VesicleState::MicrotubuleAttached,
        DVec2::new(1000.0, 0.0),
    ));

    let id = simulation
        .vesicles_mut()
        .add_vesicle(DVec2::new(0.5, 0.5), 0.1)
        .unwrap();
    simulation
        .vesicles_mut()
        .vesicle_mut(id)
        .unwrap()
        .set_state(VesicleState::MicrotubuleAttached);

    let report = simulation.next_epoch().unwrap();
    assert_eq!(report.moved_vesicles, 1);
    let vesicle = simulation.vesicles().vesicle(id).unwrap();
    assert!((vesicle.position().x - 1.5).abs() < 1e-12);
    assert_eq!(vesicle.associated_cells().keys().copied().collect::<Vec<_>>(), vec![CellCoordinate::new(1, 0)]);

    // the next step would leave the grid
    simulation.next_epoch().unwrap();
    let report = simulation.next_epoch().unwrap();
    assert_eq!(report.rejected_moves, 1);
    assert!((simulation.vesicles().vesicle(id).unwrap().position().x - 2.5).abs() < 1e-12);
}

// ============================================================================
// Collisions
// ============================================================================

#[test]
fn test_mover_yields_to_resting_vesicle() {
    let mut layer = layer_in_box(4.0, 2.0);
    let mover = layer.add_vesicle(DVec2::new(1.0, 1.0), 0.1).unwrap();
    let resting = layer.add_vesicle(DVec2::new(1.4, 1.0), 0.1).unwrap();
    layer
        .vesicle_mut(mover)
        .unwrap()
        .set_state(VesicleState::ActinPropelled);

    let modules: Vec<Box<dyn DisplacementModule>> = vec![Box::new(DirectedTransport::new(
        "myosin",
        VesicleState::ActinPropelled,
        DVec2::new(250.0, 0.0),
    ))];
    assert_eq!(step(&mut layer, &modules), 1);
    assert_eq!(position(&layer, mover), DVec2::new(1.0, 1.0));
    assert_eq!(position(&layer, resting), DVec2::new(1.4, 1.0));
}

#[test]
fn test_head_on_collision_lets_one_through() {
    let mut layer = layer_in_box(4.0, 2.0);
    let left = layer.add_vesicle(DVec2::new(1.0, 1.0), 0.1).unwrap();
    let right = layer.add_vesicle(DVec2::new(1.6, 1.0), 0.1).unwrap();
    layer
        .vesicle_mut(left)
        .unwrap()
        .set_state(VesicleState::ActinPropelled);
    layer
        .vesicle_mut(right)
        .unwrap()
        .set_state(VesicleState::MicrotubuleAttached);

    let modules: Vec<Box<dyn DisplacementModule>> = vec![
        Box::new(DirectedTransport::new(
            "myosin",
            VesicleState::ActinPropelled,
            DVec2::new(250.0, 0.0),
        )),
        Box::new(DirectedTransport::new(
            "dynein",
            VesicleState::MicrotubuleAttached,
            DVec2::new(-250.0, 0.0),
        )),
    ];
    assert_eq!(step(&mut layer, &modules), 1);

    let left_moved = position(&layer, left) != DVec2::new(1.0, 1.0);
    let right_moved = position(&layer, right) != DVec2::new(1.6, 1.0);
    assert!(left_moved ^ right_moved);
    let gap = position(&layer, left).distance(position(&layer, right));
    assert!(gap >= 0.2);
}

#[test]
fn test_rejections_cascade() {
    init_logging();
    let mut layer = layer_in_box(4.0, 2.0);
    let first = layer.add_vesicle(DVec2::new(1.4, 1.0), 0.1).unwrap();
    let second = layer.add_vesicle(DVec2::new(1.7, 1.0), 0.1).unwrap();
    let wall = layer.add_vesicle(DVec2::new(2.0, 1.0), 0.1).unwrap();
    for id in [first, second] {
        layer
            .vesicle_mut(id)
            .unwrap()
            .set_state(VesicleState::ActinPropelled);
    }

    let modules: Vec<Box<dyn DisplacementModule>> = vec![Box::new(DirectedTransport::new(
        "myosin",
        VesicleState::ActinPropelled,
        DVec2::new(250.0, 0.0),
    ))];
    // second runs into the wall, first then runs into second
    assert_eq!(step(&mut layer, &modules), 2);
    assert_eq!(position(&layer, first), DVec2::new(1.4, 1.0));
    assert_eq!(position(&layer, second), DVec2::new(1.7, 1.0));
    assert_eq!(position(&layer, wall), DVec2::new(2.0, 1.0));
}

#[test]
fn test_confinement_binds_only_its_state() {
    let mut layer = layer_in_box(4.0, 2.0);
    layer.add_confinement(
        VesicleState::ActinAttached,
        Polygon::rectangle(DVec2::new(0.0, 0.0), DVec2::new(1.0, 2.0)),
    );
    let attached = layer.add_vesicle(DVec2::new(0.8, 0.5), 0.1).unwrap();
    let free = layer.add_vesicle(DVec2::new(0.8, 1.5), 0.1).unwrap();
    layer
        .vesicle_mut(attached)
        .unwrap()
        .set_state(VesicleState::ActinAttached);
    layer
        .vesicle_mut(free)
        .unwrap()
        .set_state(VesicleState::MembraneAttached);

    let modules: Vec<Box<dyn DisplacementModule>> = vec![
        Box::new(DirectedTransport::new(
            "actin drift",
            VesicleState::ActinAttached,
            DVec2::new(500.0, 0.0),
        )),
        Box::new(DirectedTransport::new(
            "membrane drift",
            VesicleState::MembraneAttached,
            DVec2::new(500.0, 0.0),
        )),
    ];
    assert_eq!(step(&mut layer, &modules), 1);
    assert_eq!(position(&layer, attached), DVec2::new(0.8, 0.5));
    assert!((position(&layer, free).x - 1.3).abs() < 1e-12);
}

// ============================================================================
// Brownian motion
// ============================================================================

#[test]
fn test_brownian_vesicles_respect_obstacles() {
    init_logging();
    let mut parameters = SimulationParameters::default();
    parameters.spatial.columns = 5;
    parameters.spatial.rows = 5;
    parameters.spatial.membrane_row = Some(2);
    parameters.time.time_step_sec = 1e-3;
    let mut simulation = Simulation::from_parameters(&parameters).unwrap();
    simulation.add_displacement_module(BrownianMotion::default());

    let radius = 0.08;
    let mut ids = Vec::new();
    for column in 0..10 {
        for row in 0..5 {
            let center = DVec2::new(0.25 + 0.5 * column as f64, 0.25 + 0.45 * row as f64);
            ids.push(simulation.vesicles_mut().add_vesicle(center, radius).unwrap());
        }
    }

    let membrane_y = 2.5;
    let mut moved = 0;
    for _ in 0..200 {
        moved += simulation.next_epoch().unwrap().moved_vesicles;
        let vesicles: Vec<_> = simulation.vesicles().vesicles().collect();
        for (i, a) in vesicles.iter().enumerate() {
            let p = a.position();
            assert!(p.x >= radius && p.x <= 5.0 - radius, "{} left the bounds", a.id());
            assert!(p.y >= radius && p.y < membrane_y - radius, "{} crossed the membrane", a.id());
            for b in &vesicles[i + 1..] {
                assert!(p.distance(b.position()) >= 2.0 * radius - 1e-12);
            }
            let total: f64 = a.associated_cells().values().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }
    assert!(moved > 0);
    assert_eq!(simulation.vesicles().len(), ids.len());
}

#[test]
fn test_same_seed_same_trajectory() {
    let run = || {
        let mut parameters = SimulationParameters::default();
        parameters.spatial.columns = 2;
        parameters.spatial.rows = 2;
        parameters.time.time_step_sec = 1e-3;
        parameters.vesicle.seed = 99;
        let mut simulation = Simulation::from_parameters(&parameters).unwrap();
        simulation.add_displacement_module(BrownianMotion::default());
        let id = simulation
            .vesicles_mut()
            .add_vesicle(DVec2::new(1.0, 1.0), 0.05)
            .unwrap();
        simulation.run(0.05).unwrap();
        simulation.vesicles().vesicle(id).unwrap().position()
    };
    assert_eq!(run(), run());
}
