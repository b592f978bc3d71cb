//! Integration tests for area mappings.
//!
//! Tests verify:
//! - One mapping per coupled pair and subsection
//! - Both endpoints reference the same arena entry
//! - Membrane splits couple each compartment separately
//! - Cortex regions scale diffusion and survive mapping rebuilds

use cell_automaton_x::geometry::{DVec2, Polygon};
use cell_automaton_x::{
    initialize_area_mappings, AutomatonGraph, CellCoordinate, CellSubsection, ChemicalEntity,
    Diffusion, Feature, Neighborhood, Simulation, SimulationParameters,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Mapping construction
// ============================================================================

#[test]
fn test_grid_mapping_count() {
    init_logging();
    for neighborhood in [Neighborhood::VonNeumann, Neighborhood::Moore] {
        let mut graph = AutomatonGraph::rectangular(10, 10, 1.0, neighborhood);
        // diagonal neighbours only touch in a point
        assert_eq!(initialize_area_mappings(&mut graph).unwrap(), 180);
        assert_eq!(graph.mappings().len(), 180);
    }
}

#[test]
fn test_mappings_are_shared_by_both_endpoints() {
    let mut graph = AutomatonGraph::rectangular(4, 3, 2.0, Neighborhood::VonNeumann);
    initialize_area_mappings(&mut graph).unwrap();

    for cell in graph.cells() {
        for id in cell.area_mappings() {
            let mapping = graph.mapping(*id);
            let other = mapping.other(cell.coordinate()).unwrap();
            assert!(graph.cell(other).unwrap().area_mappings().contains(id));
            assert!((mapping.relative_adjacent_area - 1.0).abs() < 1e-12);
            assert!((mapping.relative_centroid_distance - 1.0).abs() < 1e-12);
            assert!((mapping.weight() - 1.0).abs() < 1e-12);
        }
    }
    let corner = graph.cell(CellCoordinate::new(0, 0)).unwrap();
    assert_eq!(corner.area_mappings().len(), 2);
    let inner = graph.cell(CellCoordinate::new(1, 1)).unwrap();
    assert_eq!(inner.area_mappings().len(), 4);
}

#[test]
fn test_rebuild_replaces_mappings() {
    let mut graph = AutomatonGraph::rectangular(3, 3, 1.0, Neighborhood::VonNeumann);
    initialize_area_mappings(&mut graph).unwrap();
    initialize_area_mappings(&mut graph).unwrap();
    assert_eq!(graph.mappings().len(), 12);
    let total: usize = graph.cells().map(|cell| cell.area_mappings().len()).sum();
    assert_eq!(total, 24);
}

#[test]
fn test_membrane_split_couples_compartments() {
    let mut graph = AutomatonGraph::rectangular(4, 4, 1.0, Neighborhood::VonNeumann);
    graph.split_with_membrane(2).unwrap();
    assert_eq!(initialize_area_mappings(&mut graph).unwrap(), 30);

    let count = |subsection| {
        graph
            .mappings()
            .iter()
            .filter(|mapping| mapping.subsection == subsection)
            .count()
    };
    assert_eq!(count(CellSubsection::Cytoplasm), 17);
    assert_eq!(count(CellSubsection::PlasmaMembrane), 3);
    assert_eq!(count(CellSubsection::Extracellular), 10);

    // half-cell footprints sit closer to their full-cell neighbours
    let across = graph
        .mappings()
        .iter()
        .find(|mapping| {
            mapping.subsection == CellSubsection::Cytoplasm
                && mapping.connects(CellCoordinate::new(0, 1), CellCoordinate::new(0, 2))
        })
        .unwrap();
    assert!((across.relative_centroid_distance - 0.75).abs() < 1e-12);
}

// ============================================================================
// Cortex
// ============================================================================

#[test]
fn test_cortex_slows_diffusion_after_rebuild() {
    init_logging();
    let entity = ChemicalEntity::small_molecule("actin monomer");
    let mut parameters = SimulationParameters::default();
    parameters.spatial.columns = 4;
    parameters.spatial.rows = 1;
    parameters.time.time_step_sec = 1e-3;

    let spread = |ratio: Option<f64>| {
        let mut simulation = Simulation::from_parameters(&parameters).unwrap();
        simulation
            .features_mut()
            .set_feature(&entity, Feature::diffusivity_um2_per_sec(50.0));
        simulation
            .add_module(Diffusion::builder().entity(entity.clone()).build().unwrap())
            .unwrap();
        if let Some(ratio) = ratio {
            simulation
                .add_cortex(
                    Polygon::rectangle(DVec2::new(0.0, 0.0), DVec2::new(2.0, 1.0)),
                    ratio,
                )
                .unwrap();
        }
        simulation
            .graph_mut()
            .cell_mut(CellCoordinate::new(0, 0))
            .unwrap()
            .concentrations
            .set(CellSubsection::Cytoplasm, entity.clone(), 1e-15);
        simulation.run(0.02).unwrap();

        // a rebuild must keep the cortex
        simulation.graph_mut().mark_topology_changed();
        simulation.next_epoch().unwrap();
        let ratios: Vec<f64> = simulation
            .graph()
            .mappings()
            .iter()
            .map(|mapping| mapping.diffusive_ratio)
            .collect();
        let neighbour = simulation
            .graph()
            .cell(CellCoordinate::new(1, 0))
            .unwrap()
            .concentrations
            .get(CellSubsection::Cytoplasm, &entity);
        (neighbour, ratios)
    };

    let (free, free_ratios) = spread(None);
    let (slowed, cortex_ratios) = spread(Some(0.2));

    assert!(free_ratios.iter().all(|ratio| *ratio == 1.0));
    // (0,0)-(1,0) inside, (1,0)-(2,0) half inside, (2,0)-(3,0) outside
    assert!((cortex_ratios[0] - 0.2).abs() < 1e-12);
    assert!((cortex_ratios[1] - 0.6).abs() < 1e-12);
    assert!((cortex_ratios[2] - 1.0).abs() < 1e-12);
    assert!(slowed < free);
}

#[test]
fn test_negative_cortex_ratio_is_rejected() {
    let mut simulation = Simulation::from_parameters(&SimulationParameters::default()).unwrap();
    let region = Polygon::rectangle(DVec2::ZERO, DVec2::new(1.0, 1.0));
    assert!(simulation.add_cortex(region, -0.5).is_err());
}
