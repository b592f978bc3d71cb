//! Vesicle release demo
//!
//! A row of cargo-filled vesicles diffuses beneath the plasma membrane and
//! releases its cargo into the cytoplasm, where it spreads and leaks across
//! the membrane.
//!
//! Usage:
//!   cargo run --example vesicle_release

use std::time::Instant;

use anyhow::Result;
use cell_automaton_x::geometry::DVec2;
use cell_automaton_x::units::{internal_to_molar, molar_to_internal};
use cell_automaton_x::{
    BrownianMotion, CellSubsection, ChemicalEntity, Diffusion, Feature, MembraneDiffusion,
    Simulation, SimulationParameters,
};

fn main() -> Result<()> {
    env_logger::init();
    println!("=== Cell Automaton X - Vesicle Release ===\n");

    let mut params = SimulationParameters::load_or_default();
    params.spatial.columns = 12;
    params.spatial.rows = 8;
    params.spatial.membrane_row.get_or_insert(6);
    params.time.time_step_sec = 1e-5;

    let mut simulation = Simulation::from_parameters(&params)?;
    println!(
        "Grid: {} x {} cells of {:.2} µm, time step {:e} s",
        params.spatial.columns, params.spatial.rows, params.spatial.node_distance_um, params.time.time_step_sec
    );

    let cargo = ChemicalEntity::small_molecule("glutamate");
    simulation
        .features_mut()
        .set_feature(&cargo, Feature::diffusivity_cm2_per_sec(7.6e-6));
    simulation
        .features_mut()
        .set_feature(&cargo, Feature::permeability_cm_per_sec(1e-4));
    simulation.add_module(Diffusion::builder().entity(cargo.clone()).build()?)?;
    simulation.add_module(MembraneDiffusion::new([cargo.clone()])?)?;
    simulation.add_displacement_module(BrownianMotion::new(
        params.vesicle.viscosity_pa_s,
        params.vesicle.temperature_K,
    ));

    let radius = params.vesicle.default_radius_um;
    let membrane_row = params.spatial.membrane_row.unwrap_or(6) as f64;
    let y = (membrane_row - 0.5) * params.spatial.node_distance_um;
    for column in 0..params.spatial.columns {
        let x = (column as f64 + 0.5) * params.spatial.node_distance_um;
        let id = simulation.vesicles_mut().add_vesicle(DVec2::new(x, y), radius)?;
        simulation
            .vesicles_mut()
            .vesicle_mut(id)?
            .concentrations
            .set(CellSubsection::VesicleLumen, cargo.clone(), molar_to_internal(0.1));
    }
    println!("Vesicles: {} with radius {:.3} µm\n", simulation.vesicles().len(), radius);

    let steps = 2000;
    let start_time = Instant::now();
    for step in 0..steps {
        simulation.next_epoch()?;

        // Report progress every 10%
        if step % (steps / 10) == 0 {
            let mean_lumen: f64 = simulation
                .vesicles()
                .vesicles()
                .map(|v| internal_to_molar(v.concentrations.get(CellSubsection::VesicleLumen, &cargo)))
                .sum::<f64>()
                / simulation.vesicles().len() as f64;
            println!(
                "  {:3.0}%: t={:.2} ms, mean lumen={:.4} M, grid total={:.3e} M",
                100.0 * step as f64 / steps as f64,
                simulation.clock().elapsed_time_sec * 1e3,
                mean_lumen,
                internal_to_molar(simulation.graph().sum_concentration(&cargo))
            );
        }
    }
    let elapsed = start_time.elapsed();

    let metrics = simulation.metrics();
    println!("\n--- Final state after {} epochs ({:.2?}) ---\n", metrics.epoch, elapsed);
    println!("{}", metrics.to_json()?);
    if !metrics.is_finite() {
        anyhow::bail!("{} containers hold non-finite values", metrics.non_finite_containers);
    }
    Ok(())
}
