//! Snapshot metrics of a running simulation, for logging and export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Simulation;
use crate::units::internal_to_molar;

/// Summed concentration of one entity (mol/L), grid and vesicles apart.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityTotals {
    pub grid_M: f64,
    pub vesicles_M: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    // === Timing ===
    pub epoch: u64,
    pub simulation_time_sec: f64,
    pub time_step_sec: f64,

    // === Topology ===
    pub cell_count: usize,
    pub area_mapping_count: usize,
    pub vesicle_count: usize,
    pub module_count: usize,

    // === Chemistry ===
    /// Concentrations summed over every container and subsection, per entity
    pub entity_totals: BTreeMap<String, EntityTotals>,
    /// Containers holding NaN or infinite values
    pub non_finite_containers: usize,
}

impl SimulationMetrics {
    pub fn from_simulation(simulation: &Simulation) -> Self {
        let graph = simulation.graph();
        let vesicles = simulation.vesicles();

        let mut entity_totals: BTreeMap<String, EntityTotals> = BTreeMap::new();
        let mut non_finite_containers = 0;

        for cell in graph.cells() {
            if !cell.concentrations.is_finite() {
                non_finite_containers += 1;
            }
            for entity in cell.concentrations.entities() {
                entity_totals
                    .entry(entity.identifier().to_string())
                    .or_default()
                    .grid_M += internal_to_molar(cell.concentrations.sum_over_subsections(&entity));
            }
        }
        for vesicle in vesicles.vesicles() {
            if !vesicle.concentrations.is_finite() {
                non_finite_containers += 1;
            }
            for entity in vesicle.concentrations.entities() {
                entity_totals
                    .entry(entity.identifier().to_string())
                    .or_default()
                    .vesicles_M += internal_to_molar(vesicle.concentrations.sum_over_subsections(&entity));
            }
        }

        Self {
            epoch: simulation.clock().epoch,
            simulation_time_sec: simulation.clock().elapsed_time_sec,
            time_step_sec: simulation.time_step_sec(),
            cell_count: graph.len(),
            area_mapping_count: graph.mappings().len(),
            vesicle_count: vesicles.len(),
            module_count: simulation.module_count(),
            entity_totals,
            non_finite_containers,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.non_finite_containers == 0
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
