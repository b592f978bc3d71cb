//! Epoch loop.
//!
//! One epoch runs, in order:
//!
//! 1. area mappings are rebuilt if the topology changed, and vesicles that
//!    moved are re-associated with the grid;
//! 2. every module proposes deltas against the committed state (all
//!    proposals are collected before anything is written, so a failing module
//!    leaves the state untouched);
//! 3. displacement modules propose vesicle moves and the collision gate
//!    rejects illegal ones;
//! 4. concentration deltas and positions are committed;
//! 5. the clock advances.

mod clock;
mod metrics;

pub use clock::SimulationClock;
pub use metrics::{EntityTotals, SimulationMetrics};

use serde::{Deserialize, Serialize};

use crate::adjacency::{apply_diffusive_ratio, initialize_area_mappings};
use crate::chemistry::FeatureRegistry;
use crate::config::SimulationParameters;
use crate::error::{Result, SimulationError};
use crate::geometry::{LineSegment, Polygon};
use crate::graph::AutomatonGraph;
use crate::modules::{DeltaTarget, EpochContext, EpochScale, Proposal, UpdateModule};
use crate::vesicle::{DisplacementModule, VesicleLayer};

/// How proposals are turned into a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegrationScheme {
    /// Explicit Euler: one evaluation at the committed state
    #[default]
    Euler,
    /// Explicit midpoint: a half-step predictor is applied to a scratch copy,
    /// the full step is evaluated there and applied to the real state
    Midpoint,
}

/// Outcome of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochReport {
    pub epoch: u64,
    pub proposals: usize,
    pub moved_vesicles: usize,
    pub rejected_moves: usize,
}

pub struct Simulation {
    graph: AutomatonGraph,
    vesicles: VesicleLayer,
    features: FeatureRegistry,
    modules: Vec<Box<dyn UpdateModule>>,
    displacement_modules: Vec<Box<dyn DisplacementModule>>,
    /// Diffusive-ratio regions, re-applied whenever mappings are rebuilt
    cortex_regions: Vec<(Polygon, f64)>,
    clock: SimulationClock,
    time_step_sec: f64,
    scheme: IntegrationScheme,
}

impl Simulation {
    /// Simulation over an existing graph.
    pub fn new(graph: AutomatonGraph, parameters: &SimulationParameters) -> Result<Self> {
        parameters.validate()?;
        let mut vesicles = VesicleLayer::new(parameters.vesicle.seed);
        vesicles.set_membrane_margin(parameters.vesicle.membrane_margin_um);
        if let Some(bounds) = graph.bounds() {
            vesicles.set_bounds(bounds);
        }

        log::info!(
            "Simulation with {} cells, time step {:e} s, {:?} integration",
            graph.len(),
            parameters.time.time_step_sec,
            parameters.time.integration_scheme
        );
        Ok(Self {
            graph,
            vesicles,
            features: FeatureRegistry::new(),
            modules: Vec::new(),
            displacement_modules: Vec::new(),
            cortex_regions: Vec::new(),
            clock: SimulationClock::new(),
            time_step_sec: parameters.time.time_step_sec,
            scheme: parameters.time.integration_scheme,
        })
    }

    /// Rectangular grid built from the spatial parameters, split at the
    /// membrane row if one is configured.
    pub fn from_parameters(parameters: &SimulationParameters) -> Result<Self> {
        parameters.validate()?;
        let spatial = &parameters.spatial;
        let mut graph = AutomatonGraph::rectangular(
            spatial.columns,
            spatial.rows,
            spatial.node_distance_um,
            spatial.neighborhood,
        );
        let membrane = match spatial.membrane_row {
            Some(row) => Some(graph.split_with_membrane(row)?),
            None => None,
        };

        let mut simulation = Self::new(graph, parameters)?;
        if let Some(segment) = membrane {
            simulation.add_membrane_segment(segment);
        }
        Ok(simulation)
    }

    pub fn graph(&self) -> &AutomatonGraph {
        &self.graph
    }

    /// Mutable access for setting up state. Changing regions, polygons or
    /// edges marks the topology dirty; mappings are rebuilt next epoch.
    pub fn graph_mut(&mut self) -> &mut AutomatonGraph {
        &mut self.graph
    }

    pub fn vesicles(&self) -> &VesicleLayer {
        &self.vesicles
    }

    pub fn vesicles_mut(&mut self) -> &mut VesicleLayer {
        &mut self.vesicles
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureRegistry {
        &mut self.features
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn time_step_sec(&self) -> f64 {
        self.time_step_sec
    }

    pub fn integration_scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    pub fn set_integration_scheme(&mut self, scheme: IntegrationScheme) {
        self.scheme = scheme;
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Register a module; its required features must already be present.
    pub fn add_module<M: UpdateModule + 'static>(&mut self, module: M) -> Result<()> {
        if self
            .modules
            .iter()
            .any(|existing| existing.identifier() == module.identifier())
        {
            return Err(SimulationError::config(format!(
                "a module named '{}' is already registered",
                module.identifier()
            )));
        }
        self.features.check(&module.required_features())?;
        log::info!("Added module '{}'", module.identifier());
        self.modules.push(Box::new(module));
        Ok(())
    }

    pub fn add_displacement_module<M: DisplacementModule + 'static>(&mut self, module: M) {
        log::info!("Added displacement module '{}'", module.identifier());
        self.displacement_modules.push(Box::new(module));
    }

    /// A membrane segment vesicles may not cross.
    pub fn add_membrane_segment(&mut self, segment: LineSegment) {
        self.vesicles.add_membrane_segment(segment);
    }

    /// Scale diffusion inside `region` by `ratio`.
    pub fn add_cortex(&mut self, region: Polygon, ratio: f64) -> Result<()> {
        if !(ratio.is_finite() && ratio >= 0.0) {
            return Err(SimulationError::config(format!(
                "diffusive ratio must be non-negative, got {}",
                ratio
            )));
        }
        self.cortex_regions.push((region, ratio));
        self.graph.mark_topology_changed();
        Ok(())
    }

    /// Reset the clock, drop pending deltas and rebuild mappings next epoch.
    pub fn reinitialize(&mut self) {
        self.clock.reset();
        self.discard_pending();
        self.vesicles.discard_displacements();
        self.graph.mark_topology_changed();
        log::info!("Simulation reinitialized");
    }

    /// Rebuild mappings and associations that are out of date.
    pub fn refresh_topology(&mut self) -> Result<()> {
        let rebuilt = self.graph.is_topology_dirty();
        if rebuilt {
            initialize_area_mappings(&mut self.graph)?;
            for (region, ratio) in &self.cortex_regions {
                apply_diffusive_ratio(&mut self.graph, region, *ratio)?;
            }
            if let Some(bounds) = self.graph.bounds() {
                self.vesicles.set_bounds(bounds);
            }
        }
        self.vesicles.associate(&self.graph, rebuilt);
        Ok(())
    }

    fn scale(&self) -> EpochScale {
        EpochScale::new(self.time_step_sec, self.graph.node_distance_um())
    }

    /// Run one epoch.
    pub fn next_epoch(&mut self) -> Result<EpochReport> {
        self.refresh_topology()?;
        let scale = self.scale();

        let proposals = match self.scheme {
            IntegrationScheme::Euler => self.propose(&self.graph, &self.vesicles, scale)?,
            IntegrationScheme::Midpoint => {
                let predictor = self.propose(&self.graph, &self.vesicles, scale.halved())?;
                let mut graph = self.graph.clone();
                let mut vesicles = self.vesicles.clone();
                stage(&mut graph, &mut vesicles, predictor)?;
                graph.apply_deltas();
                vesicles.apply_deltas();
                self.propose(&graph, &vesicles, scale)?
            }
        };
        let proposal_count = proposals.len();
        if let Err(e) = stage(&mut self.graph, &mut self.vesicles, proposals) {
            self.discard_pending();
            return Err(e);
        }

        self.vesicles
            .propose_displacements(&self.displacement_modules, &scale);
        let rejected_moves = self.vesicles.resolve_collisions();

        self.graph.apply_deltas();
        self.vesicles.apply_deltas();
        let moved_vesicles = self.vesicles.commit_positions();
        if moved_vesicles > 0 {
            self.vesicles.associate(&self.graph, false);
        }

        self.clock.tick(self.time_step_sec);
        log::debug!(
            "Epoch {}: {} proposals, {} vesicles moved, {} moves rejected",
            self.clock.epoch,
            proposal_count,
            moved_vesicles,
            rejected_moves
        );
        Ok(EpochReport {
            epoch: self.clock.epoch,
            proposals: proposal_count,
            moved_vesicles,
            rejected_moves,
        })
    }

    /// Run epochs covering `duration_sec`. Returns the number of epochs run.
    pub fn run(&mut self, duration_sec: f64) -> Result<u64> {
        if !(duration_sec.is_finite() && duration_sec >= 0.0) {
            return Err(SimulationError::config(format!(
                "duration must be non-negative, got {}",
                duration_sec
            )));
        }
        let epochs = (duration_sec / self.time_step_sec).round() as u64;
        for _ in 0..epochs {
            self.next_epoch()?;
        }
        log::info!(
            "Ran {} epochs, simulated time {:e} s",
            epochs,
            self.clock.elapsed_time_sec
        );
        Ok(epochs)
    }

    pub fn metrics(&self) -> SimulationMetrics {
        SimulationMetrics::from_simulation(self)
    }

    fn propose(
        &self,
        graph: &AutomatonGraph,
        vesicles: &VesicleLayer,
        scale: EpochScale,
    ) -> Result<Vec<Proposal>> {
        let context = EpochContext::new(graph, vesicles, &self.features, scale);
        let mut proposals = Vec::new();
        for module in &self.modules {
            proposals.extend(module.propose(&context)?);
        }
        Ok(proposals)
    }

    fn discard_pending(&mut self) {
        for cell in self.graph.cells_mut() {
            cell.deltas.clear_potential_deltas();
        }
        self.vesicles.clear_potential_deltas();
    }
}

/// Buffer proposals on their targets.
fn stage(graph: &mut AutomatonGraph, vesicles: &mut VesicleLayer, proposals: Vec<Proposal>) -> Result<()> {
    for proposal in proposals {
        match proposal.target {
            DeltaTarget::Cell(coordinate) => graph
                .cell_mut(coordinate)?
                .deltas
                .add_potential_delta(proposal.delta),
            DeltaTarget::Vesicle(id) => vesicles
                .vesicle_mut(id)?
                .deltas
                .add_potential_delta(proposal.delta),
        }
    }
    Ok(())
}
