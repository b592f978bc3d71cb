//! Delta-computing modules.
//!
//! Every module reads the state committed at the end of the previous epoch
//! through an [`EpochContext`] and returns [`Proposal`]s; it never writes to
//! shared state. Physical features are scaled to the epoch in one place,
//! [`EpochScale::scale`], so the half-step flag reaches every module alike.

pub mod diffusion;
pub mod membrane;
pub mod reaction;

pub use diffusion::{Diffusion, DiffusionBuilder};
pub use membrane::MembraneDiffusion;
pub use reaction::{
    ComplexBuildingRule, Reactant, ReactantRole, Reaction, ReactionBuilder, ReactionKinetics,
};

use rayon::prelude::*;

use crate::chemistry::{Feature, FeatureKind, FeatureOwner, FeatureRegistry};
use crate::delta::{ConcentrationDelta, ModuleId};
use crate::error::Result;
use crate::graph::{AutomatonGraph, Cell, CellCoordinate};
use crate::vesicle::{Vesicle, VesicleId, VesicleLayer};

/// Temporal and spatial scale of one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochScale {
    /// Full time step (s)
    pub time_step_sec: f64,
    /// Unit cell length (µm)
    pub node_distance_um: f64,
    /// Predictor sub-step: rates are evaluated over half the time step
    pub half_step: bool,
}

impl EpochScale {
    pub fn new(time_step_sec: f64, node_distance_um: f64) -> Self {
        Self {
            time_step_sec,
            node_distance_um,
            half_step: false,
        }
    }

    pub fn halved(self) -> Self {
        Self {
            half_step: true,
            ..self
        }
    }

    /// Time step actually integrated over in this evaluation.
    pub fn effective_time_step(&self) -> f64 {
        if self.half_step {
            self.time_step_sec * 0.5
        } else {
            self.time_step_sec
        }
    }

    /// Scale a feature: value × Δt / node_distance^exponent.
    pub fn scale(&self, feature: &Feature) -> f64 {
        let time_factor = if feature.kind.is_time_scaled() {
            self.effective_time_step()
        } else {
            1.0
        };
        let length_factor = self.node_distance_um.powi(feature.kind.length_exponent());
        feature.value * time_factor / length_factor
    }
}

/// Frozen view of the simulation handed to modules during the propose phase.
#[derive(Clone, Copy)]
pub struct EpochContext<'a> {
    pub graph: &'a AutomatonGraph,
    pub vesicles: &'a VesicleLayer,
    pub features: &'a FeatureRegistry,
    pub scale: EpochScale,
}

impl<'a> EpochContext<'a> {
    pub fn new(
        graph: &'a AutomatonGraph,
        vesicles: &'a VesicleLayer,
        features: &'a FeatureRegistry,
        scale: EpochScale,
    ) -> Self {
        Self {
            graph,
            vesicles,
            features,
            scale,
        }
    }

    /// Resolve and scale a feature; missing features are fatal.
    pub fn scaled_feature(&self, owner: &FeatureOwner, kind: FeatureKind) -> Result<f64> {
        let feature = self.features.require(owner, kind)?;
        Ok(self.scale.scale(feature))
    }
}

/// Where a proposed delta lands at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeltaTarget {
    Cell(CellCoordinate),
    Vesicle(VesicleId),
}

/// A delta together with its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub target: DeltaTarget,
    pub delta: ConcentrationDelta,
}

impl Proposal {
    pub fn cell(coordinate: CellCoordinate, delta: ConcentrationDelta) -> Self {
        Self {
            target: DeltaTarget::Cell(coordinate),
            delta,
        }
    }

    pub fn vesicle(id: VesicleId, delta: ConcentrationDelta) -> Self {
        Self {
            target: DeltaTarget::Vesicle(id),
            delta,
        }
    }
}

/// A pluggable strategy that proposes concentration deltas.
pub trait UpdateModule: Send + Sync {
    fn identifier(&self) -> &ModuleId;

    /// Features that must be registered before the module may run.
    fn required_features(&self) -> Vec<(FeatureOwner, FeatureKind)>;

    /// Application condition for cells.
    fn applies_to_cell(&self, cell: &Cell) -> bool;

    /// Application condition for vesicles.
    fn applies_to_vesicle(&self, _vesicle: &Vesicle) -> bool {
        false
    }

    /// Compute proposals against the frozen state.
    fn propose(&self, context: &EpochContext<'_>) -> Result<Vec<Proposal>>;
}

/// Evaluate `compute` for every applicable cell in parallel.
///
/// Results keep the graph's cell order.
pub fn propose_per_cell<M, F>(module: &M, context: &EpochContext<'_>, compute: F) -> Result<Vec<Proposal>>
where
    M: UpdateModule + ?Sized,
    F: Fn(&Cell) -> Result<Vec<Proposal>> + Sync + Send,
{
    let per_cell: Vec<Vec<Proposal>> = context
        .graph
        .cell_slice()
        .par_iter()
        .filter(|cell| module.applies_to_cell(cell))
        .map(|cell| compute(cell))
        .collect::<Result<_>>()?;
    Ok(per_cell.into_iter().flatten().collect())
}

/// Evaluate `compute` for every applicable vesicle in parallel.
pub fn propose_per_vesicle<M, F>(
    module: &M,
    context: &EpochContext<'_>,
    compute: F,
) -> Result<Vec<Proposal>>
where
    M: UpdateModule + ?Sized,
    F: Fn(&Vesicle) -> Result<Vec<Proposal>> + Sync + Send,
{
    let per_vesicle: Vec<Vec<Proposal>> = context
        .vesicles
        .vesicle_slice()
        .par_iter()
        .filter(|vesicle| module.applies_to_vesicle(vesicle))
        .map(|vesicle| compute(vesicle))
        .collect::<Result<_>>()?;
    Ok(per_vesicle.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_step_halves_every_time_scaled_feature() {
        let scale = EpochScale::new(1e-6, 1.0);
        let half = scale.halved();

        for feature in [
            Feature::diffusivity_um2_per_sec(100.0),
            Feature::permeability_cm_per_sec(3.5e-3),
            Feature::first_order_rate_per_sec(FeatureKind::RateConstant, 2.0),
        ] {
            assert!((half.scale(&feature) * 2.0 - scale.scale(&feature)).abs() < 1e-18);
        }

        let km = Feature::michaelis_constant_molar(1e-3);
        assert_eq!(half.scale(&km), scale.scale(&km));
    }

    #[test]
    fn test_diffusivity_scales_with_node_distance_squared() {
        let feature = Feature::diffusivity_um2_per_sec(100.0);
        let fine = EpochScale::new(1e-3, 1.0);
        let coarse = EpochScale::new(1e-3, 2.0);
        assert!((fine.scale(&feature) / coarse.scale(&feature) - 4.0).abs() < 1e-12);
    }
}
