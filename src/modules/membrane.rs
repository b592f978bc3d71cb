//! Passive transport across membranes.
//!
//! Membrane cells exchange between their inner and outer pools:
//!
//! ```text
//! flux = P_scaled × (c_outer − c_inner)
//! inner += flux, outer −= flux
//! ```
//!
//! Vesicles exchange their lumen with every associated cell, weighted by the
//! area fraction of the footprint lying in that cell. On membrane cells only
//! the pool on the vesicle's side of the membrane takes part. The exchanged amount is
//! converted back to concentrations with the volume of each side, so the
//! moles leaving one side arrive on the other.

use super::{propose_per_cell, propose_per_vesicle, EpochContext, Proposal, UpdateModule};
use crate::chemistry::{ChemicalEntity, FeatureKind, FeatureOwner};
use crate::delta::{ConcentrationDelta, ModuleId};
use crate::error::{Result, SimulationError};
use crate::geometry::DVec2;
use crate::graph::{Cell, CellSubsection, CellTopology};
use crate::vesicle::Vesicle;

#[derive(Debug, Clone)]
pub struct MembraneDiffusion {
    identifier: ModuleId,
    entities: Vec<ChemicalEntity>,
}

impl MembraneDiffusion {
    pub fn new(entities: impl IntoIterator<Item = ChemicalEntity>) -> Result<Self> {
        Self::with_identifier("membrane diffusion", entities)
    }

    pub fn with_identifier(
        identifier: &str,
        entities: impl IntoIterator<Item = ChemicalEntity>,
    ) -> Result<Self> {
        let mut entities: Vec<_> = entities.into_iter().collect();
        if entities.is_empty() {
            return Err(SimulationError::config(
                "membrane diffusion needs at least one entity",
            ));
        }
        if let Some(anchored) = entities.iter().find(|e| e.is_membrane_anchored()) {
            return Err(SimulationError::config(format!(
                "{} is membrane anchored and cannot cross a membrane",
                anchored
            )));
        }
        entities.sort();
        entities.dedup();
        Ok(Self {
            identifier: ModuleId::new(identifier),
            entities,
        })
    }

    pub fn entities(&self) -> &[ChemicalEntity] {
        &self.entities
    }

    fn scaled_permeabilities(&self, context: &EpochContext<'_>) -> Result<Vec<(ChemicalEntity, f64)>> {
        self.entities
            .iter()
            .map(|entity| {
                let permeability = context.scaled_feature(
                    &FeatureOwner::from(entity),
                    FeatureKind::MembranePermeability,
                )?;
                Ok((entity.clone(), permeability))
            })
            .collect()
    }

    fn propose_for_cell(&self, cell: &Cell, permeabilities: &[(ChemicalEntity, f64)]) -> Vec<Proposal> {
        let (Some(inner), Some(outer)) = (
            cell.concentrations.subsection_for(CellTopology::Inner),
            cell.concentrations.subsection_for(CellTopology::Outer),
        ) else {
            return Vec::new();
        };

        let mut proposals = Vec::new();
        for (entity, permeability) in permeabilities {
            let flux = permeability
                * (cell.concentrations.get(outer, entity) - cell.concentrations.get(inner, entity));
            if flux == 0.0 {
                continue;
            }
            for (subsection, quantity) in [(inner, flux), (outer, -flux)] {
                proposals.push(Proposal::cell(
                    cell.coordinate(),
                    ConcentrationDelta::new(self.identifier.clone(), subsection, entity.clone(), quantity),
                ));
            }
        }
        proposals
    }

    fn propose_for_vesicle(
        &self,
        context: &EpochContext<'_>,
        vesicle: &Vesicle,
        permeabilities: &[(ChemicalEntity, f64)],
    ) -> Result<Vec<Proposal>> {
        let node_distance = context.scale.node_distance_um;
        let lumen = CellSubsection::VesicleLumen;
        let surface = vesicle.surface_area_um2();
        let vesicle_volume = vesicle.volume_um3();

        let mut proposals = Vec::new();
        for (coordinate, fraction) in vesicle.associated_cells() {
            let cell = context.graph.cell(*coordinate)?;
            let Some(subsection) = exchange_subsection(cell, vesicle.position()) else {
                continue;
            };
            let cell_volume = cell
                .subsection_polygon(subsection)
                .map(|polygon| polygon.area() * node_distance)
                .unwrap_or_else(|| node_distance.powi(3));

            for (entity, permeability) in permeabilities {
                // P_scaled × node_distance is P × Δt in µm
                let amount = permeability
                    * node_distance
                    * surface
                    * fraction
                    * (cell.concentrations.get(subsection, entity)
                        - vesicle.concentrations.get(lumen, entity));
                if amount == 0.0 {
                    continue;
                }
                proposals.push(Proposal::vesicle(
                    vesicle.id(),
                    ConcentrationDelta::new(
                        self.identifier.clone(),
                        lumen,
                        entity.clone(),
                        amount / vesicle_volume,
                    ),
                ));
                proposals.push(Proposal::cell(
                    *coordinate,
                    ConcentrationDelta::new(
                        self.identifier.clone(),
                        subsection,
                        entity.clone(),
                        -amount / cell_volume,
                    ),
                ));
            }
        }
        Ok(proposals)
    }
}

/// Volume pool of `cell` a vesicle centred at `point` exchanges with.
///
/// On a membrane cell this is the half on the vesicle's side of the
/// membrane: the pool whose footprint holds the centre, else the one with the
/// nearest footprint centroid (the centre may lie in a neighbouring cell).
fn exchange_subsection(cell: &Cell, point: DVec2) -> Option<CellSubsection> {
    let pools: Vec<CellSubsection> = cell
        .concentrations
        .subsections()
        .filter(|subsection| !subsection.is_membrane())
        .collect();
    if let Some(containing) = pools.iter().find(|subsection| {
        cell.subsection_polygon(**subsection)
            .is_some_and(|polygon| polygon.contains(point))
    }) {
        return Some(*containing);
    }
    pools
        .iter()
        .filter_map(|subsection| {
            cell.subsection_polygon(*subsection)
                .map(|polygon| (*subsection, polygon.centroid().distance_squared(point)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(subsection, _)| subsection)
        .or_else(|| pools.first().copied())
}

impl UpdateModule for MembraneDiffusion {
    fn identifier(&self) -> &ModuleId {
        &self.identifier
    }

    fn required_features(&self) -> Vec<(FeatureOwner, FeatureKind)> {
        self.entities
            .iter()
            .map(|entity| (FeatureOwner::from(entity), FeatureKind::MembranePermeability))
            .collect()
    }

    fn applies_to_cell(&self, cell: &Cell) -> bool {
        cell.region().has_membrane()
    }

    fn applies_to_vesicle(&self, vesicle: &Vesicle) -> bool {
        !vesicle.associated_cells().is_empty()
    }

    fn propose(&self, context: &EpochContext<'_>) -> Result<Vec<Proposal>> {
        let permeabilities = self.scaled_permeabilities(context)?;

        let mut proposals = propose_per_cell(self, context, |cell| {
            Ok(self.propose_for_cell(cell, &permeabilities))
        })?;
        proposals.extend(propose_per_vesicle(self, context, |vesicle| {
            self.propose_for_vesicle(context, vesicle, &permeabilities)
        })?);
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::{Feature, FeatureRegistry};
    use crate::graph::{AutomatonGraph, CellCoordinate, CellRegion};
    use crate::modules::{DeltaTarget, EpochScale};
    use crate::units::molar_to_internal;
    use crate::vesicle::VesicleLayer;

    fn membrane_cell(entity: &ChemicalEntity) -> AutomatonGraph {
        let mut graph = AutomatonGraph::new(1.0);
        let mut cell = Cell::new(CellCoordinate::new(0, 0), CellRegion::Membrane);
        cell.concentrations
            .set(CellSubsection::Cytoplasm, entity.clone(), molar_to_internal(2.0));
        cell.concentrations
            .set(CellSubsection::Extracellular, entity.clone(), molar_to_internal(1.0));
        graph.add_cell(cell).unwrap();
        graph
    }

    #[test]
    fn test_anchored_entities_are_rejected() {
        assert!(MembraneDiffusion::new([ChemicalEntity::membrane_protein("R")]).is_err());
        assert!(MembraneDiffusion::new(Vec::new()).is_err());
    }

    #[test]
    fn test_cell_flux_is_symmetric() {
        let entity = ChemicalEntity::small_molecule("water");
        let graph = membrane_cell(&entity);
        let layer = VesicleLayer::default();
        let mut features = FeatureRegistry::new();
        features.set_feature(&entity, Feature::permeability_cm_per_sec(3.5e-3));
        let context = EpochContext::new(&graph, &layer, &features, EpochScale::new(1e-6, 1.0));

        let module = MembraneDiffusion::new([entity.clone()]).unwrap();
        let proposals = module.propose(&context).unwrap();
        assert_eq!(proposals.len(), 2);

        let inner = proposals
            .iter()
            .find(|p| p.delta.subsection() == CellSubsection::Cytoplasm)
            .unwrap();
        let outer = proposals
            .iter()
            .find(|p| p.delta.subsection() == CellSubsection::Extracellular)
            .unwrap();
        assert_eq!(inner.target, DeltaTarget::Cell(CellCoordinate::new(0, 0)));
        assert!(inner.delta.quantity() < 0.0);
        assert_eq!(inner.delta.quantity(), -outer.delta.quantity());
        // 35 µm/s × 1e-6 s × 1e-15 mol/µm³
        assert!((outer.delta.quantity() - 3.5e-20).abs() < 1e-30);
    }

    #[test]
    fn test_plain_cytoplasm_cells_are_skipped() {
        let module = MembraneDiffusion::new([ChemicalEntity::small_molecule("A")]).unwrap();
        let cell = Cell::new(CellCoordinate::new(0, 0), CellRegion::Cytoplasm);
        assert!(!module.applies_to_cell(&cell));
    }

    #[test]
    fn test_exchange_pool_follows_the_membrane_side() {
        let mut graph = AutomatonGraph::rectangular(2, 3, 1.0, crate::graph::Neighborhood::VonNeumann);
        graph.split_with_membrane(1).unwrap();
        let cell = graph.cell(CellCoordinate::new(0, 1)).unwrap();

        assert_eq!(
            exchange_subsection(cell, DVec2::new(0.5, 1.7)),
            Some(CellSubsection::Extracellular)
        );
        assert_eq!(
            exchange_subsection(cell, DVec2::new(0.5, 1.3)),
            Some(CellSubsection::Cytoplasm)
        );
        // centre in the neighbouring cell, above the membrane line
        assert_eq!(
            exchange_subsection(cell, DVec2::new(1.05, 1.8)),
            Some(CellSubsection::Extracellular)
        );

        let plain = graph.cell(CellCoordinate::new(0, 0)).unwrap();
        assert_eq!(
            exchange_subsection(plain, DVec2::new(1.05, 0.5)),
            Some(CellSubsection::Cytoplasm)
        );
    }
}
