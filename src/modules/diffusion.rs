//! Free diffusion between neighbouring cells.
//!
//! Each area mapping is evaluated once per entity:
//!
//! ```text
//! flux = D_scaled × relative_effective_area × diffusive_ratio × (c_target − c_source)
//! source += flux, target −= flux
//! ```
//!
//! Summed over a cell's mappings this is the classical entering − leaving
//! form, and both endpoints of a mapping receive exact negatives.
//! Membrane-anchored entities only move along membrane subsections; all
//! other entities only along non-membrane subsections.

use rayon::prelude::*;

use super::{DeltaTarget, EpochContext, Proposal, UpdateModule};
use crate::chemistry::{ChemicalEntity, FeatureKind, FeatureOwner};
use crate::delta::{ConcentrationDelta, ModuleId};
use crate::error::{Result, SimulationError};
use crate::graph::{Cell, CellCoordinate, CellSubsection};

/// Diffusion module for a set of entities.
#[derive(Debug, Clone)]
pub struct Diffusion {
    identifier: ModuleId,
    entities: Vec<ChemicalEntity>,
}

/// Order-independent builder, validated in [`DiffusionBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct DiffusionBuilder {
    identifier: Option<String>,
    entities: Vec<ChemicalEntity>,
}

impl DiffusionBuilder {
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn entity(mut self, entity: ChemicalEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(mut self, entities: impl IntoIterator<Item = ChemicalEntity>) -> Self {
        self.entities.extend(entities);
        self
    }

    pub fn build(mut self) -> Result<Diffusion> {
        if self.entities.is_empty() {
            return Err(SimulationError::config("diffusion needs at least one entity"));
        }
        self.entities.sort();
        self.entities.dedup();
        Ok(Diffusion {
            identifier: ModuleId::new(self.identifier.as_deref().unwrap_or("diffusion")),
            entities: self.entities,
        })
    }
}

impl Diffusion {
    pub fn builder() -> DiffusionBuilder {
        DiffusionBuilder::default()
    }

    pub fn entities(&self) -> &[ChemicalEntity] {
        &self.entities
    }

    /// Whether `entity` may diffuse within `subsection`.
    fn couples(entity: &ChemicalEntity, subsection: CellSubsection) -> bool {
        entity.is_membrane_anchored() == subsection.is_membrane()
    }

    fn scaled_diffusivities(&self, context: &EpochContext<'_>) -> Result<Vec<(ChemicalEntity, f64)>> {
        self.entities
            .iter()
            .map(|entity| {
                let diffusivity =
                    context.scaled_feature(&FeatureOwner::from(entity), FeatureKind::Diffusivity)?;
                Ok((entity.clone(), diffusivity))
            })
            .collect()
    }

    /// Entering − leaving for one cell, subsection and entity.
    ///
    /// Entering sums neighbour concentrations weighted by the scaled
    /// diffusivity and mapping weight; leaving is the summed weight times the
    /// local concentration.
    pub fn cell_delta(
        &self,
        context: &EpochContext<'_>,
        coordinate: CellCoordinate,
        subsection: CellSubsection,
        entity: &ChemicalEntity,
    ) -> Result<f64> {
        if !Self::couples(entity, subsection) {
            return Ok(0.0);
        }
        let diffusivity =
            context.scaled_feature(&FeatureOwner::from(entity), FeatureKind::Diffusivity)?;
        let cell = context.graph.cell(coordinate)?;
        let local = cell.concentrations.get(subsection, entity);

        let mut entering = 0.0;
        let mut leaving = 0.0;
        for id in cell.area_mappings() {
            let mapping = context.graph.mapping(*id);
            if mapping.subsection != subsection {
                continue;
            }
            let Some(other) = mapping.other(coordinate) else {
                continue;
            };
            let neighbour = context.graph.cell(other)?;
            let weight = diffusivity * mapping.weight();
            entering += weight * neighbour.concentrations.get(subsection, entity);
            leaving += weight * local;
        }
        Ok(entering - leaving)
    }
}

impl UpdateModule for Diffusion {
    fn identifier(&self) -> &ModuleId {
        &self.identifier
    }

    fn required_features(&self) -> Vec<(FeatureOwner, FeatureKind)> {
        self.entities
            .iter()
            .map(|entity| (FeatureOwner::from(entity), FeatureKind::Diffusivity))
            .collect()
    }

    fn applies_to_cell(&self, cell: &Cell) -> bool {
        !cell.area_mappings().is_empty()
    }

    fn propose(&self, context: &EpochContext<'_>) -> Result<Vec<Proposal>> {
        let diffusivities = self.scaled_diffusivities(context)?;
        let graph = context.graph;

        let per_mapping: Vec<Vec<Proposal>> = graph
            .mappings()
            .par_iter()
            .map(|mapping| -> Result<Vec<Proposal>> {
                let source = graph.cell(mapping.source)?;
                let target = graph.cell(mapping.target)?;
                if !self.applies_to_cell(source) || !self.applies_to_cell(target) {
                    return Ok(Vec::new());
                }

                let mut proposals = Vec::new();
                for (entity, diffusivity) in &diffusivities {
                    if !Self::couples(entity, mapping.subsection) {
                        continue;
                    }
                    let source_concentration = source.concentrations.get(mapping.subsection, entity);
                    let target_concentration = target.concentrations.get(mapping.subsection, entity);
                    let flux =
                        diffusivity * mapping.weight() * (target_concentration - source_concentration);
                    if flux == 0.0 {
                        continue;
                    }
                    for (coordinate, quantity) in [(mapping.source, flux), (mapping.target, -flux)] {
                        proposals.push(Proposal {
                            target: DeltaTarget::Cell(coordinate),
                            delta: ConcentrationDelta::new(
                                self.identifier.clone(),
                                mapping.subsection,
                                entity.clone(),
                                quantity,
                            ),
                        });
                    }
                }
                Ok(proposals)
            })
            .collect::<Result<_>>()?;

        Ok(per_mapping.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::initialize_area_mappings;
    use crate::chemistry::{Feature, FeatureRegistry};
    use crate::graph::{AutomatonGraph, Neighborhood};
    use crate::modules::EpochScale;
    use crate::vesicle::VesicleLayer;

    fn line_graph(entity: &ChemicalEntity) -> AutomatonGraph {
        let mut graph = AutomatonGraph::rectangular(3, 1, 1.0, Neighborhood::VonNeumann);
        graph
            .cell_mut(CellCoordinate::new(1, 0))
            .unwrap()
            .concentrations
            .set(CellSubsection::Cytoplasm, entity.clone(), 1.0);
        initialize_area_mappings(&mut graph).unwrap();
        graph
    }

    #[test]
    fn test_builder_requires_entities() {
        assert!(Diffusion::builder().build().is_err());
    }

    #[test]
    fn test_edge_fluxes_match_cell_form() {
        let entity = ChemicalEntity::small_molecule("A");
        let graph = line_graph(&entity);
        let layer = VesicleLayer::default();
        let mut features = FeatureRegistry::new();
        features.set_feature(&entity, Feature::diffusivity_um2_per_sec(1e4));
        let context = EpochContext::new(&graph, &layer, &features, EpochScale::new(1e-6, 1.0));

        let diffusion = Diffusion::builder().entity(entity.clone()).build().unwrap();
        let proposals = diffusion.propose(&context).unwrap();

        let center = CellCoordinate::new(1, 0);
        let summed: f64 = proposals
            .iter()
            .filter(|p| p.target == DeltaTarget::Cell(center))
            .map(|p| p.delta.quantity())
            .sum();
        let cell_form = diffusion
            .cell_delta(&context, center, CellSubsection::Cytoplasm, &entity)
            .unwrap();

        // D_scaled = 1e4 * 1e-6 = 0.01, two neighbours at zero
        assert!((cell_form + 0.02).abs() < 1e-15);
        assert!((summed - cell_form).abs() < 1e-15);
    }

    #[test]
    fn test_membrane_anchored_entities_stay_in_membrane() {
        let receptor = ChemicalEntity::membrane_protein("R");
        assert!(!Diffusion::couples(&receptor, CellSubsection::Cytoplasm));
        assert!(Diffusion::couples(&receptor, CellSubsection::PlasmaMembrane));

        let glucose = ChemicalEntity::small_molecule("glucose");
        assert!(Diffusion::couples(&glucose, CellSubsection::Extracellular));
        assert!(!Diffusion::couples(&glucose, CellSubsection::PlasmaMembrane));
    }

    #[test]
    fn test_missing_diffusivity_is_fatal() {
        let entity = ChemicalEntity::small_molecule("A");
        let graph = line_graph(&entity);
        let layer = VesicleLayer::default();
        let features = FeatureRegistry::new();
        let context = EpochContext::new(&graph, &layer, &features, EpochScale::new(1e-6, 1.0));

        let diffusion = Diffusion::builder().entity(entity).build().unwrap();
        let err = diffusion.propose(&context).unwrap_err();
        assert!(matches!(err, SimulationError::MissingFeature { .. }));
    }
}
