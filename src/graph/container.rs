//! Concentration containers.

use std::collections::{BTreeMap, BTreeSet};

use super::{CellSubsection, CellTopology};
use crate::chemistry::ChemicalEntity;

/// Mapping (subsection, entity) → concentration in mol/µm³.
///
/// The set of subsections is fixed by the layout the container was created
/// with. Stored values are never negative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConcentrationContainer {
    layout: Vec<(CellTopology, CellSubsection)>,
    pools: BTreeMap<CellSubsection, BTreeMap<ChemicalEntity, f64>>,
}

impl ConcentrationContainer {
    /// Empty container for the given topology → subsection layout.
    pub fn with_layout(layout: &[(CellTopology, CellSubsection)]) -> Self {
        Self {
            layout: layout.to_vec(),
            pools: layout
                .iter()
                .map(|(_, subsection)| (*subsection, BTreeMap::new()))
                .collect(),
        }
    }

    /// Concentration of `entity` in `subsection`, zero if absent.
    #[inline]
    pub fn get(&self, subsection: CellSubsection, entity: &ChemicalEntity) -> f64 {
        self.pools
            .get(&subsection)
            .and_then(|pool| pool.get(entity))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set a concentration, clamped at zero.
    ///
    /// Writes to subsections outside the layout are dropped with a warning.
    pub fn set(&mut self, subsection: CellSubsection, entity: ChemicalEntity, value: f64) {
        match self.pools.get_mut(&subsection) {
            Some(pool) => {
                pool.insert(entity, value.max(0.0));
            }
            None => log::warn!(
                "Dropping concentration of {} for {:?}: not part of this layout",
                entity,
                subsection
            ),
        }
    }

    pub fn subsection_for(&self, topology: CellTopology) -> Option<CellSubsection> {
        self.layout
            .iter()
            .find(|(t, _)| *t == topology)
            .map(|(_, subsection)| *subsection)
    }

    pub fn topology_of(&self, subsection: CellSubsection) -> Option<CellTopology> {
        self.layout
            .iter()
            .find(|(_, s)| *s == subsection)
            .map(|(topology, _)| *topology)
    }

    /// Concentration in the subsection playing `topology`, zero if none does.
    pub fn get_in_topology(&self, topology: CellTopology, entity: &ChemicalEntity) -> f64 {
        self.subsection_for(topology)
            .map(|subsection| self.get(subsection, entity))
            .unwrap_or(0.0)
    }

    /// Set the concentration in the subsection playing `topology`.
    pub fn set_in_topology(&mut self, topology: CellTopology, entity: ChemicalEntity, value: f64) {
        match self.subsection_for(topology) {
            Some(subsection) => self.set(subsection, entity, value),
            None => log::warn!(
                "Dropping concentration of {} for {:?}: no such topology in layout",
                entity,
                topology
            ),
        }
    }

    pub fn has_subsection(&self, subsection: CellSubsection) -> bool {
        self.pools.contains_key(&subsection)
    }

    pub fn subsections(&self) -> impl Iterator<Item = CellSubsection> + '_ {
        self.layout.iter().map(|(_, subsection)| *subsection)
    }

    pub fn layout(&self) -> &[(CellTopology, CellSubsection)] {
        &self.layout
    }

    /// Entities with their concentrations in one subsection.
    pub fn pool(&self, subsection: CellSubsection) -> impl Iterator<Item = (&ChemicalEntity, f64)> {
        self.pools
            .get(&subsection)
            .into_iter()
            .flat_map(|pool| pool.iter().map(|(entity, value)| (entity, *value)))
    }

    /// Every entity referenced in any subsection.
    pub fn entities(&self) -> BTreeSet<ChemicalEntity> {
        self.pools
            .values()
            .flat_map(|pool| pool.keys().cloned())
            .collect()
    }

    /// Sum of an entity's concentration over all subsections.
    pub fn sum_over_subsections(&self, entity: &ChemicalEntity) -> f64 {
        self.pools
            .values()
            .filter_map(|pool| pool.get(entity))
            .sum()
    }

    /// Whether every stored value is finite.
    pub fn is_finite(&self) -> bool {
        self.pools
            .values()
            .all(|pool| pool.values().all(|value| value.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CellRegion;

    #[test]
    fn test_missing_entries_read_as_zero() {
        let container = CellRegion::Membrane.new_container();
        let entity = ChemicalEntity::small_molecule("A");
        assert_eq!(container.get(CellSubsection::Cytoplasm, &entity), 0.0);
        assert_eq!(container.get_in_topology(CellTopology::Outer, &entity), 0.0);
    }

    #[test]
    fn test_topology_access() {
        let mut container = CellRegion::Membrane.new_container();
        let entity = ChemicalEntity::small_molecule("A");
        container.set_in_topology(CellTopology::Outer, entity.clone(), 3.0);

        assert_eq!(container.get(CellSubsection::Extracellular, &entity), 3.0);
        assert_eq!(
            container.topology_of(CellSubsection::Extracellular),
            Some(CellTopology::Outer)
        );
    }

    #[test]
    fn test_writes_outside_layout_are_dropped() {
        let mut container = CellRegion::Cytoplasm.new_container();
        let entity = ChemicalEntity::small_molecule("A");
        container.set(CellSubsection::Extracellular, entity.clone(), 1.0);
        assert!(container.entities().is_empty());
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let mut container = CellRegion::Cytoplasm.new_container();
        let entity = ChemicalEntity::small_molecule("A");
        container.set(CellSubsection::Cytoplasm, entity.clone(), -1.0);
        assert_eq!(container.get(CellSubsection::Cytoplasm, &entity), 0.0);
    }
}
