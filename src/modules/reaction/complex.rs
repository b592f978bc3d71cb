//! Rule-based reactant sets for complex formation.
//!
//! A binder (typically a receptor) attaches to a binding target or to any
//! complex that already contains the target, as long as that complex does not
//! carry the binder yet. One reactant set is generated per candidate found in
//! the target's pool of the evaluated container.

use super::{ReactantSet, ResolvedReactant};
use crate::chemistry::ChemicalEntity;
use crate::graph::{CellTopology, ConcentrationContainer};

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexBuildingRule {
    pub binder: ChemicalEntity,
    pub binder_topology: CellTopology,
    pub binding_target: ChemicalEntity,
    pub target_topology: CellTopology,
}

impl ComplexBuildingRule {
    pub fn new(
        binder: ChemicalEntity,
        binder_topology: CellTopology,
        binding_target: ChemicalEntity,
        target_topology: CellTopology,
    ) -> Self {
        Self {
            binder,
            binder_topology,
            binding_target,
            target_topology,
        }
    }

    /// Whether `candidate` may be bound by the binder.
    pub fn accepts(&self, candidate: &ChemicalEntity) -> bool {
        !candidate.contains(&self.binder) && candidate.contains(&self.binding_target)
    }

    /// Generate the reactant sets available in `container`.
    ///
    /// Empty when the container lacks either topology.
    pub(crate) fn reactant_sets(&self, container: &ConcentrationContainer) -> Vec<ReactantSet> {
        let (Some(binder_subsection), Some(target_subsection)) = (
            container.subsection_for(self.binder_topology),
            container.subsection_for(self.target_topology),
        ) else {
            return Vec::new();
        };

        let mut candidates = vec![self.binding_target.clone()];
        for (entity, _) in container.pool(target_subsection) {
            if self.accepts(entity) && !candidates.contains(entity) {
                candidates.push(entity.clone());
            }
        }

        candidates
            .into_iter()
            .map(|candidate| {
                let complex = ChemicalEntity::complex(&self.binder, &candidate);
                ReactantSet {
                    substrates: vec![
                        ResolvedReactant::single(self.binder.clone(), binder_subsection),
                        ResolvedReactant::single(candidate, target_subsection),
                    ],
                    products: vec![ResolvedReactant::single(complex, binder_subsection)],
                    catalysts: Vec::new(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CellRegion, CellSubsection};

    fn rule() -> ComplexBuildingRule {
        ComplexBuildingRule::new(
            ChemicalEntity::membrane_protein("receptor"),
            CellTopology::Membrane,
            ChemicalEntity::small_molecule("ligand"),
            CellTopology::Outer,
        )
    }

    #[test]
    fn test_acceptance() {
        let rule = rule();
        let bound = ChemicalEntity::complex(&rule.binder, &rule.binding_target);
        let chaperoned = ChemicalEntity::complex(
            &ChemicalEntity::protein("chaperone"),
            &rule.binding_target,
        );
        assert!(rule.accepts(&rule.binding_target));
        assert!(rule.accepts(&chaperoned));
        assert!(!rule.accepts(&bound));
        assert!(!rule.accepts(&ChemicalEntity::small_molecule("other")));
    }

    #[test]
    fn test_sets_need_both_topologies() {
        let rule = rule();
        let cytoplasm = CellRegion::Cytoplasm.new_container();
        assert!(rule.reactant_sets(&cytoplasm).is_empty());

        let membrane = CellRegion::Membrane.new_container();
        let sets = rule.reactant_sets(&membrane);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].substrates[0].subsection, CellSubsection::PlasmaMembrane);
        assert_eq!(sets[0].substrates[1].subsection, CellSubsection::Extracellular);
        assert!(sets[0].products[0].entity.is_membrane_anchored());
    }

    #[test]
    fn test_one_set_per_candidate() {
        let rule = rule();
        let mut membrane = CellRegion::Membrane.new_container();
        let chaperoned = ChemicalEntity::complex(
            &ChemicalEntity::protein("chaperone"),
            &rule.binding_target,
        );
        membrane.set(CellSubsection::Extracellular, rule.binding_target.clone(), 1.0);
        membrane.set(CellSubsection::Extracellular, chaperoned, 1.0);
        membrane.set(CellSubsection::Extracellular, ChemicalEntity::small_molecule("other"), 1.0);
        assert_eq!(rule.reactant_sets(&membrane).len(), 2);
    }
}
