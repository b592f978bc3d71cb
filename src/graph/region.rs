//! Regions, subsections and topologies.
//!
//! A region classifies a cell and fixes its subsection layout: which named
//! compartment plays the inner, membrane and outer role.

use serde::{Deserialize, Serialize};

use super::ConcentrationContainer;

/// Topological role of a subsection relative to a membrane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellTopology {
    Inner,
    Membrane,
    Outer,
}

/// Named logical compartments holding their own concentration pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellSubsection {
    Cytoplasm,
    PlasmaMembrane,
    Extracellular,
    VesicleLumen,
    VesicleMembrane,
}

impl CellSubsection {
    pub fn is_membrane(&self) -> bool {
        matches!(self, CellSubsection::PlasmaMembrane | CellSubsection::VesicleMembrane)
    }
}

/// Classification of a cell (or vesicle) that determines its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CellRegion {
    /// Ordinary intracellular volume
    #[default]
    Cytoplasm,
    /// Cell crossed by the plasma membrane: inner, membrane and outer pools
    Membrane,
    /// Space outside the cell
    Extracellular,
    /// Layout of a vesicle's cargo container
    Vesicle,
}

impl CellRegion {
    /// Topology to subsection mapping of this region.
    pub fn layout(&self) -> &'static [(CellTopology, CellSubsection)] {
        match self {
            CellRegion::Cytoplasm => &[(CellTopology::Inner, CellSubsection::Cytoplasm)],
            CellRegion::Membrane => &[
                (CellTopology::Inner, CellSubsection::Cytoplasm),
                (CellTopology::Membrane, CellSubsection::PlasmaMembrane),
                (CellTopology::Outer, CellSubsection::Extracellular),
            ],
            CellRegion::Extracellular => &[(CellTopology::Outer, CellSubsection::Extracellular)],
            CellRegion::Vesicle => &[
                (CellTopology::Inner, CellSubsection::VesicleLumen),
                (CellTopology::Membrane, CellSubsection::VesicleMembrane),
            ],
        }
    }

    /// Fresh, empty container with this region's layout.
    pub fn new_container(&self) -> ConcentrationContainer {
        ConcentrationContainer::with_layout(self.layout())
    }

    pub fn has_membrane(&self) -> bool {
        self.layout()
            .iter()
            .any(|(topology, _)| *topology == CellTopology::Membrane)
    }

    pub fn subsection(&self, topology: CellTopology) -> Option<CellSubsection> {
        self.layout()
            .iter()
            .find(|(t, _)| *t == topology)
            .map(|(_, subsection)| *subsection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membrane_region_has_three_pools() {
        let container = CellRegion::Membrane.new_container();
        assert_eq!(container.subsections().count(), 3);
        assert_eq!(
            CellRegion::Membrane.subsection(CellTopology::Outer),
            Some(CellSubsection::Extracellular)
        );
    }

    #[test]
    fn test_cytoplasm_has_no_membrane() {
        assert!(!CellRegion::Cytoplasm.has_membrane());
        assert!(CellRegion::Membrane.has_membrane());
        assert_eq!(CellRegion::Cytoplasm.subsection(CellTopology::Outer), None);
    }
}
