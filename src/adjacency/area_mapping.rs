//! Area mappings: weighted adjacency edges between cell subsections.

use crate::graph::{CellCoordinate, CellSubsection};

/// Index of an [`AreaMapping`] in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingId(pub(crate) usize);

impl MappingId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Coupling between the same subsection of two neighbouring cells.
///
/// One instance exists per coupled pair and both endpoint cells refer to it
/// by [`MappingId`].
#[derive(Debug, Clone, PartialEq)]
pub struct AreaMapping {
    pub source: CellCoordinate,
    pub target: CellCoordinate,
    pub subsection: CellSubsection,
    /// Touching segment length over unit cell length
    pub relative_adjacent_area: f64,
    /// Centroid distance over unit cell length
    pub relative_centroid_distance: f64,
    /// relative_adjacent_area / relative_centroid_distance²
    pub relative_effective_area: f64,
    /// Local permeability reduction (1.0 = unhindered)
    pub diffusive_ratio: f64,
}

impl AreaMapping {
    pub fn new(
        source: CellCoordinate,
        target: CellCoordinate,
        subsection: CellSubsection,
        relative_adjacent_area: f64,
        relative_centroid_distance: f64,
    ) -> Self {
        Self {
            source,
            target,
            subsection,
            relative_adjacent_area,
            relative_centroid_distance,
            relative_effective_area: relative_adjacent_area
                / (relative_centroid_distance * relative_centroid_distance),
            diffusive_ratio: 1.0,
        }
    }

    /// Coupling weight used by diffusion.
    pub fn weight(&self) -> f64 {
        self.relative_effective_area * self.diffusive_ratio
    }

    /// The endpoint opposite to `coordinate`, if it is an endpoint at all.
    pub fn other(&self, coordinate: CellCoordinate) -> Option<CellCoordinate> {
        if coordinate == self.source {
            Some(self.target)
        } else if coordinate == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn connects(&self, a: CellCoordinate, b: CellCoordinate) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}
