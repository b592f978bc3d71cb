//! Grid cells: one discretized region of simulated space.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CellRegion, CellSubsection, ConcentrationContainer};
use crate::adjacency::MappingId;
use crate::delta::DeltaBuffer;
use crate::geometry::{DVec2, Polygon};

/// Integer grid coordinate, the unique identifier of a cell.
///
/// Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoordinate {
    pub column: i32,
    pub row: i32,
}

impl CellCoordinate {
    pub fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    pub fn offset(&self, d_column: i32, d_row: i32) -> Self {
        Self::new(self.column + d_column, self.row + d_row)
    }
}

impl PartialOrd for CellCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellCoordinate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.row, self.column).cmp(&(other.row, other.column))
    }
}

impl fmt::Display for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// A node of the automaton graph.
#[derive(Debug, Clone)]
pub struct Cell {
    coordinate: CellCoordinate,
    region: CellRegion,
    /// Committed concentrations
    pub concentrations: ConcentrationContainer,
    /// Pending concentration deltas of the current epoch
    pub deltas: DeltaBuffer,
    polygon: Option<Polygon>,
    subsection_polygons: BTreeMap<CellSubsection, Polygon>,
    pub(crate) neighbours: Vec<CellCoordinate>,
    pub(crate) area_mappings: Vec<MappingId>,
}

impl Cell {
    /// New cell with an empty container for `region`.
    pub fn new(coordinate: CellCoordinate, region: CellRegion) -> Self {
        Self {
            coordinate,
            region,
            concentrations: region.new_container(),
            deltas: DeltaBuffer::new(),
            polygon: None,
            subsection_polygons: BTreeMap::new(),
            neighbours: Vec::new(),
            area_mappings: Vec::new(),
        }
    }

    pub fn with_polygon(mut self, polygon: Polygon) -> Self {
        self.polygon = Some(polygon);
        self
    }

    pub fn coordinate(&self) -> CellCoordinate {
        self.coordinate
    }

    pub fn region(&self) -> CellRegion {
        self.region
    }

    /// Replace the region and rebuild an empty container for its layout.
    ///
    /// Concentrations and per-subsection footprints are discarded; callers
    /// migrate state themselves.
    pub(crate) fn reset_region(&mut self, region: CellRegion) {
        self.region = region;
        self.concentrations = region.new_container();
        self.deltas.clear_potential_deltas();
        self.subsection_polygons.clear();
    }

    pub fn polygon(&self) -> Option<&Polygon> {
        self.polygon.as_ref()
    }

    pub fn set_polygon(&mut self, polygon: Polygon) {
        self.polygon = Some(polygon);
    }

    /// Footprint of a subsection; the whole cell when none was assigned.
    pub fn subsection_polygon(&self, subsection: CellSubsection) -> Option<&Polygon> {
        self.subsection_polygons
            .get(&subsection)
            .or(self.polygon.as_ref())
    }

    pub fn set_subsection_polygon(&mut self, subsection: CellSubsection, polygon: Polygon) {
        self.subsection_polygons.insert(subsection, polygon);
    }

    /// Centroid of the footprint, if the cell has one.
    pub fn centroid(&self) -> Option<DVec2> {
        self.polygon.as_ref().map(Polygon::centroid)
    }

    pub fn neighbour_coordinates(&self) -> &[CellCoordinate] {
        &self.neighbours
    }

    pub fn area_mappings(&self) -> &[MappingId] {
        &self.area_mappings
    }

    /// Commit pending deltas into the concentration container.
    pub fn apply_deltas(&mut self) {
        self.deltas.apply_deltas(&mut self.concentrations);
    }
}
