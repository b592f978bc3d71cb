//! The automaton graph: cells, their neighbourhood and the area-mapping arena.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cell, CellCoordinate, CellRegion, CellSubsection};
use crate::adjacency::{AreaMapping, MappingId};
use crate::chemistry::ChemicalEntity;
use crate::error::{Result, SimulationError};
use crate::geometry::{Bounds, DVec2, LineSegment, Polygon};

/// Neighbourhood used when building rectangular meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Neighborhood {
    /// 4-neighbourhood (edges only)
    #[default]
    VonNeumann,
    /// 8-neighbourhood (edges and corners)
    Moore,
}

/// Discretized mesh of cells.
#[derive(Debug, Clone)]
pub struct AutomatonGraph {
    cells: Vec<Cell>,
    index: HashMap<CellCoordinate, usize>,
    pub(crate) mappings: Vec<AreaMapping>,
    node_distance_um: f64,
    topology_dirty: bool,
}

impl AutomatonGraph {
    /// Empty graph with the given unit cell length.
    pub fn new(node_distance_um: f64) -> Self {
        Self {
            cells: Vec::new(),
            index: HashMap::new(),
            mappings: Vec::new(),
            node_distance_um,
            topology_dirty: true,
        }
    }

    /// Build a `columns × rows` mesh of square cytoplasm cells.
    ///
    /// Cells are created in row-major order; row 0 is at y = 0 and rows grow
    /// along +y. Each cell's footprint is a square of side `node_distance_um`.
    pub fn rectangular(
        columns: usize,
        rows: usize,
        node_distance_um: f64,
        neighborhood: Neighborhood,
    ) -> Self {
        let mut graph = Self::new(node_distance_um);
        for row in 0..rows as i32 {
            for column in 0..columns as i32 {
                let coordinate = CellCoordinate::new(column, row);
                let center = DVec2::new(
                    (column as f64 + 0.5) * node_distance_um,
                    (row as f64 + 0.5) * node_distance_um,
                );
                let cell = Cell::new(coordinate, CellRegion::Cytoplasm)
                    .with_polygon(Polygon::square(center, node_distance_um));
                graph.insert(cell);
            }
        }

        let mut offsets = vec![(1, 0), (0, 1)];
        if neighborhood == Neighborhood::Moore {
            offsets.extend([(1, 1), (-1, 1)]);
        }
        for row in 0..rows as i32 {
            for column in 0..columns as i32 {
                let coordinate = CellCoordinate::new(column, row);
                for (d_column, d_row) in &offsets {
                    let other = coordinate.offset(*d_column, *d_row);
                    if graph.index.contains_key(&other) {
                        graph.connect(coordinate, other);
                    }
                }
            }
        }

        log::debug!(
            "Built {}x{} rectangular graph ({:?}, {} cells)",
            columns,
            rows,
            neighborhood,
            graph.cells.len()
        );
        graph
    }

    fn insert(&mut self, cell: Cell) {
        self.index.insert(cell.coordinate(), self.cells.len());
        self.cells.push(cell);
        self.topology_dirty = true;
    }

    fn connect(&mut self, a: CellCoordinate, b: CellCoordinate) {
        for (from, to) in [(a, b), (b, a)] {
            let cell = &mut self.cells[self.index[&from]];
            if !cell.neighbours.contains(&to) {
                cell.neighbours.push(to);
            }
        }
        self.topology_dirty = true;
    }

    /// Add a cell; its coordinate must be unused.
    pub fn add_cell(&mut self, cell: Cell) -> Result<()> {
        if self.index.contains_key(&cell.coordinate()) {
            return Err(SimulationError::config(format!(
                "cell {} already exists",
                cell.coordinate()
            )));
        }
        self.insert(cell);
        Ok(())
    }

    /// Make two existing cells neighbours.
    pub fn add_edge(&mut self, a: CellCoordinate, b: CellCoordinate) -> Result<()> {
        self.position(a)?;
        self.position(b)?;
        self.connect(a, b);
        Ok(())
    }

    fn position(&self, coordinate: CellCoordinate) -> Result<usize> {
        self.index
            .get(&coordinate)
            .copied()
            .ok_or(SimulationError::InvalidTopology(coordinate))
    }

    pub fn cell(&self, coordinate: CellCoordinate) -> Result<&Cell> {
        let position = self.position(coordinate)?;
        Ok(&self.cells[position])
    }

    pub fn cell_mut(&mut self, coordinate: CellCoordinate) -> Result<&mut Cell> {
        let position = self.position(coordinate)?;
        Ok(&mut self.cells[position])
    }

    pub fn contains(&self, coordinate: CellCoordinate) -> bool {
        self.index.contains_key(&coordinate)
    }

    /// Graph neighbours of a cell.
    pub fn neighbors(&self, coordinate: CellCoordinate) -> Result<Vec<&Cell>> {
        self.cell(coordinate)?
            .neighbours
            .iter()
            .map(|neighbour| self.cell(*neighbour))
            .collect()
    }

    /// Reassign a cell's region. The container is rebuilt empty.
    pub fn set_region(&mut self, coordinate: CellCoordinate, region: CellRegion) -> Result<()> {
        let cell = self.cell_mut(coordinate)?;
        cell.reset_region(region);
        self.topology_dirty = true;
        Ok(())
    }

    /// All cells in insertion (row-major for rectangular meshes) order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub(crate) fn cell_slice(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn node_distance_um(&self) -> f64 {
        self.node_distance_um
    }

    pub fn is_topology_dirty(&self) -> bool {
        self.topology_dirty
    }

    pub fn mark_topology_changed(&mut self) {
        self.topology_dirty = true;
    }

    pub(crate) fn mark_topology_clean(&mut self) {
        self.topology_dirty = false;
    }

    pub fn mapping(&self, id: MappingId) -> &AreaMapping {
        &self.mappings[id.0]
    }

    pub fn mappings(&self) -> &[AreaMapping] {
        &self.mappings
    }

    /// Area mappings referenced by a cell.
    pub fn mappings_of(&self, coordinate: CellCoordinate) -> Result<Vec<&AreaMapping>> {
        Ok(self
            .cell(coordinate)?
            .area_mappings
            .iter()
            .map(|id| self.mapping(*id))
            .collect())
    }

    /// Bounding box of all footprints.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .cells
            .iter()
            .filter_map(Cell::polygon)
            .flat_map(|polygon| polygon.vertices().iter().copied());
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Bounds::new(min, max))
    }

    /// Cell whose footprint contains `point`.
    pub fn cell_containing(&self, point: DVec2) -> Option<CellCoordinate> {
        let guess = CellCoordinate::new(
            (point.x / self.node_distance_um).floor() as i32,
            (point.y / self.node_distance_um).floor() as i32,
        );
        if let Ok(cell) = self.cell(guess) {
            if cell.polygon().is_some_and(|polygon| polygon.contains(point)) {
                return Some(guess);
            }
        }
        self.cells
            .iter()
            .find(|cell| cell.polygon().is_some_and(|polygon| polygon.contains(point)))
            .map(Cell::coordinate)
    }

    /// Split a rectangular mesh into inner and outer compartments divided by
    /// a membrane row.
    ///
    /// Rows below `membrane_row` become cytoplasm, rows past it extracellular.
    /// Membrane cells get half-cell footprints for their cytoplasm (inner
    /// side) and extracellular (outer side) pools. Returns the membrane line.
    pub fn split_with_membrane(&mut self, membrane_row: i32) -> Result<LineSegment> {
        let rows: Vec<i32> = self.cells.iter().map(|cell| cell.coordinate().row).collect();
        if !rows.contains(&membrane_row) {
            return Err(SimulationError::config(format!(
                "membrane row {} is not part of the graph",
                membrane_row
            )));
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let half = self.node_distance_um * 0.5;
        let membrane_y = (membrane_row as f64 + 0.5) * self.node_distance_um;

        for cell in &mut self.cells {
            let row = cell.coordinate().row;
            let region = match row.cmp(&membrane_row) {
                std::cmp::Ordering::Less => CellRegion::Cytoplasm,
                std::cmp::Ordering::Equal => CellRegion::Membrane,
                std::cmp::Ordering::Greater => CellRegion::Extracellular,
            };
            cell.reset_region(region);

            if region != CellRegion::Membrane {
                continue;
            }
            if let Some(centroid) = cell.centroid() {
                min_x = min_x.min(centroid.x - half);
                max_x = max_x.max(centroid.x + half);
                let inner = Polygon::rectangle(
                    DVec2::new(centroid.x - half, centroid.y - half),
                    DVec2::new(centroid.x + half, centroid.y),
                );
                let outer = Polygon::rectangle(
                    DVec2::new(centroid.x - half, centroid.y),
                    DVec2::new(centroid.x + half, centroid.y + half),
                );
                cell.set_subsection_polygon(CellSubsection::Cytoplasm, inner);
                cell.set_subsection_polygon(CellSubsection::Extracellular, outer);
            }
        }
        self.topology_dirty = true;

        log::info!("Split graph at membrane row {}", membrane_row);
        Ok(LineSegment::new(
            DVec2::new(min_x, membrane_y),
            DVec2::new(max_x, membrane_y),
        ))
    }

    /// Sum of an entity's concentration over every cell and subsection.
    pub fn sum_concentration(&self, entity: &ChemicalEntity) -> f64 {
        self.cells
            .iter()
            .map(|cell| cell.concentrations.sum_over_subsections(entity))
            .sum()
    }

    pub fn has_deltas(&self) -> bool {
        self.cells.iter().any(|cell| cell.deltas.has_deltas())
    }

    /// Commit the pending deltas of every cell.
    pub fn apply_deltas(&mut self) {
        for cell in &mut self.cells {
            cell.apply_deltas();
        }
    }
}
