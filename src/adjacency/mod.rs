//! Neighbourhood and adjacency geometry.
//!
//! For every pair of neighbouring cells and every subsection both carry, the
//! touching segment of their footprints yields a finite-volume coupling
//! weight:
//!
//! ```text
//! relative_adjacent_area     = segment_length / node_distance
//! relative_centroid_distance = centroid_distance / node_distance
//! relative_effective_area    = relative_adjacent_area / relative_centroid_distance²
//! ```
//!
//! Exactly one [`AreaMapping`] is stored per coupled pair, in an arena on the
//! graph; both cells hold its [`MappingId`].

mod area_mapping;
mod cortex;

pub use area_mapping::{AreaMapping, MappingId};
pub use cortex::apply_diffusive_ratio;

use crate::error::Result;
use crate::graph::AutomatonGraph;

/// Touching segments shorter than this (µm) are treated as point contacts.
pub const MINIMAL_TOUCHING_LENGTH: f64 = 1e-8;

/// Recompute every area mapping of the graph.
///
/// Existing mappings are discarded. Returns the number of mappings created.
pub fn initialize_area_mappings(graph: &mut AutomatonGraph) -> Result<usize> {
    let node_distance = graph.node_distance_um();
    let mut created = Vec::new();

    for cell in graph.cell_slice() {
        let coordinate = cell.coordinate();
        for neighbour_coordinate in cell.neighbour_coordinates() {
            // each unordered pair once
            if *neighbour_coordinate <= coordinate {
                continue;
            }
            let neighbour = graph.cell(*neighbour_coordinate)?;

            for subsection in cell.concentrations.subsections() {
                if !neighbour.concentrations.has_subsection(subsection) {
                    continue;
                }
                let (Some(footprint), Some(neighbour_footprint)) = (
                    cell.subsection_polygon(subsection),
                    neighbour.subsection_polygon(subsection),
                ) else {
                    log::debug!(
                        "No footprint for {:?} between {} and {}",
                        subsection,
                        coordinate,
                        neighbour_coordinate
                    );
                    continue;
                };

                let segments: Vec<_> = footprint
                    .touching_segments(neighbour_footprint)
                    .into_iter()
                    .filter(|segment| segment.length() >= MINIMAL_TOUCHING_LENGTH)
                    .collect();
                let Some(segment) = segments.first() else {
                    continue;
                };
                if segments.len() > 1 {
                    log::warn!(
                        "{} touching segments for {:?} between {} and {}, using the first",
                        segments.len(),
                        subsection,
                        coordinate,
                        neighbour_coordinate
                    );
                }

                let centroid_distance = footprint
                    .centroid()
                    .distance(neighbour_footprint.centroid());
                if centroid_distance < MINIMAL_TOUCHING_LENGTH {
                    log::warn!(
                        "Coincident centroids for {:?} between {} and {}, skipping coupling",
                        subsection,
                        coordinate,
                        neighbour_coordinate
                    );
                    continue;
                }

                created.push(AreaMapping::new(
                    coordinate,
                    *neighbour_coordinate,
                    subsection,
                    segment.length() / node_distance,
                    centroid_distance / node_distance,
                ));
            }
        }
    }

    for cell in graph.cells_mut() {
        cell.area_mappings.clear();
    }
    graph.mappings.clear();

    let count = created.len();
    for mapping in created {
        let id = MappingId(graph.mappings.len());
        graph.cell_mut(mapping.source)?.area_mappings.push(id);
        graph.cell_mut(mapping.target)?.area_mappings.push(id);
        graph.mappings.push(mapping);
    }
    graph.mark_topology_clean();

    log::debug!("Initialized {} area mappings", count);
    Ok(count)
}
