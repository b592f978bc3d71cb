//! Diffusive-ratio overrides for sub-regions with reduced permeability,
//! such as the actin cortex underneath the plasma membrane.

use crate::error::Result;
use crate::geometry::{LineSegment, Polygon};
use crate::graph::AutomatonGraph;

/// Apply `ratio` to every mapping whose endpoints lie inside `region`.
///
/// A mapping whose line of centres crosses the region boundary gets a linear
/// blend: the fraction of the line inside the region takes `ratio`, the rest
/// keeps the mapping's current ratio. Returns the number of mappings changed.
pub fn apply_diffusive_ratio(graph: &mut AutomatonGraph, region: &Polygon, ratio: f64) -> Result<usize> {
    let mut updates = Vec::new();

    for (index, mapping) in graph.mappings().iter().enumerate() {
        let source = graph.cell(mapping.source)?;
        let target = graph.cell(mapping.target)?;
        let (Some(source_footprint), Some(target_footprint)) = (
            source.subsection_polygon(mapping.subsection),
            target.subsection_polygon(mapping.subsection),
        ) else {
            continue;
        };

        let source_centroid = source_footprint.centroid();
        let target_centroid = target_footprint.centroid();
        let source_inside = region.contains(source_centroid);
        let target_inside = region.contains(target_centroid);

        let updated = match (source_inside, target_inside) {
            (true, true) => ratio,
            (false, false) => continue,
            _ => {
                let line = LineSegment::new(source_centroid, target_centroid);
                let inside_point = if source_inside { source_centroid } else { target_centroid };
                let fraction_inside = match region.intersections_with_segment(&line).first() {
                    Some(crossing) => crossing.distance(inside_point) / line.length(),
                    None => {
                        log::warn!(
                            "Line of centres between {} and {} does not cross the region boundary, assuming half",
                            mapping.source,
                            mapping.target
                        );
                        0.5
                    }
                };
                fraction_inside * ratio + (1.0 - fraction_inside) * mapping.diffusive_ratio
            }
        };
        updates.push((index, updated));
    }

    let changed = updates.len();
    for (index, updated) in updates {
        graph.mappings[index].diffusive_ratio = updated;
    }
    log::debug!("Diffusive ratio {} applied to {} mappings", ratio, changed);
    Ok(changed)
}
