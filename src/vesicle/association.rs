//! Vesicle-to-cell association.
//!
//! Decides which cells a vesicle's circular footprint overlaps and the
//! fraction of the footprint area in each, in order of specificity:
//!
//! 1. the circle crosses exactly one edge of its host cell: the chord cuts
//!    off a circular segment that belongs to the cell across that edge;
//! 2. the circle reaches a vertex (or several edges): it is split into eight
//!    equal sectors, each assigned to the cell containing its centroid;
//! 3. otherwise the vesicle lies inside the host cell.
//!
//! The weights of one vesicle always sum to one. Sectors or segments whose
//! cell cannot be resolved stay with the host, with a warning.

use std::collections::BTreeMap;

use super::Vesicle;
use crate::geometry::{Circle, DVec2, LineSegment, Polygon, SLICE_COUNT};
use crate::graph::{AutomatonGraph, CellCoordinate};

/// Offset (in node distances) used to probe across an edge.
const PROBE_OFFSET: f64 = 1e-6;

/// Cells overlapped by the vesicle with their area fractions.
///
/// Empty if the vesicle centre lies outside every cell.
pub fn associate_vesicle(graph: &AutomatonGraph, vesicle: &Vesicle) -> BTreeMap<CellCoordinate, f64> {
    let mut weights = BTreeMap::new();
    let circle = vesicle.circle();

    let Some(host) = graph.cell_containing(circle.center) else {
        log::warn!("{} at {} lies outside every cell", vesicle.id(), circle.center);
        return weights;
    };
    let Some(polygon) = graph.cell(host).ok().and_then(|cell| cell.polygon()) else {
        weights.insert(host, 1.0);
        return weights;
    };

    let crossed = circle.crossed_edges(polygon);
    if circle.contains_vertex_of(polygon) || crossed.len() > 1 {
        slice(graph, &circle, host, &mut weights);
    } else if let Some(edge) = crossed.first() {
        split_at_edge(graph, &circle, host, polygon, edge, &mut weights);
    } else {
        weights.insert(host, 1.0);
    }
    weights
}

fn split_at_edge(
    graph: &AutomatonGraph,
    circle: &Circle,
    host: CellCoordinate,
    polygon: &Polygon,
    edge: &LineSegment,
    weights: &mut BTreeMap<CellCoordinate, f64>,
) {
    let mut normal = edge.direction().perp();
    if normal.dot(edge.midpoint() - polygon.centroid()) < 0.0 {
        normal = -normal;
    }
    let probe = edge.closest_point(circle.center) + normal * PROBE_OFFSET * graph.node_distance_um();
    let neighbour = graph.cell_containing(probe).filter(|coordinate| *coordinate != host);

    let Some(neighbour) = neighbour else {
        log::warn!(
            "No cell across the edge crossed by the vesicle at {}, keeping it in {}",
            circle.center,
            host
        );
        weights.insert(host, 1.0);
        return;
    };

    let fraction = circle.circular_segment_area(edge.line_distance_to_point(circle.center)) / circle.area();
    weights.insert(host, 1.0 - fraction);
    weights.insert(neighbour, fraction);
}

fn slice(
    graph: &AutomatonGraph,
    circle: &Circle,
    host: CellCoordinate,
    weights: &mut BTreeMap<CellCoordinate, f64>,
) {
    let share = 1.0 / SLICE_COUNT as f64;
    for direction in Circle::slice_directions() {
        let centroid: DVec2 = circle.slice_centroid(direction);
        let coordinate = graph.cell_containing(centroid).unwrap_or_else(|| {
            log::warn!(
                "Unresolved slice at {} of the vesicle at {}, assigning it to {}",
                centroid,
                circle.center,
                host
            );
            host
        });
        *weights.entry(coordinate).or_insert(0.0) += share;
    }
}
