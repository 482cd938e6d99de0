//! Local route suggestion: a greedy nearest-neighbour chain over the
//! not-started pool.
//!
//! The sequencer treats any suggested ordering as opaque; this generator is
//! the in-process stand-in for the external heuristic service and produces
//! the same record shape.

use crate::geometry::Point;
use crate::model::TargetId;
use prospect_schema::{LineStringRecord, SuggestedRoute};

/// Build a suggested visiting order from a pool of fresh targets.
///
/// The pool is capped at `pool_max` before chaining, the chain at
/// `tour_max` stops. Starts from the first pool entry and repeatedly walks
/// to the nearest remaining point by squared planar distance. A polyline is
/// attached once the route has at least two stops.
pub fn suggest_route(
    pool: &[(TargetId, Point)],
    pool_max: usize,
    tour_max: usize,
) -> SuggestedRoute {
    let mut remaining: Vec<(TargetId, Point)> = pool.iter().take(pool_max).copied().collect();
    if remaining.is_empty() || tour_max == 0 {
        return SuggestedRoute {
            target_ids_ordered: Vec::new(),
            polyline: None,
        };
    }

    let mut ordered = vec![remaining.remove(0)];
    while !remaining.is_empty() && ordered.len() < tour_max {
        let last = ordered[ordered.len() - 1].1;
        let mut best_index = 0;
        let mut best_dist = last.dist2(remaining[0].1);
        for (index, candidate) in remaining.iter().enumerate().skip(1) {
            let dist = last.dist2(candidate.1);
            if dist < best_dist {
                best_dist = dist;
                best_index = index;
            }
        }
        ordered.push(remaining.remove(best_index));
    }

    let polyline = if ordered.len() >= 2 {
        Some(LineStringRecord {
            coordinates: ordered.iter().map(|(_, p)| [p.lng, p.lat]).collect(),
        })
    } else {
        None
    };

    SuggestedRoute {
        target_ids_ordered: ordered.iter().map(|(id, _)| id.0).collect(),
        polyline,
    }
}
