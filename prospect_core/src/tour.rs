//! The agent's bounded, ordered visiting sequence.
//!
//! Capacity 8, cheapest-insertion construction, bulk replace from an
//! externally suggested ordering. Only fresh `not_started` targets may be
//! sequenced; the session layer encodes that rule into the [`Stop`] map.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::geometry::Point;
use crate::model::TargetId;

/// Default tour capacity. The configured value may differ in tests but the
/// product bound is eight visits a day.
pub const TOUR_CAPACITY: usize = 8;

/// The sequencer's view of one candidate target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub point: Point,
    /// True only for `not_started` targets currently in the visible set.
    pub eligible: bool,
}

/// Result of a manual insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { position: usize },
    AlreadyPresent,
    AtCapacity,
    NotEligible,
    UnknownTarget,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TourError {
    /// The suggestion filtered down to nothing. Distinct from an explicit
    /// clear; the caller renders a different empty state.
    #[error("suggested route contains no viable stops")]
    NoViableSuggestion,
}

#[derive(Debug, Clone, Copy)]
struct TourStop {
    id: TargetId,
    point: Point,
}

/// Ordered, capacity-bounded, duplicate-free sequence of target ids.
#[derive(Debug, Clone)]
pub struct Tour {
    stops: Vec<TourStop>,
    capacity: usize,
}

impl Default for Tour {
    fn default() -> Self {
        Self::with_capacity(TOUR_CAPACITY)
    }
}

impl Tour {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stops: Vec::new(),
            capacity,
        }
    }

    pub fn ids(&self) -> Vec<TargetId> {
        self.stops.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.stops.iter().any(|s| s.id == id)
    }

    /// Insert at the cheapest position.
    ///
    /// Cost of inserting `n` at position `i` over stops `s`:
    /// at the front `d²(n, s[0])`, at the end `d²(s.last, n)`, in between
    /// `d²(s[i-1], n) + d²(n, s[i]) - d²(s[i-1], s[i])`. The strictly
    /// smallest cost wins; ties go to the lowest index.
    pub fn insert(&mut self, id: TargetId, stops: &HashMap<TargetId, Stop>) -> InsertOutcome {
        if self.contains(id) {
            return InsertOutcome::AlreadyPresent;
        }
        if self.stops.len() >= self.capacity {
            return InsertOutcome::AtCapacity;
        }
        let candidate = match stops.get(&id) {
            Some(stop) => stop,
            None => return InsertOutcome::UnknownTarget,
        };
        if !candidate.eligible {
            return InsertOutcome::NotEligible;
        }

        let position = self.cheapest_position(candidate.point);
        self.stops.insert(
            position,
            TourStop {
                id,
                point: candidate.point,
            },
        );
        // Capacity was checked above; the bound still holds if it ever was
        // not.
        self.stops.truncate(self.capacity);
        InsertOutcome::Inserted { position }
    }

    fn cheapest_position(&self, point: Point) -> usize {
        if self.stops.is_empty() {
            return 0;
        }
        let mut best_position = 0;
        let mut best_cost = point.dist2(self.stops[0].point);
        for i in 1..self.stops.len() {
            let before = self.stops[i - 1].point;
            let after = self.stops[i].point;
            let cost = before.dist2(point) + point.dist2(after) - before.dist2(after);
            if cost < best_cost {
                best_cost = cost;
                best_position = i;
            }
        }
        let end_cost = self.stops[self.stops.len() - 1].point.dist2(point);
        if end_cost < best_cost {
            best_position = self.stops.len();
        }
        best_position
    }

    /// Remove if present. Always legal; removing an absent id is a no-op.
    pub fn remove(&mut self, id: TargetId) -> bool {
        let before = self.stops.len();
        self.stops.retain(|s| s.id != id);
        self.stops.len() != before
    }

    pub fn clear(&mut self) {
        self.stops.clear();
    }

    /// Drop members that are no longer in the stop map or no longer
    /// eligible, returning the removed ids. Called when the visible set or a
    /// member's status changes under the tour.
    pub fn retain_eligible(&mut self, stops: &HashMap<TargetId, Stop>) -> Vec<TargetId> {
        let mut removed = Vec::new();
        self.stops.retain(|s| {
            let keep = stops.get(&s.id).map_or(false, |stop| stop.eligible);
            if !keep {
                removed.push(s.id);
            }
            keep
        });
        removed
    }

    /// Replace the whole sequence with an externally suggested ordering:
    /// filter to known eligible ids, dedupe keeping first occurrence,
    /// truncate to capacity. An empty filtered result is an error, never a
    /// silent clear.
    pub fn replace_from_suggestion(
        &mut self,
        ordered: &[TargetId],
        stops: &HashMap<TargetId, Stop>,
    ) -> Result<usize, TourError> {
        let mut seen = HashSet::new();
        let mut next = Vec::new();
        for &id in ordered {
            if next.len() >= self.capacity {
                break;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(stop) = stops.get(&id) {
                if stop.eligible {
                    next.push(TourStop {
                        id,
                        point: stop.point,
                    });
                }
            }
        }
        if next.is_empty() {
            return Err(TourError::NoViableSuggestion);
        }
        self.stops = next;
        Ok(self.stops.len())
    }
}
