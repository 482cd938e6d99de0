//! Visibility resolution: which targets an agent can currently see.
//!
//! The resolver is a pure function of its inputs. It distinguishes "this
//! agent has no micro-territory" from "everything is filtered out", because
//! the two render different empty states downstream.

use rayon::prelude::*;

use crate::config::ProspectConfig;
use crate::geometry::GeometryError;
use crate::model::{Agency, Agent, ProspectingMode, Target, TargetId, Zone};

/// Resolver outcome. `NoTerritory` is a valid result, not an error, and must
/// never be conflated with an empty `Visible` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Agency mode is segmented and the agent has no micro-territory.
    NoTerritory,
    /// The eligible target ids, in input order.
    Visible(Vec<TargetId>),
}

impl Visibility {
    pub fn ids(&self) -> &[TargetId] {
        match self {
            Visibility::NoTerritory => &[],
            Visibility::Visible(ids) => ids,
        }
    }

    pub fn is_no_territory(&self) -> bool {
        matches!(self, Visibility::NoTerritory)
    }
}

/// Resolve the agent's currently visible target set.
///
/// Candidates are targets inside any of the agency's zones (union semantics)
/// that pass the agent's surface band. Open mode stops there; segmented mode
/// additionally requires containment in the agent's territory. An agency with
/// zero linked zones yields an empty visible set, not an error.
pub fn visible_targets(
    agent: &Agent,
    agency: &Agency,
    zones: &[Zone],
    targets: &[Target],
    config: &ProspectConfig,
) -> Result<Visibility, GeometryError> {
    let territory = match (agency.mode, agent.territory.as_ref()) {
        (ProspectingMode::Segmented, None) => return Ok(Visibility::NoTerritory),
        (ProspectingMode::Segmented, Some(territory)) => Some(territory),
        (ProspectingMode::Open, _) => None,
    };

    let eligible = |target: &Target| -> Result<bool, GeometryError> {
        if !agent.surface_band_accepts(target.surface_m2) {
            return Ok(false);
        }
        let mut in_zone = false;
        for zone in zones {
            if zone.geometry.contains(target.point)? {
                in_zone = true;
                break;
            }
        }
        if !in_zone {
            return Ok(false);
        }
        match territory {
            Some(territory) => territory.contains(target.point),
            None => Ok(true),
        }
    };

    // Containment tests are independent per target; large pools run the pass
    // in parallel with identical results and ordering.
    let flags: Vec<bool> = if targets.len() >= config.parallel_min_targets {
        targets
            .par_iter()
            .map(|t| eligible(t))
            .collect::<Result<_, _>>()?
    } else {
        targets
            .iter()
            .map(|t| eligible(t))
            .collect::<Result<_, _>>()?
    };

    let ids = targets
        .iter()
        .zip(flags)
        .filter_map(|(t, keep)| keep.then_some(t.id))
        .collect();
    Ok(Visibility::Visible(ids))
}
