//! Session wiring: one agent, one zone, one tour.
//!
//! The route store is client-local and durable; the in-memory tour must
//! never overwrite a previously saved route before the one-time hydration
//! pass has run. Store failures of any kind degrade to "nothing stored".

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::ProspectConfig;
use crate::model::{AgencyId, Target, TargetId};
use crate::status::{StatusLedger, StatusError, TransitionOutcome};
use crate::tour::{InsertOutcome, Stop, Tour, TourError};
use prospect_schema::{
    decode_route_json, encode_route_json, SessionKey, SessionRouteRecord, StatusCommand,
    SuggestedRoute,
};

/// Durable client-local storage for session routes. Both operations are
/// infallible at this boundary: quota, corruption and parse failures are the
/// store's problem and surface as "nothing stored".
pub trait RouteStore {
    fn load(&self, key: &SessionKey) -> Option<SessionRouteRecord>;
    fn save(&mut self, key: &SessionKey, record: &SessionRouteRecord);
}

/// In-memory store, for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    entries: HashMap<String, SessionRouteRecord>,
}

impl RouteStore for MemoryRouteStore {
    fn load(&self, key: &SessionKey) -> Option<SessionRouteRecord> {
        self.entries.get(&key.storage_key()).cloned()
    }

    fn save(&mut self, key: &SessionKey, record: &SessionRouteRecord) {
        self.entries.insert(key.storage_key(), record.clone());
    }
}

/// One JSON file per session key under a base directory.
#[derive(Debug)]
pub struct JsonFileRouteStore {
    base_dir: PathBuf,
}

impl JsonFileRouteStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", key.storage_key().replace(':', "_")))
    }
}

impl RouteStore for JsonFileRouteStore {
    fn load(&self, key: &SessionKey) -> Option<SessionRouteRecord> {
        let path = self.path_for(key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    target: "prospect::session",
                    path = %path.display(),
                    error = %err,
                    "route_store.read_failed"
                );
                return None;
            }
        };
        match decode_route_json(&data) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(
                    target: "prospect::session",
                    path = %path.display(),
                    error = %err,
                    "route_store.corrupt_record"
                );
                None
            }
        }
    }

    fn save(&mut self, key: &SessionKey, record: &SessionRouteRecord) {
        if let Err(err) = fs::create_dir_all(&self.base_dir) {
            tracing::warn!(
                target: "prospect::session",
                path = %self.base_dir.display(),
                error = %err,
                "route_store.mkdir_failed"
            );
            return;
        }
        let path = self.path_for(key);
        match encode_route_json(record) {
            Ok(json) => {
                if let Err(err) = fs::write(&path, json) {
                    tracing::warn!(
                        target: "prospect::session",
                        path = %path.display(),
                        error = %err,
                        "route_store.write_failed"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(
                    target: "prospect::session",
                    error = %err,
                    "route_store.encode_failed"
                );
            }
        }
    }
}

/// What toggling auto-routing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoRouteOutcome {
    /// A tour already existed and was cleared instead.
    Cleared,
    /// The suggestion replaced the tour with this many stops.
    Replaced(usize),
}

/// Build the sequencer's stop map: visible targets, flagged tour-eligible
/// only when their status for this agency is still `not_started`.
pub fn eligible_stops(
    targets: &[Target],
    visible: &[TargetId],
    ledger: &StatusLedger,
    agency: AgencyId,
) -> HashMap<TargetId, Stop> {
    let by_id: HashMap<TargetId, &Target> = targets.iter().map(|t| (t.id, t)).collect();
    visible
        .iter()
        .filter_map(|id| {
            let target = by_id.get(id)?;
            let eligible = ledger
                .status(agency, *id)
                .map_or(false, |status| status.is_tour_eligible());
            Some((
                *id,
                Stop {
                    point: target.point,
                    eligible,
                },
            ))
        })
        .collect()
}

/// The interactive session driving one tour.
#[derive(Debug)]
pub struct FieldSession<S: RouteStore> {
    key: SessionKey,
    agency: AgencyId,
    ledger: StatusLedger,
    tour: Tour,
    store: S,
    hydrated: bool,
}

impl<S: RouteStore> FieldSession<S> {
    pub fn new(key: SessionKey, agency: AgencyId, ledger: StatusLedger, store: S,
               config: &ProspectConfig) -> Self {
        Self {
            key,
            agency,
            ledger,
            tour: Tour::with_capacity(config.tour_capacity),
            store,
            hydrated: false,
        }
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut StatusLedger {
        &mut self.ledger
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// One-time restore pass. Stored ids are filtered through the same
    /// eligibility rule as a suggestion; whatever went stale since the last
    /// session silently drops out. Until this has run, every persist call is
    /// a no-op, so a slow initial load can never clobber a saved route.
    pub fn hydrate(&mut self, stops: &HashMap<TargetId, Stop>) {
        if self.hydrated {
            return;
        }
        if let Some(record) = self.store.load(&self.key) {
            let ids: Vec<TargetId> = record.target_ids.iter().map(|&id| TargetId(id)).collect();
            match self.tour.replace_from_suggestion(&ids, stops) {
                Ok(restored) => {
                    tracing::debug!(
                        target: "prospect::session",
                        key = %self.key.storage_key(),
                        restored,
                        "session route restored"
                    );
                }
                Err(TourError::NoViableSuggestion) => {
                    tracing::debug!(
                        target: "prospect::session",
                        key = %self.key.storage_key(),
                        "stored route fully stale, starting empty"
                    );
                }
            }
        }
        self.hydrated = true;
    }

    fn persist(&mut self) {
        if !self.hydrated {
            return;
        }
        let record = SessionRouteRecord {
            target_ids: self.tour.ids().iter().map(|id| id.0).collect(),
        };
        self.store.save(&self.key, &record);
    }

    /// Apply a status command; when the transition ends tour eligibility the
    /// member is evicted and the route persisted in the same operation.
    pub fn apply_status(
        &mut self,
        target: TargetId,
        command: &StatusCommand,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StatusError> {
        let outcome = self.ledger.transition(self.agency, target, command, now)?;
        if outcome.evict && self.tour.remove(target) {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn add_stop(&mut self, id: TargetId, stops: &HashMap<TargetId, Stop>) -> InsertOutcome {
        let outcome = self.tour.insert(id, stops);
        if matches!(outcome, InsertOutcome::Inserted { .. }) {
            self.persist();
        }
        outcome
    }

    pub fn remove_stop(&mut self, id: TargetId) -> bool {
        let removed = self.tour.remove(id);
        if removed {
            self.persist();
        }
        removed
    }

    /// Reset-or-generate: a non-empty tour is cleared, an empty one is
    /// replaced from the suggestion. This policy belongs here at the
    /// workflow boundary, not in the sequencer.
    pub fn toggle_auto_route(
        &mut self,
        suggestion: &SuggestedRoute,
        stops: &HashMap<TargetId, Stop>,
    ) -> Result<AutoRouteOutcome, TourError> {
        if !self.tour.is_empty() {
            self.tour.clear();
            self.persist();
            return Ok(AutoRouteOutcome::Cleared);
        }
        let ids: Vec<TargetId> = suggestion
            .target_ids_ordered
            .iter()
            .map(|&id| TargetId(id))
            .collect();
        let replaced = self.tour.replace_from_suggestion(&ids, stops)?;
        self.persist();
        Ok(AutoRouteOutcome::Replaced(replaced))
    }

    /// Re-check every member against a fresh stop map, evicting what the
    /// latest visibility or status data no longer supports.
    pub fn refresh_eligibility(&mut self, stops: &HashMap<TargetId, Stop>) -> Vec<TargetId> {
        let removed = self.tour.retain_eligible(stops);
        if !removed.is_empty() {
            self.persist();
        }
        removed
    }
}
