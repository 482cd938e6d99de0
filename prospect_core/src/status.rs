//! Per-(agency, target) status lifecycle.
//!
//! Each agency tracks its own progress on a target. The cycle is
//! `not_started → done | ignored | deferred(due)`, with an explicit manual
//! reset back to `not_started`. "Actionable now" is always derived from the
//! stored status and the clock, never cached.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AgencyId, TargetId};
use prospect_schema::{StatusCommand, StatusTag, TargetRecord};

/// Lifecycle status of a target for one agency. The deferral timestamp lives
/// inside the variant, so `deferred ⇔ due present` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    NotStarted,
    Done,
    Ignored,
    Deferred { due_at: DateTime<Utc> },
}

impl TargetStatus {
    /// Rebuild a status from its wire parts, enforcing the timestamp rules:
    /// deferred requires a due date, anything else sheds a stale one.
    pub fn from_parts(
        tag: StatusTag,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<Self, StatusError> {
        match (tag, due_at) {
            (StatusTag::NotStarted, _) => Ok(TargetStatus::NotStarted),
            (StatusTag::Done, _) => Ok(TargetStatus::Done),
            (StatusTag::Ignored, _) => Ok(TargetStatus::Ignored),
            (StatusTag::Deferred, Some(due_at)) => Ok(TargetStatus::Deferred { due_at }),
            (StatusTag::Deferred, None) => Err(StatusError::InvalidTransition {
                from: StatusTag::Deferred,
                to: StatusTag::Deferred,
                reason: "deferred status requires a due timestamp",
            }),
        }
    }

    pub fn tag(&self) -> StatusTag {
        match self {
            TargetStatus::NotStarted => StatusTag::NotStarted,
            TargetStatus::Done => StatusTag::Done,
            TargetStatus::Ignored => StatusTag::Ignored,
            TargetStatus::Deferred { .. } => StatusTag::Deferred,
        }
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TargetStatus::Deferred { due_at } => Some(*due_at),
            _ => None,
        }
    }

    /// Whether the target deserves attention right now. A deferred target
    /// becomes actionable the moment its due date passes, with no further
    /// transition required.
    pub fn is_actionable(&self, now: DateTime<Utc>) -> bool {
        match self {
            TargetStatus::NotStarted => true,
            TargetStatus::Deferred { due_at } => *due_at <= now,
            TargetStatus::Done | TargetStatus::Ignored => false,
        }
    }

    /// Tour eligibility is stricter than actionability: only fresh,
    /// never-touched targets may be routed. A due-deferred target shows up
    /// in lists but not in the tour.
    pub fn is_tour_eligible(&self) -> bool {
        matches!(self, TargetStatus::NotStarted)
    }
}

/// The per-agency status record for one target.
#[derive(Debug, Clone)]
pub struct AgencyTarget {
    pub agency: AgencyId,
    pub target: TargetId,
    pub status: TargetStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("no status record for agency {agency}, target {target}")]
    NotFound { agency: AgencyId, target: TargetId },
    #[error("invalid transition {from} -> {to}: {reason}")]
    InvalidTransition {
        from: StatusTag,
        to: StatusTag,
        reason: &'static str,
    },
}

/// Emitted when a target leaves `not_started`, so the sequencer can evict it
/// in the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    EligibilityLost { agency: AgencyId, target: TargetId },
}

/// What a transition did, handed back to the calling workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub status: TargetStatus,
    /// True when the target just left `not_started` and must be removed from
    /// any tour it belongs to.
    pub evict: bool,
}

/// In-memory status ledger for the agencies a session cares about.
/// Concurrent writers (two tabs on the same record) resolve last-writer-wins
/// at the storage layer; transitions are idempotent set-status commands.
#[derive(Debug, Default)]
pub struct StatusLedger {
    entries: HashMap<(AgencyId, TargetId), AgencyTarget>,
    subscribers: Vec<Sender<StatusEvent>>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, entry: AgencyTarget) {
        self.entries.insert((entry.agency, entry.target), entry);
    }

    /// Seed the ledger from ingested target records for one agency.
    pub fn seed_from_records(
        &mut self,
        agency: AgencyId,
        records: &[TargetRecord],
        now: DateTime<Utc>,
    ) -> Result<(), StatusError> {
        for record in records {
            let status = TargetStatus::from_parts(record.status, record.next_action_at)?;
            self.upsert(AgencyTarget {
                agency,
                target: TargetId(record.id),
                status,
                updated_at: now,
            });
        }
        Ok(())
    }

    pub fn entry(&self, agency: AgencyId, target: TargetId) -> Option<&AgencyTarget> {
        self.entries.get(&(agency, target))
    }

    pub fn status(&self, agency: AgencyId, target: TargetId) -> Option<TargetStatus> {
        self.entry(agency, target).map(|e| e.status)
    }

    /// Targets in this agency that are actionable at `now`, unordered.
    pub fn actionable_now(&self, agency: AgencyId, now: DateTime<Utc>) -> Vec<TargetId> {
        self.entries
            .values()
            .filter(|e| e.agency == agency && e.status.is_actionable(now))
            .map(|e| e.target)
            .collect()
    }

    /// Subscribe to eviction events. Dead receivers are pruned on send.
    pub fn subscribe(&mut self) -> Receiver<StatusEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&mut self, event: StatusEvent) {
        self.subscribers.retain(|s| s.send(event).is_ok());
    }

    /// Apply a status command to one record.
    ///
    /// Terminal states are only reachable from `not_started`; issuing
    /// `not_started` from anywhere is the manual reset; re-issuing the
    /// current tag is an idempotent accept (a repeat `deferred` updates the
    /// due date). A due timestamp on a non-deferred command is dropped, so a
    /// stale one can never survive a transition.
    pub fn transition(
        &mut self,
        agency: AgencyId,
        target: TargetId,
        command: &StatusCommand,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StatusError> {
        let entry = self
            .entries
            .get_mut(&(agency, target))
            .ok_or(StatusError::NotFound { agency, target })?;

        let from = entry.status.tag();
        let to = command.status;

        let legal = from == to
            || from == StatusTag::NotStarted
            || to == StatusTag::NotStarted;
        if !legal {
            return Err(StatusError::InvalidTransition {
                from,
                to,
                reason: "terminal statuses are only reachable from not_started",
            });
        }

        let due_at = match to {
            StatusTag::Deferred => command.next_action_at,
            _ => None,
        };
        let next = TargetStatus::from_parts(to, due_at)?;

        let was_eligible = entry.status.is_tour_eligible();
        entry.status = next;
        entry.updated_at = now;

        let evict = was_eligible && !next.is_tour_eligible();
        if evict {
            tracing::debug!(
                target: "prospect::status",
                %agency,
                target_id = %target,
                status = %next.tag(),
                "target left not_started, evicting from tour"
            );
            self.emit(StatusEvent::EligibilityLost { agency, target });
        }

        Ok(TransitionOutcome {
            status: next,
            evict,
        })
    }
}
