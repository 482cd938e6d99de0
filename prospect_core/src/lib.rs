//! Core engine for geographically-scoped prospecting.
//!
//! Resolves which targets an agent can currently see (nested polygon
//! containment gated by the agency's prospecting mode), tracks the
//! per-agency status lifecycle of each target, and maintains the bounded
//! daily visiting sequence built by cheapest insertion. The surrounding
//! CRUD plumbing (endpoints, rendering, database wiring) lives elsewhere;
//! this crate only consumes and produces `prospect_schema` records.

pub mod config;
pub mod geometry;
pub mod model;
pub mod notes;
pub mod session;
pub mod status;
pub mod suggest;
pub mod tour;
pub mod visibility;

pub use config::{
    load_prospect_config_from_env, ProspectConfig, ProspectConfigError, ProspectConfigMetadata,
};
pub use geometry::{Geometry, GeometryError, Point};
pub use model::{
    normalize_complement, Agency, AgencyId, Agent, AgentId, ProspectingMode, Target, TargetId,
    Zone, ZoneId,
};
pub use notes::{Note, NoteBook, NoteDraft, NoteError, NoteId};
pub use session::{
    eligible_stops, AutoRouteOutcome, FieldSession, JsonFileRouteStore, MemoryRouteStore,
    RouteStore,
};
pub use status::{
    AgencyTarget, StatusError, StatusEvent, StatusLedger, TargetStatus, TransitionOutcome,
};
pub use suggest::suggest_route;
pub use tour::{InsertOutcome, Stop, Tour, TourError, TOUR_CAPACITY};
pub use visibility::{visible_targets, Visibility};
