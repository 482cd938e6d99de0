//! Boundary records for the prospecting core.
//!
//! The core does not own a wire protocol; it consumes and produces the plain
//! structured records defined here. The collaborator layer (HTTP endpoints,
//! persistence wiring, map rendering) is responsible for moving these records
//! around; this crate only defines their shape and a couple of encode/decode
//! helpers for transport and client-local storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Per-agency status tag for a target, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusTag {
    #[default]
    NotStarted,
    Done,
    Ignored,
    Deferred,
}

impl std::fmt::Display for StatusTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusTag {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusTag::NotStarted => "not_started",
            StatusTag::Done => "done",
            StatusTag::Ignored => "ignored",
            StatusTag::Deferred => "deferred",
        }
    }
}

/// A geocoded prospecting opportunity as supplied by the ingestion pipeline.
///
/// Status fields reflect the viewing agency's overlay, not anything global to
/// the target itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub id: u64,
    pub address: String,
    /// Free-text address qualifier (floor, staircase, door) exactly as ingested.
    #[serde(default)]
    pub complement_raw: Option<String>,
    /// Normalized form of `complement_raw`, used for grouping and note lookup.
    #[serde(default)]
    pub complement: Option<String>,
    #[serde(default)]
    pub surface_m2: Option<f64>,
    #[serde(default)]
    pub diagnostic_date: Option<NaiveDate>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub status: StatusTag,
    #[serde(default)]
    pub next_action_at: Option<DateTime<Utc>>,
}

/// Polygon or multipolygon geometry in the standard geographic interchange
/// shape: nested coordinate rings, outer ring first then holes, coordinates
/// as `[lng, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryRecord {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

/// A named catchment boundary. Zones are linked to agencies many-to-many;
/// the link itself travels as plain `(agency_id, zone_id)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub id: u64,
    pub name: String,
    pub geometry: GeometryRecord,
}

/// An agent's micro-territory geometry, saved whole-for-whole: committing a
/// new record replaces the previous one for that agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryRecord {
    pub agent_id: u64,
    pub geometry: GeometryRecord,
}

/// Status transition command issued by an agent against one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCommand {
    pub status: StatusTag,
    #[serde(default)]
    pub next_action_at: Option<DateTime<Utc>>,
}

/// GeoJSON-shaped polyline for map rendering of a suggested route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LineString")]
pub struct LineStringRecord {
    pub coordinates: Vec<[f64; 2]>,
}

/// Ordered route suggestion, either from the external heuristic service or
/// from the local fallback generator. The ranking is opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedRoute {
    pub target_ids_ordered: Vec<u64>,
    #[serde(default)]
    pub polyline: Option<LineStringRecord>,
}

/// Composite key under which a session route is persisted client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub agent_id: u64,
    pub zone_id: u64,
}

impl SessionKey {
    pub fn new(agent_id: u64, zone_id: u64) -> Self {
        Self { agent_id, zone_id }
    }

    /// Stable string form used as the storage key.
    pub fn storage_key(&self) -> String {
        format!("route:{}:{}", self.agent_id, self.zone_id)
    }
}

/// The persisted value for a session route: the ordered id list, nothing more.
/// Staleness is resolved at restore time, not at save time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionRouteRecord {
    pub target_ids: Vec<u64>,
}

pub fn encode_route(record: &SessionRouteRecord) -> bincode::Result<Vec<u8>> {
    bincode::serialize(record)
}

pub fn decode_route(data: &[u8]) -> bincode::Result<SessionRouteRecord> {
    bincode::deserialize(data)
}

pub fn encode_route_json(record: &SessionRouteRecord) -> serde_json::Result<String> {
    serde_json::to_string(record)
}

pub fn decode_route_json(data: &str) -> serde_json::Result<SessionRouteRecord> {
    serde_json::from_str(data)
}

pub fn encode_suggestion_json(route: &SuggestedRoute) -> serde_json::Result<String> {
    serde_json::to_string(route)
}

pub fn decode_suggestion_json(data: &str) -> serde_json::Result<SuggestedRoute> {
    serde_json::from_str(data)
}
