//! Domain entities behind the boundary records.
//!
//! Conversion from `prospect_schema` records happens here, at ingestion, so
//! the resolver and sequencer always work with validated points and
//! geometries.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, GeometryError, Point};
use prospect_schema::{TargetRecord, ZoneRecord};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a geocoded prospecting target.
    TargetId
);
id_type!(
    /// Identifier of a catchment zone.
    ZoneId
);
id_type!(
    /// Identifier of a business unit.
    AgencyId
);
id_type!(
    /// Identifier of a field agent.
    AgentId
);

/// How an agency exposes its zone targets to its agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectingMode {
    /// Agents only see targets inside their own micro-territory.
    Segmented,
    /// Agents see every target inside the agency's zones.
    Open,
}

#[derive(Debug, Clone)]
pub struct Agency {
    pub id: AgencyId,
    pub mode: ProspectingMode,
}

/// A field agent. The micro-territory is exactly zero-or-one by construction;
/// saving a new one replaces the whole geometry.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub agency: AgencyId,
    pub territory: Option<Geometry>,
    pub min_surface_m2: Option<f64>,
    pub max_surface_m2: Option<f64>,
}

impl Agent {
    pub fn new(id: AgentId, agency: AgencyId) -> Self {
        Self {
            id,
            agency,
            territory: None,
            min_surface_m2: None,
            max_surface_m2: None,
        }
    }

    /// Commit a new micro-territory, replacing any previous one whole.
    pub fn assign_territory(&mut self, geometry: Geometry) -> Result<(), GeometryError> {
        geometry.validate()?;
        self.territory = Some(geometry);
        Ok(())
    }

    pub fn clear_territory(&mut self) {
        self.territory = None;
    }

    /// Surface-band segmentation carried per agent. A target with no known
    /// surface only passes on a side that has no bound set.
    pub fn surface_band_accepts(&self, surface_m2: Option<f64>) -> bool {
        let min_ok = match self.min_surface_m2 {
            Some(min) => surface_m2.map_or(false, |s| s >= min),
            None => true,
        };
        let max_ok = match self.max_surface_m2 {
            Some(max) => surface_m2.map_or(false, |s| s <= max),
            None => true,
        };
        min_ok && max_ok
    }
}

/// An immutable geocoded opportunity. Targets are read-only inputs here;
/// per-agency progress lives in the status ledger, never on the target.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    pub address: String,
    pub complement_raw: Option<String>,
    pub complement: Option<String>,
    pub surface_m2: Option<f64>,
    pub diagnostic_date: Option<NaiveDate>,
    pub point: Point,
}

impl Target {
    pub fn from_record(record: &TargetRecord) -> Result<Self, GeometryError> {
        let point = Point::new(record.latitude, record.longitude);
        if !point.is_finite() {
            return Err(GeometryError::NonFiniteCoordinate {
                lat: point.lat,
                lng: point.lng,
            });
        }
        let complement = record.complement.clone().or_else(|| {
            record
                .complement_raw
                .as_deref()
                .map(normalize_complement)
                .filter(|c| !c.is_empty())
        });
        Ok(Self {
            id: TargetId(record.id),
            address: record.address.clone(),
            complement_raw: record.complement_raw.clone(),
            complement,
            surface_m2: record.surface_m2,
            diagnostic_date: record.diagnostic_date,
            point,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub geometry: Geometry,
}

impl Zone {
    pub fn from_record(record: &ZoneRecord) -> Result<Self, GeometryError> {
        Ok(Self {
            id: ZoneId(record.id),
            name: record.name.clone(),
            geometry: Geometry::try_from_record(&record.geometry)?,
        })
    }
}

/// Normalize an address qualifier: lowercase, with runs of anything
/// non-alphanumeric collapsed to a single space.
pub fn normalize_complement(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use prospect_schema::StatusTag;

    fn record(id: u64, lat: f64, lng: f64) -> TargetRecord {
        TargetRecord {
            id,
            address: "12 rue des Lilas".to_string(),
            complement_raw: None,
            complement: None,
            surface_m2: Some(62.0),
            diagnostic_date: None,
            latitude: lat,
            longitude: lng,
            status: StatusTag::NotStarted,
            next_action_at: None,
        }
    }

    #[test]
    fn target_requires_finite_coordinates() {
        assert!(Target::from_record(&record(1, 48.85, 2.35)).is_ok());
        assert!(matches!(
            Target::from_record(&record(2, f64::NAN, 2.35)),
            Err(GeometryError::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn complement_is_normalized_from_raw() {
        let mut raw = record(1, 48.85, 2.35);
        raw.complement_raw = Some("  Bât. B -- Étage 3 ".to_string());
        let target = Target::from_record(&raw).unwrap();
        assert_eq!(target.complement.as_deref(), Some("bât b étage 3"));
    }

    #[test]
    fn normalize_collapses_punctuation_runs() {
        assert_eq!(normalize_complement("APPT 12 / ESC. A"), "appt 12 esc a");
        assert_eq!(normalize_complement("   "), "");
    }

    #[test]
    fn surface_band_excludes_unknown_surface_when_bounded() {
        let mut agent = Agent::new(AgentId(1), AgencyId(1));
        assert!(agent.surface_band_accepts(None));

        agent.min_surface_m2 = Some(40.0);
        assert!(!agent.surface_band_accepts(None));
        assert!(!agent.surface_band_accepts(Some(30.0)));
        assert!(agent.surface_band_accepts(Some(40.0)));

        agent.max_surface_m2 = Some(100.0);
        assert!(agent.surface_band_accepts(Some(80.0)));
        assert!(!agent.surface_band_accepts(Some(120.0)));
    }

    #[test]
    fn territory_replacement_is_whole_geometry() {
        use prospect_schema::GeometryRecord;

        let mut agent = Agent::new(AgentId(1), AgencyId(1));
        let first = Geometry::try_from_record(&GeometryRecord::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
        })
        .unwrap();
        let second = Geometry::try_from_record(&GeometryRecord::Polygon {
            coordinates: vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0]]],
        })
        .unwrap();

        agent.assign_territory(first).unwrap();
        agent.assign_territory(second.clone()).unwrap();
        assert_eq!(agent.territory, Some(second));
    }
}
