#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use prospect_core::{
    Agency, AgencyId, Agent, AgentId, Geometry, ProspectingMode, Target, Zone,
};
use prospect_schema::{TargetRecord, TerritoryRecord, ZoneRecord};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Result<String> {
    let path = fixture_path(name);
    fs::read_to_string(&path).with_context(|| format!("missing fixture {}", path.display()))
}

pub fn load_zone_records() -> Result<Vec<ZoneRecord>> {
    Ok(serde_json::from_str(&read_fixture("zones.json")?)?)
}

pub fn load_zones() -> Result<Vec<Zone>> {
    load_zone_records()?
        .iter()
        .map(|record| Zone::from_record(record).context("invalid zone fixture"))
        .collect()
}

pub fn load_target_records() -> Result<Vec<TargetRecord>> {
    Ok(serde_json::from_str(&read_fixture("targets.json")?)?)
}

pub fn load_targets() -> Result<Vec<Target>> {
    load_target_records()?
        .iter()
        .map(|record| Target::from_record(record).context("invalid target fixture"))
        .collect()
}

pub fn load_territory() -> Result<Geometry> {
    let record: TerritoryRecord = serde_json::from_str(&read_fixture("territory.json")?)?;
    Ok(Geometry::try_from_record(&record.geometry)?)
}

pub fn agency(mode: ProspectingMode) -> Agency {
    Agency {
        id: AgencyId(1),
        mode,
    }
}

pub fn bare_agent() -> Agent {
    Agent::new(AgentId(1), AgencyId(1))
}

pub fn agent_with_territory() -> Result<Agent> {
    let mut agent = bare_agent();
    agent.assign_territory(load_territory()?)?;
    Ok(agent)
}

/// Fixed clock for every scenario; fixtures are written against it.
pub fn test_now() -> DateTime<Utc> {
    "2026-03-01T09:00:00Z".parse().expect("valid test clock")
}
