//! JSON front door for embedders.
//!
//! One request in, one response out. The request carries the whole
//! snapshot (directory rows, dual matches, optional config and
//! coordinates); the response carries the ranked table, the bracket when
//! one was requested, and every diagnostic the run produced.

use serde::{Deserialize, Serialize};

use fxhash::{FxHashMap, FxHashSet};

use crate::engine::{
    rank_and_seed, BracketConfig, Diagnostic, DrawnDualRule, EngineConfig, GeoPoint,
    ScheduleBlend, SeasonSnapshot,
};
use crate::error::{EngineError, Result};
use crate::models::{
    Bracket, DualMatch, Gender, RankedTeam, TeamDirectory, TeamEntry, TeamId,
    TeamSeasonStats,
};
use crate::SCHEMA_VERSION;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub schema_version: u8,
    pub season: u16,
    pub gender: Gender,
    pub classification: String,
    pub teams: Vec<TeamRow>,
    pub duals: Vec<DualMatch>,
    /// League champions holding automatic playoff bids.
    #[serde(default)]
    pub champions: Vec<u32>,
    #[serde(default)]
    pub config: Option<ConfigRequest>,
    /// Team id to (lat, lon), decimal degrees. Enables the regional stage.
    #[serde(default)]
    pub coordinates: Option<FxHashMap<u32, (f64, f64)>>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRow {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub city: String,
    pub classification: String,
    pub league: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigRequest {
    /// "classic" (35/65 two-term) or "rpi" (25/50/25 three-term).
    #[serde(default)]
    pub schedule_blend: Option<String>,
    #[serde(default)]
    pub depth_weight: Option<f64>,
    #[serde(default)]
    pub index_threshold: Option<f64>,
    /// "defer" or "game_differential".
    #[serde(default)]
    pub drawn_dual_rule: Option<String>,
    /// 8, 12, or 16. Absent means ranking only.
    #[serde(default)]
    pub bracket_size: Option<u32>,
    #[serde(default)]
    pub regional_tier: Option<(u32, u32)>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub schema_version: u8,
    pub season: u16,
    pub gender: Gender,
    pub classification: String,
    pub rankings: Vec<RankedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<Bracket>,
    pub diagnostics: Vec<Diagnostic>,
    pub opponents_outside_snapshot: u32,
}

/// One row of the published table, mirroring what a rankings page shows.
#[derive(Debug, Serialize)]
pub struct RankedRow {
    pub rank: u32,
    pub team: u32,
    pub name: String,
    pub league: String,
    pub record: String,
    pub wwp: f64,
    pub owp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oowp: Option<f64>,
    pub schedule_score: f64,
    pub depth: f64,
    pub power_index: f64,
}

fn parse_blend(name: &str) -> Result<ScheduleBlend> {
    match name {
        "classic" => Ok(ScheduleBlend::classic()),
        "rpi" => Ok(ScheduleBlend::rpi()),
        other => Err(EngineError::InvalidConfig(format!(
            "unknown schedule blend {other:?}, expected \"classic\" or \"rpi\""
        ))),
    }
}

fn parse_drawn_dual_rule(name: &str) -> Result<DrawnDualRule> {
    match name {
        "defer" => Ok(DrawnDualRule::Defer),
        "game_differential" => Ok(DrawnDualRule::GameDifferential),
        other => Err(EngineError::InvalidConfig(format!(
            "unknown drawn dual rule {other:?}, expected \"defer\" or \"game_differential\""
        ))),
    }
}

fn parse_bracket_size(field: u32) -> Result<crate::models::BracketSize> {
    use crate::models::BracketSize;
    match field {
        8 => Ok(BracketSize::Eight),
        12 => Ok(BracketSize::Twelve),
        16 => Ok(BracketSize::Sixteen),
        other => Err(EngineError::InvalidConfig(format!(
            "unsupported bracket size {other}, expected 8, 12, or 16"
        ))),
    }
}

fn build_config(request: Option<&ConfigRequest>) -> Result<EngineConfig> {
    let mut config = EngineConfig::default();
    let Some(req) = request else { return Ok(config) };

    if let Some(name) = &req.schedule_blend {
        config.rating.schedule_blend = parse_blend(name)?;
    }
    if let Some(weight) = req.depth_weight {
        config.rating.depth_weight = weight;
    }
    if let Some(threshold) = req.index_threshold {
        config.tiebreak.index_threshold = threshold;
    }
    if let Some(name) = &req.drawn_dual_rule {
        config.tiebreak.drawn_dual_rule = parse_drawn_dual_rule(name)?;
    }
    if let Some(field) = req.bracket_size {
        let mut bracket = BracketConfig::for_size(parse_bracket_size(field)?);
        if let Some(tier) = req.regional_tier {
            bracket.regional_tier = Some(tier);
        }
        config.bracket = Some(bracket);
    }
    Ok(config)
}

fn ranked_row(
    entry: &RankedTeam,
    directory: &TeamDirectory,
    stats: &FxHashMap<TeamId, TeamSeasonStats>,
) -> RankedRow {
    let (name, league) = match directory.get(entry.team) {
        Some(meta) => (meta.name.clone(), meta.league.clone()),
        None => (entry.team.to_string(), String::new()),
    };
    let record = stats
        .get(&entry.team)
        .map(TeamSeasonStats::record)
        .unwrap_or_else(|| "0-0".to_string());
    RankedRow {
        rank: entry.rank,
        team: entry.team.0,
        name,
        league,
        record,
        wwp: entry.rating.wwp,
        owp: entry.rating.owp,
        oowp: entry.rating.oowp,
        schedule_score: entry.rating.schedule_score,
        depth: entry.rating.depth_raw(),
        power_index: entry.rating.power_index,
    }
}

/// Rank a season from a JSON request, returning the response as JSON.
pub fn rank_season_json(request_json: &str) -> Result<String> {
    let request: RankRequest = serde_json::from_str(request_json)?;
    if request.schema_version != SCHEMA_VERSION {
        return Err(EngineError::SchemaVersion {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let directory = TeamDirectory::new(
        request
            .teams
            .iter()
            .map(|row| TeamEntry {
                id: TeamId(row.id),
                name: row.name.clone(),
                city: row.city.clone(),
                classification: row.classification.clone(),
                league: row.league.clone(),
            })
            .collect(),
    )?;
    let champions: FxHashSet<TeamId> = request.champions.iter().map(|&id| TeamId(id)).collect();
    let config = build_config(request.config.as_ref())?;

    let coordinates: Option<FxHashMap<TeamId, GeoPoint>> = request.coordinates.map(|table| {
        table
            .into_iter()
            .map(|(id, (lat, lon))| (TeamId(id), GeoPoint { lat, lon }))
            .collect()
    });

    let snapshot = SeasonSnapshot {
        season: request.season,
        gender: request.gender,
        classification: request.classification.clone(),
        duals: request.duals,
    };

    let output = rank_and_seed(
        &snapshot,
        &directory,
        &champions,
        &config,
        coordinates
            .as_ref()
            .map(|table| table as &dyn crate::engine::CoordinateLookup),
    )?;

    let rankings = output
        .ranking
        .teams()
        .iter()
        .map(|entry| ranked_row(entry, &directory, &output.stats))
        .collect();

    let response = RankResponse {
        schema_version: SCHEMA_VERSION,
        season: request.season,
        gender: request.gender,
        classification: request.classification,
        rankings,
        bracket: output.bracket,
        diagnostics: output.diagnostics.events().to_vec(),
        opponents_outside_snapshot: output.diagnostics.opponents_outside_snapshot,
    };
    Ok(serde_json::to_string(&response)?)
}
