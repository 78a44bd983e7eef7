//! The rating-and-bracket pipeline.
//!
//! Five stages in strict dependency order over an immutable per-season,
//! per-classification snapshot: aggregation, rating, tiebreak resolution,
//! bracket construction, geographic reassignment. Each stage fully
//! consumes its predecessor's complete output; nothing is computed on
//! demand, and independent invocations share no state.

pub mod aggregate;
pub mod bracket;
pub mod config;
pub mod diagnostics;
pub mod rating;
pub mod regional;
pub mod tiebreak;

pub use aggregate::{Aggregates, HeadToHead};
pub use config::{
    BracketConfig, DrawnDualRule, EngineConfig, RatingConfig, ScheduleBlend, TiebreakConfig,
};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use regional::{haversine_miles, CoordinateLookup, GeoPoint};

use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{
    Bracket, DualMatch, Gender, Ranking, TeamDirectory, TeamId, TeamSeasonStats,
};

/// Immutable input for one invocation: one season, one classification,
/// one gender, already parsed and filtered upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonSnapshot {
    pub season: u16,
    pub gender: Gender,
    pub classification: String,
    pub duals: Vec<DualMatch>,
}

/// Everything one invocation produces. Discarded after output; no state
/// survives into the next run.
#[derive(Debug, Clone)]
pub struct SeasonOutput {
    pub ranking: Ranking,
    pub bracket: Option<Bracket>,
    pub stats: FxHashMap<TeamId, TeamSeasonStats>,
    pub diagnostics: Diagnostics,
}

/// Run the full pipeline. Structural validation happens before
/// aggregation; everything after that accumulates diagnostics instead of
/// failing. `champions` are auto-bid league champions (bracket stage
/// only); `coordinates` enables the regional stage when a bracket is
/// requested and a tier is configured.
pub fn rank_and_seed(
    snapshot: &SeasonSnapshot,
    directory: &TeamDirectory,
    champions: &FxHashSet<TeamId>,
    config: &EngineConfig,
    coordinates: Option<&dyn CoordinateLookup>,
) -> Result<SeasonOutput> {
    config.validate()?;
    let mut diagnostics = Diagnostics::new();

    let aggregates = aggregate::aggregate(&snapshot.duals, directory, &mut diagnostics);
    let rated = rating::rate(&aggregates.stats, &config.rating, &mut diagnostics);
    let ranking = tiebreak::resolve(
        &rated,
        &aggregates.head_to_head,
        directory,
        &config.tiebreak,
        &mut diagnostics,
    );

    let bracket = match &config.bracket {
        Some(bracket_config) => {
            let built =
                bracket::build(&ranking, champions, directory, bracket_config, &mut diagnostics)?;
            match (bracket_config.regional_tier, coordinates) {
                (Some(tier), Some(lookup)) => {
                    Some(regional::optimize(&built, directory, lookup, tier, &mut diagnostics))
                }
                _ => Some(built),
            }
        }
        None => None,
    };

    debug!(
        season = snapshot.season,
        classification = %snapshot.classification,
        teams = ranking.len(),
        "pipeline complete"
    );
    Ok(SeasonOutput { ranking, bracket, stats: aggregates.stats, diagnostics })
}
