use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::flight::Flight;
use super::team::TeamId;

/// Won/played tally for one flight position across a season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightTally {
    pub won: u32,
    pub played: u32,
}

/// Season aggregates for one team within one classification.
///
/// Built once by the aggregation pass and read-only afterward. The rating
/// passes never mutate these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeasonStats {
    pub team: TeamId,
    pub classification: String,
    pub league: String,
    /// Sum of flight weights for flights won.
    pub weighted_wins: f64,
    /// Sum of flight weights for flights actually contested.
    pub weighted_contested: f64,
    /// Unique opponents faced in dual matches.
    pub opponents: FxHashSet<TeamId>,
    /// Individual flight wins/losses on strict score comparison.
    pub flight_wins: u32,
    pub flight_losses: u32,
    /// Per-flight breakdown, indexed by `Flight::index`.
    pub by_flight: [FlightTally; Flight::COUNT],
    /// Dual match record (whole meets won/lost).
    pub dual_wins: u32,
    pub dual_losses: u32,
    /// Sum of per-meet depth ratios (weight won / weight contested in the
    /// meet) and the number of meets contributing, for the depth score.
    pub depth_ratio_sum: f64,
    pub duals_played: u32,
}

impl TeamSeasonStats {
    pub fn new(team: TeamId, classification: &str, league: &str) -> Self {
        Self {
            team,
            classification: classification.to_string(),
            league: league.to_string(),
            weighted_wins: 0.0,
            weighted_contested: 0.0,
            opponents: FxHashSet::default(),
            flight_wins: 0,
            flight_losses: 0,
            by_flight: [FlightTally::default(); Flight::COUNT],
            dual_wins: 0,
            dual_losses: 0,
            depth_ratio_sum: 0.0,
            duals_played: 0,
        }
    }

    /// Record one recognized flight result from this team's perspective.
    pub fn record_flight(&mut self, flight: Flight, won: Option<bool>) {
        let weight = flight.weight();
        self.weighted_contested += weight;
        let tally = &mut self.by_flight[flight.index()];
        tally.played += 1;
        match won {
            Some(true) => {
                self.weighted_wins += weight;
                self.flight_wins += 1;
                tally.won += 1;
            }
            Some(false) => {
                self.flight_losses += 1;
            }
            // Tied flight score: contested weight counts, neither tally moves.
            None => {}
        }
    }

    /// Average proportion of contested flight weight won per meet, in [0,1].
    pub fn mean_depth_ratio(&self) -> f64 {
        if self.duals_played == 0 {
            0.0
        } else {
            self.depth_ratio_sum / self.duals_played as f64
        }
    }

    pub fn record(&self) -> String {
        format!("{}-{}", self.dual_wins, self.dual_losses)
    }
}
