use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::team::TeamId;
use crate::models::Flight;

/// Result of a single flight within a dual match.
///
/// Scores are game counts for that flight. The flight code travels as the
/// raw integer so unknown codes can be reported instead of failing to parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchRecord {
    pub flight_code: u8,
    pub home: TeamId,
    pub away: TeamId,
    pub home_score: u16,
    pub away_score: u16,
}

impl MatchRecord {
    pub fn flight(&self) -> Option<Flight> {
        Flight::from_code(self.flight_code)
    }

    /// Strict comparison from the home team's perspective. Equal scores are
    /// neither a win nor a loss.
    pub fn home_outcome(&self) -> Ordering {
        self.home_score.cmp(&self.away_score)
    }
}

/// One team-vs-team meet: the set of flight results contested that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualMatch {
    pub home: TeamId,
    pub away: TeamId,
    pub flights: Vec<MatchRecord>,
}

/// Outcome of a whole dual from one team's perspective, used for
/// head-to-head tiebreaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DualOutcome {
    Won,
    Lost,
    Drawn,
}

impl DualMatch {
    /// Flight wins for (home, away), counting only recognized flights with a
    /// strict score winner.
    pub fn flight_wins(&self) -> (u32, u32) {
        let mut home = 0;
        let mut away = 0;
        for record in &self.flights {
            if record.flight().is_none() {
                continue;
            }
            match record.home_outcome() {
                Ordering::Greater => home += 1,
                Ordering::Less => away += 1,
                Ordering::Equal => {}
            }
        }
        (home, away)
    }

    /// Dual winner by flight wins; equal flight wins is a drawn dual.
    pub fn outcome_for(&self, team: TeamId) -> Option<DualOutcome> {
        let (home_wins, away_wins) = self.flight_wins();
        let from_home = match home_wins.cmp(&away_wins) {
            Ordering::Greater => DualOutcome::Won,
            Ordering::Less => DualOutcome::Lost,
            Ordering::Equal => DualOutcome::Drawn,
        };
        if team == self.home {
            Some(from_home)
        } else if team == self.away {
            Some(match from_home {
                DualOutcome::Won => DualOutcome::Lost,
                DualOutcome::Lost => DualOutcome::Won,
                DualOutcome::Drawn => DualOutcome::Drawn,
            })
        } else {
            None
        }
    }

    /// Total game differential for `team` across recognized flights.
    /// Secondary signal for drawn head-to-head duals.
    pub fn game_differential(&self, team: TeamId) -> i32 {
        let mut diff = 0i32;
        for record in &self.flights {
            if record.flight().is_none() {
                continue;
            }
            diff += record.home_score as i32 - record.away_score as i32;
        }
        if team == self.away {
            -diff
        } else {
            diff
        }
    }

    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if team == self.home {
            Some(self.away)
        } else if team == self.away {
            Some(self.home)
        } else {
            None
        }
    }
}
