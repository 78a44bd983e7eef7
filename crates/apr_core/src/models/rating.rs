use serde::{Deserialize, Serialize};

use super::team::TeamId;

/// Derived rating fields for one team. Recomputed from scratch each
/// invocation; every percentage-like field lies in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    /// Weighted win percentage: weighted flights won / weighted contested.
    pub wwp: f64,
    /// Opponent win percentage: mean wwp of opponents in the snapshot.
    pub owp: f64,
    /// Opponents' opponent win percentage; only computed for the
    /// three-term schedule blend.
    pub oowp: Option<f64>,
    /// Blended schedule-strength score (the APR).
    pub schedule_score: f64,
    /// Mean share of contested flight weight won per meet, in [0,1].
    /// Used for blending into the power index.
    pub depth_norm: f64,
    /// Single combined index ranking is sorted by.
    pub power_index: f64,
}

impl Rating {
    /// Display form of the depth score on the 0-10 scale.
    pub fn depth_raw(&self) -> f64 {
        self.depth_norm * 10.0
    }
}

/// One row of a ranking: contiguous rank, team, rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTeam {
    pub rank: u32,
    pub team: TeamId,
    pub rating: Rating,
}

/// Ordered ranking with contiguous ranks 1..N for the team subset in scope.
/// Each stage produces a fresh value; nothing mutates a ranking in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ranking {
    teams: Vec<RankedTeam>,
}

impl Ranking {
    /// Build from an already-ordered list, assigning ranks 1..N.
    pub fn from_ordered(ordered: Vec<(TeamId, Rating)>) -> Self {
        let teams = ordered
            .into_iter()
            .enumerate()
            .map(|(i, (team, rating))| RankedTeam { rank: i as u32 + 1, team, rating })
            .collect();
        Self { teams }
    }

    pub fn teams(&self) -> &[RankedTeam] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn position_of(&self, team: TeamId) -> Option<usize> {
        self.teams.iter().position(|t| t.team == team)
    }

    /// True when ranks are exactly 1..N in order.
    pub fn ranks_contiguous(&self) -> bool {
        self.teams.iter().enumerate().all(|(i, t)| t.rank == i as u32 + 1)
    }
}
