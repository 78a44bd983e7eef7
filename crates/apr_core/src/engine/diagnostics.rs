//! Non-fatal anomaly reporting.
//!
//! Every anomaly the pipeline tolerates is recorded here and returned with
//! the result; none of them aborts a stage.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::TeamId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Flight code outside 1..=8; the record contributed nothing.
    UnknownFlight { code: u8, home: TeamId, away: TeamId },
    /// Team appears in match data but not in the directory; dropped.
    MissingTeamMetadata { team: TeamId },
    /// Head-to-head promotion rejected because it would close a cycle
    /// among already-applied tiebreak edges.
    TiebreakCycleRejected { winner: TeamId, loser: TeamId },
    /// Same-league first-round pairing left in place after the swap
    /// attempts ran out.
    UnresolvedLeagueConflict { host_seed: u32, visitor_seed: u32 },
    /// Visitor had no usable coordinates; strict seeding kept.
    VisitorUnassignable { team: TeamId, seed: u32 },
    /// Every remaining host shared the visitor's league, so the league
    /// constraint was relaxed for this assignment.
    LeagueConstraintRelaxed { team: TeamId, seed: u32 },
}

/// Accumulator threaded through the pipeline stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
    /// Opponents excluded from the opponent-average passes because they had
    /// no stats in the snapshot. Counted rather than listed; a filtered
    /// classification run excludes most of the state.
    pub opponents_outside_snapshot: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Diagnostic) {
        debug!(?event, "pipeline diagnostic");
        self.events.push(event);
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn count_of(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}
