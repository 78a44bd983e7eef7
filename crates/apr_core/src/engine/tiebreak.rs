//! Head-to-head tiebreak resolution.
//!
//! Adjusts the rating-based order for pairs that are effectively tied,
//! without ever introducing a cyclic inconsistency: applied promotions form
//! a directed graph and every new edge is preceded by an explicit
//! reachability check for the reverse path.

use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::aggregate::HeadToHead;
use super::config::{DrawnDualRule, TiebreakConfig};
use super::diagnostics::{Diagnostic, Diagnostics};
use crate::models::{DualOutcome, RankedTeam, Ranking, TeamDirectory, TeamId};

/// Directed graph of already-applied promotions (winner -> loser).
#[derive(Debug, Default)]
struct PromotionGraph {
    edges: FxHashMap<TeamId, Vec<TeamId>>,
}

impl PromotionGraph {
    /// Depth-first reachability over applied edges.
    fn reachable(&self, from: TeamId, to: TeamId) -> bool {
        let mut visited: FxHashSet<TeamId> = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(next) = self.edges.get(&node) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    /// Add winner -> loser unless the reverse path already exists.
    fn try_add(&mut self, winner: TeamId, loser: TeamId) -> bool {
        if self.reachable(loser, winner) {
            return false;
        }
        self.edges.entry(winner).or_default().push(loser);
        true
    }
}

/// Head-to-head verdict for a pair, from the first team's perspective.
///
/// Promotion requires exactly one head-to-head dual between the pair; any
/// multi-dual series, split or not, defers to the rating order. A drawn
/// single dual may fall back to the secondary signal.
fn series_winner(
    a: TeamId,
    b: TeamId,
    head_to_head: &HeadToHead,
    rule: DrawnDualRule,
) -> Option<TeamId> {
    let duals = head_to_head.between(a, b);
    if duals.len() != 1 {
        return None;
    }

    let (outcome, game_differential) = duals[0];
    match outcome {
        DualOutcome::Won => Some(a),
        DualOutcome::Lost => Some(b),
        DualOutcome::Drawn => {
            if rule == DrawnDualRule::GameDifferential {
                match game_differential.cmp(&0) {
                    std::cmp::Ordering::Greater => Some(a),
                    std::cmp::Ordering::Less => Some(b),
                    std::cmp::Ordering::Equal => None,
                }
            } else {
                None
            }
        }
    }
}

/// Whether the pair at positions (i, j) of the current order qualifies for
/// head-to-head examination.
fn pair_triggered(
    order: &[RankedTeam],
    i: usize,
    j: usize,
    directory: &TeamDirectory,
    config: &TiebreakConfig,
) -> bool {
    let upper = &order[i];
    let lower = &order[j];

    if j == i + 1 {
        let scale = upper.rating.power_index.abs().max(lower.rating.power_index.abs());
        let gap = (upper.rating.power_index - lower.rating.power_index).abs();
        if gap <= config.index_threshold * scale {
            return true;
        }
    }

    if j - i <= config.league_window {
        if let (Some(a), Some(b)) =
            (directory.league_of(upper.team), directory.league_of(lower.team))
        {
            if a == b {
                return true;
            }
        }
    }

    false
}

/// Apply head-to-head tiebreaks to the rating order and renumber ranks.
pub fn resolve(
    ranking: &Ranking,
    head_to_head: &HeadToHead,
    directory: &TeamDirectory,
    config: &TiebreakConfig,
    diagnostics: &mut Diagnostics,
) -> Ranking {
    let mut order: Vec<RankedTeam> = ranking.teams().to_vec();
    let mut graph = PromotionGraph::default();
    let mut applied = 0usize;

    let mut i = 0;
    while i < order.len() {
        let window_end = (i + config.league_window).min(order.len().saturating_sub(1));
        for j in (i + 1)..=window_end {
            if !pair_triggered(&order, i, j, directory, config) {
                continue;
            }
            let upper = order[i].team;
            let lower = order[j].team;
            let Some(winner) =
                series_winner(upper, lower, head_to_head, config.drawn_dual_rule)
            else {
                continue;
            };
            if winner != lower {
                continue; // rating order already agrees
            }
            if !graph.try_add(lower, upper) {
                diagnostics
                    .push(Diagnostic::TiebreakCycleRejected { winner: lower, loser: upper });
                continue;
            }
            // Promote by insertion so teams between j and i shift down one.
            let promoted = order.remove(j);
            order.insert(i, promoted);
            applied += 1;
            break;
        }
        i += 1;
    }

    debug!(applied, "tiebreak resolution complete");
    Ranking::from_ordered(order.into_iter().map(|t| (t.team, t.rating)).collect())
}
