//! Season aggregation: raw dual-match records into per-team stats.
//!
//! Leaf stage of the pipeline. Produces the full stats map the rating
//! passes run over, plus the head-to-head ledger the tiebreak stage
//! consults later. Teams missing from the directory are dropped here
//! entirely; no partial stats ever leave this stage.

use std::cmp::Ordering;

use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::diagnostics::{Diagnostic, Diagnostics};
use crate::models::{DualMatch, DualOutcome, TeamDirectory, TeamId, TeamSeasonStats};

/// Head-to-head dual results, keyed by the id-ordered team pair.
#[derive(Debug, Clone, Default)]
pub struct HeadToHead {
    duals: FxHashMap<(TeamId, TeamId), Vec<H2HDual>>,
}

/// One dual between a pair, stored from the lower-id side's perspective.
#[derive(Debug, Clone, Copy)]
struct H2HDual {
    outcome: DualOutcome,
    game_differential: i32,
}

impl HeadToHead {
    fn record(&mut self, dual: &DualMatch) {
        let (lo, hi) = if dual.home <= dual.away {
            (dual.home, dual.away)
        } else {
            (dual.away, dual.home)
        };
        // outcome_for only returns None for a team not in the dual.
        let Some(outcome) = dual.outcome_for(lo) else { return };
        self.duals.entry((lo, hi)).or_default().push(H2HDual {
            outcome,
            game_differential: dual.game_differential(lo),
        });
    }

    /// Dual results between `a` and `b` from `a`'s perspective:
    /// (outcome, game differential) per meet.
    pub fn between(&self, a: TeamId, b: TeamId) -> Vec<(DualOutcome, i32)> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let Some(duals) = self.duals.get(&(lo, hi)) else { return Vec::new() };
        duals
            .iter()
            .map(|d| {
                if a == lo {
                    (d.outcome, d.game_differential)
                } else {
                    let flipped = match d.outcome {
                        DualOutcome::Won => DualOutcome::Lost,
                        DualOutcome::Lost => DualOutcome::Won,
                        DualOutcome::Drawn => DualOutcome::Drawn,
                    };
                    (flipped, -d.game_differential)
                }
            })
            .collect()
    }
}

/// Output of the aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub stats: FxHashMap<TeamId, TeamSeasonStats>,
    pub head_to_head: HeadToHead,
}

/// Aggregate one classification's season of dual matches.
pub fn aggregate(
    duals: &[DualMatch],
    directory: &TeamDirectory,
    diagnostics: &mut Diagnostics,
) -> Aggregates {
    let mut stats: FxHashMap<TeamId, TeamSeasonStats> = FxHashMap::default();
    let mut head_to_head = HeadToHead::default();
    let mut reported_missing: FxHashSet<TeamId> = FxHashSet::default();

    for dual in duals {
        for side in [dual.home, dual.away] {
            if directory.contains(side) {
                continue;
            }
            if reported_missing.insert(side) {
                diagnostics.push(Diagnostic::MissingTeamMetadata { team: side });
            }
        }
        // Unknown flight codes are reported here, once per record, so the
        // event survives even when neither side has directory metadata.
        for record in &dual.flights {
            if record.flight().is_none() {
                diagnostics.push(Diagnostic::UnknownFlight {
                    code: record.flight_code,
                    home: record.home,
                    away: record.away,
                });
            }
        }

        accumulate_side(dual, dual.home, directory, &mut stats, true);
        accumulate_side(dual, dual.away, directory, &mut stats, false);
        head_to_head.record(dual);
    }

    debug!(teams = stats.len(), duals = duals.len(), "aggregation pass complete");
    Aggregates { stats, head_to_head }
}

fn accumulate_side(
    dual: &DualMatch,
    team: TeamId,
    directory: &TeamDirectory,
    stats: &mut FxHashMap<TeamId, TeamSeasonStats>,
    is_home: bool,
) {
    // Silent-drop policy: no entry is ever created for an unknown team.
    let Some(entry) = directory.get(team) else { return };
    let Some(opponent) = dual.opponent_of(team) else { return };

    let team_stats = stats
        .entry(team)
        .or_insert_with(|| TeamSeasonStats::new(team, &entry.classification, &entry.league));

    let mut meet_weight_won = 0.0;
    let mut meet_weight_contested = 0.0;

    for record in &dual.flights {
        // Unknown flight code: skipped fully, already reported upstream.
        let Some(flight) = record.flight() else { continue };

        let outcome = if is_home { record.home_outcome() } else { record.home_outcome().reverse() };
        let won = match outcome {
            Ordering::Greater => Some(true),
            Ordering::Less => Some(false),
            Ordering::Equal => None,
        };
        team_stats.record_flight(flight, won);

        meet_weight_contested += flight.weight();
        if won == Some(true) {
            meet_weight_won += flight.weight();
        }
    }

    // A meet with no recognized flights contributes nothing further.
    if meet_weight_contested == 0.0 {
        return;
    }

    team_stats.opponents.insert(opponent);
    team_stats.depth_ratio_sum += meet_weight_won / meet_weight_contested;
    team_stats.duals_played += 1;
    match dual.outcome_for(team) {
        Some(DualOutcome::Won) => team_stats.dual_wins += 1,
        Some(DualOutcome::Lost) => team_stats.dual_losses += 1,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchRecord, TeamEntry};

    fn directory(ids: &[u32]) -> TeamDirectory {
        TeamDirectory::new(
            ids.iter()
                .map(|&id| TeamEntry {
                    id: TeamId(id),
                    name: format!("School {id}"),
                    city: String::new(),
                    classification: "6A".to_string(),
                    league: if id % 2 == 0 { "Metro" } else { "PIL" }.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn record(code: u8, home: u32, away: u32, hs: u16, als: u16) -> MatchRecord {
        MatchRecord {
            flight_code: code,
            home: TeamId(home),
            away: TeamId(away),
            home_score: hs,
            away_score: als,
        }
    }

    #[test]
    fn weighted_sums_follow_flight_weights() {
        let dir = directory(&[1, 2]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(1),
            away: TeamId(2),
            flights: vec![
                record(1, 1, 2, 6, 2), // S1 win, weight 1.0
                record(2, 1, 2, 3, 6), // S2 loss, weight 0.75
                record(5, 1, 2, 6, 4), // D1 win, weight 1.0
            ],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        let home = &agg.stats[&TeamId(1)];
        assert_eq!(home.weighted_wins, 2.0);
        assert_eq!(home.weighted_contested, 2.75);
        assert_eq!(home.flight_wins, 2);
        assert_eq!(home.flight_losses, 1);
        assert_eq!(home.dual_wins, 1);

        let away = &agg.stats[&TeamId(2)];
        assert_eq!(away.weighted_wins, 0.75);
        assert_eq!(away.dual_losses, 1);
    }

    #[test]
    fn unknown_flight_is_fully_skipped() {
        let dir = directory(&[1, 2]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(1),
            away: TeamId(2),
            flights: vec![record(1, 1, 2, 6, 0), record(77, 1, 2, 0, 6)],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        let home = &agg.stats[&TeamId(1)];
        // The unrecognized record contributed to neither sums nor counters.
        assert_eq!(home.weighted_contested, 1.0);
        assert_eq!(home.flight_losses, 0);
        assert_eq!(diags.count_of(|e| matches!(e, Diagnostic::UnknownFlight { .. })), 1);
    }

    #[test]
    fn unknown_flight_reported_even_without_home_metadata() {
        // Only the away team is in the directory; the unrecognized flight
        // must still surface.
        let dir = directory(&[2]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(99),
            away: TeamId(2),
            flights: vec![record(1, 99, 2, 6, 1), record(77, 99, 2, 0, 6)],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        assert_eq!(diags.count_of(|e| matches!(e, Diagnostic::UnknownFlight { .. })), 1);
        assert_eq!(
            diags.count_of(|e| matches!(e, Diagnostic::MissingTeamMetadata { .. })),
            1
        );
        // The away side's stats still exclude the unrecognized record.
        assert_eq!(agg.stats[&TeamId(2)].weighted_contested, 1.0);
    }

    #[test]
    fn team_without_metadata_is_dropped() {
        let dir = directory(&[1]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(1),
            away: TeamId(99),
            flights: vec![record(1, 1, 99, 6, 3)],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        assert!(agg.stats.contains_key(&TeamId(1)));
        assert!(!agg.stats.contains_key(&TeamId(99)));
        assert_eq!(
            diags.count_of(|e| matches!(e, Diagnostic::MissingTeamMetadata { .. })),
            1
        );
    }

    #[test]
    fn opponent_sets_are_symmetric() {
        let dir = directory(&[1, 2, 3]);
        let mut diags = Diagnostics::new();
        let duals = vec![
            DualMatch {
                home: TeamId(1),
                away: TeamId(2),
                flights: vec![record(1, 1, 2, 6, 3)],
            },
            DualMatch {
                home: TeamId(3),
                away: TeamId(1),
                flights: vec![record(1, 3, 1, 6, 3)],
            },
        ];
        let agg = aggregate(&duals, &dir, &mut diags);
        for (&a, stats_a) in &agg.stats {
            for &b in &stats_a.opponents {
                assert!(agg.stats[&b].opponents.contains(&a));
            }
        }
    }

    #[test]
    fn tied_flight_counts_contested_but_no_tally() {
        let dir = directory(&[1, 2]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(1),
            away: TeamId(2),
            flights: vec![record(1, 1, 2, 4, 4)],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        let home = &agg.stats[&TeamId(1)];
        assert_eq!(home.weighted_contested, 1.0);
        assert_eq!(home.weighted_wins, 0.0);
        assert_eq!(home.flight_wins, 0);
        assert_eq!(home.flight_losses, 0);
    }

    #[test]
    fn head_to_head_perspective_flips() {
        let dir = directory(&[1, 2]);
        let mut diags = Diagnostics::new();
        let duals = vec![DualMatch {
            home: TeamId(2),
            away: TeamId(1),
            flights: vec![record(1, 2, 1, 6, 2), record(2, 2, 1, 6, 4)],
        }];
        let agg = aggregate(&duals, &dir, &mut diags);
        let from_two = agg.head_to_head.between(TeamId(2), TeamId(1));
        assert_eq!(from_two.len(), 1);
        assert_eq!(from_two[0].0, DualOutcome::Won);
        let from_one = agg.head_to_head.between(TeamId(1), TeamId(2));
        assert_eq!(from_one[0].0, DualOutcome::Lost);
        assert_eq!(from_one[0].1, -from_two[0].1);
    }
}
