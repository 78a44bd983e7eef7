//! Rating computation: wwp, schedule strength, depth, power index.
//!
//! Three strict sequential passes over the complete stats map. Each pass
//! reads only fully-computed results of the previous one; nothing here is
//! lazy or memoized, because interleaved evaluation would make a team's
//! rating depend on map iteration order.

use fxhash::FxHashMap;
use tracing::debug;

use super::config::{RatingConfig, ScheduleBlend};
use super::diagnostics::Diagnostics;
use crate::models::{Ranking, Rating, TeamId, TeamSeasonStats};

/// Compute ratings for every team in the snapshot and produce the initial
/// ranking, sorted by power index. Pure: identical inputs give identical
/// output.
pub fn rate(
    stats: &FxHashMap<TeamId, TeamSeasonStats>,
    config: &RatingConfig,
    diagnostics: &mut Diagnostics,
) -> Ranking {
    // Pass 1: weighted win percentage for every team.
    let mut wwp: FxHashMap<TeamId, f64> = FxHashMap::default();
    for (&team, team_stats) in stats {
        wwp.insert(team, weighted_win_pct(team_stats));
    }

    // Pass 2: opponent win percentage, reading only finished pass-1 values.
    let mut owp: FxHashMap<TeamId, f64> = FxHashMap::default();
    for (&team, team_stats) in stats {
        owp.insert(team, opponent_mean(&team_stats.opponents, &wwp, diagnostics));
    }

    // Pass 3: opponents' opponent win percentage, only when the blend asks.
    let oowp: Option<FxHashMap<TeamId, f64>> = if config.schedule_blend.uses_second_order() {
        let mut map = FxHashMap::default();
        for (&team, team_stats) in stats {
            map.insert(team, opponent_mean(&team_stats.opponents, &owp, diagnostics));
        }
        Some(map)
    } else {
        None
    };

    let mut rated: Vec<(TeamId, Rating)> = stats
        .iter()
        .map(|(&team, team_stats)| {
            let team_wwp = wwp[&team];
            let team_owp = owp[&team];
            let team_oowp = oowp.as_ref().map(|m| m[&team]);

            let schedule_score = match config.schedule_blend {
                ScheduleBlend::TwoTerm { wwp: a, owp: b } => a * team_wwp + b * team_owp,
                ScheduleBlend::ThreeTerm { wwp: a, owp: b, oowp: c } => {
                    a * team_wwp + b * team_owp + c * team_oowp.unwrap_or(0.0)
                }
            };
            let depth_norm = team_stats.mean_depth_ratio();
            let power_index = (1.0 - config.depth_weight) * schedule_score
                + config.depth_weight * depth_norm;

            let rating = Rating {
                wwp: team_wwp,
                owp: team_owp,
                oowp: team_oowp,
                schedule_score,
                depth_norm,
                power_index,
            };
            (team, rating)
        })
        .collect();

    // Descending power index; team id breaks exact float ties so the
    // ordering never depends on map iteration order.
    rated.sort_by(|(a_id, a), (b_id, b)| {
        b.power_index
            .partial_cmp(&a.power_index)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a_id.cmp(b_id))
    });

    debug!(teams = rated.len(), "rating passes complete");
    Ranking::from_ordered(rated)
}

/// Weighted wins over weighted contested, 0 when nothing was contested.
fn weighted_win_pct(stats: &TeamSeasonStats) -> f64 {
    if stats.weighted_contested == 0.0 {
        0.0
    } else {
        stats.weighted_wins / stats.weighted_contested
    }
}

/// Mean of `values` over the opponent set. Opponents with no value in the
/// snapshot are excluded from the mean, never treated as zero.
fn opponent_mean(
    opponents: &fxhash::FxHashSet<TeamId>,
    values: &FxHashMap<TeamId, f64>,
    diagnostics: &mut Diagnostics,
) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u32;
    for opponent in opponents {
        match values.get(opponent) {
            Some(value) => {
                sum += value;
                count += 1;
            }
            None => diagnostics.opponents_outside_snapshot += 1,
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Flight;
    use proptest::prelude::*;

    fn stats_with(team: u32, results: &[(Flight, bool)]) -> TeamSeasonStats {
        let mut stats = TeamSeasonStats::new(TeamId(team), "6A", "PIL");
        let mut won = 0.0;
        let mut contested = 0.0;
        for &(flight, win) in results {
            stats.record_flight(flight, Some(win));
            contested += flight.weight();
            if win {
                won += flight.weight();
            }
        }
        stats.depth_ratio_sum = if contested > 0.0 { won / contested } else { 0.0 };
        stats.duals_played = 1;
        stats
    }

    fn snapshot(entries: Vec<TeamSeasonStats>) -> FxHashMap<TeamId, TeamSeasonStats> {
        entries.into_iter().map(|s| (s.team, s)).collect()
    }

    #[test]
    fn wwp_matches_worked_example() {
        // Six contested flights with weights 1.0, 1.0, 0.75, 0.5, 0.25,
        // 0.25 (total 3.75); all won except one 0.25-weight flight.
        let stats = stats_with(
            1,
            &[
                (Flight::Singles1, true),
                (Flight::Doubles1, true),
                (Flight::Singles2, true),
                (Flight::Doubles2, true),
                (Flight::Singles3, false),
                (Flight::Doubles3, true),
            ],
        );
        assert!((stats.weighted_contested - 3.75).abs() < 1e-12);
        assert!((weighted_win_pct(&stats) - 3.5 / 3.75).abs() < 1e-12);
        assert!((weighted_win_pct(&stats) - 0.9333).abs() < 1e-3);
    }

    #[test]
    fn zero_contested_rates_zero() {
        let stats = TeamSeasonStats::new(TeamId(1), "6A", "PIL");
        let mut diags = Diagnostics::new();
        let ranking = rate(&snapshot(vec![stats]), &RatingConfig::default(), &mut diags);
        let rating = ranking.teams()[0].rating;
        assert_eq!(rating.wwp, 0.0);
        assert_eq!(rating.owp, 0.0);
        assert_eq!(rating.power_index, 0.0);
    }

    #[test]
    fn owp_excludes_opponents_outside_snapshot() {
        let mut a = stats_with(1, &[(Flight::Singles1, true)]);
        a.opponents.insert(TeamId(2));
        a.opponents.insert(TeamId(99)); // not in snapshot
        let mut b = stats_with(2, &[(Flight::Singles1, false)]);
        b.opponents.insert(TeamId(1));

        let mut diags = Diagnostics::new();
        let ranking = rate(&snapshot(vec![a, b]), &RatingConfig::default(), &mut diags);
        let rating_a =
            ranking.teams().iter().find(|t| t.team == TeamId(1)).unwrap().rating;
        // Only team 2's wwp (0.0) enters the mean; the ghost opponent is
        // excluded rather than averaged in as zero.
        assert_eq!(rating_a.owp, 0.0);
        assert_eq!(diags.opponents_outside_snapshot, 1);
    }

    #[test]
    fn second_order_pass_only_runs_for_three_term_blend() {
        let mut a = stats_with(1, &[(Flight::Singles1, true)]);
        a.opponents.insert(TeamId(2));
        let mut b = stats_with(2, &[(Flight::Singles1, false)]);
        b.opponents.insert(TeamId(1));
        let snapshot = snapshot(vec![a, b]);

        let mut diags = Diagnostics::new();
        let classic = rate(&snapshot, &RatingConfig::default(), &mut diags);
        assert!(classic.teams()[0].rating.oowp.is_none());

        let rpi_config =
            RatingConfig { schedule_blend: ScheduleBlend::rpi(), depth_weight: 0.5 };
        let rpi = rate(&snapshot, &rpi_config, &mut diags);
        assert!(rpi.teams()[0].rating.oowp.is_some());
    }

    #[test]
    fn identical_snapshots_rate_identically() {
        let mut a = stats_with(1, &[(Flight::Singles1, true), (Flight::Doubles1, false)]);
        a.opponents.insert(TeamId(2));
        let mut b = stats_with(2, &[(Flight::Singles1, false), (Flight::Doubles1, true)]);
        b.opponents.insert(TeamId(1));
        let snapshot = snapshot(vec![a, b]);

        let mut d1 = Diagnostics::new();
        let mut d2 = Diagnostics::new();
        let r1 = rate(&snapshot, &RatingConfig::default(), &mut d1);
        let r2 = rate(&snapshot, &RatingConfig::default(), &mut d2);
        let rows1: Vec<_> = r1.teams().iter().map(|t| (t.rank, t.team)).collect();
        let rows2: Vec<_> = r2.teams().iter().map(|t| (t.rank, t.team)).collect();
        assert_eq!(rows1, rows2);
    }

    proptest! {
        #[test]
        fn wwp_stays_in_unit_interval(
            results in proptest::collection::vec((1u8..=8, any::<bool>()), 0..40)
        ) {
            let mut stats = TeamSeasonStats::new(TeamId(1), "6A", "PIL");
            for (code, win) in results {
                stats.record_flight(Flight::from_code(code).unwrap(), Some(win));
            }
            let wwp = weighted_win_pct(&stats);
            prop_assert!((0.0..=1.0).contains(&wwp));
            prop_assert!(stats.weighted_wins <= stats.weighted_contested + 1e-12);
        }

        #[test]
        fn ranking_is_contiguous_permutation(team_count in 1usize..30) {
            let entries: Vec<_> = (0..team_count)
                .map(|i| {
                    stats_with(i as u32, &[(Flight::Singles1, i % 2 == 0)])
                })
                .collect();
            let mut diags = Diagnostics::new();
            let ranking =
                rate(&snapshot(entries), &RatingConfig::default(), &mut diags);
            prop_assert_eq!(ranking.len(), team_count);
            prop_assert!(ranking.ranks_contiguous());
            let mut teams: Vec<_> = ranking.teams().iter().map(|t| t.team).collect();
            teams.sort();
            teams.dedup();
            prop_assert_eq!(teams.len(), team_count);
        }
    }
}
