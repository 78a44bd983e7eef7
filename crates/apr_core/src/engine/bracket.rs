//! Playoff bracket construction.
//!
//! Five deterministic steps from a resolved ranking to a finalized (or
//! partially-unresolved) bracket: field selection and tier partition,
//! league-champion home-game promotion, league-hierarchy reordering,
//! standard pairing, and the bounded same-league avoidance pass.

use fxhash::FxHashSet;
use tracing::debug;

use super::config::BracketConfig;
use super::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{EngineError, Result};
use crate::models::{
    Bracket, BracketSlot, Pairing, Ranking, TeamDirectory, TeamId,
};

#[derive(Debug, Clone)]
struct SeedEntry {
    team: TeamId,
    champion: bool,
    league: String,
}

/// Build the bracket for one classification from the resolved ranking.
///
/// `champions` are the auto-bid league champions; they enter the field
/// regardless of rank. Everyone else qualifies at-large in rank order.
pub fn build(
    ranking: &Ranking,
    champions: &FxHashSet<TeamId>,
    directory: &TeamDirectory,
    config: &BracketConfig,
    diagnostics: &mut Diagnostics,
) -> Result<Bracket> {
    let field_size = config.size.field_size();
    if ranking.len() < field_size {
        return Err(EngineError::InvalidConfig(format!(
            "bracket needs {field_size} ranked teams, have {}",
            ranking.len()
        )));
    }

    let mut field = select_field(ranking, champions, directory, field_size);
    promote_champions(&mut field, config.size.host_cutoff() as usize);
    enforce_league_hierarchy(&mut field);

    let pairings = pair(config.size);
    let mut slots: Vec<BracketSlot> = field
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let seed = i as u32 + 1;
            BracketSlot {
                seed,
                team: entry.team,
                role: config.size.role_of(seed),
                champion: entry.champion,
            }
        })
        .collect();

    let unresolved =
        avoid_same_league(&mut slots, &field, &pairings, config, diagnostics);

    debug!(
        size = field_size,
        unresolved = unresolved.len(),
        "bracket construction complete"
    );
    Ok(Bracket { size: config.size, slots, pairings, unresolved_conflicts: unresolved })
}

/// Auto-bid champions plus the best at-large teams, in rank order.
fn select_field(
    ranking: &Ranking,
    champions: &FxHashSet<TeamId>,
    directory: &TeamDirectory,
    field_size: usize,
) -> Vec<SeedEntry> {
    let champion_count =
        ranking.teams().iter().filter(|t| champions.contains(&t.team)).count().min(field_size);
    let at_large_budget = field_size - champion_count;

    let mut field = Vec::with_capacity(field_size);
    let mut at_large_used = 0usize;
    for entry in ranking.teams() {
        let is_champion = champions.contains(&entry.team);
        if !is_champion {
            if at_large_used == at_large_budget {
                continue;
            }
            at_large_used += 1;
        }
        field.push(SeedEntry {
            team: entry.team,
            champion: is_champion,
            league: directory.league_of(entry.team).unwrap_or_default().to_string(),
        });
        if field.len() == field_size {
            break;
        }
    }
    field
}

/// Home-game promotion: champions seeded below the host cutoff are moved up
/// to the minimum seed that still hosts. Promotion is insertion, never a
/// swap: at-large teams displaced from the host tier slide down in order,
/// and no already-qualified champion drops below the cutoff.
fn promote_champions(field: &mut Vec<SeedEntry>, host_cutoff: usize) {
    let mut promoting: Vec<SeedEntry> = Vec::new();
    let mut index = host_cutoff;
    while index < field.len() {
        if field[index].champion {
            promoting.push(field.remove(index));
        } else {
            index += 1;
        }
    }
    if promoting.is_empty() {
        return;
    }

    // Make room by bumping the lowest-seeded at-large teams out of the host
    // tier; their relative order among the displaced keeps them at the top
    // of the visitor tier.
    let mut bumped: Vec<SeedEntry> = Vec::new();
    for _ in 0..promoting.len() {
        match field[..host_cutoff.min(field.len())]
            .iter()
            .rposition(|entry| !entry.champion)
        {
            Some(pos) => bumped.insert(0, field.remove(pos)),
            // Host tier is all champions already; the remaining promotions
            // have nowhere to go and stay where they are.
            None => break,
        }
    }

    let room = bumped.len();
    let insert_at = host_cutoff - room;
    for (offset, entry) in promoting.drain(..room).enumerate() {
        field.insert(insert_at + offset, entry);
    }
    // Champions that could not be promoted re-enter at the top of the
    // remainder, ahead of the bumped at-large teams.
    for (offset, entry) in promoting.into_iter().enumerate() {
        field.insert(host_cutoff + offset, entry);
    }
    for (offset, entry) in bumped.into_iter().enumerate() {
        let pos = (host_cutoff + offset).min(field.len());
        field.insert(pos, entry);
    }
}

/// No at-large entrant may be seeded above a champion from its own league:
/// within each league's set of seed positions, champions come first.
fn enforce_league_hierarchy(field: &mut [SeedEntry]) {
    let leagues: FxHashSet<String> =
        field.iter().map(|entry| entry.league.clone()).collect();
    for league in leagues {
        let positions: Vec<usize> = field
            .iter()
            .enumerate()
            .filter(|(_, e)| e.league == league)
            .map(|(i, _)| i)
            .collect();
        if positions.len() < 2 {
            continue;
        }
        let mut group: Vec<SeedEntry> =
            positions.iter().map(|&i| field[i].clone()).collect();
        // Stable: champions first, rating order preserved inside each side.
        group.sort_by_key(|entry| !entry.champion);
        for (&pos, entry) in positions.iter().zip(group) {
            field[pos] = entry;
        }
    }
}

/// Standard bracket pairing: host seed s meets visitor seed
/// field + byes + 1 - s.
fn pair(size: crate::models::BracketSize) -> Vec<Pairing> {
    let total = size.field_size() as u32 + size.bye_cutoff() + 1;
    (size.bye_cutoff() + 1..=size.host_cutoff())
        .map(|host_seed| Pairing { host_seed, visitor_seed: total - host_seed })
        .collect()
}

/// The 3-move rule. Only visitors relocate; lower-seeded swap targets are
/// preferred; a swap is valid only when neither resulting pairing is a
/// same-league matchup. Pairings still colliding after the attempt budget
/// are retained and flagged.
fn avoid_same_league(
    slots: &mut [BracketSlot],
    field: &[SeedEntry],
    pairings: &[Pairing],
    config: &BracketConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Pairing> {
    let league_of = |slots: &[BracketSlot], seed: u32| -> String {
        let team = slots[seed as usize - 1].team;
        field
            .iter()
            .find(|entry| entry.team == team)
            .map(|entry| entry.league.clone())
            .unwrap_or_default()
    };
    let host_of = |seed: u32| -> u32 {
        pairings
            .iter()
            .find(|p| p.visitor_seed == seed)
            .map(|p| p.host_seed)
            .expect("visitor seed always paired")
    };

    let mut unresolved = Vec::new();
    for pairing in pairings {
        if league_of(slots, pairing.host_seed) != league_of(slots, pairing.visitor_seed) {
            continue;
        }

        // Candidate visitor slots, lower seed numbers first.
        let candidates: Vec<u32> = pairings
            .iter()
            .map(|p| p.visitor_seed)
            .filter(|&v| v != pairing.visitor_seed)
            .collect();
        let mut sorted = candidates;
        sorted.sort();

        let mut swapped = false;
        for &candidate in sorted.iter().take(config.max_swap_attempts) {
            let candidate_host = host_of(candidate);
            let our_league = league_of(slots, pairing.host_seed);
            let candidate_league = league_of(slots, candidate);
            let candidate_host_league = league_of(slots, candidate_host);
            let our_visitor_league = league_of(slots, pairing.visitor_seed);

            // Neither new pairing may collide.
            if candidate_league != our_league
                && our_visitor_league != candidate_host_league
            {
                let a = pairing.visitor_seed as usize - 1;
                let b = candidate as usize - 1;
                let team_a = slots[a].team;
                slots[a].team = slots[b].team;
                slots[b].team = team_a;
                let champ_a = slots[a].champion;
                slots[a].champion = slots[b].champion;
                slots[b].champion = champ_a;
                swapped = true;
                break;
            }
        }

        if !swapped {
            unresolved.push(*pairing);
            diagnostics.push(Diagnostic::UnresolvedLeagueConflict {
                host_seed: pairing.host_seed,
                visitor_seed: pairing.visitor_seed,
            });
        }
    }
    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BracketSize, Rating, SlotRole, TeamEntry};

    fn rating(power_index: f64) -> Rating {
        Rating {
            wwp: 0.5,
            owp: 0.5,
            oowp: None,
            schedule_score: 0.5,
            depth_norm: 0.5,
            power_index,
        }
    }

    /// Ranking of `n` teams, team ids 1..=n in rank order.
    fn ranking_of(n: u32) -> Ranking {
        Ranking::from_ordered(
            (1..=n).map(|id| (TeamId(id), rating(1.0 - id as f64 / 100.0))).collect(),
        )
    }

    fn directory_with(leagues: &[(u32, &str)]) -> TeamDirectory {
        TeamDirectory::new(
            leagues
                .iter()
                .map(|&(id, league)| TeamEntry {
                    id: TeamId(id),
                    name: format!("School {id}"),
                    city: String::new(),
                    classification: "6A".to_string(),
                    league: league.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    /// Every team in its own league unless overridden.
    fn solo_leagues(n: u32) -> Vec<(u32, String)> {
        (1..=n).map(|id| (id, format!("League {id}"))).collect()
    }

    fn directory_solo(n: u32) -> TeamDirectory {
        let rows = solo_leagues(n);
        directory_with(
            &rows.iter().map(|(id, l)| (*id, l.as_str())).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn straight_seeding_and_pairing_sixteen() {
        let dir = directory_solo(16);
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(16),
            &FxHashSet::default(),
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();

        assert_eq!(bracket.slots.len(), 16);
        assert_eq!(bracket.team_at(1), Some(TeamId(1)));
        assert_eq!(bracket.slot(1).unwrap().role, SlotRole::Host);
        assert_eq!(bracket.slot(9).unwrap().role, SlotRole::Visitor);
        assert_eq!(bracket.pairings[0], Pairing { host_seed: 1, visitor_seed: 16 });
        assert_eq!(bracket.pairings[7], Pairing { host_seed: 8, visitor_seed: 9 });
        assert!(bracket.unresolved_conflicts.is_empty());
    }

    #[test]
    fn twelve_bracket_pairs_hosts_five_through_eight() {
        let dir = directory_solo(12);
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(12),
            &FxHashSet::default(),
            &dir,
            &BracketConfig::for_size(BracketSize::Twelve),
            &mut diags,
        )
        .unwrap();
        assert_eq!(bracket.slot(1).unwrap().role, SlotRole::Bye);
        assert_eq!(bracket.pairings[0], Pairing { host_seed: 5, visitor_seed: 12 });
        assert_eq!(bracket.pairings[3], Pairing { host_seed: 8, visitor_seed: 9 });
    }

    #[test]
    fn champion_seeded_twelfth_is_promoted_to_host_tier() {
        let dir = directory_solo(20);
        let mut champions = FxHashSet::default();
        champions.insert(TeamId(12));
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(20),
            &champions,
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();

        let position = bracket
            .slots
            .iter()
            .find(|s| s.team == TeamId(12))
            .map(|s| s.seed)
            .unwrap();
        assert!(position <= 8, "champion must host, got seed {position}");
        // The displaced at-large lands at the top of the visitor tier.
        assert_eq!(bracket.team_at(9), Some(TeamId(8)));
        // Everyone above the insertion point is untouched.
        assert_eq!(bracket.team_at(1), Some(TeamId(1)));
        assert_eq!(bracket.team_at(7), Some(TeamId(7)));
    }

    #[test]
    fn promotion_preserves_relative_champion_order() {
        let dir = directory_solo(20);
        let mut champions = FxHashSet::default();
        champions.insert(TeamId(11));
        champions.insert(TeamId(14));
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(20),
            &champions,
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();

        let seed_of = |id: u32| {
            bracket.slots.iter().find(|s| s.team == TeamId(id)).map(|s| s.seed).unwrap()
        };
        assert!(seed_of(11) <= 8);
        assert!(seed_of(14) <= 8);
        assert!(seed_of(11) < seed_of(14), "relative champion order preserved");
    }

    #[test]
    fn at_large_never_seeded_above_same_league_champion() {
        // Teams 3 and 5 share a league; 5 is its champion.
        let mut rows = solo_leagues(16);
        rows[2].1 = "Shared".to_string();
        rows[4].1 = "Shared".to_string();
        let dir = directory_with(
            &rows.iter().map(|(id, l)| (*id, l.as_str())).collect::<Vec<_>>(),
        );
        let mut champions = FxHashSet::default();
        champions.insert(TeamId(5));
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(16),
            &champions,
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();

        let seed_of = |id: u32| {
            bracket.slots.iter().find(|s| s.team == TeamId(id)).map(|s| s.seed).unwrap()
        };
        assert!(seed_of(5) < seed_of(3), "champion outranks same-league at-large");
    }

    #[test]
    fn same_league_pairing_is_swapped_away() {
        // Host seed 8 and visitor seed 9 share a league; plenty of valid
        // swap targets exist, so the collision must resolve.
        let mut rows = solo_leagues(16);
        rows[7].1 = "Shared".to_string();
        rows[8].1 = "Shared".to_string();
        let dir = directory_with(
            &rows.iter().map(|(id, l)| (*id, l.as_str())).collect::<Vec<_>>(),
        );
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(16),
            &FxHashSet::default(),
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();

        assert!(bracket.unresolved_conflicts.is_empty());
        for pairing in &bracket.pairings {
            let host = bracket.team_at(pairing.host_seed).unwrap();
            let visitor = bracket.team_at(pairing.visitor_seed).unwrap();
            assert_ne!(dir.league_of(host), dir.league_of(visitor));
        }
    }

    #[test]
    fn unresolvable_conflict_is_retained_and_flagged() {
        // Every visitor shares the host's league: no valid swap exists.
        let rows: Vec<(u32, String)> =
            (1..=8).map(|id| (id, "OnlyLeague".to_string())).collect();
        let dir = directory_with(
            &rows.iter().map(|(id, l)| (*id, l.as_str())).collect::<Vec<_>>(),
        );
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(8),
            &FxHashSet::default(),
            &dir,
            &BracketConfig::for_size(BracketSize::Eight),
            &mut diags,
        )
        .unwrap();

        assert_eq!(bracket.unresolved_conflicts.len(), 4);
        assert_eq!(
            diags.count_of(|e| matches!(e, Diagnostic::UnresolvedLeagueConflict { .. })),
            4
        );
        // Pairings themselves are untouched.
        assert_eq!(bracket.pairings[0], Pairing { host_seed: 1, visitor_seed: 8 });
    }

    #[test]
    fn no_team_appears_twice() {
        let dir = directory_solo(20);
        let mut champions = FxHashSet::default();
        champions.insert(TeamId(12));
        champions.insert(TeamId(18));
        let mut diags = Diagnostics::new();
        let bracket = build(
            &ranking_of(20),
            &champions,
            &dir,
            &BracketConfig::for_size(BracketSize::Sixteen),
            &mut diags,
        )
        .unwrap();
        let mut teams: Vec<TeamId> = bracket.slots.iter().map(|s| s.team).collect();
        teams.sort();
        teams.dedup();
        assert_eq!(teams.len(), 16);
    }

    #[test]
    fn too_few_teams_is_a_structural_error() {
        let dir = directory_solo(6);
        let mut diags = Diagnostics::new();
        let result = build(
            &ranking_of(6),
            &FxHashSet::default(),
            &dir,
            &BracketConfig::for_size(BracketSize::Eight),
            &mut diags,
        );
        assert!(result.is_err());
    }
}
