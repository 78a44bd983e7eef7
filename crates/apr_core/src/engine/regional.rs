//! Geography-aware visitor reassignment.
//!
//! Greedy, deterministic, single-pass nearest-neighbor assignment over a
//! configurable visitor tier. Host slots never move; the protected tier is
//! never touched; the result is explicitly not globally optimal.

use fxhash::FxHashMap;
use tracing::debug;

use super::diagnostics::{Diagnostic, Diagnostics};
use crate::models::{Bracket, SlotRole, TeamDirectory, TeamId};

/// Geographic position of a team's home site.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// External coordinate collaborator. The engine performs no geocoding of
/// its own; teams the lookup cannot place are unassignable.
pub trait CoordinateLookup {
    fn coordinates(&self, team: TeamId) -> Option<GeoPoint>;
}

impl CoordinateLookup for FxHashMap<TeamId, GeoPoint> {
    fn coordinates(&self, team: TeamId) -> Option<GeoPoint> {
        self.get(&team).copied()
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    const EARTH_RADIUS_MILES: f64 = 3958.8;
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Reassign the visitor tier `tier` (inclusive seed range) by proximity.
/// Produces a new bracket; the input is untouched.
pub fn optimize(
    bracket: &Bracket,
    directory: &TeamDirectory,
    lookup: &dyn CoordinateLookup,
    tier: (u32, u32),
    diagnostics: &mut Diagnostics,
) -> Bracket {
    let (lo, hi) = tier;
    let mut result = bracket.clone();

    // Visitor seeds inside the tier, with the paired host seed for each.
    let mut tier_visitors: Vec<(u32, u32)> = bracket
        .pairings
        .iter()
        .filter(|p| (lo..=hi).contains(&p.visitor_seed))
        .filter(|p| {
            bracket
                .slot(p.visitor_seed)
                .map(|s| s.role == SlotRole::Visitor)
                .unwrap_or(false)
        })
        .map(|p| (p.visitor_seed, p.host_seed))
        .collect();
    tier_visitors.sort_by_key(|&(visitor_seed, _)| visitor_seed);
    if tier_visitors.is_empty() {
        return result;
    }

    // Visitors in seed order, each carrying its original team and host.
    let visitors: Vec<(u32, TeamId, u32)> = tier_visitors
        .iter()
        .map(|&(visitor_seed, host_seed)| {
            (visitor_seed, bracket.team_at(visitor_seed).expect("slot filled"), host_seed)
        })
        .collect();

    // Host pool keyed by host seed.
    let mut pool: Vec<u32> = tier_visitors.iter().map(|&(_, host)| host).collect();

    // Visitors without coordinates keep their strict-seeding placement, so
    // their original hosts leave the pool before anyone else chooses.
    let mut placements: Vec<(TeamId, u32)> = Vec::new();
    let mut mobile: Vec<(u32, TeamId)> = Vec::new();
    for &(visitor_seed, team, original_host) in &visitors {
        if lookup.coordinates(team).is_none() {
            diagnostics.push(Diagnostic::VisitorUnassignable { team, seed: visitor_seed });
            pool.retain(|&h| h != original_host);
            placements.push((team, original_host));
        } else {
            mobile.push((visitor_seed, team));
        }
    }

    for (visitor_seed, team) in mobile {
        let from = lookup.coordinates(team).expect("checked above");
        let league = directory.league_of(team).map(str::to_string);

        let nearest = |hosts: &[u32], cross_league_only: bool| -> Option<u32> {
            hosts
                .iter()
                .copied()
                .filter(|&host_seed| {
                    let host_team = bracket.team_at(host_seed).expect("slot filled");
                    if cross_league_only {
                        let host_league = directory.league_of(host_team).map(str::to_string);
                        if host_league.is_some() && host_league == league {
                            return false;
                        }
                    }
                    lookup.coordinates(host_team).is_some()
                })
                .min_by(|&a, &b| {
                    let da = haversine_miles(
                        from,
                        lookup.coordinates(bracket.team_at(a).unwrap()).unwrap(),
                    );
                    let db = haversine_miles(
                        from,
                        lookup.coordinates(bracket.team_at(b).unwrap()).unwrap(),
                    );
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
                })
        };

        let chosen = match nearest(&pool, true) {
            Some(host) => host,
            None => match nearest(&pool, false) {
                // Every remaining geocoded host shares the league: relax,
                // as an accepted last resort.
                Some(host) => {
                    diagnostics.push(Diagnostic::LeagueConstraintRelaxed {
                        team,
                        seed: visitor_seed,
                    });
                    host
                }
                // No geocoded host left at all; strict seeding stands if
                // the original host is still free, else take any.
                None => {
                    diagnostics
                        .push(Diagnostic::VisitorUnassignable { team, seed: visitor_seed });
                    let original = visitors
                        .iter()
                        .find(|(s, _, _)| *s == visitor_seed)
                        .map(|&(_, _, h)| h)
                        .expect("visitor came from this tier");
                    if pool.contains(&original) {
                        original
                    } else {
                        pool[0]
                    }
                }
            },
        };
        pool.retain(|&h| h != chosen);
        placements.push((team, chosen));
    }

    // Rewrite the tier's visitor slots: each assigned team moves into the
    // visitor seed paired with its chosen host.
    let host_to_visitor: FxHashMap<u32, u32> =
        tier_visitors.iter().map(|&(v, h)| (h, v)).collect();
    let original: FxHashMap<u32, (TeamId, bool)> = tier_visitors
        .iter()
        .map(|&(v, _)| {
            let slot = bracket.slot(v).expect("slot filled");
            (v, (slot.team, slot.champion))
        })
        .collect();
    let champion_of = |team: TeamId| {
        original.values().find(|(t, _)| *t == team).map(|(_, c)| *c).unwrap_or(false)
    };
    for (team, host_seed) in placements {
        let visitor_seed = host_to_visitor[&host_seed];
        let slot = result
            .slots
            .iter_mut()
            .find(|s| s.seed == visitor_seed)
            .expect("slot filled");
        slot.team = team;
        slot.champion = champion_of(team);
    }

    debug!(tier_lo = lo, tier_hi = hi, "regional reassignment complete");
    result
}
