use serde::{Deserialize, Serialize};

use super::team::TeamId;

/// Supported bracket field sizes. Twelve uses first-round byes for the top
/// four seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketSize {
    Eight,
    Twelve,
    Sixteen,
}

impl BracketSize {
    pub fn field_size(&self) -> usize {
        match self {
            BracketSize::Eight => 8,
            BracketSize::Twelve => 12,
            BracketSize::Sixteen => 16,
        }
    }

    /// Seeds 1..=bye_cutoff skip the first round.
    pub fn bye_cutoff(&self) -> u32 {
        match self {
            BracketSize::Twelve => 4,
            _ => 0,
        }
    }

    /// Largest seed number that hosts a first-round match. This is also the
    /// target seed for league-champion home-game promotion.
    pub fn host_cutoff(&self) -> u32 {
        match self {
            BracketSize::Eight => 4,
            BracketSize::Twelve | BracketSize::Sixteen => 8,
        }
    }

    pub fn role_of(&self, seed: u32) -> SlotRole {
        if seed <= self.bye_cutoff() {
            SlotRole::Bye
        } else if seed <= self.host_cutoff() {
            SlotRole::Host
        } else {
            SlotRole::Visitor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotRole {
    /// Hosts a first-round match.
    Host,
    /// Skips the first round (12-team bracket top seeds).
    Bye,
    /// Travels for the first round.
    Visitor,
}

/// One seeded slot of the bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketSlot {
    pub seed: u32,
    pub team: TeamId,
    pub role: SlotRole,
    /// Auto-bid league champion, as opposed to an at-large entrant.
    pub champion: bool,
}

/// First-round pairing by seed number. The host side never moves during
/// same-league or geographic adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub host_seed: u32,
    pub visitor_seed: u32,
}

/// Finalized (or partially-unresolved) single-elimination bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bracket {
    pub size: BracketSize,
    /// Slots in seed order, seed 1 first. Every slot holds exactly one team
    /// and no team appears twice.
    pub slots: Vec<BracketSlot>,
    /// First-round pairings after all adjustments.
    pub pairings: Vec<Pairing>,
    /// Pairings left as same-league matchups after the 3-move rule ran out
    /// of candidates. Accepted policy, not a failure.
    pub unresolved_conflicts: Vec<Pairing>,
}

impl Bracket {
    pub fn slot(&self, seed: u32) -> Option<&BracketSlot> {
        self.slots.iter().find(|s| s.seed == seed)
    }

    pub fn team_at(&self, seed: u32) -> Option<TeamId> {
        self.slot(seed).map(|s| s.team)
    }
}
