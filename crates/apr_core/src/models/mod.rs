pub mod bracket;
pub mod flight;
pub mod match_record;
pub mod rating;
pub mod stats;
pub mod team;

pub use bracket::{Bracket, BracketSize, BracketSlot, Pairing, SlotRole};
pub use flight::Flight;
pub use match_record::{DualMatch, DualOutcome, MatchRecord};
pub use rating::{RankedTeam, Rating, Ranking};
pub use stats::{FlightTally, TeamSeasonStats};
pub use team::{Gender, TeamDirectory, TeamEntry, TeamId};
