//! # apr_core - Deterministic Tennis Rating and Bracket Engine
//!
//! This library rates high-school tennis teams from dual-match results
//! and seeds playoff brackets from the ranking, with a JSON API for easy
//! integration into site generators and pipelines.
//!
//! ## Features
//! - 100% deterministic (same snapshot = same ranking, byte for byte)
//! - Flight-weighted power ratings with opponent-strength blending
//! - Head-to-head tiebreaks, champion-hosting brackets, travel-aware
//!   first-round pairing
//! - JSON API for easy integration

pub mod api;
pub mod engine;
pub mod error;
pub mod models;

// Re-export the main API surface
pub use api::{rank_season_json, RankRequest, RankResponse};
pub use engine::{
    rank_and_seed, CoordinateLookup, Diagnostic, Diagnostics, EngineConfig, GeoPoint,
    SeasonOutput, SeasonSnapshot,
};
pub use error::{EngineError, Result};
pub use models::{
    Bracket, BracketSize, DualMatch, DualOutcome, Flight, Gender, MatchRecord, RankedTeam,
    Ranking, Rating, TeamDirectory, TeamEntry, TeamId,
};

/// Crate version at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON request/response schema version accepted by [`rank_season_json`].
pub const SCHEMA_VERSION: u8 = 1;
