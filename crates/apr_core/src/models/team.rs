use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Stable team identifier, as assigned by the upstream data source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TeamId(pub u32);

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Boys,
    Girls,
}

/// One row of the classification/league metadata table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub city: String,
    /// Classification band, e.g. "6A".
    pub classification: String,
    /// League / conference name within the classification.
    pub league: String,
}

/// Metadata table keyed by team id. Teams that appear in match data but not
/// here are silently dropped during aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamDirectory {
    entries: FxHashMap<TeamId, TeamEntry>,
}

impl TeamDirectory {
    /// Build the directory, rejecting duplicate ids. A duplicated id means
    /// the upstream table is malformed, which is fatal before aggregation.
    pub fn new(rows: Vec<TeamEntry>) -> Result<Self> {
        let mut entries = FxHashMap::default();
        for row in rows {
            if entries.insert(row.id, row.clone()).is_some() {
                return Err(EngineError::DuplicateTeamId { id: row.id.0 });
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, id: TeamId) -> Option<&TeamEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: TeamId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn league_of(&self, id: TeamId) -> Option<&str> {
        self.entries.get(&id).map(|e| e.league.as_str())
    }
}
