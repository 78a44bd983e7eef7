//! Engine configuration.
//!
//! Every tunable the stages consult lives here instead of being hardcoded:
//! the schedule-strength blend, the power-index blend, tiebreak triggers,
//! bracket size, and the geographic reassignment tier. Defaults reproduce
//! the published APR formula.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::BracketSize;

/// Weighted blend producing the schedule-strength score.
///
/// Two documented formulas exist for this system and both are supported;
/// neither is silently collapsed into the other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleBlend {
    /// Two-term blend of wwp and owp. The published default is 0.35/0.65.
    TwoTerm { wwp: f64, owp: f64 },
    /// Three-term RPI-style blend adding the second-order opponents'
    /// opponent term. The documented variant is 0.25/0.50/0.25.
    ThreeTerm { wwp: f64, owp: f64, oowp: f64 },
}

impl ScheduleBlend {
    /// The original APR formula: 35% own results, 65% schedule.
    pub fn classic() -> Self {
        ScheduleBlend::TwoTerm { wwp: 0.35, owp: 0.65 }
    }

    /// RPI-style blend with the opponents' opponent term.
    pub fn rpi() -> Self {
        ScheduleBlend::ThreeTerm { wwp: 0.25, owp: 0.50, oowp: 0.25 }
    }

    /// Whether the third rating pass (oowp) is needed at all.
    pub fn uses_second_order(&self) -> bool {
        matches!(self, ScheduleBlend::ThreeTerm { .. })
    }

    fn weight_sum(&self) -> f64 {
        match *self {
            ScheduleBlend::TwoTerm { wwp, owp } => wwp + owp,
            ScheduleBlend::ThreeTerm { wwp, owp, oowp } => wwp + owp + oowp,
        }
    }
}

impl Default for ScheduleBlend {
    fn default() -> Self {
        Self::classic()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    pub schedule_blend: ScheduleBlend,
    /// Share of the power index taken by the normalized depth score; the
    /// rest is the schedule-strength score. Default is an equal split.
    pub depth_weight: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self { schedule_blend: ScheduleBlend::default(), depth_weight: 0.5 }
    }
}

/// How a single drawn head-to-head dual is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawnDualRule {
    /// Leave the rating order alone.
    #[default]
    Defer,
    /// Promote the team with the larger game differential in that dual.
    GameDifferential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiebreakConfig {
    /// Relative power-index gap below which an adjacent pair is examined.
    pub index_threshold: f64,
    /// Same-league pairs within this many standing positions are examined
    /// regardless of the index gap.
    pub league_window: usize,
    pub drawn_dual_rule: DrawnDualRule,
}

impl Default for TiebreakConfig {
    fn default() -> Self {
        Self { index_threshold: 0.02, league_window: 2, drawn_dual_rule: DrawnDualRule::Defer }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketConfig {
    pub size: BracketSize,
    /// Bounded retry count for same-league first-round pairings.
    pub max_swap_attempts: usize,
    /// Visitor seed range open to geographic reassignment, inclusive.
    /// Seeds outside it form the protected tier. `None` skips the
    /// regional stage entirely.
    pub regional_tier: Option<(u32, u32)>,
}

impl BracketConfig {
    pub fn for_size(size: BracketSize) -> Self {
        let first_visitor = size.host_cutoff() + 1;
        Self {
            size,
            max_swap_attempts: 3,
            regional_tier: Some((first_visitor, size.field_size() as u32)),
        }
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self::for_size(BracketSize::Sixteen)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub tiebreak: TiebreakConfig,
    /// Bracket construction is optional; ranking-only runs leave this unset.
    #[serde(default)]
    pub bracket: Option<BracketConfig>,
}

impl EngineConfig {
    /// Structural validation, run before aggregation. Weight mistakes here
    /// would silently skew every rating, so they are fatal.
    pub fn validate(&self) -> Result<()> {
        let sum = self.rating.schedule_blend.weight_sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(EngineError::InvalidConfig(format!(
                "schedule blend weights must sum to 1.0, got {sum}"
            )));
        }
        if !(0.0..=1.0).contains(&self.rating.depth_weight) {
            return Err(EngineError::InvalidConfig(format!(
                "depth_weight must be in [0,1], got {}",
                self.rating.depth_weight
            )));
        }
        if self.tiebreak.index_threshold < 0.0 {
            return Err(EngineError::InvalidConfig(
                "index_threshold must be non-negative".to_string(),
            ));
        }
        if let Some(bracket) = &self.bracket {
            if let Some((lo, hi)) = bracket.regional_tier {
                let field = bracket.size.field_size() as u32;
                if lo > hi || hi > field || lo <= bracket.size.host_cutoff() {
                    return Err(EngineError::InvalidConfig(format!(
                        "regional_tier {lo}..={hi} must lie inside the visitor tier"
                    )));
                }
            }
        }
        Ok(())
    }
}
