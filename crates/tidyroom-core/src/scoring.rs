//! Session scoring engine.
//!
//! Maps (base points, reward tier, pass/fail) to a total point value and
//! bonus multiplier. The engine is a pure function over a fixed bonus
//! table; it holds no state and performs no I/O. Callers recompute a
//! session's totals through it on every relevant mutation.

use serde::{Deserialize, Serialize};

use crate::session::Tier;

/// Result of a scoring computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Total points after applying the tier bonus
    pub total_points: f64,
    /// `total_points / base_points`; 1.0 when no bonus applies
    pub bonus_multiplier: f64,
}

impl Score {
    fn flat(base_points: i64) -> Self {
        Self {
            total_points: base_points.max(0) as f64,
            bonus_multiplier: 1.0,
        }
    }
}

/// Tier/outcome bonus table.
///
/// Golden pays more than blue on a pass; a failed ceremony earns no
/// bonus at either tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusTable {
    pub blue_pass: f64,
    pub golden_pass: f64,
    pub blue_fail: f64,
    pub golden_fail: f64,
}

impl BonusTable {
    pub const fn standard() -> Self {
        Self {
            blue_pass: 1.5,
            golden_pass: 2.0,
            blue_fail: 1.0,
            golden_fail: 1.0,
        }
    }

    /// Multiplier for a judged ceremony at the given tier.
    /// `Tier::None` always maps to 1.0.
    pub fn multiplier(&self, tier: Tier, passed: bool) -> f64 {
        match (tier, passed) {
            (Tier::None, _) => 1.0,
            (Tier::Blue, true) => self.blue_pass,
            (Tier::Golden, true) => self.golden_pass,
            (Tier::Blue, false) => self.blue_fail,
            (Tier::Golden, false) => self.golden_fail,
        }
    }
}

impl Default for BonusTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Pure scoring engine over a bonus table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    table: BonusTable,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: BonusTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BonusTable {
        &self.table
    }

    /// Compute the total and multiplier for a judged session.
    ///
    /// Non-positive base points always yield `(0, 1)`; `Tier::None`
    /// yields `(base, 1)` regardless of the verdict.
    pub fn compute(&self, base_points: i64, tier: Tier, passed: bool) -> Score {
        if base_points <= 0 {
            return Score::flat(0);
        }
        if tier == Tier::None {
            return Score::flat(base_points);
        }

        let total = base_points as f64 * self.table.multiplier(tier, passed);
        Score {
            total_points: total,
            bonus_multiplier: total / base_points as f64,
        }
    }

    /// Score for a session whose ceremony is pending or skipped:
    /// totals collapse to the base with no bonus.
    pub fn unjudged(&self, base_points: i64) -> Score {
        Score::flat(base_points)
    }
}
