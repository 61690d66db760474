//! Session ("bowl") types: tasks, verification state, and scoring glue.
//!
//! A bowl is one cleaning cycle for an area, from the opening photo to
//! completion. Bowls own their tasks exclusively and are never deleted
//! individually -- only through an area cascade.
//!
//! State invariants, maintained by every mutation path in this crate:
//! - `outcome == Pending` implies `requested == true`
//! - `outcome == Passed` implies `total_points >= base_points`
//! - `outcome` pending or skipped implies totals equal to the base and
//!   a multiplier of 1
//! - a bowl is completed iff it has at least one task and every task
//!   is completed
//! - at most one bowl per area is in progress at any time

pub mod completion;
pub mod lifecycle;
pub mod verification;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::scoring::ScoringEngine;

/// Requested reward level for a verification ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No reward tier requested
    #[default]
    None,
    /// Standard reward tier
    Blue,
    /// High-value reward tier, gated by the eligibility rule
    Golden,
}

impl Tier {
    /// Stable string form for the persistence boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Blue => "blue",
            Tier::Golden => "golden",
        }
    }

    /// Decode from the persisted string form. Unknown values are an
    /// error, never silently defaulted.
    pub fn parse(value: &str) -> Result<Self, StorageError> {
        match value {
            "none" => Ok(Tier::None),
            "blue" => Ok(Tier::Blue),
            "golden" => Ok(Tier::Golden),
            other => Err(StorageError::Corrupt {
                column: "tier".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Result of the verification sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Ceremony requested, verdict not yet applied
    Pending,
    /// Judge accepted the after photo
    Passed,
    /// Judge rejected the after photo
    Failed,
    /// No ceremony: the rest state, and the result of an explicit skip
    #[default]
    Skipped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pending => "pending",
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StorageError> {
        match value {
            "pending" => Ok(Outcome::Pending),
            "passed" => Ok(Outcome::Passed),
            "failed" => Ok(Outcome::Failed),
            "skipped" => Ok(Outcome::Skipped),
            other => Err(StorageError::Corrupt {
                column: "outcome".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Whether a verdict has been applied.
    pub fn is_judged(self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Failed)
    }
}

/// Verification sub-record of a bowl.
///
/// The default is the skipped rest state: nothing requested, no tier,
/// totals untouched. `Pending` exists only between a request and its
/// resolution, which keeps `Pending` implying `requested` at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Verification {
    pub requested: bool,
    pub tier: Tier,
    pub outcome: Outcome,
    pub requested_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// A single actionable item inside a bowl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub detail: Option<String>,
    /// Point value, never negative
    pub points: i64,
    /// Absent while the task is open. Completion is one-directional.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, points: i64) -> Self {
        Self {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            detail: None,
            points: points.max(0),
            completed_at: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// One cleaning cycle for an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bowl {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Stamped on the first transition into the completed state
    pub completed_at: Option<DateTime<Utc>>,
    pub verification: Verification,
    /// Sum of completed task points
    pub base_points: i64,
    pub bonus_multiplier: f64,
    /// Derived: recomputed through the scoring engine on every mutation
    pub total_points: f64,
    /// Reference to the opening photo, set at creation
    pub before_photo: String,
    pub after_photo: Option<String>,
    pub tasks: Vec<Task>,
}

impl Bowl {
    pub fn new(before_photo: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("bowl-{}", uuid::Uuid::new_v4()),
            created_at,
            completed_at: None,
            verification: Verification::default(),
            base_points: 0,
            bonus_multiplier: 1.0,
            total_points: 0.0,
            before_photo: before_photo.into(),
            after_photo: None,
            tasks: Vec::new(),
        }
    }

    /// A bowl is completed iff it has at least one task and every task
    /// is completed.
    pub fn is_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(Task::is_completed)
    }

    pub fn is_in_progress(&self) -> bool {
        !self.is_completed()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Recompute `total_points` and `bonus_multiplier` from the base
    /// and the current verification state.
    pub fn recompute_score(&mut self, engine: &ScoringEngine) {
        let score = match self.verification.outcome {
            Outcome::Passed => engine.compute(self.base_points, self.verification.tier, true),
            Outcome::Failed => engine.compute(self.base_points, self.verification.tier, false),
            Outcome::Pending | Outcome::Skipped => engine.unjudged(self.base_points),
        };
        self.total_points = score.total_points;
        self.bonus_multiplier = score.bonus_multiplier;
    }

    /// Whole-point contribution of this bowl to the earned total.
    pub fn earned_points(&self) -> i64 {
        self.total_points.round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bowl_with_tasks(points: &[i64]) -> Bowl {
        let mut bowl = Bowl::new("photo/before.jpg", Utc::now());
        for (i, p) in points.iter().enumerate() {
            bowl.tasks.push(Task::new(format!("Task {i}"), *p));
        }
        bowl
    }

    #[test]
    fn tier_and_outcome_string_roundtrip() {
        for tier in [Tier::None, Tier::Blue, Tier::Golden] {
            assert_eq!(Tier::parse(tier.as_str()).unwrap(), tier);
        }
        for outcome in [
            Outcome::Pending,
            Outcome::Passed,
            Outcome::Failed,
            Outcome::Skipped,
        ] {
            assert_eq!(Outcome::parse(outcome.as_str()).unwrap(), outcome);
        }
    }

    #[test]
    fn unknown_persisted_value_is_an_error_not_a_default() {
        assert!(Tier::parse("platinum").is_err());
        assert!(Outcome::parse("").is_err());
    }

    #[test]
    fn fresh_bowl_is_in_progress_and_unverified() {
        let bowl = bowl_with_tasks(&[5, 5]);
        assert!(bowl.is_in_progress());
        assert!(!bowl.verification.requested);
        assert_eq!(bowl.verification.outcome, Outcome::Skipped);
        assert_eq!(bowl.total_points, 0.0);
        assert_eq!(bowl.bonus_multiplier, 1.0);
    }

    #[test]
    fn empty_bowl_never_counts_as_completed() {
        let bowl = bowl_with_tasks(&[]);
        assert!(!bowl.is_completed());
    }

    #[test]
    fn completion_requires_every_task() {
        let mut bowl = bowl_with_tasks(&[5, 10]);
        bowl.tasks[0].completed_at = Some(Utc::now());
        assert!(!bowl.is_completed());
        bowl.tasks[1].completed_at = Some(Utc::now());
        assert!(bowl.is_completed());
    }

    #[test]
    fn recompute_collapses_pending_and_skipped_to_base() {
        let engine = ScoringEngine::new();
        let mut bowl = bowl_with_tasks(&[5]);
        bowl.base_points = 10;
        bowl.verification.requested = true;
        bowl.verification.outcome = Outcome::Pending;
        bowl.verification.tier = Tier::Golden;
        bowl.recompute_score(&engine);
        assert_eq!(bowl.total_points, 10.0);
        assert_eq!(bowl.bonus_multiplier, 1.0);

        bowl.verification.outcome = Outcome::Skipped;
        bowl.recompute_score(&engine);
        assert_eq!(bowl.total_points, 10.0);
        assert_eq!(bowl.bonus_multiplier, 1.0);
    }

    #[test]
    fn recompute_applies_bonus_on_pass() {
        let engine = ScoringEngine::new();
        let mut bowl = bowl_with_tasks(&[5]);
        bowl.base_points = 10;
        bowl.verification.requested = true;
        bowl.verification.tier = Tier::Blue;
        bowl.verification.outcome = Outcome::Passed;
        bowl.recompute_score(&engine);
        assert!(bowl.total_points >= bowl.base_points as f64);
        assert!(bowl.bonus_multiplier > 1.0);
    }

    #[test]
    fn task_points_are_clamped_to_non_negative() {
        let task = Task::new("Wipe counters", -3);
        assert_eq!(task.points, 0);
    }
}
