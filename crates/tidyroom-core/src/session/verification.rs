//! Verification ceremony for a bowl: tier eligibility, judging, and
//! terminal outcome application.
//!
//! The ceremony is optional. A bowl can be judged (pass/fail against a
//! before/after photo pair), skipped, or left pending until the caller
//! resolves it. Bonus points only exist through the scoring engine's
//! recompute, so applying an outcome can never double-credit: the
//! earned balance is derived from the current totals.

use chrono::{DateTime, NaiveDate, Utc};

use crate::area::Area;
use crate::error::{JudgeError, Result, SessionError};
use crate::events::{AnalyticsEvent, AnalyticsSink};
use crate::progress::ProgressState;
use crate::scoring::ScoringEngine;
use crate::services::VerificationJudge;
use crate::session::{Outcome, Tier};
use crate::storage::Database;

/// Caller's decision for a pending ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingResolution {
    /// No tier: the ceremony is recorded as failed with no bonus
    Decline,
    /// Blue tier pass
    Blue,
    /// Golden tier pass; only selectable while eligible
    Golden,
}

/// Result of applying a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalizeOutcome {
    /// Bonus over the base, floored at zero
    pub bonus_delta: f64,
    /// True the first time this bowl reached a verified state
    pub first_verification: bool,
    pub total_points: f64,
}

/// Manages the verification sub-flow of a session.
pub struct VerificationCoordinator<'a> {
    engine: ScoringEngine,
    judge: &'a dyn VerificationJudge,
    sink: &'a dyn AnalyticsSink,
    daily_target: u32,
}

impl<'a> VerificationCoordinator<'a> {
    pub fn new(judge: &'a dyn VerificationJudge, sink: &'a dyn AnalyticsSink, daily_target: u32) -> Self {
        Self {
            engine: ScoringEngine::new(),
            judge,
            sink,
            daily_target,
        }
    }

    /// Deterministic golden-tier eligibility: enough days since the
    /// last passed ceremony, or the day's target not yet met. No prior
    /// pass counts as infinitely many days.
    pub fn golden_eligible(
        &self,
        progress: &ProgressState,
        completed_today: usize,
        today: NaiveDate,
    ) -> bool {
        let days_ok = progress
            .days_since_last_passed(today)
            .map(|days| days >= 3)
            .unwrap_or(true);
        days_ok || (completed_today as i64) < i64::from(self.daily_target)
    }

    /// Mark the ceremony as requested. Idempotent; moves a rest-state
    /// bowl to pending without touching a judged outcome.
    pub fn request(
        &self,
        db: &Database,
        area: &mut Area,
        bowl_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let area_id = area.id.clone();
        let bowl = area
            .bowl_mut(bowl_id)
            .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;

        if !bowl.verification.requested {
            bowl.verification.requested = true;
            bowl.verification.requested_at = Some(now);
        }
        if bowl.verification.outcome == Outcome::Skipped {
            bowl.verification.outcome = Outcome::Pending;
        }
        bowl.recompute_score(&self.engine);
        db.save_bowl(&area_id, bowl)?;
        Ok(())
    }

    /// Apply a terminal outcome to the bowl.
    ///
    /// Marks the ceremony requested if it wasn't, records the verdict,
    /// stamps the verification time, recomputes totals, and persists.
    /// One-shot side effects (the analytics event) fire only on the
    /// first verification of the bowl; re-finalizing recomputes totals
    /// in place and the derived earned balance follows them.
    pub fn finalize(
        &self,
        db: &Database,
        area: &mut Area,
        progress: &mut ProgressState,
        bowl_id: &str,
        tier: Tier,
        passed: bool,
        after_photo: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let area_id = area.id.clone();
        let bowl = area
            .bowl_mut(bowl_id)
            .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;

        if !bowl.verification.requested {
            bowl.verification.requested = true;
            bowl.verification.requested_at = Some(now);
        }
        let was_verified = bowl.verification.verified_at.is_some();

        bowl.verification.tier = tier;
        bowl.verification.outcome = if passed { Outcome::Passed } else { Outcome::Failed };
        bowl.verification.verified_at = Some(now);
        if let Some(photo) = after_photo {
            bowl.after_photo = Some(photo.to_string());
        }
        bowl.recompute_score(&self.engine);

        let bonus_delta = (bowl.total_points - bowl.base_points as f64).max(0.0);
        let outcome = FinalizeOutcome {
            bonus_delta,
            first_verification: !was_verified,
            total_points: bowl.total_points,
        };

        if !was_verified {
            self.sink.record(&AnalyticsEvent::VerificationFinalized {
                area_id: area_id.clone(),
                bowl_id: bowl.id.clone(),
                tier,
                outcome: bowl.verification.outcome,
                total_points: bowl.total_points,
                at: now,
            });
        }

        db.save_bowl(&area_id, bowl)?;

        if passed {
            progress.last_passed_verification = Some(now.date_naive());
            progress.save(db)?;
        }

        Ok(outcome)
    }

    /// Judge the bowl against its before photo and the supplied after
    /// photo, then finalize with the verdict.
    ///
    /// A judge failure surfaces as an error and leaves the bowl
    /// untouched.
    pub async fn submit(
        &self,
        db: &Database,
        area: &mut Area,
        progress: &mut ProgressState,
        bowl_id: &str,
        tier: Tier,
        after_photo: &str,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let before_photo = {
            let bowl = area
                .bowl(bowl_id)
                .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;
            if bowl.before_photo.is_empty() {
                return Err(JudgeError::InvalidPhotoData.into());
            }
            bowl.before_photo.clone()
        };

        let passed = self.judge.judge(&before_photo, after_photo).await?;
        self.finalize(
            db,
            area,
            progress,
            bowl_id,
            tier,
            passed,
            Some(after_photo),
            now,
        )
    }

    /// Decline the ceremony: back to the rest state, totals collapse
    /// to the base.
    pub fn skip(&self, db: &Database, area: &mut Area, bowl_id: &str) -> Result<()> {
        let area_id = area.id.clone();
        let bowl = area
            .bowl_mut(bowl_id)
            .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;

        bowl.verification.requested = false;
        bowl.verification.outcome = Outcome::Skipped;
        bowl.recompute_score(&self.engine);
        db.save_bowl(&area_id, bowl)?;
        Ok(())
    }

    /// Resolve a pending ceremony with the caller's tier decision.
    /// Golden is gated by the eligibility rule.
    pub fn resolve_pending(
        &self,
        db: &Database,
        area: &mut Area,
        progress: &mut ProgressState,
        bowl_id: &str,
        resolution: PendingResolution,
        completed_today: usize,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome> {
        let (tier, passed) = match resolution {
            PendingResolution::Decline => (Tier::None, false),
            PendingResolution::Blue => (Tier::Blue, true),
            PendingResolution::Golden => {
                if !self.golden_eligible(progress, completed_today, now.date_naive()) {
                    return Err(SessionError::GoldenNotEligible.into());
                }
                (Tier::Golden, true)
            }
        };
        self.finalize(db, area, progress, bowl_id, tier, passed, None, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::Persona;
    use crate::events::test_support::RecordingSink;
    use crate::session::{Bowl, Task};
    use async_trait::async_trait;
    use chrono::Duration;

    struct StaticJudge(bool);

    #[async_trait]
    impl VerificationJudge for StaticJudge {
        async fn judge(&self, _before: &str, _after: &str) -> Result<bool, JudgeError> {
            Ok(self.0)
        }
    }

    struct BrokenJudge;

    #[async_trait]
    impl VerificationJudge for BrokenJudge {
        async fn judge(&self, _before: &str, _after: &str) -> Result<bool, JudgeError> {
            Err(JudgeError::JudgingFailed("model offline".to_string()))
        }
    }

    fn setup(base_points: i64) -> (Database, Area, String, ProgressState) {
        let db = Database::open_memory().unwrap();
        let mut area = Area::new("Kitchen", "pot", "#ff8800", Persona::Cheer);
        let mut bowl = Bowl::new("before.jpg", Utc::now());
        let mut task = Task::new("Everything", base_points);
        task.completed_at = Some(Utc::now());
        bowl.tasks.push(task);
        bowl.base_points = base_points;
        bowl.total_points = base_points as f64;
        bowl.completed_at = Some(Utc::now());
        let bowl_id = bowl.id.clone();
        area.bowls.push(bowl);
        db.insert_area(&area).unwrap();
        db.save_bowl(&area.id, &area.bowls[0]).unwrap();
        (db, area, bowl_id, ProgressState::default())
    }

    #[test]
    fn eligibility_scenario_a_old_pass_and_open_quota() {
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 1);
        let today = Utc::now().date_naive();
        let mut progress = ProgressState::default();
        progress.last_passed_verification = Some(today - Duration::days(5));

        assert!(coord.golden_eligible(&progress, 0, today));
    }

    #[test]
    fn eligibility_scenario_b_recent_pass_and_quota_met() {
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 1);
        let today = Utc::now().date_naive();
        let mut progress = ProgressState::default();
        progress.last_passed_verification = Some(today - Duration::days(1));

        assert!(!coord.golden_eligible(&progress, 1, today));
    }

    #[test]
    fn no_prior_pass_is_always_eligible() {
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 0);
        assert!(coord.golden_eligible(&ProgressState::default(), 99, Utc::now().date_naive()));
    }

    #[test]
    fn request_moves_rest_state_to_pending() {
        let (db, mut area, bowl_id, _) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        coord.request(&db, &mut area, &bowl_id, Utc::now()).unwrap();
        let v = &area.bowls[0].verification;
        assert!(v.requested);
        assert_eq!(v.outcome, Outcome::Pending);
        assert!(v.requested_at.is_some());
        // Pending keeps totals collapsed
        assert_eq!(area.bowls[0].total_points, 10.0);
        assert_eq!(area.bowls[0].bonus_multiplier, 1.0);
    }

    #[test]
    fn finalize_pass_applies_bonus_and_records_the_day() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let now = Utc::now();
        let outcome = coord
            .finalize(
                &db, &mut area, &mut progress, &bowl_id, Tier::Blue, true, None, now,
            )
            .unwrap();

        assert!(outcome.first_verification);
        assert_eq!(outcome.total_points, 15.0);
        assert_eq!(outcome.bonus_delta, 5.0);
        assert!(area.bowls[0].total_points >= area.bowls[0].base_points as f64);
        assert!(area.bowls[0].verification.requested);
        assert_eq!(progress.last_passed_verification, Some(now.date_naive()));
        assert_eq!(sink.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn finalize_fail_earns_no_bonus() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let outcome = coord
            .finalize(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                Tier::Golden,
                false,
                None,
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.bonus_delta, 0.0);
        assert_eq!(area.bowls[0].total_points, 10.0);
        assert!(progress.last_passed_verification.is_none());
    }

    #[test]
    fn refinalize_is_not_a_first_verification() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let now = Utc::now();
        let first = coord
            .finalize(
                &db, &mut area, &mut progress, &bowl_id, Tier::Blue, true, None, now,
            )
            .unwrap();
        let second = coord
            .finalize(
                &db, &mut area, &mut progress, &bowl_id, Tier::Golden, true, None, now,
            )
            .unwrap();

        assert!(first.first_verification);
        assert!(!second.first_verification);
        // One-shot event only
        assert_eq!(sink.events.lock().unwrap().len(), 1);
        // Totals follow the latest outcome
        assert_eq!(area.bowls[0].total_points, 20.0);
    }

    #[tokio::test]
    async fn submit_pass_goes_through_the_judge() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let outcome = coord
            .submit(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                Tier::Blue,
                "after.jpg",
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.total_points, 15.0);
        assert_eq!(area.bowls[0].after_photo.as_deref(), Some("after.jpg"));
        assert_eq!(area.bowls[0].verification.outcome, Outcome::Passed);
    }

    #[tokio::test]
    async fn judge_failure_leaves_the_bowl_untouched() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = BrokenJudge;
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let before = area.bowls[0].clone();
        let err = coord
            .submit(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                Tier::Blue,
                "after.jpg",
                Utc::now(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::error::CoreError::Judge(JudgeError::JudgingFailed(_))
        ));
        assert_eq!(area.bowls[0], before);
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_without_before_photo_is_invalid() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        area.bowls[0].before_photo.clear();
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        let err = coord
            .submit(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                Tier::Blue,
                "after.jpg",
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Judge(JudgeError::InvalidPhotoData)
        ));
    }

    #[test]
    fn skip_collapses_to_the_rest_state() {
        let (db, mut area, bowl_id, _) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        coord.request(&db, &mut area, &bowl_id, Utc::now()).unwrap();
        coord.skip(&db, &mut area, &bowl_id).unwrap();

        let bowl = &area.bowls[0];
        assert!(!bowl.verification.requested);
        assert_eq!(bowl.verification.outcome, Outcome::Skipped);
        assert_eq!(bowl.total_points, 10.0);
        assert_eq!(bowl.bonus_multiplier, 1.0);
    }

    #[test]
    fn resolve_pending_golden_is_gated_by_eligibility() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let today = Utc::now().date_naive();
        progress.last_passed_verification = Some(today - Duration::days(1));
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 1);

        coord.request(&db, &mut area, &bowl_id, Utc::now()).unwrap();
        let err = coord
            .resolve_pending(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                PendingResolution::Golden,
                1,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Session(SessionError::GoldenNotEligible)
        ));
        // Gating happens before any mutation
        assert_eq!(area.bowls[0].verification.outcome, Outcome::Pending);

        let outcome = coord
            .resolve_pending(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                PendingResolution::Blue,
                1,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome.total_points, 15.0);
    }

    #[test]
    fn resolve_pending_decline_records_a_failed_no_tier_ceremony() {
        let (db, mut area, bowl_id, mut progress) = setup(10);
        let sink = RecordingSink::default();
        let judge = StaticJudge(true);
        let coord = VerificationCoordinator::new(&judge, &sink, 3);

        coord.request(&db, &mut area, &bowl_id, Utc::now()).unwrap();
        let outcome = coord
            .resolve_pending(
                &db,
                &mut area,
                &mut progress,
                &bowl_id,
                PendingResolution::Decline,
                0,
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.total_points, 10.0);
        assert_eq!(area.bowls[0].verification.tier, Tier::None);
        assert_eq!(area.bowls[0].verification.outcome, Outcome::Failed);
    }
}
