//! Task completion.
//!
//! Completing a task stamps it, accrues its points into the owning
//! bowl's base, emits an analytics event, and recomputes the bowl's
//! totals. Points reach the spendable balance immediately (the earned
//! total is derived from bowl totals), independent of any later
//! verification outcome. The whole mutation persists in one write.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::area::Area;
use crate::error::{Result, SessionError};
use crate::events::{AnalyticsEvent, AnalyticsSink};
use crate::scoring::ScoringEngine;
use crate::services::ProgressionHook;
use crate::storage::Database;

/// Result of a completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOutcome {
    /// False when the task was already completed (idempotent no-op)
    pub newly_completed: bool,
    /// Whether the bowl is completed after this call
    pub session_completed: bool,
    pub base_points: i64,
    pub total_points: f64,
}

/// Applies task completions to a bowl.
pub struct TaskCompletionTracker<'a> {
    engine: ScoringEngine,
    sink: &'a dyn AnalyticsSink,
    hook: &'a dyn ProgressionHook,
}

impl<'a> TaskCompletionTracker<'a> {
    pub fn new(sink: &'a dyn AnalyticsSink, hook: &'a dyn ProgressionHook) -> Self {
        Self {
            engine: ScoringEngine::new(),
            sink,
            hook,
        }
    }

    /// Complete a task in the given bowl.
    ///
    /// Completing an already-completed task is a no-op: base points,
    /// totals, and the earned balance are left unchanged and nothing
    /// is emitted or persisted.
    pub fn complete_task(
        &self,
        db: &Database,
        area: &mut Area,
        bowl_id: &str,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let area_id = area.id.clone();
        let persona = area.persona;

        let (outcome, points, first_completion) = {
            let bowl = area
                .bowl_mut(bowl_id)
                .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;
            let already_completed = bowl
                .task(task_id)
                .ok_or_else(|| SessionError::TaskNotFound(task_id.to_string()))?
                .is_completed();

            if already_completed {
                return Ok(CompletionOutcome {
                    newly_completed: false,
                    session_completed: bowl.is_completed(),
                    base_points: bowl.base_points,
                    total_points: bowl.total_points,
                });
            }

            let task = bowl
                .task_mut(task_id)
                .ok_or_else(|| SessionError::TaskNotFound(task_id.to_string()))?;
            task.completed_at = Some(now);
            let points = task.points;
            bowl.base_points += points;
            bowl.recompute_score(&self.engine);

            let first_completion = bowl.is_completed() && bowl.completed_at.is_none();
            if first_completion {
                bowl.completed_at = Some(now);
            }

            (
                CompletionOutcome {
                    newly_completed: true,
                    session_completed: bowl.is_completed(),
                    base_points: bowl.base_points,
                    total_points: bowl.total_points,
                },
                points,
                first_completion,
            )
        };

        self.sink.record(&AnalyticsEvent::TaskCompleted {
            area_id: area_id.clone(),
            persona,
            points,
            weekday: now.weekday().num_days_from_sunday() as u8,
            hour: now.hour() as u8,
            at: now,
        });

        if first_completion {
            let bowl = area
                .bowl(bowl_id)
                .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;
            self.sink.record(&AnalyticsEvent::SessionCompleted {
                area_id: area_id.clone(),
                bowl_id: bowl.id.clone(),
                base_points: bowl.base_points,
                at: now,
            });
            self.hook.award_bonus(area);
        }

        let bowl = area
            .bowl(bowl_id)
            .ok_or_else(|| SessionError::SessionNotFound(bowl_id.to_string()))?;
        db.save_bowl(&area_id, bowl)?;

        Ok(outcome)
    }
}
