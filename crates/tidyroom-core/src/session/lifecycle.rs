//! Session lifecycle orchestration.
//!
//! Decides whether a session may start, which entry mode applies, and
//! ties task generation, persistence, the streak, and analytics
//! together. Gating runs before any mutation; an advisory generation
//! failure degrades to a fixed fallback task set and a warning, while
//! gating failures abort cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::area::{Area, AreaRegistry};
use crate::error::{Result, SessionError};
use crate::events::{AnalyticsEvent, AnalyticsSink};
use crate::progress::ProgressState;
use crate::services::TaskGenerationService;
use crate::session::{Bowl, Task};
use crate::storage::Database;

/// Hard cap on tasks added per creation or extension.
pub const MAX_TASKS_PER_BATCH: usize = 5;

/// Point value assigned to generated and fallback tasks.
pub const DEFAULT_TASK_POINTS: i64 = 5;

/// Generic titles used when task generation fails.
pub const FALLBACK_TASK_TITLES: [&str; 3] = [
    "Pick up anything on the floor",
    "Wipe down the surfaces",
    "Put things back where they belong",
];

/// How a session start enters an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// First scan of the area: create a session and its vision artifact
    DreamVision,
    /// An in-progress session exists: extend it with new tasks
    AppendTasks,
    /// Known area, nothing in progress: create a task-only session
    TasksOnlyNewSession,
}

/// Result of a session start, including any advisory warnings that
/// accompanied a degraded-but-successful run.
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub bowl_id: String,
    pub mode: EntryMode,
    pub tasks_added: usize,
    pub warnings: Vec<String>,
}

/// Top-level orchestrator for session starts.
pub struct SessionLifecycleController<'a> {
    generator: &'a dyn TaskGenerationService,
    sink: &'a dyn AnalyticsSink,
    daily_target: u32,
}

impl<'a> SessionLifecycleController<'a> {
    pub fn new(
        generator: &'a dyn TaskGenerationService,
        sink: &'a dyn AnalyticsSink,
        daily_target: u32,
    ) -> Self {
        Self {
            generator,
            sink,
            daily_target,
        }
    }

    /// Entry-mode decision for an area. Pure.
    pub fn entry_mode(area: &Area) -> EntryMode {
        if area.vision.is_none() {
            EntryMode::DreamVision
        } else if area.in_progress_bowl().is_some() {
            EntryMode::AppendTasks
        } else {
            EntryMode::TasksOnlyNewSession
        }
    }

    /// Start or extend a session for the area.
    ///
    /// Gating failures (`KitchenClosed`, `SessionAlreadyActive`,
    /// `PhotoRequired`) abort before any mutation. Task-generation
    /// failures never abort: the fixed fallback titles are used and a
    /// warning is attached to the successful result.
    pub async fn start_session(
        &self,
        db: &Database,
        registry: &mut AreaRegistry,
        progress: &mut ProgressState,
        area_id: &str,
        photo: Option<&str>,
        filter_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionStart> {
        let completed_today = registry.completed_on(now.date_naive());
        if self.daily_target == 0 || completed_today >= self.daily_target as usize {
            return Err(SessionError::KitchenClosed {
                completed_today,
                daily_target: self.daily_target,
            }
            .into());
        }

        let area = registry.area_mut(area_id)?;
        let mode = Self::entry_mode(area);

        if mode != EntryMode::AppendTasks && area.in_progress_bowl().is_some() {
            return Err(SessionError::SessionAlreadyActive {
                area_id: area.id.clone(),
            }
            .into());
        }

        let photo = photo.ok_or(SessionError::PhotoRequired)?;

        let mut warnings = Vec::new();
        let (titles, image) = match self.generator.generate(photo, area.persona, filter_id).await {
            Ok(generated) if !generated.titles.is_empty() => (generated.titles, generated.image),
            Ok(_) => {
                tracing::warn!(area = %area.id, "task generation returned no tasks, using fallback titles");
                warnings.push("Task generation returned no tasks; using a generic list.".to_string());
                (fallback_titles(), None)
            }
            Err(err) => {
                tracing::warn!(area = %area.id, error = %err, "task generation failed, using fallback titles");
                warnings.push(format!("Task generation unavailable ({err}); using a generic list."));
                (fallback_titles(), None)
            }
        };

        let tasks: Vec<Task> = titles
            .into_iter()
            .take(MAX_TASKS_PER_BATCH)
            .map(|title| Task::new(title, DEFAULT_TASK_POINTS))
            .collect();
        let tasks_added = tasks.len();

        let bowl_id = match mode {
            EntryMode::AppendTasks => {
                let area_id = area.id.clone();
                let bowl = area
                    .in_progress_bowl_mut()
                    .ok_or_else(|| SessionError::SessionNotFound(area_id.clone()))?;
                bowl.tasks.extend(tasks);
                db.save_bowl(&area_id, bowl)?;
                bowl.id.clone()
            }
            EntryMode::DreamVision | EntryMode::TasksOnlyNewSession => {
                let mut bowl = Bowl::new(photo, now);
                bowl.tasks = tasks;

                let vision = if mode == EntryMode::DreamVision {
                    Some(image.unwrap_or_else(|| area.persona.default_scene().to_string()))
                } else {
                    None
                };
                db.create_session(&area.id, &bowl, vision.as_deref())?;
                if let Some(vision) = vision {
                    area.vision = Some(vision);
                }

                progress.streak.record_session_start(now);
                progress.save(db)?;

                let bowl_id = bowl.id.clone();
                area.bowls.push(bowl);
                bowl_id
            }
        };

        if mode != EntryMode::AppendTasks {
            self.sink.record(&AnalyticsEvent::SessionStarted {
                area_id: area.id.clone(),
                bowl_id: bowl_id.clone(),
                mode,
                task_count: tasks_added,
                at: now,
            });
        }

        Ok(SessionStart {
            bowl_id,
            mode,
            tasks_added,
            warnings,
        })
    }
}

fn fallback_titles() -> Vec<String> {
    FALLBACK_TASK_TITLES.iter().map(|t| t.to_string()).collect()
}
