//! Session lifecycle commands.

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use tidyroom_core::{
    AreaRegistry, Config, Database, NullProgression, NullSink, ProgressState,
    SessionLifecycleController, TaskCompletionTracker,
};

use crate::oracles::BuiltinTaskSource;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start (or extend) a session from a photo scan
    Start {
        /// Area ID
        area_id: String,
        /// Path or URI of the "before" photo
        #[arg(long)]
        photo: Option<String>,
        /// Optional generation filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show the current session for an area
    Status {
        /// Area ID
        area_id: String,
    },
    /// Complete a task in the area's open session
    Complete {
        /// Area ID
        area_id: String,
        /// Task ID
        task_id: String,
    },
}

#[derive(Serialize)]
struct TaskView {
    id: String,
    title: String,
    points: i64,
    completed: bool,
}

#[derive(Serialize)]
struct SessionView {
    bowl_id: String,
    completed: bool,
    base_points: i64,
    total_points: f64,
    verification: String,
    tasks: Vec<TaskView>,
}

pub async fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut registry = AreaRegistry::load(&db)?;
    let mut progress = ProgressState::load(&db)?;

    match action {
        SessionAction::Start {
            area_id,
            photo,
            filter,
        } => {
            let generator = BuiltinTaskSource;
            let sink = NullSink;
            let controller =
                SessionLifecycleController::new(&generator, &sink, config.session.daily_target);
            let start = controller
                .start_session(
                    &db,
                    &mut registry,
                    &mut progress,
                    &area_id,
                    photo.as_deref(),
                    filter.as_deref(),
                    Utc::now(),
                )
                .await?;

            println!(
                "started {} ({:?}, {} tasks)",
                start.bowl_id, start.mode, start.tasks_added
            );
            for warning in &start.warnings {
                eprintln!("warning: {warning}");
            }
        }
        SessionAction::Status { area_id } => {
            let area = registry.area(&area_id)?;
            match area.bowls.last() {
                Some(bowl) => {
                    let view = SessionView {
                        bowl_id: bowl.id.clone(),
                        completed: bowl.is_completed(),
                        base_points: bowl.base_points,
                        total_points: bowl.total_points,
                        verification: format!(
                            "{}{}",
                            bowl.verification.outcome.as_str(),
                            if bowl.verification.requested {
                                " (requested)"
                            } else {
                                ""
                            }
                        ),
                        tasks: bowl
                            .tasks
                            .iter()
                            .map(|t| TaskView {
                                id: t.id.clone(),
                                title: t.title.clone(),
                                points: t.points,
                                completed: t.is_completed(),
                            })
                            .collect(),
                    };
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                None => println!("no sessions for {area_id}"),
            }
        }
        SessionAction::Complete { area_id, task_id } => {
            let bowl_id = registry
                .area(&area_id)?
                .in_progress_bowl()
                .map(|b| b.id.clone())
                .ok_or("no open session for this area")?;

            let sink = NullSink;
            let hook = NullProgression;
            let tracker = TaskCompletionTracker::new(&sink, &hook);
            let area = registry.area_mut(&area_id)?;
            let outcome = tracker.complete_task(&db, area, &bowl_id, &task_id, Utc::now())?;

            if !outcome.newly_completed {
                println!("task was already completed");
            } else if outcome.session_completed {
                println!(
                    "session completed: {} base points ({} total)",
                    outcome.base_points, outcome.total_points
                );
            } else {
                println!("task completed: {} base points so far", outcome.base_points);
            }
        }
    }
    Ok(())
}
