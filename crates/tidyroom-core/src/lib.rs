//! # Tidyroom Core Library
//!
//! This library provides the core business logic for Tidyroom: bounded
//! cleaning sessions ("bowls") tracked against user-defined areas, with
//! a scoring engine, a spendable points economy, and a calendar-day
//! streak. The CLI binary is a thin adapter over this library; nothing
//! here depends on a presentation layer.
//!
//! ## Architecture
//!
//! - **Session lifecycle**: entry-mode decision, gating, and creation
//!   with graceful degradation when task generation is unavailable
//! - **Scoring**: pure tier/outcome bonus table recomputed on every
//!   relevant mutation
//! - **Progress**: durable streak and ledger scalars with explicit
//!   load/save
//! - **Storage**: SQLite persistence and TOML configuration
//! - **Services**: trait seams for the external task-generation and
//!   photo-judging oracles
//!
//! ## Key Components
//!
//! - [`SessionLifecycleController`]: decides whether and how sessions start
//! - [`TaskCompletionTracker`]: applies task completions and accrues points
//! - [`VerificationCoordinator`]: the optional pass/fail ceremony
//! - [`ScoringEngine`]: pure point computation
//! - [`AreaRegistry`]: CRUD owner of areas and their sessions
//! - [`Database`] / [`Config`]: persistence and configuration

pub mod area;
pub mod error;
pub mod events;
pub mod progress;
pub mod scoring;
pub mod services;
pub mod session;
pub mod storage;

pub use area::{Area, AreaRegistry, Persona};
pub use error::{
    ConfigError, CoreError, JudgeError, LedgerError, Result, ServiceError, SessionError,
    StorageError,
};
pub use events::{AnalyticsEvent, AnalyticsSink, NullSink};
pub use progress::{PointsLedger, ProgressState, StreakState};
pub use scoring::{BonusTable, Score, ScoringEngine};
pub use services::{
    GeneratedTasks, NullProgression, ProgressionHook, TaskGenerationService, VerificationJudge,
};
pub use session::completion::{CompletionOutcome, TaskCompletionTracker};
pub use session::lifecycle::{
    EntryMode, SessionLifecycleController, SessionStart, DEFAULT_TASK_POINTS,
    FALLBACK_TASK_TITLES, MAX_TASKS_PER_BATCH,
};
pub use session::verification::{FinalizeOutcome, PendingResolution, VerificationCoordinator};
pub use session::{Bowl, Outcome, Task, Tier, Verification};
pub use storage::{Config, Database};
