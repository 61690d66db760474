//! Trait seams for the external collaborators the core consumes.
//!
//! Task/image generation and photo judging are opaque oracles: the core
//! defines their contracts and failure semantics, never their
//! implementations. Generation is advisory (failure degrades to a
//! fallback), judging is required (failure aborts with no mutation).

use async_trait::async_trait;

use crate::area::{Area, Persona};
use crate::error::{JudgeError, ServiceError};

/// Payload returned by a task-generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedTasks {
    pub titles: Vec<String>,
    /// Optional generated image artifact reference
    pub image: Option<String>,
}

/// Best-effort generator of task titles (and optionally a scene image)
/// from an area photo.
#[async_trait]
pub trait TaskGenerationService: Send + Sync {
    async fn generate(
        &self,
        photo: &str,
        persona: Persona,
        filter_id: Option<&str>,
    ) -> Result<GeneratedTasks, ServiceError>;
}

/// Binary judge over a before/after photo pair. Required for the
/// judging path; the session is untouched when it errors.
#[async_trait]
pub trait VerificationJudge: Send + Sync {
    async fn judge(&self, before_photo: &str, after_photo: &str) -> Result<bool, JudgeError>;
}

/// One-shot hook invoked on a session's first transition into the
/// completed state. Fire-and-forget.
pub trait ProgressionHook: Send + Sync {
    fn award_bonus(&self, _area: &Area) {}
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgression;

impl ProgressionHook for NullProgression {}
