//! Analytics events emitted by the core.
//!
//! Every scoring-relevant mutation produces an event. Delivery is
//! fire-and-forget: sinks get a reference, may do what they like with
//! it, and are never allowed to fail the operation that emitted it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::area::Persona;
use crate::session::lifecycle::EntryMode;
use crate::session::{Outcome, Tier};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnalyticsEvent {
    SessionStarted {
        area_id: String,
        bowl_id: String,
        mode: EntryMode,
        task_count: usize,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        area_id: String,
        persona: Persona,
        points: i64,
        /// 0 = Sunday .. 6 = Saturday
        weekday: u8,
        /// 0..=23
        hour: u8,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        area_id: String,
        bowl_id: String,
        base_points: i64,
        at: DateTime<Utc>,
    },
    VerificationFinalized {
        area_id: String,
        bowl_id: String,
        tier: Tier,
        outcome: Outcome,
        total_points: f64,
        at: DateTime<Utc>,
    },
}

/// Receiver for analytics events. Best-effort: implementations must not
/// block or propagate failures to the caller.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, _event: &AnalyticsEvent) {}
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {}
