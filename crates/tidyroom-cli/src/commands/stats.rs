//! Streak and balance overview.

use chrono::Utc;
use serde::Serialize;
use tidyroom_core::{AreaRegistry, Database, ProgressState};

#[derive(Serialize)]
struct Stats {
    streak: u32,
    last_session_day: Option<String>,
    completed_today: usize,
    earned: i64,
    spent: i64,
    available: i64,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let registry = AreaRegistry::load(&db)?;
    let progress = ProgressState::load(&db)?;
    let earned = registry.total_earned();

    let stats = Stats {
        streak: progress.streak.count,
        last_session_day: progress.streak.last_session_day.map(|d| d.to_string()),
        completed_today: registry.completed_on(Utc::now().date_naive()),
        earned,
        spent: progress.ledger.spent_points,
        available: progress.ledger.available_balance(earned),
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
