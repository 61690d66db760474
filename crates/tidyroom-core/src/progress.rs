//! Durable progress scalars: the calendar-day streak, the points
//! ledger, and the last-passed-verification marker.
//!
//! These are process-durable values backed by the database kv store,
//! loaded and saved explicitly -- mutating a field here never writes
//! to disk on its own.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::storage::Database;

const KV_STREAK_COUNT: &str = "streak.count";
const KV_STREAK_LAST_DAY: &str = "streak.last_day";
const KV_POINTS_SPENT: &str = "points.spent";
const KV_POINTS_REWARDS: &str = "points.rewards";
const KV_LAST_PASSED: &str = "verify.last_passed";

const DAY_FMT: &str = "%Y-%m-%d";

/// Day-granular consecutive-session streak counter.
///
/// The counter advances when a session starts on a calendar day that
/// differs from the last recorded one; it compares dates, not a rolling
/// 24-hour window, and is touched at most once per session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreakState {
    pub count: u32,
    pub last_session_day: Option<NaiveDate>,
}

impl StreakState {
    /// Record a session start. Returns true when the streak advanced.
    pub fn record_session_start(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if self.last_session_day == Some(today) {
            return false;
        }
        self.count += 1;
        self.last_session_day = Some(today);
        true
    }
}

/// Spendable points economy.
///
/// Earned points are not stored here: they are derived by summing bowl
/// totals (see `AreaRegistry::total_earned`). The ledger tracks only
/// what has been spent and which rewards were unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PointsLedger {
    pub spent_points: i64,
    pub unlocked_rewards: BTreeSet<String>,
}

impl PointsLedger {
    /// Spendable balance given the derived earned total.
    pub fn available_balance(&self, total_earned: i64) -> i64 {
        (total_earned - self.spent_points).max(0)
    }

    /// Spend `cost` points to unlock `reward_id`. No partial spends:
    /// either the whole cost is covered or nothing changes.
    pub fn spend(
        &mut self,
        cost: i64,
        reward_id: impl Into<String>,
        total_earned: i64,
    ) -> Result<(), LedgerError> {
        let available = self.available_balance(total_earned);
        if available < cost {
            return Err(LedgerError::InsufficientPoints { cost, available });
        }
        self.spent_points += cost;
        self.unlocked_rewards.insert(reward_id.into());
        Ok(())
    }
}

/// Aggregate of all durable progress scalars, with explicit load/save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressState {
    pub streak: StreakState,
    pub ledger: PointsLedger,
    /// Day of the most recent passed verification; drives golden
    /// eligibility. Absent means no pass has ever happened.
    pub last_passed_verification: Option<NaiveDate>,
}

impl ProgressState {
    /// Load from the kv store, defaulting absent keys.
    pub fn load(db: &Database) -> Result<Self> {
        let count = match db.kv_get(KV_STREAK_COUNT)? {
            Some(v) => v.parse::<u32>().unwrap_or(0),
            None => 0,
        };
        let last_session_day = db
            .kv_get(KV_STREAK_LAST_DAY)?
            .and_then(|v| NaiveDate::parse_from_str(&v, DAY_FMT).ok());
        let spent_points = match db.kv_get(KV_POINTS_SPENT)? {
            Some(v) => v.parse::<i64>().unwrap_or(0),
            None => 0,
        };
        let unlocked_rewards = match db.kv_get(KV_POINTS_REWARDS)? {
            Some(v) => serde_json::from_str(&v)?,
            None => BTreeSet::new(),
        };
        let last_passed_verification = db
            .kv_get(KV_LAST_PASSED)?
            .and_then(|v| NaiveDate::parse_from_str(&v, DAY_FMT).ok());

        Ok(Self {
            streak: StreakState {
                count,
                last_session_day,
            },
            ledger: PointsLedger {
                spent_points,
                unlocked_rewards,
            },
            last_passed_verification,
        })
    }

    /// Persist every scalar in one transaction.
    pub fn save(&self, db: &Database) -> Result<()> {
        let mut entries = vec![
            (KV_STREAK_COUNT, self.streak.count.to_string()),
            (KV_POINTS_SPENT, self.ledger.spent_points.to_string()),
            (
                KV_POINTS_REWARDS,
                serde_json::to_string(&self.ledger.unlocked_rewards)?,
            ),
        ];
        if let Some(day) = self.streak.last_session_day {
            entries.push((KV_STREAK_LAST_DAY, day.format(DAY_FMT).to_string()));
        }
        if let Some(day) = self.last_passed_verification {
            entries.push((KV_LAST_PASSED, day.format(DAY_FMT).to_string()));
        }
        db.kv_set_many(&entries)?;
        Ok(())
    }

    /// Days since the last passed verification, unbounded when no pass
    /// exists.
    pub fn days_since_last_passed(&self, today: NaiveDate) -> Option<i64> {
        self.last_passed_verification
            .map(|day| (today - day).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn first_session_start_begins_the_streak() {
        let mut streak = StreakState::default();
        assert!(streak.record_session_start(at(2025, 3, 1, 9)));
        assert_eq!(streak.count, 1);
        assert_eq!(
            streak.last_session_day,
            Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        );
    }

    #[test]
    fn same_day_counts_once() {
        let mut streak = StreakState::default();
        assert!(streak.record_session_start(at(2025, 3, 1, 9)));
        assert!(!streak.record_session_start(at(2025, 3, 1, 21)));
        assert_eq!(streak.count, 1);
    }

    #[test]
    fn calendar_day_not_rolling_window() {
        let mut streak = StreakState::default();
        // 23:30 and 00:30 the next day are under an hour apart but on
        // different calendar days.
        streak.record_session_start(Utc.with_ymd_and_hms(2025, 3, 1, 23, 30, 0).unwrap());
        streak.record_session_start(Utc.with_ymd_and_hms(2025, 3, 2, 0, 30, 0).unwrap());
        assert_eq!(streak.count, 2);
    }

    #[test]
    fn ledger_spend_round_trip() {
        let mut ledger = PointsLedger::default();
        assert_eq!(ledger.available_balance(100), 100);

        ledger.spend(40, "mop-skin", 100).unwrap();
        assert_eq!(ledger.available_balance(100), 60);
        assert!(ledger.unlocked_rewards.contains("mop-skin"));

        let err = ledger.spend(61, "golden-broom", 100).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientPoints {
                cost: 61,
                available: 60
            }
        );
        // Failed spend leaves the ledger untouched
        assert_eq!(ledger.available_balance(100), 60);
        assert!(!ledger.unlocked_rewards.contains("golden-broom"));
    }

    #[test]
    fn available_balance_floors_at_zero() {
        let ledger = PointsLedger {
            spent_points: 50,
            unlocked_rewards: BTreeSet::new(),
        };
        assert_eq!(ledger.available_balance(30), 0);
    }

    #[test]
    fn days_since_last_passed() {
        let mut progress = ProgressState::default();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(progress.days_since_last_passed(today), None);

        progress.last_passed_verification = Some(today - Duration::days(5));
        assert_eq!(progress.days_since_last_passed(today), Some(5));
    }

    #[test]
    fn progress_kv_round_trip() {
        let db = Database::open_memory().unwrap();
        let mut progress = ProgressState::default();
        progress.streak.record_session_start(at(2025, 3, 1, 9));
        progress.ledger.spent_points = 12;
        progress.ledger.unlocked_rewards.insert("sponge".to_string());
        progress.last_passed_verification = NaiveDate::from_ymd_opt(2025, 2, 27);

        progress.save(&db).unwrap();
        let loaded = ProgressState::load(&db).unwrap();
        assert_eq!(loaded, progress);
    }

    #[test]
    fn load_defaults_when_store_is_empty() {
        let db = Database::open_memory().unwrap();
        let progress = ProgressState::load(&db).unwrap();
        assert_eq!(progress, ProgressState::default());
    }
}
