//! SQLite-backed persistence for areas, bowls, tasks, and durable
//! progress scalars.
//!
//! Areas exclusively own bowls, bowls exclusively own tasks; both edges
//! cascade on delete. Every multi-row write runs in one transaction so
//! a logical operation persists atomically. A crash between an
//! in-memory mutation and its flush can still leave memory ahead of
//! storage; that window is surfaced to callers as a storage error, not
//! resolved here.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::area::{Area, Persona};
use crate::error::StorageError;
use crate::session::{Bowl, Outcome, Task, Tier, Verification};

use super::data_dir;

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/tidyroom/tidyroom.db`.
    ///
    /// Creates the file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?
            .join("tidyroom.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS areas (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    icon        TEXT NOT NULL DEFAULT '',
                    color       TEXT NOT NULL DEFAULT '',
                    persona     TEXT NOT NULL,
                    vision      TEXT,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS bowls (
                    id               TEXT PRIMARY KEY,
                    area_id          TEXT NOT NULL REFERENCES areas(id) ON DELETE CASCADE,
                    created_at       TEXT NOT NULL,
                    completed_at     TEXT,
                    requested        INTEGER NOT NULL DEFAULT 0,
                    tier             TEXT NOT NULL,
                    outcome          TEXT NOT NULL,
                    requested_at     TEXT,
                    verified_at      TEXT,
                    base_points      INTEGER NOT NULL DEFAULT 0,
                    bonus_multiplier REAL NOT NULL DEFAULT 1.0,
                    total_points     REAL NOT NULL DEFAULT 0.0,
                    before_photo     TEXT NOT NULL,
                    after_photo      TEXT
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id           TEXT PRIMARY KEY,
                    bowl_id      TEXT NOT NULL REFERENCES bowls(id) ON DELETE CASCADE,
                    position     INTEGER NOT NULL,
                    title        TEXT NOT NULL,
                    detail       TEXT,
                    points       INTEGER NOT NULL DEFAULT 0,
                    completed_at TEXT
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_bowls_area_id ON bowls(area_id);
                CREATE INDEX IF NOT EXISTS idx_bowls_completed_at ON bowls(completed_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_bowl_id ON tasks(bowl_id);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    /// Fetch all areas with their bowls and tasks hydrated.
    pub fn fetch_areas(&self) -> Result<Vec<Area>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, icon, color, persona, vision, created_at
             FROM areas ORDER BY created_at, id",
        )?;
        let rows: Vec<(String, String, String, String, String, Option<String>, String)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        let mut areas = Vec::with_capacity(rows.len());
        for (id, name, icon, color, persona, vision, created_at) in rows {
            let bowls = self.fetch_bowls(&id)?;
            areas.push(Area {
                persona: Persona::parse(&persona)?,
                created_at: parse_ts(&created_at, "areas.created_at")?,
                id,
                name,
                icon,
                color,
                vision,
                bowls,
            });
        }
        Ok(areas)
    }

    fn fetch_bowls(&self, area_id: &str) -> Result<Vec<Bowl>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, completed_at, requested, tier, outcome,
                    requested_at, verified_at, base_points, bonus_multiplier,
                    total_points, before_photo, after_photo
             FROM bowls WHERE area_id = ?1 ORDER BY created_at, id",
        )?;
        #[allow(clippy::type_complexity)]
        let rows: Vec<(
            String,
            String,
            Option<String>,
            bool,
            String,
            String,
            Option<String>,
            Option<String>,
            i64,
            f64,
            f64,
            String,
            Option<String>,
        )> = stmt
            .query_map(params![area_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        let mut bowls = Vec::with_capacity(rows.len());
        for (
            id,
            created_at,
            completed_at,
            requested,
            tier,
            outcome,
            requested_at,
            verified_at,
            base_points,
            bonus_multiplier,
            total_points,
            before_photo,
            after_photo,
        ) in rows
        {
            let tasks = self.fetch_tasks(&id)?;
            bowls.push(Bowl {
                created_at: parse_ts(&created_at, "bowls.created_at")?,
                completed_at: parse_opt_ts(completed_at.as_deref(), "bowls.completed_at")?,
                verification: Verification {
                    requested,
                    tier: Tier::parse(&tier)?,
                    outcome: Outcome::parse(&outcome)?,
                    requested_at: parse_opt_ts(requested_at.as_deref(), "bowls.requested_at")?,
                    verified_at: parse_opt_ts(verified_at.as_deref(), "bowls.verified_at")?,
                },
                id,
                base_points,
                bonus_multiplier,
                total_points,
                before_photo,
                after_photo,
                tasks,
            });
        }
        Ok(bowls)
    }

    fn fetch_tasks(&self, bowl_id: &str) -> Result<Vec<Task>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, detail, points, completed_at
             FROM tasks WHERE bowl_id = ?1 ORDER BY position",
        )?;
        let rows: Vec<(String, String, Option<String>, i64, Option<String>)> = stmt
            .query_map(params![bowl_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        let mut tasks = Vec::with_capacity(rows.len());
        for (id, title, detail, points, completed_at) in rows {
            tasks.push(Task {
                completed_at: parse_opt_ts(completed_at.as_deref(), "tasks.completed_at")?,
                id,
                title,
                detail,
                points,
            });
        }
        Ok(tasks)
    }

    /// Insert a new area row. Bowls are persisted separately.
    pub fn insert_area(&self, area: &Area) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO areas (id, name, icon, color, persona, vision, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                area.id,
                area.name,
                area.icon,
                area.color,
                area.persona.as_str(),
                area.vision,
                area.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update an area's first-impression artifact.
    pub fn update_area_vision(&self, area_id: &str, vision: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE areas SET vision = ?2 WHERE id = ?1",
            params![area_id, vision],
        )?;
        Ok(())
    }

    /// Delete an area, cascading to its bowls and their tasks.
    pub fn delete_area(&self, area_id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM areas WHERE id = ?1", params![area_id])?;
        Ok(())
    }

    /// Upsert a bowl and all its tasks in one transaction.
    pub fn save_bowl(&self, area_id: &str, bowl: &Bowl) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::write_bowl(&tx, area_id, bowl)?;
        tx.commit()?;
        Ok(())
    }

    /// Persist a newly created session, optionally together with the
    /// area's first-impression artifact, in one transaction.
    pub fn create_session(
        &self,
        area_id: &str,
        bowl: &Bowl,
        vision: Option<&str>,
    ) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::write_bowl(&tx, area_id, bowl)?;
        if let Some(vision) = vision {
            tx.execute(
                "UPDATE areas SET vision = ?2 WHERE id = ?1",
                params![area_id, vision],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn write_bowl(
        tx: &rusqlite::Transaction<'_>,
        area_id: &str,
        bowl: &Bowl,
    ) -> Result<(), StorageError> {
        tx.execute(
            "INSERT INTO bowls (id, area_id, created_at, completed_at, requested, tier,
                                outcome, requested_at, verified_at, base_points,
                                bonus_multiplier, total_points, before_photo, after_photo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
                completed_at = excluded.completed_at,
                requested = excluded.requested,
                tier = excluded.tier,
                outcome = excluded.outcome,
                requested_at = excluded.requested_at,
                verified_at = excluded.verified_at,
                base_points = excluded.base_points,
                bonus_multiplier = excluded.bonus_multiplier,
                total_points = excluded.total_points,
                after_photo = excluded.after_photo",
            params![
                bowl.id,
                area_id,
                bowl.created_at.to_rfc3339(),
                bowl.completed_at.map(|t| t.to_rfc3339()),
                bowl.verification.requested,
                bowl.verification.tier.as_str(),
                bowl.verification.outcome.as_str(),
                bowl.verification.requested_at.map(|t| t.to_rfc3339()),
                bowl.verification.verified_at.map(|t| t.to_rfc3339()),
                bowl.base_points,
                bowl.bonus_multiplier,
                bowl.total_points,
                bowl.before_photo,
                bowl.after_photo,
            ],
        )?;
        tx.execute("DELETE FROM tasks WHERE bowl_id = ?1", params![bowl.id])?;
        for (position, task) in bowl.tasks.iter().enumerate() {
            tx.execute(
                "INSERT INTO tasks (id, bowl_id, position, title, detail, points, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id,
                    bowl.id,
                    position as i64,
                    task.title,
                    task.detail,
                    task.points,
                    task.completed_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Set several kv entries in one transaction.
    pub fn kv_set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_ts(value: &str, column: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::Corrupt {
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn parse_opt_ts(value: Option<&str>, column: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
    value.map(|v| parse_ts(v, column)).transpose()
}
