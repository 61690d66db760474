//! Areas and the registry that owns them.
//!
//! An area is a user-named physical zone. It exclusively owns its bowls
//! (and, through them, their tasks); deleting an area cascades through
//! both. The registry is a thin CRUD layer over the in-memory collection
//! and the database, consumed by the lifecycle controller.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError, StorageError};
use crate::session::Bowl;
use crate::storage::Database;

/// Flavor tag for an area. Affects prompt context and fallback scene
/// assets only, never scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Upbeat encouragement
    #[default]
    Cheer,
    /// Drill-sergeant tone
    Strict,
    /// Calm, minimal prompts
    Zen,
}

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Cheer => "cheer",
            Persona::Strict => "strict",
            Persona::Zen => "zen",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StorageError> {
        match value {
            "cheer" => Ok(Persona::Cheer),
            "strict" => Ok(Persona::Strict),
            "zen" => Ok(Persona::Zen),
            other => Err(StorageError::Corrupt {
                column: "persona".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Context string handed to the task-generation service.
    pub fn prompt_context(self) -> &'static str {
        match self {
            Persona::Cheer => "an upbeat coach who celebrates small wins",
            Persona::Strict => "a no-nonsense inspector with exacting standards",
            Persona::Zen => "a calm guide who keeps instructions minimal",
        }
    }

    /// Static reference asset used when image generation yields nothing.
    pub fn default_scene(self) -> &'static str {
        match self {
            Persona::Cheer => "assets/scenes/cheer.png",
            Persona::Strict => "assets/scenes/strict.png",
            Persona::Zen => "assets/scenes/zen.png",
        }
    }
}

/// A user-named physical zone with its sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub persona: Persona,
    /// First-impression artifact from the opening scan, if any.
    /// Its absence selects the dream-vision entry mode.
    pub vision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub bowls: Vec<Bowl>,
}

impl Area {
    pub fn new(
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
        persona: Persona,
    ) -> Self {
        Self {
            id: format!("area-{}", uuid::Uuid::new_v4()),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            persona,
            vision: None,
            created_at: Utc::now(),
            bowls: Vec::new(),
        }
    }

    /// The single in-progress bowl, if one exists.
    pub fn in_progress_bowl(&self) -> Option<&Bowl> {
        self.bowls.iter().find(|b| b.is_in_progress())
    }

    pub fn in_progress_bowl_mut(&mut self) -> Option<&mut Bowl> {
        self.bowls.iter_mut().find(|b| b.is_in_progress())
    }

    pub fn bowl(&self, bowl_id: &str) -> Option<&Bowl> {
        self.bowls.iter().find(|b| b.id == bowl_id)
    }

    pub fn bowl_mut(&mut self, bowl_id: &str) -> Option<&mut Bowl> {
        self.bowls.iter_mut().find(|b| b.id == bowl_id)
    }
}

/// Owner of the area collection. Single logical writer: callers are
/// responsible for serializing mutations to a given area.
#[derive(Debug, Default)]
pub struct AreaRegistry {
    areas: Vec<Area>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate the registry from storage.
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            areas: db.fetch_areas()?,
        })
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, area_id: &str) -> Result<&Area> {
        self.areas
            .iter()
            .find(|a| a.id == area_id)
            .ok_or_else(|| SessionError::AreaNotFound(area_id.to_string()).into())
    }

    pub fn area_mut(&mut self, area_id: &str) -> Result<&mut Area> {
        self.areas
            .iter_mut()
            .find(|a| a.id == area_id)
            .ok_or_else(|| SessionError::AreaNotFound(area_id.to_string()).into())
    }

    /// Create and persist a new area.
    pub fn create_area(
        &mut self,
        db: &Database,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
        persona: Persona,
    ) -> Result<&Area> {
        let area = Area::new(name, icon, color, persona);
        db.insert_area(&area)?;
        self.areas.push(area);
        let idx = self.areas.len() - 1;
        Ok(&self.areas[idx])
    }

    /// Delete an area, cascading to its bowls and tasks.
    pub fn delete_area(&mut self, db: &Database, area_id: &str) -> Result<()> {
        let idx = self
            .areas
            .iter()
            .position(|a| a.id == area_id)
            .ok_or_else(|| SessionError::AreaNotFound(area_id.to_string()))?;
        db.delete_area(area_id)?;
        self.areas.remove(idx);
        Ok(())
    }

    /// Count of bowls completed on the given calendar day, across all
    /// areas. Drives the daily quota and golden eligibility.
    pub fn completed_on(&self, day: NaiveDate) -> usize {
        self.areas
            .iter()
            .flat_map(|a| &a.bowls)
            .filter(|b| {
                b.completed_at
                    .map(|at| at.date_naive() == day)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Total earned points, derived by summing bowl totals.
    pub fn total_earned(&self) -> i64 {
        self.areas
            .iter()
            .flat_map(|a| &a.bowls)
            .map(Bowl::earned_points)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Task;
    use chrono::Duration;

    fn completed_bowl(total: f64, completed_at: DateTime<Utc>) -> Bowl {
        let mut bowl = Bowl::new("before.jpg", completed_at - Duration::hours(1));
        let mut task = Task::new("Done", total as i64);
        task.completed_at = Some(completed_at);
        bowl.tasks.push(task);
        bowl.completed_at = Some(completed_at);
        bowl.base_points = total as i64;
        bowl.total_points = total;
        bowl
    }

    #[test]
    fn persona_string_roundtrip() {
        for persona in [Persona::Cheer, Persona::Strict, Persona::Zen] {
            assert_eq!(Persona::parse(persona.as_str()).unwrap(), persona);
        }
        assert!(Persona::parse("pirate").is_err());
    }

    #[test]
    fn in_progress_lookup_skips_completed_bowls() {
        let mut area = Area::new("Kitchen", "pot", "#ff8800", Persona::Cheer);
        area.bowls.push(completed_bowl(10.0, Utc::now()));
        assert!(area.in_progress_bowl().is_none());

        let mut open = Bowl::new("before.jpg", Utc::now());
        open.tasks.push(Task::new("Wipe counters", 5));
        area.bowls.push(open);
        assert!(area.in_progress_bowl().is_some());
    }

    #[test]
    fn completed_on_counts_only_that_day() {
        let now = Utc::now();
        let mut registry = AreaRegistry::new();
        let mut area = Area::new("Kitchen", "pot", "#ff8800", Persona::Zen);
        area.bowls.push(completed_bowl(10.0, now));
        area.bowls.push(completed_bowl(10.0, now - Duration::days(1)));
        registry.areas.push(area);

        assert_eq!(registry.completed_on(now.date_naive()), 1);
        assert_eq!(
            registry.completed_on((now - Duration::days(1)).date_naive()),
            1
        );
        assert_eq!(
            registry.completed_on((now - Duration::days(2)).date_naive()),
            0
        );
    }

    #[test]
    fn total_earned_sums_rounded_bowl_totals() {
        let now = Utc::now();
        let mut registry = AreaRegistry::new();
        let mut area = Area::new("Bath", "duck", "#0088ff", Persona::Strict);
        area.bowls.push(completed_bowl(10.5, now));
        area.bowls.push(completed_bowl(20.0, now));
        registry.areas.push(area);

        // 10.5 rounds up
        assert_eq!(registry.total_earned(), 31);
    }
}
