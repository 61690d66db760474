//! Area management commands.

use clap::Subcommand;
use serde::Serialize;
use tidyroom_core::{AreaRegistry, Database, Persona};

#[derive(Subcommand)]
pub enum AreaAction {
    /// Create a new area
    Add {
        /// Area name
        name: String,
        /// Persona flavor: cheer, strict, or zen
        #[arg(long, default_value = "cheer")]
        persona: String,
        /// Icon identifier
        #[arg(long, default_value = "")]
        icon: String,
        /// Accent color
        #[arg(long, default_value = "#3b82f6")]
        color: String,
    },
    /// List areas
    List,
    /// Delete an area and all of its sessions
    Remove {
        /// Area ID
        id: String,
    },
}

#[derive(Serialize)]
struct AreaSummary {
    id: String,
    name: String,
    persona: Persona,
    sessions: usize,
    open_session: bool,
    scanned: bool,
}

pub fn run(action: AreaAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut registry = AreaRegistry::load(&db)?;

    match action {
        AreaAction::Add {
            name,
            persona,
            icon,
            color,
        } => {
            let persona = Persona::parse(&persona)?;
            let area = registry.create_area(&db, name, icon, color, persona)?;
            println!("{}", area.id);
        }
        AreaAction::List => {
            let summaries: Vec<AreaSummary> = registry
                .areas()
                .iter()
                .map(|a| AreaSummary {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    persona: a.persona,
                    sessions: a.bowls.len(),
                    open_session: a.in_progress_bowl().is_some(),
                    scanned: a.vision.is_some(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        AreaAction::Remove { id } => {
            registry.delete_area(&db, &id)?;
            println!("removed {id}");
        }
    }
    Ok(())
}
