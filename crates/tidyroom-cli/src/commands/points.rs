//! Points economy commands.

use clap::Subcommand;
use serde::Serialize;
use tidyroom_core::{AreaRegistry, Database, ProgressState};

#[derive(Subcommand)]
pub enum PointsAction {
    /// Show the spendable balance
    Balance,
    /// Spend points to unlock a reward
    Spend {
        /// Point cost
        cost: i64,
        /// Reward identifier
        reward_id: String,
    },
    /// List unlocked rewards
    Rewards,
}

#[derive(Serialize)]
struct BalanceView {
    earned: i64,
    spent: i64,
    available: i64,
}

pub fn run(action: PointsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let registry = AreaRegistry::load(&db)?;
    let mut progress = ProgressState::load(&db)?;
    let earned = registry.total_earned();

    match action {
        PointsAction::Balance => {
            let view = BalanceView {
                earned,
                spent: progress.ledger.spent_points,
                available: progress.ledger.available_balance(earned),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        PointsAction::Spend { cost, reward_id } => {
            progress.ledger.spend(cost, reward_id.clone(), earned)?;
            progress.save(&db)?;
            println!(
                "unlocked {reward_id}; {} points remaining",
                progress.ledger.available_balance(earned)
            );
        }
        PointsAction::Rewards => {
            let rewards: Vec<&String> = progress.ledger.unlocked_rewards.iter().collect();
            println!("{}", serde_json::to_string_pretty(&rewards)?);
        }
    }
    Ok(())
}
