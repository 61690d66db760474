//! Verification ceremony commands.
//!
//! `submit` drives the judging path with a verdict supplied up front,
//! standing in for the remote photo judge.

use chrono::Utc;
use clap::Subcommand;
use tidyroom_core::{
    Area, AreaRegistry, Config, Database, NullSink, PendingResolution, ProgressState, Tier,
    VerificationCoordinator,
};

use crate::oracles::VerdictJudge;

#[derive(Subcommand)]
pub enum VerifyAction {
    /// Request the ceremony for the area's latest session
    Request {
        /// Area ID
        area_id: String,
    },
    /// Submit an after photo for judging
    Submit {
        /// Area ID
        area_id: String,
        /// Path or URI of the "after" photo
        #[arg(long)]
        photo: String,
        /// Reward tier: blue or golden
        #[arg(long, default_value = "blue")]
        tier: String,
        /// Judge verdict: pass or fail
        #[arg(long)]
        verdict: String,
    },
    /// Skip the ceremony
    Skip {
        /// Area ID
        area_id: String,
    },
    /// Resolve a pending ceremony: decline, blue, or golden
    Resolve {
        /// Area ID
        area_id: String,
        /// Decision
        choice: String,
    },
    /// Show golden-tier eligibility
    Eligibility,
}

fn parse_tier(value: &str) -> Result<Tier, Box<dyn std::error::Error>> {
    match value {
        "blue" => Ok(Tier::Blue),
        "golden" => Ok(Tier::Golden),
        other => Err(format!("unknown tier '{other}' (expected blue or golden)").into()),
    }
}

fn latest_bowl_id(area: &Area) -> Result<String, Box<dyn std::error::Error>> {
    area.bowls
        .last()
        .map(|b| b.id.clone())
        .ok_or_else(|| "no sessions for this area".into())
}

pub async fn run(action: VerifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut registry = AreaRegistry::load(&db)?;
    let mut progress = ProgressState::load(&db)?;
    let sink = NullSink;
    let daily_target = config.session.daily_target;

    match action {
        VerifyAction::Request { area_id } => {
            let judge = VerdictJudge { passed: false };
            let coord = VerificationCoordinator::new(&judge, &sink, daily_target);
            let area = registry.area_mut(&area_id)?;
            let bowl_id = latest_bowl_id(area)?;
            coord.request(&db, area, &bowl_id, Utc::now())?;
            println!("verification requested for {bowl_id}");
        }
        VerifyAction::Submit {
            area_id,
            photo,
            tier,
            verdict,
        } => {
            let tier = parse_tier(&tier)?;
            let passed = match verdict.as_str() {
                "pass" => true,
                "fail" => false,
                other => return Err(format!("unknown verdict '{other}'").into()),
            };
            let judge = VerdictJudge { passed };
            let coord = VerificationCoordinator::new(&judge, &sink, daily_target);

            if tier == Tier::Golden {
                let today = Utc::now().date_naive();
                let completed_today = registry.completed_on(today);
                if !coord.golden_eligible(&progress, completed_today, today) {
                    return Err("golden tier not eligible".into());
                }
            }

            let area = registry.area_mut(&area_id)?;
            let bowl_id = latest_bowl_id(area)?;
            let outcome = coord
                .submit(
                    &db,
                    area,
                    &mut progress,
                    &bowl_id,
                    tier,
                    &photo,
                    Utc::now(),
                )
                .await?;
            println!(
                "{}: {} total points (+{} bonus)",
                if passed { "passed" } else { "failed" },
                outcome.total_points,
                outcome.bonus_delta
            );
        }
        VerifyAction::Skip { area_id } => {
            let judge = VerdictJudge { passed: false };
            let coord = VerificationCoordinator::new(&judge, &sink, daily_target);
            let area = registry.area_mut(&area_id)?;
            let bowl_id = latest_bowl_id(area)?;
            coord.skip(&db, area, &bowl_id)?;
            println!("verification skipped for {bowl_id}");
        }
        VerifyAction::Resolve { area_id, choice } => {
            let resolution = match choice.as_str() {
                "decline" => PendingResolution::Decline,
                "blue" => PendingResolution::Blue,
                "golden" => PendingResolution::Golden,
                other => return Err(format!("unknown choice '{other}'").into()),
            };
            let judge = VerdictJudge { passed: false };
            let coord = VerificationCoordinator::new(&judge, &sink, daily_target);
            let completed_today = registry.completed_on(Utc::now().date_naive());
            let area = registry.area_mut(&area_id)?;
            let bowl_id = latest_bowl_id(area)?;
            let outcome = coord.resolve_pending(
                &db,
                area,
                &mut progress,
                &bowl_id,
                resolution,
                completed_today,
                Utc::now(),
            )?;
            println!(
                "resolved: {} total points (+{} bonus)",
                outcome.total_points, outcome.bonus_delta
            );
        }
        VerifyAction::Eligibility => {
            let judge = VerdictJudge { passed: false };
            let coord = VerificationCoordinator::new(&judge, &sink, daily_target);
            let today = Utc::now().date_naive();
            let eligible = coord.golden_eligible(&progress, registry.completed_on(today), today);
            println!("golden eligible: {eligible}");
        }
    }
    Ok(())
}
