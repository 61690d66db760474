use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod oracles;

#[derive(Parser)]
#[command(name = "tidyroom-cli", version, about = "Tidyroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Area management
    Area {
        #[command(subcommand)]
        action: commands::area::AreaAction,
    },
    /// Session lifecycle
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Verification ceremony
    Verify {
        #[command(subcommand)]
        action: commands::verify::VerifyAction,
    },
    /// Points economy
    Points {
        #[command(subcommand)]
        action: commands::points::PointsAction,
    },
    /// Streak and balance overview
    Stats,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Area { action } => commands::area::run(action),
        Commands::Session { action } => commands::session::run(action).await,
        Commands::Verify { action } => commands::verify::run(action).await,
        Commands::Points { action } => commands::points::run(action),
        Commands::Stats => commands::stats::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
