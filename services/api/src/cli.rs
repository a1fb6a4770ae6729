use crate::server;
use crate::tasks;
use baujobs::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "BauJobs API",
    about = "Run the BauJobs job board backend and its maintenance tasks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Delete job offers, seeker profiles and legacy jobs past their expiry
    PurgeExpired,
    /// Rewrite job-offer categories stored as slugs or in the wrong case
    NormalizeCategories,
    /// Move documents from the legacy `stellengesuche` collection into `stellenanzeigen`
    MigrateLegacyListings,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::PurgeExpired => tasks::purge_expired().await,
        Command::NormalizeCategories => tasks::normalize_categories().await,
        Command::MigrateLegacyListings => tasks::migrate_legacy_listings().await,
    }
}
