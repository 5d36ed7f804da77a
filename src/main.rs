use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tickets::cmd::config::{self as config_cmd, ConfigArgs};
use tickets::cmd::draft::{self as draft_cmd, DraftArgs};
use tickets::cmd::tickets::{self as ticket_cmd, FormArgs, ListArgs, UpdateArgs};
use tickets::config::{AppConfig, BackendKind};
use tickets::context::AppContext;
use tickets::error::AppResult;
use tickets::infra::notify::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "tickets", author, version, about = "Support ticket client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tickets, refreshed from the backend unless --cached is given.
    List(ListArgs),
    /// Show one ticket.
    Show { id: u64 },
    /// Create a ticket, continuing from the saved draft if there is one.
    Add(FormArgs),
    /// Change fields of an existing ticket.
    Update(UpdateArgs),
    /// Delete a ticket.
    Remove { id: u64 },
    /// Inspect or manage the saved ticket draft.
    Draft(DraftArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    setup_logging();
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Config(args) => return config_cmd::run(args.command),
        other => other,
    };

    let config = AppConfig::load()?;
    if config.backend == BackendKind::Mock {
        eprintln!("Warning: using the in-memory mock backend; changes are not kept between runs.");
    }
    let ctx = AppContext::from_config(config, Arc::new(ConsoleNotifier))?;

    match command {
        Commands::List(args) => ticket_cmd::list(&ctx, args).await,
        Commands::Show { id } => ticket_cmd::show(&ctx, id).await,
        Commands::Add(args) => ticket_cmd::add(&ctx, args).await,
        Commands::Update(args) => ticket_cmd::update(&ctx, args).await,
        Commands::Remove { id } => ticket_cmd::remove(&ctx, id).await,
        Commands::Draft(args) => draft_cmd::run(&ctx, args.command).await,
        Commands::Config(_) => Ok(()),
    }
}
