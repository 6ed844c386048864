//! contentos - command line entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use contentos::commands::{
    archive::{self, ArchiveCommand},
    brain::{self, BrainCommand},
    channel::{self, ChannelCommand},
    config::{self, ConfigCommand},
    db::{self, DbCommand},
    health,
    kit::{self, KitCommand},
    setup,
    sync::{self, SyncArgs},
};
use contentos_common::config::{resolve_root_folder, ROOT_ENV_VAR};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "contentos")]
#[command(about = "Production kits and ingredient analytics for short-form video channels")]
#[command(version)]
struct Cli {
    /// Workspace root holding `channels/` and `.contentos/`
    #[arg(long, global = true, env = ROOT_ENV_VAR)]
    root: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the workspace folders and default config
    Setup,
    /// Feature flags
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Archive old published kits
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Channel knowledge base
    #[command(subcommand)]
    Brain(BrainCommand),
    /// Manage channels
    #[command(subcommand)]
    Channel(ChannelCommand),
    /// Pull upload statistics
    Sync(SyncArgs),
    /// Diagnose the active channel
    Health,
    /// Production kits
    #[command(subcommand)]
    Kit(KitCommand),
    /// Database and ingredient analysis
    #[command(subcommand)]
    Db(DbCommand),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!(
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "contentos {}",
        env!("CARGO_PKG_VERSION")
    );

    let root = resolve_root_folder(cli.root.as_deref());
    debug!("Root folder: {}", root.display());

    match cli.command {
        Command::Setup => setup::run(&root).await?,
        Command::Config(cmd) => config::run(&root, cmd).await?,
        Command::Archive(cmd) => archive::run(&root, cmd).await?,
        Command::Brain(cmd) => brain::run(&root, cmd).await?,
        Command::Channel(cmd) => channel::run(&root, cmd).await?,
        Command::Sync(args) => sync::run(&root, args).await?,
        Command::Health => {
            let issues = health::run(&root).await?;
            if issues > 0 {
                std::process::exit(1);
            }
        }
        Command::Kit(cmd) => kit::run(&root, cmd).await?,
        Command::Db(cmd) => db::run(&root, cmd).await?,
    }
    Ok(())
}
