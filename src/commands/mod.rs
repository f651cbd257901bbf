pub mod check;
pub mod info;
pub mod init;
pub mod links;
pub mod update;

use crate::{
    libs::{
        context::AppContext,
        logging::{self, LogHandle},
        messages::Message,
    },
    msg_warning,
};
use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Check for a newer release")]
    Check(check::CheckArgs),
    #[command(about = "Download and install the latest release")]
    Update(update::UpdateArgs),
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Show system information")]
    Info,
    #[command(about = "Open a BunnyPad download page")]
    Links(links::LinksArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();

        let log = match logging::init() {
            Ok(handle) => Some(handle),
            Err(e) => {
                msg_warning!(Message::LogInitFailed(e.to_string()));
                None
            }
        };
        let log_path = log
            .as_ref()
            .map(|handle: &LogHandle| handle.path.clone())
            .unwrap_or_else(|| logging::log_dir().join(logging::log_file_name(Local::now())));
        let ctx = AppContext::new(log_path)?;
        tracing::info!(version = %ctx.version_tag, os = %ctx.display_os, "updater started");

        match cli.command {
            Commands::Check(args) => check::cmd(&ctx, args).await,
            Commands::Update(args) => update::cmd(&ctx, args).await,
            Commands::Init(args) => init::cmd(args),
            Commands::Info => info::cmd(&ctx),
            Commands::Links(args) => links::cmd(args).await,
        }
    }
}

/// Token that is cancelled when the user presses Ctrl+C.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            trigger.cancel();
        }
    });
    token
}
