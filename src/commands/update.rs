use super::cancel_on_ctrl_c;
use crate::{
    libs::{
        config::UpdaterConfig,
        context::AppContext,
        download::DownloadProgress,
        error::UpdateError,
        messages::Message,
        process::SystemProcess,
        prompt::TerminalPrompter,
        workflow::{UpdateOptions, UpdateWorkflow},
    },
    msg_bail_anyhow,
};
use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Follow the pre-release (CarrotPatch) channel
    #[arg(short, long)]
    prerelease: bool,

    /// Download and install without asking; elevation is still confirmed
    #[arg(short, long)]
    yes: bool,
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}") {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}

/// Runs the whole update: check, download, install, hand over.
///
/// Failures are reported to the user as they happen. A successful launch
/// terminates the process.
pub async fn cmd(ctx: &AppContext, args: UpdateArgs) -> Result<()> {
    let config = UpdaterConfig::read()?;
    let options = UpdateOptions {
        prerelease: args.prerelease || config.include_prereleases,
        assume_yes: args.yes,
    };
    let pb = progress_bar();
    let workflow = UpdateWorkflow::new(ctx, &config, &TerminalPrompter, &SystemProcess).on_download_finished(|| pb.finish_and_clear());

    let on_progress = |progress: DownloadProgress| {
        if progress.total > 0 {
            pb.set_length(progress.total);
        }
        pb.set_position(progress.downloaded);
        pb.set_message(format!("{}%", progress.percentage));
    };

    let outcome = match workflow.run(options, &cancel_on_ctrl_c(), on_progress).await {
        Ok(outcome) => outcome,
        Err(UpdateError::Busy(state)) => msg_bail_anyhow!(Message::UpdaterBusy(state)),
        Err(e) => return Err(e.into()),
    };
    pb.finish_and_clear();

    tracing::info!(?outcome, "update attempt finished");
    Ok(())
}
