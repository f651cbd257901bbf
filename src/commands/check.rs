use super::cancel_on_ctrl_c;
use crate::{
    libs::{
        config::UpdaterConfig,
        context::AppContext,
        error::UpdateError,
        messages::Message,
        process::SystemProcess,
        prompt::TerminalPrompter,
        view::View,
        workflow::UpdateWorkflow,
    },
    msg_bail_anyhow, msg_error, msg_info, msg_print,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Follow the pre-release (CarrotPatch) channel
    #[arg(short, long)]
    prerelease: bool,

    /// Print the underlying error when the check fails
    #[arg(short, long)]
    verbose: bool,
}

/// Reports whether a newer release is available.
///
/// A failed check is reported like "no update"; `--verbose` adds the cause.
pub async fn cmd(ctx: &AppContext, args: CheckArgs) -> Result<()> {
    let config = UpdaterConfig::read()?;
    let prerelease = args.prerelease || config.include_prereleases;
    let workflow = UpdateWorkflow::new(ctx, &config, &TerminalPrompter, &SystemProcess);

    msg_info!(Message::CheckingForUpdates {
        owner: config.owner.clone(),
        repo: config.repo.clone(),
        prerelease,
    });

    match workflow.check(prerelease, &cancel_on_ctrl_c()).await {
        Ok(Some(release)) => {
            msg_print!(
                Message::UpdateAvailable {
                    app_name: ctx.app_name.clone(),
                    current: ctx.version_tag.clone(),
                    latest: release.version_tag.clone(),
                },
                true
            );
            View::release(&release);
            if !release.page_url.is_empty() {
                msg_print!(Message::UpdateReleaseDetails {
                    asset: release.asset_name.clone(),
                    published: release.published_at.clone(),
                    page: release.page_url.clone(),
                });
            }
        }
        Ok(None) => msg_info!(Message::NoUpdateAvailable),
        Err(UpdateError::Busy(state)) => msg_bail_anyhow!(Message::UpdaterBusy(state)),
        Err(e) => {
            tracing::warn!(error = %e, "update check failed");
            msg_info!(Message::NoUpdateAvailable);
            if args.verbose {
                msg_error!(Message::UpdateCheckFailed(e.to_string()));
            }
        }
    }

    Ok(())
}
