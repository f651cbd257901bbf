//! Update workflow: state machine, background tasks and orchestration.
//!
//! ```text
//! Idle ─▶ Checking ─▶ NoUpdate ─────────────────────────────────────▶ Idle
//!             │
//!             └─▶ UpdateFound ─▶ Downloading ─▶ Downloaded ─▶ Installing ─┬─▶ Terminated
//!                                                                         └─▶ InstallFailed ─▶ Idle
//! ```
//!
//! Network work runs on Tokio tasks that report back over an unbounded
//! channel; the foreground only reacts to [`UpdateEvent`]s. A single
//! [`UpdateSlot`] guards the whole attempt, so a second check or download
//! is refused while one is in flight.

use super::config::UpdaterConfig;
use super::context::AppContext;
use super::download::{staging_path, staging_path_in, DownloadProgress, Downloader};
use super::error::UpdateError;
use super::install::{InstallCandidates, InstallLauncher, LaunchOutcome};
use super::messages::Message;
use super::process::{open_path_or_url, ProcessControl};
use super::prompt::Prompter;
use super::release::{ReleaseInfo, ReleaseQuery};
use crate::{msg_error, msg_info, msg_print, msg_success, msg_warning};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Idle,
    Checking,
    NoUpdate,
    UpdateFound,
    Downloading,
    Downloaded,
    Installing,
    Terminated,
    InstallFailed,
}

impl UpdateState {
    /// Transition table of one update attempt.
    pub fn can_transition_to(self, next: UpdateState) -> bool {
        use UpdateState::*;
        matches!(
            (self, next),
            (Idle, Checking)
                | (Checking, NoUpdate)
                | (Checking, UpdateFound)
                | (Checking, Idle)
                | (NoUpdate, Idle)
                | (UpdateFound, Downloading)
                | (UpdateFound, Idle)
                | (Downloading, Downloaded)
                | (Downloading, Idle)
                | (Downloaded, Installing)
                | (Downloaded, Idle)
                | (Installing, Terminated)
                | (Installing, InstallFailed)
                | (InstallFailed, Idle)
        )
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Single-slot guard around the update state.
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct UpdateSlot {
    state: Arc<Mutex<UpdateState>>,
}

impl Default for UpdateSlot {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(UpdateState::Idle)),
        }
    }
}

impl UpdateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UpdateState {
        *self.state.lock()
    }

    /// Claims the slot for a new attempt, moving `Idle` to `Checking`.
    pub fn try_begin(&self) -> Result<(), UpdateError> {
        let mut state = self.state.lock();
        if *state != UpdateState::Idle {
            return Err(UpdateError::Busy(state.to_string()));
        }
        *state = UpdateState::Checking;
        Ok(())
    }

    pub fn transition(&self, next: UpdateState) -> Result<(), UpdateError> {
        let mut state = self.state.lock();
        if !state.can_transition_to(next) {
            return Err(UpdateError::InvalidTransition {
                from: state.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %*state, to = %next, "update state");
        *state = next;
        Ok(())
    }

    /// Returns the slot to `Idle` at the end of an attempt. `Terminated` is final.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if !matches!(*state, UpdateState::Terminated | UpdateState::Idle) {
            tracing::debug!(from = %*state, "update slot released");
            *state = UpdateState::Idle;
        }
    }
}

/// Completion and progress notifications sent by background tasks.
#[derive(Debug)]
pub enum UpdateEvent {
    CheckCompleted(Option<ReleaseInfo>),
    CheckFailed(UpdateError),
    Progress(DownloadProgress),
    Downloaded(PathBuf),
    DownloadFailed(UpdateError),
}

/// Runs a release check on a Tokio task. Sends exactly one completion event.
pub fn spawn_check(query: ReleaseQuery, prerelease: bool, tx: UnboundedSender<UpdateEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UpdateError::Cancelled),
            result = query.check_for_update(prerelease) => result,
        };
        let event = match result {
            Ok(release) => UpdateEvent::CheckCompleted(release),
            Err(e) => UpdateEvent::CheckFailed(e),
        };
        if tx.send(event).is_err() {
            tracing::debug!("check finished after the receiver went away");
        }
    })
}

/// Downloads on a Tokio task. Sends progress events, then exactly one of
/// `Downloaded` or `DownloadFailed`.
pub fn spawn_download(
    downloader: Downloader,
    url: String,
    dest: PathBuf,
    tx: UnboundedSender<UpdateEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let result = downloader
            .download(&url, &dest, &cancel, move |progress| {
                let _ = progress_tx.send(UpdateEvent::Progress(progress));
            })
            .await;
        let event = match result {
            Ok(path) => UpdateEvent::Downloaded(path),
            Err(e) => UpdateEvent::DownloadFailed(e),
        };
        if tx.send(event).is_err() {
            tracing::debug!("download finished after the receiver went away");
        }
    })
}

/// How an update attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoUpdate,
    /// The check failed; reported to the user as "no update".
    CheckFailed,
    DownloadDeclined,
    DownloadFailed,
    Cancelled,
    InstallDeclined,
    InstallAborted,
    InstallFailed,
    Terminated { pid: u32, elevated: bool },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    pub prerelease: bool,
    /// Skip the download and install confirmations. Elevation is always asked.
    pub assume_yes: bool,
}

pub struct UpdateWorkflow<'a> {
    ctx: &'a AppContext,
    config: &'a UpdaterConfig,
    prompter: &'a dyn Prompter,
    process: &'a dyn ProcessControl,
    slot: UpdateSlot,
    candidates: InstallCandidates,
    protected_roots: Option<Vec<PathBuf>>,
    writable_probe: Option<fn(&Path) -> bool>,
    staging_dir: Option<PathBuf>,
    download_finished: Option<Box<dyn Fn() + 'a>>,
}

impl<'a> UpdateWorkflow<'a> {
    pub fn new(ctx: &'a AppContext, config: &'a UpdaterConfig, prompter: &'a dyn Prompter, process: &'a dyn ProcessControl) -> Self {
        Self {
            ctx,
            config,
            prompter,
            process,
            slot: UpdateSlot::new(),
            candidates: InstallCandidates::for_platform(&ctx.app_name),
            protected_roots: None,
            writable_probe: None,
            staging_dir: None,
            download_finished: None,
        }
    }

    pub fn with_slot(mut self, slot: UpdateSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_candidates(mut self, candidates: InstallCandidates) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_protected_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.protected_roots = Some(roots);
        self
    }

    pub fn with_writable_probe(mut self, probe: fn(&Path) -> bool) -> Self {
        self.writable_probe = Some(probe);
        self
    }

    /// Downloads into `dir` instead of the data directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Called once when a download ends, whether it succeeded or not, before
    /// anything else is printed or asked.
    pub fn on_download_finished(mut self, hook: impl Fn() + 'a) -> Self {
        self.download_finished = Some(Box::new(hook));
        self
    }

    pub fn slot(&self) -> &UpdateSlot {
        &self.slot
    }

    /// Checks for an update without downloading anything.
    pub async fn check(&self, prerelease: bool, cancel: &CancellationToken) -> Result<Option<ReleaseInfo>, UpdateError> {
        self.slot.try_begin()?;
        let result = self.check_in_slot(prerelease, cancel).await;
        self.slot.release();
        result
    }

    async fn check_in_slot(&self, prerelease: bool, cancel: &CancellationToken) -> Result<Option<ReleaseInfo>, UpdateError> {
        let query = ReleaseQuery::new(self.config, self.ctx)?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_check(query, prerelease, tx, cancel.clone());

        match rx.recv().await {
            Some(UpdateEvent::CheckCompleted(Some(release))) => {
                self.slot.transition(UpdateState::UpdateFound)?;
                Ok(Some(release))
            }
            Some(UpdateEvent::CheckCompleted(None)) => {
                self.slot.transition(UpdateState::NoUpdate)?;
                Ok(None)
            }
            Some(UpdateEvent::CheckFailed(e)) => Err(e),
            Some(other) => {
                tracing::error!(event = ?other, "unexpected event during check");
                Err(UpdateError::Cancelled)
            }
            None => Err(UpdateError::Cancelled),
        }
    }

    /// Runs a full attempt: check, confirm, download, confirm, install.
    ///
    /// Only a busy slot is returned as an error; every other failure is
    /// reported to the user and folded into the outcome. On a successful
    /// launch the current process is terminated through [`ProcessControl`].
    pub async fn run<F>(&self, options: UpdateOptions, cancel: &CancellationToken, on_progress: F) -> Result<UpdateOutcome, UpdateError>
    where
        F: FnMut(DownloadProgress),
    {
        self.slot.try_begin()?;
        let result = self.run_in_slot(options, cancel, on_progress).await;
        self.slot.release();
        result
    }

    async fn run_in_slot<F>(&self, options: UpdateOptions, cancel: &CancellationToken, mut on_progress: F) -> Result<UpdateOutcome, UpdateError>
    where
        F: FnMut(DownloadProgress),
    {
        msg_info!(Message::CheckingForUpdates {
            owner: self.config.owner.clone(),
            repo: self.config.repo.clone(),
            prerelease: options.prerelease,
        });

        let release = match self.check_in_slot(options.prerelease, cancel).await {
            Ok(Some(release)) => release,
            Ok(None) => {
                msg_info!(Message::NoUpdateAvailable);
                return Ok(UpdateOutcome::NoUpdate);
            }
            Err(UpdateError::Cancelled) => {
                msg_warning!(Message::OperationCancelled);
                return Ok(UpdateOutcome::Cancelled);
            }
            Err(e) => {
                tracing::warn!(error = %e, "update check failed");
                msg_info!(Message::NoUpdateAvailable);
                return Ok(UpdateOutcome::CheckFailed);
            }
        };

        msg_print!(
            Message::UpdateAvailable {
                app_name: self.ctx.app_name.clone(),
                current: self.ctx.version_tag.clone(),
                latest: release.version_tag.clone(),
            },
            true
        );
        msg_print!(Message::UpdateReleaseDetails {
            asset: release.asset_name.clone(),
            published: release.published_at.clone(),
            page: release.page_url.clone(),
        });

        let download_prompt = Message::ConfirmDownload {
            version: release.version_tag.clone(),
            asset: release.asset_name.clone(),
        };
        if !options.assume_yes && !self.prompter.confirm(&download_prompt, true) {
            msg_info!(Message::DownloadSkipped);
            return Ok(UpdateOutcome::DownloadDeclined);
        }

        self.slot.transition(UpdateState::Downloading)?;
        let downloaded = self.download(&release, cancel, &mut on_progress).await;
        if let Some(hook) = &self.download_finished {
            hook();
        }
        let downloaded = match downloaded {
            Ok(path) => path,
            Err(UpdateError::Cancelled) => {
                msg_warning!(Message::DownloadCancelled);
                return Ok(UpdateOutcome::Cancelled);
            }
            Err(e) => {
                tracing::error!(error = %e, "download failed");
                msg_error!(Message::DownloadFailed(e.to_string()));
                return Ok(UpdateOutcome::DownloadFailed);
            }
        };
        self.slot.transition(UpdateState::Downloaded)?;
        msg_success!(Message::DownloadCompleted(downloaded.display().to_string()));

        let install_prompt = Message::ConfirmInstall(downloaded.display().to_string());
        if !options.assume_yes && !self.prompter.confirm(&install_prompt, true) {
            msg_info!(Message::InstallSkipped);
            return Ok(UpdateOutcome::InstallDeclined);
        }

        self.slot.transition(UpdateState::Installing)?;
        match self.launcher().install(&downloaded).await {
            Ok(LaunchOutcome::Launched { pid, elevated }) => {
                msg_success!(Message::InstallLaunched { pid, elevated });
                self.slot.transition(UpdateState::Terminated)?;
                msg_info!(Message::ExitingForUpdate);
                self.process.terminate_current();
                Ok(UpdateOutcome::Terminated { pid, elevated })
            }
            Err(UpdateError::Aborted) => {
                self.slot.transition(UpdateState::InstallFailed)?;
                msg_warning!(Message::InstallAborted);
                Ok(UpdateOutcome::InstallAborted)
            }
            Err(e) => {
                self.slot.transition(UpdateState::InstallFailed)?;
                self.prompter.report_error(&e);
                if e.offers_log() {
                    self.offer_log().await;
                }
                Ok(UpdateOutcome::InstallFailed)
            }
        }
    }

    async fn download<F>(&self, release: &ReleaseInfo, cancel: &CancellationToken, on_progress: &mut F) -> Result<PathBuf, UpdateError>
    where
        F: FnMut(DownloadProgress),
    {
        let downloader = Downloader::new(self.config, self.ctx)?;
        let dest = match &self.staging_dir {
            Some(dir) => staging_path_in(dir, &release.asset_name)?,
            None => staging_path(&release.asset_name)?,
        };
        msg_info!(Message::DownloadStarted {
            url: release.download_url.clone(),
            dest: dest.display().to_string(),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        spawn_download(downloader, release.download_url.clone(), dest, tx, cancel.clone());
        drain_download(rx, on_progress).await
    }

    fn launcher(&self) -> InstallLauncher<'_> {
        let mut launcher = InstallLauncher::new(self.candidates.clone(), self.process, self.prompter);
        if let Some(roots) = &self.protected_roots {
            launcher = launcher.with_protected_roots(roots.clone());
        }
        if let Some(probe) = self.writable_probe {
            launcher = launcher.with_writable_probe(probe);
        }
        launcher
    }

    async fn offer_log(&self) {
        let log_path = self.ctx.log_path.display().to_string();
        msg_info!(Message::LogFileLocation(log_path.clone()));
        if !self.prompter.confirm(&Message::ConfirmOpenLog(log_path.clone()), false) {
            return;
        }
        if let Err(e) = open_path_or_url(&log_path).await {
            msg_error!(Message::OpenLogFailed(e.to_string()));
        }
    }
}

/// Forwards progress events until the download task reports completion.
pub async fn drain_download<F>(mut rx: UnboundedReceiver<UpdateEvent>, on_progress: &mut F) -> Result<PathBuf, UpdateError>
where
    F: FnMut(DownloadProgress),
{
    while let Some(event) = rx.recv().await {
        match event {
            UpdateEvent::Progress(progress) => on_progress(progress),
            UpdateEvent::Downloaded(path) => return Ok(path),
            UpdateEvent::DownloadFailed(e) => return Err(e),
            other => tracing::error!(event = ?other, "unexpected event during download"),
        }
    }
    Err(UpdateError::Cancelled)
}
