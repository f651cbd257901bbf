//! Display implementation for updater messages.
//!
//! All message text is defined here so that prompts, progress lines and
//! error reports read consistently across the `check`, `update`, `init`,
//! `info` and `links` commands.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let text = match self {
            // === UPDATE CHECK MESSAGES ===
            Message::CheckingForUpdates { owner, repo, prerelease } => {
                let channel = if *prerelease { "pre-release" } else { "stable" };
                format!("Checking {}/{} for the latest {} release...", owner, repo, channel)
            }
            Message::UpdateAvailable { app_name, current, latest } => {
                format!("A new version of {} is available: {} (you have {})", app_name, latest, current)
            }
            Message::UpdateReleaseDetails { asset, published, page } => {
                let published = if published.is_empty() { "unknown date" } else { published.as_str() };
                if page.is_empty() {
                    format!("Asset: {} (published {})", asset, published)
                } else {
                    format!("Asset: {} (published {})\nRelease notes: {}", asset, published, page)
                }
            }
            Message::NoUpdateAvailable => "No updates available.".to_string(),
            Message::UpdateCheckFailed(error) => format!("Update check failed: {}", error),
            Message::UpdaterBusy(state) => format!("Another update operation is already running ({}).", state),

            // === DOWNLOAD MESSAGES ===
            Message::ConfirmDownload { version, asset } => format!("Download {} ({}) now?", version, asset),
            Message::DownloadSkipped => "Download skipped.".to_string(),
            Message::DownloadStarted { url, dest } => format!("Downloading {}\n  to {}", url, dest),
            Message::DownloadCompleted(path) => format!("Download finished: {}", path),
            Message::DownloadFailed(error) => format!("Download failed: {}", error),
            Message::DownloadCancelled => "Download cancelled.".to_string(),

            // === INSTALL MESSAGES ===
            Message::ConfirmInstall(path) => format!("Install and launch {} now? The running updater will exit.", path),
            Message::InstallSkipped => "Installation skipped. The downloaded file was kept.".to_string(),
            Message::InstallTargetResolved(dir) => format!("Install directory: {}", dir),
            Message::InstallTargetFallback(dir) => {
                format!("System install directory is not writable, using {} instead", dir)
            }
            Message::ConfirmElevation(path) => {
                format!("{} is inside a protected system directory. Run the installer as administrator?", path)
            }
            Message::ConfirmContinueUnelevated => "Continue without administrator rights?".to_string(),
            Message::RunningUnelevated => "Launching without administrator rights; the installer may fail to write its files.".to_string(),
            Message::ElevationFailed(error) => format!("Could not obtain administrator rights: {}", error),
            Message::InstallLaunched { pid, elevated } => {
                if *elevated {
                    format!("Installer started as administrator (PID: {})", pid)
                } else {
                    format!("Installer started (PID: {})", pid)
                }
            }
            Message::InstallFailed(error) => format!("Installation failed: {}", error),
            Message::InstallAborted => "Installation aborted.".to_string(),
            Message::ExitingForUpdate => "Exiting so the new version can take over.".to_string(),

            // === DIAGNOSTIC LOG MESSAGES ===
            Message::ConfirmOpenLog(path) => format!("Open the diagnostic log ({})?", path),
            Message::LogFileLocation(path) => format!("Diagnostic log: {}", path),
            Message::OpenLogFailed(error) => format!("Failed to open the diagnostic log: {}", error),
            Message::LogInitFailed(error) => format!("Diagnostic logging is unavailable: {}", error),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed, defaults will be used.".to_string(),
            Message::ConfigNothingToDelete => "No configuration file found, nothing to remove.".to_string(),
            Message::ConfigModuleRepository => "Release repository".to_string(),
            Message::ConfigModuleChannel => "Update channel".to_string(),

            // === SYSTEM INFO MESSAGES ===
            Message::SystemInfoHeader => "System Information".to_string(),
            Message::RunningOn(os) => format!("You are running BunnyPad on {}", os),

            // === LINK MESSAGES ===
            Message::OpeningLink(url) => format!("Opening {}", url),
            Message::OpenLinkFailed(error) => format!("Failed to open the link: {}", error),

            // === PROMPTS ===
            Message::PromptRepoOwner => "Repository owner".to_string(),
            Message::PromptRepoName => "Repository name".to_string(),
            Message::PromptApiBase => "Release API base URL".to_string(),
            Message::PromptIncludePrereleases => "Follow pre-releases (CarrotPatch builds)?".to_string(),
            Message::PromptVersionPolicy => "When should a release count as an update?".to_string(),
            Message::PromptAssetFilter => "Asset name filter (empty = first asset)".to_string(),
            Message::PromptTimeoutSecs => "Network timeout in seconds (0 = none)".to_string(),
            Message::PromptSelectDownloadOption => "Select a download option".to_string(),

            // === GENERAL MESSAGES ===
            Message::OperationCancelled => "Operation cancelled.".to_string(),
            Message::CommandTimedOut { command, secs } => format!("Command '{}' timed out after {}s", command, secs),
        };

        write!(f, "{}", text)
    }
}
