/// Every user-facing message of the updater.
///
/// Text lives in one place (`display.rs`); call sites only pick a variant
/// and supply parameters.
#[derive(Debug, Clone)]
pub enum Message {
    // === UPDATE CHECK MESSAGES ===
    CheckingForUpdates { owner: String, repo: String, prerelease: bool },
    UpdateAvailable { app_name: String, current: String, latest: String },
    UpdateReleaseDetails { asset: String, published: String, page: String },
    NoUpdateAvailable,
    UpdateCheckFailed(String),
    UpdaterBusy(String),

    // === DOWNLOAD MESSAGES ===
    ConfirmDownload { version: String, asset: String },
    DownloadSkipped,
    DownloadStarted { url: String, dest: String },
    DownloadCompleted(String),
    DownloadFailed(String),
    DownloadCancelled,

    // === INSTALL MESSAGES ===
    ConfirmInstall(String),
    InstallSkipped,
    InstallTargetResolved(String),
    InstallTargetFallback(String),
    ConfirmElevation(String),
    ConfirmContinueUnelevated,
    RunningUnelevated,
    ElevationFailed(String),
    InstallLaunched { pid: u32, elevated: bool },
    InstallFailed(String),
    InstallAborted,
    ExitingForUpdate,

    // === DIAGNOSTIC LOG MESSAGES ===
    ConfirmOpenLog(String),
    LogFileLocation(String),
    OpenLogFailed(String),
    LogInitFailed(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNothingToDelete,
    ConfigModuleRepository,
    ConfigModuleChannel,

    // === SYSTEM INFO MESSAGES ===
    SystemInfoHeader,
    RunningOn(String),

    // === LINK MESSAGES ===
    OpeningLink(String),
    OpenLinkFailed(String),

    // === PROMPTS ===
    PromptRepoOwner,
    PromptRepoName,
    PromptApiBase,
    PromptIncludePrereleases,
    PromptVersionPolicy,
    PromptAssetFilter,
    PromptTimeoutSecs,
    PromptSelectDownloadOption,

    // === GENERAL MESSAGES ===
    OperationCancelled,
    CommandTimedOut { command: String, secs: u64 },
}
