//! Placing a downloaded artifact and launching it.
//!
//! ## Target Resolution
//!
//! Candidates are probed in a fixed order and the first usable one wins:
//!
//! 1. the platform's system application directory, if it exists and is writable
//! 2. the same directory created inside its parent, if it does not exist yet
//!    and the parent is writable
//! 3. the user's downloads directory, unconditionally
//!
//! ## Launching
//!
//! On Unix the artifact is marked executable and started in its own session.
//! When the target sits below a protected system root (Program Files and
//! friends on Windows) and the updater is not elevated, the user is asked
//! before an elevated launch is attempted; if that is declined or fails the
//! user chooses between continuing unelevated and aborting.

use super::error::UpdateError;
use super::messages::Message;
use super::process::{clear_quarantine, ProcessControl};
use super::prompt::Prompter;
use crate::{msg_info, msg_warning};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Ranked places an update artifact may be installed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCandidates {
    pub system_dir: PathBuf,
    pub downloads_dir: PathBuf,
}

impl InstallCandidates {
    pub fn new(system_dir: impl Into<PathBuf>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            system_dir: system_dir.into(),
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Conventional locations for `app_name` on the running OS.
    pub fn for_platform(app_name: &str) -> Self {
        let system_dir = match env::consts::OS {
            "windows" => {
                let program_files = env::var("ProgramFiles").unwrap_or_else(|_| r"C:\Program Files".to_string());
                PathBuf::from(program_files).join(app_name)
            }
            "macos" => PathBuf::from("/Applications").join(app_name),
            _ => PathBuf::from("/opt").join(app_name.to_lowercase()),
        };

        let downloads_dir = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(system_dir, downloads_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub dir: PathBuf,
    pub writable: bool,
}

/// Checks writability by creating and removing a probe file in `dir`.
pub fn probe_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(format!(".bunnypad-write-probe-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Picks the install directory. Never returns a non-writable system directory.
pub fn resolve_install_target<F>(candidates: &InstallCandidates, is_writable: F) -> InstallTarget
where
    F: Fn(&Path) -> bool,
{
    let system = &candidates.system_dir;

    if system.is_dir() {
        if is_writable(system) {
            return InstallTarget {
                dir: system.clone(),
                writable: true,
            };
        }
        tracing::info!(dir = %system.display(), "system directory is not writable");
    } else if let Some(parent) = system.parent().filter(|parent| parent.is_dir()) {
        if is_writable(parent) {
            match fs::create_dir_all(system) {
                Ok(()) => {
                    tracing::info!(dir = %system.display(), "created system directory");
                    return InstallTarget {
                        dir: system.clone(),
                        writable: true,
                    };
                }
                Err(e) => tracing::warn!(dir = %system.display(), error = %e, "cannot create system directory"),
            }
        } else {
            tracing::info!(dir = %parent.display(), "parent of system directory is not writable");
        }
    }

    let downloads = &candidates.downloads_dir;
    if let Err(e) = fs::create_dir_all(downloads) {
        tracing::warn!(dir = %downloads.display(), error = %e, "cannot create downloads directory");
    }
    InstallTarget {
        dir: downloads.clone(),
        writable: is_writable(downloads),
    }
}

fn normalized_components(path: &str) -> Vec<String> {
    path.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect()
}

/// Whether `path` lies inside one of `protected_roots`.
///
/// Comparison is by path component, case-insensitive, and accepts both
/// separator styles, matching how Windows treats paths.
pub fn is_protected_path(path: &Path, protected_roots: &[PathBuf]) -> bool {
    let path = normalized_components(&path.to_string_lossy());
    protected_roots.iter().any(|root| {
        let root = normalized_components(&root.to_string_lossy());
        !root.is_empty() && path.len() >= root.len() && path[..root.len()] == root[..]
    })
}

/// Directories an unelevated process may not write to on this OS.
pub fn protected_roots_for_platform() -> Vec<PathBuf> {
    if !cfg!(target_os = "windows") {
        return Vec::new();
    }
    ["ProgramFiles", "ProgramFiles(x86)", "ProgramW6432", "SystemRoot", "ProgramData"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(PathBuf::from)
        .collect()
}

/// Moves the artifact into `dir` unless it is already there.
fn place_artifact(downloaded: &Path, dir: &Path) -> Result<PathBuf, UpdateError> {
    if downloaded.parent() == Some(dir) {
        return Ok(downloaded.to_path_buf());
    }
    let file_name = downloaded.file_name().ok_or_else(|| UpdateError::Permission {
        path: downloaded.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "artifact path has no file name"),
    })?;
    let dest = dir.join(file_name);

    if fs::rename(downloaded, &dest).is_err() {
        fs::copy(downloaded, &dest).map_err(|source| UpdateError::Permission {
            path: dest.clone(),
            source,
        })?;
        if let Err(e) = fs::remove_file(downloaded) {
            tracing::debug!(error = %e, "staged artifact left behind");
        }
    }
    tracing::info!(dest = %dest.display(), "artifact placed");
    Ok(dest)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), UpdateError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| UpdateError::Permission {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), UpdateError> {
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched { pid: u32, elevated: bool },
}

/// Installs and launches a downloaded artifact.
pub struct InstallLauncher<'a> {
    candidates: InstallCandidates,
    protected_roots: Vec<PathBuf>,
    is_writable: fn(&Path) -> bool,
    process: &'a dyn ProcessControl,
    prompter: &'a dyn Prompter,
}

impl<'a> InstallLauncher<'a> {
    pub fn new(candidates: InstallCandidates, process: &'a dyn ProcessControl, prompter: &'a dyn Prompter) -> Self {
        Self {
            candidates,
            protected_roots: protected_roots_for_platform(),
            is_writable: probe_writable,
            process,
            prompter,
        }
    }

    pub fn with_protected_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.protected_roots = roots;
        self
    }

    pub fn with_writable_probe(mut self, is_writable: fn(&Path) -> bool) -> Self {
        self.is_writable = is_writable;
        self
    }

    pub fn resolve_target(&self) -> InstallTarget {
        resolve_install_target(&self.candidates, self.is_writable)
    }

    /// Places `downloaded` in the resolved target and launches it.
    ///
    /// Does not terminate the current process; that is left to the caller.
    pub async fn install(&self, downloaded: &Path) -> Result<LaunchOutcome, UpdateError> {
        let target = self.resolve_target();
        if target.dir == self.candidates.system_dir {
            msg_info!(Message::InstallTargetResolved(target.dir.display().to_string()));
        } else {
            msg_warning!(Message::InstallTargetFallback(target.dir.display().to_string()));
        }

        let artifact = place_artifact(downloaded, &target.dir)?;
        set_executable(&artifact)?;
        clear_quarantine(&artifact).await;

        if is_protected_path(&artifact, &self.protected_roots) && !self.process.is_elevated() {
            return self.launch_protected(&artifact);
        }

        let pid = self.process.spawn_detached(&artifact)?;
        tracing::info!(pid, path = %artifact.display(), "artifact launched");
        Ok(LaunchOutcome::Launched { pid, elevated: false })
    }

    fn launch_protected(&self, artifact: &Path) -> Result<LaunchOutcome, UpdateError> {
        let path = artifact.display().to_string();

        if self.prompter.confirm(&Message::ConfirmElevation(path), true) {
            match self.process.spawn_elevated(artifact) {
                Ok(pid) => {
                    tracing::info!(pid, "artifact launched elevated");
                    return Ok(LaunchOutcome::Launched { pid, elevated: true });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "elevated launch failed");
                    msg_warning!(Message::ElevationFailed(e.to_string()));
                }
            }
        }

        if !self.prompter.confirm(&Message::ConfirmContinueUnelevated, false) {
            tracing::info!("install aborted at elevation prompt");
            return Err(UpdateError::Aborted);
        }

        msg_warning!(Message::RunningUnelevated);
        let pid = self.process.spawn_detached(artifact)?;
        tracing::info!(pid, "artifact launched without elevation");
        Ok(LaunchOutcome::Launched { pid, elevated: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_paths_match_case_insensitively_by_component() {
        let roots = vec![PathBuf::from(r"C:\Program Files")];
        assert!(is_protected_path(Path::new(r"c:\program files\BunnyPad\setup.exe"), &roots));
        assert!(is_protected_path(Path::new("C:/Program Files/BunnyPad"), &roots));
        assert!(!is_protected_path(Path::new(r"C:\Program Files Extra\BunnyPad"), &roots));
        assert!(!is_protected_path(Path::new(r"C:\Users\bun\Downloads\setup.exe"), &roots));
    }

    #[test]
    fn no_roots_means_nothing_is_protected() {
        assert!(!is_protected_path(Path::new("/opt/bunnypad"), &[]));
    }

    #[test]
    fn platform_candidates_end_in_the_app_directory() {
        let candidates = InstallCandidates::for_platform("BunnyPad");
        let name = candidates.system_dir.file_name().unwrap().to_string_lossy().to_lowercase();
        assert_eq!(name, "bunnypad");
    }
}
