//! OS process helpers: short-lived commands, detached launches and
//! privilege checks.
//!
//! Everything the installer does to the process table goes through
//! [`ProcessControl`] so the install flow can be exercised without
//! launching anything or exiting the test runner.

use super::error::UpdateError;
use super::logging;
use super::messages::Message;
use crate::msg_error_anyhow;
use anyhow::Result;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Upper bound for helper commands such as `xattr` or `xdg-open`.
pub const SAFE_RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `program` with `args` and collects its output, giving up after
/// [`SAFE_RUN_TIMEOUT`]. The child is killed when the timeout fires.
pub async fn safe_run(program: &str, args: &[&str]) -> Result<Output> {
    safe_run_with_timeout(program, args, SAFE_RUN_TIMEOUT).await
}

pub async fn safe_run_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Result<Output> {
    tracing::debug!(program, ?args, "running helper command");
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, child).await {
        Ok(output) => {
            let output = output?;
            if !output.status.success() {
                tracing::warn!(program, status = ?output.status.code(), "helper command failed");
            }
            Ok(output)
        }
        Err(_) => {
            tracing::warn!(program, secs = timeout.as_secs(), "helper command timed out");
            Err(msg_error_anyhow!(Message::CommandTimedOut {
                command: program.to_string(),
                secs: timeout.as_secs(),
            }))
        }
    }
}

/// Opens a file or URL with the desktop's default handler.
pub async fn open_path_or_url(target: &str) -> Result<()> {
    let output = if cfg!(target_os = "windows") {
        safe_run("cmd", &["/C", "start", "", target]).await?
    } else if cfg!(target_os = "macos") {
        safe_run("open", &[target]).await?
    } else {
        safe_run("xdg-open", &[target]).await?
    };

    if !output.status.success() {
        anyhow::bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(())
}

/// Clears the macOS quarantine flag so a downloaded artifact can be launched.
/// A no-op elsewhere. Failures are logged and ignored.
pub async fn clear_quarantine(path: &Path) {
    if !cfg!(target_os = "macos") {
        return;
    }
    let path = path.to_string_lossy();
    if let Err(e) = safe_run("xattr", &["-c", &path]).await {
        tracing::warn!(error = %e, "could not clear quarantine attribute");
    }
}

/// Process-table operations used by the installer.
pub trait ProcessControl {
    /// Whether the current process already holds administrator/root rights.
    fn is_elevated(&self) -> bool;

    /// Launches `path` detached from this process and returns its PID.
    fn spawn_detached(&self, path: &Path) -> Result<u32, UpdateError>;

    /// Launches `path` through the OS elevation prompt and returns its PID.
    fn spawn_elevated(&self, path: &Path) -> Result<u32, UpdateError>;

    /// Ends the current process so the launched artifact can take over.
    /// Pending diagnostic log lines are flushed first.
    fn terminate_current(&self);
}

/// [`ProcessControl`] backed by the real operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcess;

#[cfg(unix)]
impl ProcessControl for SystemProcess {
    fn is_elevated(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn spawn_detached(&self, path: &Path) -> Result<u32, UpdateError> {
        use std::os::unix::process::CommandExt;

        let mut command = std::process::Command::new(path);
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            command.pre_exec(|| {
                nix::unistd::setsid()?;
                Ok(())
            });
        }
        let child = command.spawn().map_err(|source| UpdateError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(child.id())
    }

    fn spawn_elevated(&self, path: &Path) -> Result<u32, UpdateError> {
        Err(UpdateError::Elevation(format!(
            "elevated launch of {} is not supported on this platform",
            path.display()
        )))
    }

    fn terminate_current(&self) {
        tracing::info!(pid = std::process::id(), "terminating for update");
        logging::shutdown();
        std::process::exit(0);
    }
}

#[cfg(windows)]
impl ProcessControl for SystemProcess {
    fn is_elevated(&self) -> bool {
        windows::is_admin()
    }

    fn spawn_detached(&self, path: &Path) -> Result<u32, UpdateError> {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

        let child = std::process::Command::new(path)
            .creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP)
            .spawn()
            .map_err(|source| UpdateError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(child.id())
    }

    fn spawn_elevated(&self, path: &Path) -> Result<u32, UpdateError> {
        windows::run_as(path)
    }

    fn terminate_current(&self) {
        tracing::info!(pid = std::process::id(), "terminating for update");
        logging::shutdown();
        std::process::exit(0);
    }
}

#[cfg(windows)]
mod windows {
    use super::UpdateError;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    const ERROR_CANCELLED: u32 = 1223;

    fn wide(value: &OsStr) -> Vec<u16> {
        value.encode_wide().chain(std::iter::once(0)).collect()
    }

    pub fn is_admin() -> bool {
        use std::ptr;
        use winapi::um::handleapi::CloseHandle;
        use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
        use winapi::um::securitybaseapi::GetTokenInformation;
        use winapi::um::winnt::{TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};

        unsafe {
            let mut token = ptr::null_mut();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                return false;
            }

            let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
            let mut size = 0;
            let result = GetTokenInformation(
                token,
                TokenElevation,
                &mut elevation as *mut _ as *mut _,
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut size,
            );
            CloseHandle(token);

            result != 0 && elevation.TokenIsElevated != 0
        }
    }

    /// Launches `path` with the "runas" verb, which raises the UAC prompt.
    pub fn run_as(path: &Path) -> Result<u32, UpdateError> {
        use std::mem;
        use std::ptr;
        use winapi::um::errhandlingapi::GetLastError;
        use winapi::um::handleapi::CloseHandle;
        use winapi::um::processthreadsapi::GetProcessId;
        use winapi::um::shellapi::{ShellExecuteExW, SEE_MASK_NOCLOSEPROCESS, SHELLEXECUTEINFOW};
        use winapi::um::winuser::SW_SHOWNORMAL;

        let verb = wide(OsStr::new("runas"));
        let file = wide(path.as_os_str());
        let directory = path.parent().map(|dir| wide(dir.as_os_str()));

        unsafe {
            let mut info: SHELLEXECUTEINFOW = mem::zeroed();
            info.cbSize = mem::size_of::<SHELLEXECUTEINFOW>() as u32;
            info.fMask = SEE_MASK_NOCLOSEPROCESS;
            info.lpVerb = verb.as_ptr();
            info.lpFile = file.as_ptr();
            info.lpDirectory = directory.as_ref().map_or(ptr::null(), |dir| dir.as_ptr());
            info.nShow = SW_SHOWNORMAL;

            if ShellExecuteExW(&mut info) == 0 {
                let code = GetLastError();
                if code == ERROR_CANCELLED {
                    return Err(UpdateError::Elevation("the elevation prompt was declined".to_string()));
                }
                return Err(UpdateError::Elevation(format!("ShellExecuteExW failed with error {}", code)));
            }

            if info.hProcess.is_null() {
                return Ok(0);
            }
            let pid = GetProcessId(info.hProcess);
            CloseHandle(info.hProcess);
            Ok(pid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn safe_run_collects_output() {
        let output = safe_run("sh", &["-c", "echo bunny"]).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "bunny");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn safe_run_gives_up_after_the_timeout() {
        let err = safe_run_with_timeout("sleep", &["5"], Duration::from_millis(100)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn safe_run_reports_missing_programs() {
        assert!(safe_run("bunnypad-no-such-program", &[]).await.is_err());
    }
}
