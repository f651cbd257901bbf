//! Process-wide application context.
//!
//! Everything the update workflow needs to know about the running program
//! and the machine it runs on is gathered once at startup into an
//! [`AppContext`] and then passed around by reference. Nothing in here
//! changes after construction.

use super::config::{APP_METADATA_DISPLAY_NAME, APP_METADATA_NAME, APP_METADATA_RELEASE_TAG, APP_METADATA_VERSION};
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};

/// Hardware and OS facts shown by the `info` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: usize,
    /// Total physical memory in bytes.
    pub total_memory: u64,
    /// Size of the disk holding the working directory, in bytes.
    pub disk_total: u64,
    pub disk_free: u64,
}

impl SystemInfo {
    /// Probes the host. Values the OS does not report are left as "Unknown".
    pub fn collect(current_dir: &Path) -> Self {
        let sys = System::new_all();
        let unknown = || "Unknown".to_string();

        let cpu = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(unknown);

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|disk| current_dir.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .or_else(|| disks.list().first());

        SystemInfo {
            os_name: System::name().unwrap_or_else(unknown),
            os_version: System::long_os_version().or_else(System::os_version).unwrap_or_else(unknown),
            kernel_version: System::kernel_version().unwrap_or_else(unknown),
            arch: env::consts::ARCH.to_string(),
            cpu,
            cpu_cores: sys.cpus().len(),
            total_memory: sys.total_memory(),
            disk_total: disk.map(|disk| disk.total_space()).unwrap_or(0),
            disk_free: disk.map(|disk| disk.available_space()).unwrap_or(0),
        }
    }
}

/// Human readable OS description for the "running on" banner.
pub fn describe_os(os: &str, info: &SystemInfo) -> String {
    match os {
        "linux" => format!("{} - Kernel: {}", info.os_version, info.kernel_version),
        "macos" => {
            let chip = if info.arch.starts_with("aarch64") || info.arch.starts_with("arm") {
                "Apple Silicon"
            } else {
                "Intel"
            };
            format!("{} - Chip: {}", info.os_version, chip)
        }
        "windows" => format!("{} (Build {})", info.os_version, info.kernel_version),
        other => format!("{} {}", other, info.os_version),
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    /// Product name shown to the user.
    pub app_name: String,
    /// Release tag of the running build, compared against published tags.
    pub version_tag: String,
    /// Cargo package version of the updater itself.
    pub package_version: String,
    pub display_os: String,
    pub system: SystemInfo,
    pub current_dir: PathBuf,
    /// Diagnostic log the user is offered after install failures.
    pub log_path: PathBuf,
}

impl AppContext {
    pub fn new(log_path: PathBuf) -> Result<Self> {
        let current_dir = env::current_dir()?;
        let system = SystemInfo::collect(&current_dir);
        let display_os = describe_os(env::consts::OS, &system);

        Ok(AppContext {
            app_name: APP_METADATA_DISPLAY_NAME.to_string(),
            version_tag: APP_METADATA_RELEASE_TAG.to_string(),
            package_version: APP_METADATA_VERSION.to_string(),
            display_os,
            system,
            current_dir,
            log_path,
        })
    }

    /// User-Agent sent with every request to the release host.
    pub fn user_agent(&self) -> String {
        format!("{}/{} ({})", APP_METADATA_NAME, self.package_version, self.version_tag)
    }
}
