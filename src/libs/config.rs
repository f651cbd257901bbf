//! Updater configuration.
//!
//! Settings live in `config.json` inside the platform data directory
//! ([`DataStorage`]). A missing file means "use the defaults", which point at
//! the official BunnyPad repository on GitHub.
//!
//! ## File Location
//!
//! - **Windows**: `%LOCALAPPDATA%\gsyt\bunnypad\config.json`
//! - **macOS**: `~/Library/Application Support/gsyt/bunnypad/config.json`
//! - **Linux**: `~/.local/share/gsyt/bunnypad/config.json`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bunnypad_updater::libs::config::UpdaterConfig;
//!
//! let mut config = UpdaterConfig::read()?;
//! config.include_prereleases = true;
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use super::version::VersionPolicy;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::time::Duration;

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default release API host.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Where to look for releases and how to judge them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Repository owner on the release host.
    pub owner: String,

    /// Repository name on the release host.
    pub repo: String,

    /// Base URL of the release API, without a trailing slash.
    pub api_base: String,

    /// Follow the pre-release (CarrotPatch) channel instead of stable releases.
    pub include_prereleases: bool,

    /// How a release tag is compared with the running build.
    pub version_policy: VersionPolicy,

    /// Substring an asset name must contain; the first asset is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_filter: Option<String>,

    /// Network timeout for release queries and downloads. Unset means no timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        UpdaterConfig {
            owner: APP_METADATA_OWNER.to_string(),
            repo: APP_METADATA_REPO.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            include_prereleases: false,
            version_policy: VersionPolicy::default(),
            asset_filter: None,
            timeout_secs: None,
        }
    }
}

impl UpdaterConfig {
    /// Loads the configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<UpdaterConfig> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;

        if !config_file_path.exists() {
            return Ok(UpdaterConfig::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: UpdaterConfig = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes the configuration file. Returns `false` if there was none.
    pub fn delete() -> Result<bool> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(config_file_path)?;
        Ok(true)
    }

    /// Release list endpoint for the configured repository.
    pub fn releases_url(&self) -> String {
        format!("{}/repos/{}/{}/releases", self.api_base.trim_end_matches('/'), self.owner, self.repo)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }

    /// Interactive setup wizard, prefilled with the current values.
    pub fn init() -> Result<Self> {
        let current = Self::read().unwrap_or_default();
        let theme = ColorfulTheme::default();

        msg_print!(Message::ConfigModuleRepository);
        let owner: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptRepoOwner.to_string())
            .default(current.owner.clone())
            .interact_text()?;
        let repo: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptRepoName.to_string())
            .default(current.repo.clone())
            .interact_text()?;
        let api_base: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptApiBase.to_string())
            .default(current.api_base.clone())
            .interact_text()?;

        msg_print!(Message::ConfigModuleChannel);
        let include_prereleases = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptIncludePrereleases.to_string())
            .default(current.include_prereleases)
            .interact()?;

        let policies: Vec<&str> = VersionPolicy::ALL.iter().map(|policy| policy.description()).collect();
        let default_policy = VersionPolicy::ALL.iter().position(|policy| *policy == current.version_policy).unwrap_or(0);
        let policy_index = Select::with_theme(&theme)
            .with_prompt(Message::PromptVersionPolicy.to_string())
            .items(&policies)
            .default(default_policy)
            .interact()?;

        let asset_filter: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptAssetFilter.to_string())
            .default(current.asset_filter.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        let timeout_secs: u64 = Input::with_theme(&theme)
            .with_prompt(Message::PromptTimeoutSecs.to_string())
            .default(current.timeout_secs.unwrap_or(0))
            .interact_text()?;

        Ok(UpdaterConfig {
            owner: owner.trim().to_string(),
            repo: repo.trim().to_string(),
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            include_prereleases,
            version_policy: VersionPolicy::ALL[policy_index],
            asset_filter: Some(asset_filter.trim().to_string()).filter(|filter| !filter.is_empty()),
            timeout_secs: Some(timeout_secs).filter(|secs| *secs > 0),
        })
    }
}
