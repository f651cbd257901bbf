//! Release lookup against a GitHub-style releases API.
//!
//! One GET of `{api_base}/repos/{owner}/{repo}/releases` returns the first
//! page of releases. From it [`select_release`] picks the newest release of
//! the requested channel (stable or pre-release) that has a downloadable
//! asset, and the configured [`VersionPolicy`] decides whether that release
//! is an update for the running build.

use super::config::UpdaterConfig;
use super::context::AppContext;
use super::error::UpdateError;
use super::version::VersionPolicy;
use chrono::{DateTime, FixedOffset};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawRelease {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<RawAsset>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawAsset {
    pub browser_download_url: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A release chosen for download. Never modified after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version_tag: String,
    pub download_url: String,
    pub asset_name: String,
    pub prerelease: bool,
    /// Publication timestamp as reported by the API, empty when absent.
    pub published_at: String,
    /// Release page, empty when absent.
    pub page_url: String,
    pub size: Option<u64>,
}

fn parse_published(published_at: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(published_at).ok()
}

/// Orders two `published_at` values. RFC 3339 timestamps are compared as
/// instants; anything else falls back to comparing the text, where a missing
/// value (empty) is the oldest.
fn compare_published(a: &str, b: &str) -> Ordering {
    match (parse_published(a), parse_published(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn pick_asset<'a>(assets: &'a [RawAsset], asset_filter: Option<&str>) -> Option<&'a RawAsset> {
    match asset_filter {
        Some(filter) => assets.iter().find(|asset| asset.name.contains(filter)),
        None => assets.first(),
    }
}

/// Picks the newest release of the requested channel that has a usable asset.
///
/// Only releases whose `prerelease` flag equals `prerelease` are considered.
/// Within them the latest `published_at` wins; equal or missing timestamps
/// keep the API's order, so the first such release is kept.
pub fn select_release(releases: &[RawRelease], prerelease: bool, asset_filter: Option<&str>) -> Option<ReleaseInfo> {
    let mut best: Option<ReleaseInfo> = None;

    for release in releases.iter().filter(|release| release.prerelease == prerelease) {
        let Some(asset) = pick_asset(&release.assets, asset_filter) else {
            tracing::debug!(tag = %release.tag_name, "skipping release without a matching asset");
            continue;
        };

        let published_at = release.published_at.clone().unwrap_or_default();
        let newer = match &best {
            None => true,
            Some(best) => compare_published(&published_at, &best.published_at) == Ordering::Greater,
        };
        if !newer {
            continue;
        }

        best = Some(ReleaseInfo {
            version_tag: release.tag_name.clone(),
            download_url: asset.browser_download_url.clone(),
            asset_name: asset.name.clone(),
            prerelease: release.prerelease,
            published_at,
            page_url: release.html_url.clone().unwrap_or_default(),
            size: asset.size,
        });
    }

    best
}

/// Queries one repository's releases on behalf of the running application.
#[derive(Debug, Clone)]
pub struct ReleaseQuery {
    client: Client,
    releases_url: String,
    user_agent: String,
    current_version: String,
    policy: VersionPolicy,
    asset_filter: Option<String>,
}

impl ReleaseQuery {
    pub fn new(config: &UpdaterConfig, ctx: &AppContext) -> Result<Self, UpdateError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(UpdateError::Query)?;

        Ok(Self {
            client,
            releases_url: config.releases_url(),
            user_agent: ctx.user_agent(),
            current_version: ctx.version_tag.clone(),
            policy: config.version_policy,
            asset_filter: config.asset_filter.clone(),
        })
    }

    /// Fetches the first page of releases.
    pub async fn fetch_releases(&self) -> Result<Vec<RawRelease>, UpdateError> {
        tracing::info!(url = %self.releases_url, "fetching releases");
        let response = self
            .client
            .get(&self.releases_url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(UpdateError::Query)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "release API returned an error status");
            return Err(UpdateError::QueryStatus {
                status: status.as_u16(),
                url: self.releases_url.clone(),
            });
        }

        let releases = response.json::<Vec<RawRelease>>().await.map_err(UpdateError::Query)?;
        tracing::debug!(count = releases.len(), "releases received");
        Ok(releases)
    }

    /// Newest release of the requested channel, regardless of the running version.
    pub async fn latest(&self, prerelease: bool) -> Result<Option<ReleaseInfo>, UpdateError> {
        let releases = self.fetch_releases().await?;
        Ok(select_release(&releases, prerelease, self.asset_filter.as_deref()))
    }

    /// Returns the release to install, or `None` when the running build is current.
    pub async fn check_for_update(&self, prerelease: bool) -> Result<Option<ReleaseInfo>, UpdateError> {
        let Some(release) = self.latest(prerelease).await? else {
            tracing::info!(prerelease, "no release with a downloadable asset");
            return Ok(None);
        };

        if self.policy.is_update(&self.current_version, &release.version_tag) {
            tracing::info!(current = %self.current_version, latest = %release.version_tag, "update available");
            Ok(Some(release))
        } else {
            tracing::info!(current = %self.current_version, "already up to date");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, prerelease: bool, published_at: Option<&str>, assets: &[&str]) -> RawRelease {
        RawRelease {
            tag_name: tag.to_string(),
            prerelease,
            published_at: published_at.map(str::to_string),
            html_url: None,
            assets: assets
                .iter()
                .map(|name| RawAsset {
                    browser_download_url: format!("http://x/{}", name),
                    name: name.to_string(),
                    size: None,
                })
                .collect(),
        }
    }

    #[test]
    fn selects_only_the_requested_channel() {
        let releases = vec![
            release("v3.0-beta", true, Some("2024-03-01T00:00:00Z"), &["beta.bin"]),
            release("v2.0", false, Some("2024-01-01T00:00:00Z"), &["a.bin"]),
        ];

        let stable = select_release(&releases, false, None).unwrap();
        assert_eq!(stable.version_tag, "v2.0");
        assert!(!stable.prerelease);

        let beta = select_release(&releases, true, None).unwrap();
        assert_eq!(beta.version_tag, "v3.0-beta");
        assert!(beta.prerelease);
    }

    #[test]
    fn newest_publication_wins_regardless_of_order() {
        let releases = vec![
            release("v1.0", false, Some("2023-01-01T00:00:00Z"), &["old.bin"]),
            release("v2.0", false, Some("2024-06-01T12:00:00Z"), &["new.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "v2.0");
    }

    #[test]
    fn ties_and_missing_timestamps_keep_response_order() {
        let releases = vec![
            release("first", false, None, &["a.bin"]),
            release("second", false, None, &["b.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "first");

        let releases = vec![
            release("first", false, Some("2024-01-01T00:00:00Z"), &["a.bin"]),
            release("second", false, Some("2024-01-01T00:00:00Z"), &["b.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "first");
    }

    #[test]
    fn unparsable_timestamps_are_ordered_as_text() {
        let releases = vec![
            release("v1.0", false, Some("2024-01-01"), &["old.bin"]),
            release("v2.0", false, Some("2024-03-01"), &["new.bin"]),
            release("undated", false, None, &["x.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "v2.0");

        let releases = vec![
            release("dated", false, Some("2024-02-10T00:00:00Z"), &["a.bin"]),
            release("bare", false, Some("2024-03-01"), &["b.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "bare");
    }

    #[test]
    fn releases_without_assets_are_skipped() {
        let releases = vec![
            release("v3.0", false, Some("2024-05-01T00:00:00Z"), &[]),
            release("v2.0", false, Some("2024-01-01T00:00:00Z"), &["a.bin"]),
        ];
        assert_eq!(select_release(&releases, false, None).unwrap().version_tag, "v2.0");
        assert!(select_release(&releases[..1], false, None).is_none());
    }

    #[test]
    fn asset_filter_picks_a_matching_asset() {
        let releases = vec![release("v2.0", false, None, &["BunnyPad-linux.tar.gz", "BunnyPad-windows.exe"])];
        let info = select_release(&releases, false, Some("windows")).unwrap();
        assert_eq!(info.asset_name, "BunnyPad-windows.exe");
        assert_eq!(info.download_url, "http://x/BunnyPad-windows.exe");
        assert!(select_release(&releases, false, Some("macos")).is_none());
    }

    #[test]
    fn parses_api_payload_with_missing_optional_fields() {
        let json = r#"[{"tag_name":"v2.0","prerelease":false,"assets":[{"browser_download_url":"http://x/a.bin","name":"a.bin"}]}]"#;
        let releases: Vec<RawRelease> = serde_json::from_str(json).unwrap();
        let info = select_release(&releases, false, None).unwrap();
        assert_eq!(info.published_at, "");
        assert_eq!(info.page_url, "");
        assert_eq!(info.size, None);
    }
}
