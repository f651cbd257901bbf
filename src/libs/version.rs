//! Deciding whether a release tag counts as an update.
//!
//! The default policy treats any tag that differs from the running build as
//! an update, downgrades included. `NewerOnly` orders tags instead: full
//! semver tags (`v2.0.0-beta.1`) through `semver`, and dotted numeric tags
//! such as BunnyPad's four-part `v11.0.27000.0809` component by component.
//! Tags that cannot be ordered fall back to plain inequality.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionPolicy {
    /// Any tag that is not identical to the running one is an update.
    #[default]
    AnyDifference,
    /// Only strictly newer tags are updates.
    NewerOnly,
}

impl VersionPolicy {
    pub const ALL: [VersionPolicy; 2] = [VersionPolicy::AnyDifference, VersionPolicy::NewerOnly];

    /// Returns `true` when `candidate` should be offered to a user running `current`.
    pub fn is_update(self, current: &str, candidate: &str) -> bool {
        match self {
            VersionPolicy::AnyDifference => current != candidate,
            VersionPolicy::NewerOnly => match compare_tags(candidate, current) {
                Some(ordering) => ordering == Ordering::Greater,
                None => current != candidate,
            },
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VersionPolicy::AnyDifference => "Any release tag different from mine (downgrades included)",
            VersionPolicy::NewerOnly => "Only release tags newer than mine",
        }
    }
}

impl fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionPolicy::AnyDifference => write!(f, "any-difference"),
            VersionPolicy::NewerOnly => write!(f, "newer-only"),
        }
    }
}

fn strip_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').or_else(|| tag.strip_prefix('V')).unwrap_or(tag)
}

fn numeric_components(tag: &str) -> Option<Vec<u64>> {
    strip_prefix(tag).split('.').map(|part| part.parse::<u64>().ok()).collect()
}

/// Orders two release tags, or `None` if they are not comparable.
pub fn compare_tags(a: &str, b: &str) -> Option<Ordering> {
    if let (Ok(a), Ok(b)) = (semver::Version::parse(strip_prefix(a)), semver::Version::parse(strip_prefix(b))) {
        return Some(a.cmp(&b));
    }

    let mut a = numeric_components(a)?;
    let mut b = numeric_components(b)?;
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    Some(a.cmp(&b))
}
