//! Error taxonomy of the update workflow.
//!
//! Query and download failures are reported and the attempt is abandoned.
//! Permission, elevation and spawn failures are surfaced to the user with an
//! offer to open the diagnostic log. None of them terminate the process.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse grouping used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Release API request failed or returned garbage.
    Query,
    /// Asset could not be fetched or written.
    Download,
    /// Rights could not be determined or obtained.
    Permission,
    /// The OS refused to launch the artifact.
    Spawn,
    /// Workflow bookkeeping: busy slot, cancellation, user abort.
    Workflow,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("release query failed: {0}")]
    Query(#[source] reqwest::Error),

    #[error("release API returned HTTP {status} for {url}")]
    QueryStatus { status: u16, url: String },

    #[error("download request failed: {0}")]
    Download(#[source] reqwest::Error),

    #[error("download server returned HTTP {status} for {url}")]
    DownloadStatus { status: u16, url: String },

    #[error("cannot write {}: {source}", path.display())]
    DownloadIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot prepare {}: {source}", path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("elevation failed: {0}")]
    Elevation(String),

    #[error("cannot launch {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("an update operation is already in progress ({0})")]
    Busy(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("installation aborted by user")]
    Aborted,

    #[error("invalid update state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl UpdateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpdateError::Query(_) | UpdateError::QueryStatus { .. } => ErrorCategory::Query,
            UpdateError::Download(_) | UpdateError::DownloadStatus { .. } | UpdateError::DownloadIo { .. } => ErrorCategory::Download,
            UpdateError::Permission { .. } | UpdateError::Elevation(_) => ErrorCategory::Permission,
            UpdateError::Spawn { .. } => ErrorCategory::Spawn,
            UpdateError::Busy(_) | UpdateError::Cancelled | UpdateError::Aborted | UpdateError::InvalidTransition { .. } => {
                ErrorCategory::Workflow
            }
        }
    }

    /// Whether the user should be offered the diagnostic log for this failure.
    pub fn offers_log(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permission | ErrorCategory::Spawn)
    }
}
