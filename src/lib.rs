//! # BunnyPad Updater
//!
//! Checks GitHub releases for a newer BunnyPad build, streams it to disk and
//! hands over to it.
//!
//! ## Features
//!
//! - **Release Check**: stable and pre-release (CarrotPatch) channels
//! - **Streaming Download**: chunked writes with progress and cancellation
//! - **Install & Launch**: permission-aware target selection and elevation
//! - **Diagnostics**: dated log file and a system information summary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bunnypad_updater::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod libs;
