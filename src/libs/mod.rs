//! Core library modules of the BunnyPad updater.
//!
//! ## Features
//!
//! - **Core Infrastructure**: configuration, data storage, messaging, logging
//! - **Update Workflow**: release lookup, streaming download, install and launch
//! - **System Integration**: process control, elevation, desktop links
//! - **User Interface**: console tables and prompts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bunnypad_updater::libs::config::UpdaterConfig;
//! use bunnypad_updater::libs::release::select_release;
//!
//! let config = UpdaterConfig::read()?;
//! println!("{}", config.releases_url());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod data_storage;
pub mod download;
pub mod error;
pub mod install;
pub mod links;
pub mod logging;
pub mod messages;
pub mod process;
pub mod prompt;
pub mod release;
pub mod version;
pub mod view;
pub mod workflow;
