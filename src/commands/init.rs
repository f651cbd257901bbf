//! Configuration initialization command.
//!
//! Runs the interactive wizard that chooses the release repository, the
//! update channel and how release tags are compared, or removes the saved
//! configuration with `--delete`.

use crate::{
    libs::{config::UpdaterConfig, messages::Message},
    msg_info, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Remove the existing configuration instead of creating a new one
    #[arg(short, long)]
    delete: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    if init_args.delete {
        if UpdaterConfig::delete()? {
            msg_success!(Message::ConfigDeleted);
        } else {
            msg_info!(Message::ConfigNothingToDelete);
        }
        return Ok(());
    }

    UpdaterConfig::init()?.save()?;
    msg_success!(Message::ConfigSaved);
    Ok(())
}
