use crate::{
    libs::{context::AppContext, messages::Message, view::View},
    msg_print,
};
use anyhow::Result;

pub fn cmd(ctx: &AppContext) -> Result<()> {
    msg_print!(Message::RunningOn(ctx.display_os.clone()), true);
    msg_print!(Message::SystemInfoHeader);
    View::system_info(ctx);
    Ok(())
}
