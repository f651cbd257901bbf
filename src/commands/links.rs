use crate::{
    libs::{links::DownloadOption, messages::Message, process::open_path_or_url},
    msg_bail_anyhow, msg_info,
};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

#[derive(Debug, Args)]
pub struct LinksArgs {
    /// Download option to open; asked interactively when omitted
    #[arg(value_enum)]
    option: Option<DownloadOption>,
}

pub async fn cmd(args: LinksArgs) -> Result<()> {
    let option = match args.option {
        Some(option) => option,
        None => {
            let labels: Vec<&str> = DownloadOption::ALL.iter().map(|option| option.label()).collect();
            let index = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptSelectDownloadOption.to_string())
                .items(&labels)
                .default(0)
                .interact()?;
            DownloadOption::ALL[index]
        }
    };

    msg_info!(Message::OpeningLink(option.url().to_string()));
    if let Err(e) = open_path_or_url(option.url()).await {
        tracing::warn!(error = %e, url = option.url(), "cannot open link");
        msg_bail_anyhow!(Message::OpenLinkFailed(e.to_string()));
    }
    Ok(())
}
