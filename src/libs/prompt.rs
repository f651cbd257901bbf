use super::error::UpdateError;
use super::messages::Message;
use crate::msg_error;
use dialoguer::{theme::ColorfulTheme, Confirm};

/// User interaction points of the update workflow.
///
/// Every side-effecting step asks through [`Prompter::confirm`]; install
/// failures are shown with [`Prompter::report_error`] before the user is
/// offered the log.
pub trait Prompter {
    /// Asks a yes/no question. Returns `false` when the question cannot be asked.
    fn confirm(&self, prompt: &Message, default: bool) -> bool;

    fn report_error(&self, error: &UpdateError);
}

/// Terminal prompts built on `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &Message, default: bool) -> bool {
        match Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.to_string())
            .default(default)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "prompt failed, treating as declined");
                false
            }
        }
    }

    fn report_error(&self, error: &UpdateError) {
        tracing::error!(error = %error, category = ?error.category(), "update step failed");
        msg_error!(Message::InstallFailed(error.to_string()), true);
    }
}
