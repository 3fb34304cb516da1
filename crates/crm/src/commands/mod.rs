//! Command handlers.

pub mod config_cmd;
pub mod contacts;

use crm_core::Crm;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, crm: &Crm, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Contacts(args) => contacts::handle(crm, args, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
