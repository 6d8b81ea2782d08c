//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod devices;
pub mod login;
pub mod users;
pub mod util;

use kegmon_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// The session is already logged in.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(session, resolved, &args, global).await,
        Command::Devices(args) => devices::handle(session, args, global).await,
        Command::Users(args) => users::handle(session, args, global).await,
        // Handled before a session exists
        Command::Completions(_) => Ok(()),
    }
}
