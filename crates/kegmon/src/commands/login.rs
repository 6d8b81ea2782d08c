//! Login: interactive credential prompt, account summary, and `--save`.

use std::io::IsTerminal;

use secrecy::SecretString;
use tracing::info;

use kegmon_core::{Credentials, Session};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

/// Fill in missing credentials from the terminal.
///
/// Only `login` prompts; every other command fails fast without credentials.
pub fn prompt_missing(resolved: &mut Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    if resolved.session.credentials.is_some() {
        return Ok(());
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: resolved.profile.clone(),
        });
    }

    let mut input = dialoguer::Input::<String>::new().with_prompt("Email");
    if let Some(ref email) = global.email {
        input = input.with_initial_text(email.clone());
    }
    let email = input
        .interact_text()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    let password = rpassword::prompt_password("Password: ")?;

    resolved.session.credentials = Some(Credentials {
        email,
        password: SecretString::from(password),
    });
    Ok(())
}

/// Show who we are logged in as; persist the profile with `--save`.
pub async fn handle(
    session: &Session,
    resolved: &Resolved,
    args: &LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let me = session.current_user().await?;
    let email = me.email.as_deref().unwrap_or("-");

    if args.save {
        save(resolved, global)?;
    }

    output::print_output(
        &format!("Logged in to {} as {email}", resolved.session.url),
        global.quiet,
    );
    Ok(())
}

fn save(resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(ref creds) = resolved.session.credentials else {
        return Err(CliError::NoCredentials {
            profile: resolved.profile.clone(),
        });
    };

    let path = config::config_file(global);
    let mut cfg = config::load(global)?;
    let profile = cfg.profiles.entry(resolved.profile.clone()).or_default();
    profile.server = resolved.session.url.to_string();
    profile.email = Some(creds.email.clone());
    kegmon_config::save_config_to(&cfg, &path)?;
    kegmon_config::store_password(&resolved.profile, &creds.password)?;

    info!(profile = %resolved.profile, path = %path.display(), "profile saved");
    Ok(())
}
