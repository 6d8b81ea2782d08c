//! User and API key command handlers.

use tabled::Tabled;

use kegmon_core::{Session, UserResponse};

use crate::cli::{ApiKeyCommand, GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Admin")]
    admin: String,
}

impl From<&UserResponse> for UserRow {
    fn from(u: &UserResponse) -> Self {
        Self {
            id: u.id.clone(),
            email: u.email.clone().unwrap_or_default(),
            name: full_name(u),
            admin: match u.admin {
                Some(true) => "yes".into(),
                Some(false) => "no".into(),
                None => String::new(),
            },
        }
    }
}

fn full_name(u: &UserResponse) -> String {
    [u.first_name.as_deref(), u.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

fn detail(u: &UserResponse) -> String {
    let name = full_name(u);
    let mut lines = vec![
        format!("ID:       {}", u.id),
        format!("Email:    {}", util::or_dash(u.email.as_deref())),
        format!("Name:     {}", if name.is_empty() { "-" } else { &name }),
    ];
    if let Some(admin) = u.admin {
        lines.push(format!("Admin:    {}", if admin { "yes" } else { "no" }));
    }
    if let Some(pw) = u.password_enabled {
        lines.push(format!("Password: {}", if pw { "enabled" } else { "disabled" }));
    }
    if u.api_key.is_some() {
        lines.push("API key:  set".into());
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List => {
            let users = session.users().await?;
            let out = output::render_list(&global.output, &users, |u| UserRow::from(u), |u| u.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Get { id } => {
            let user = session.user(&id).await?;
            print_user(&user, global)
        }

        UsersCommand::Me => {
            let user = session.current_user().await?;
            print_user(&user, global)
        }

        UsersCommand::Delete { id } => {
            if !util::confirm(&format!("Delete user {id}?"), "users delete", global.yes)? {
                return Ok(());
            }
            session.delete_user(&id).await?;
            output::print_output(&format!("Deleted user {id}"), global.quiet);
            Ok(())
        }

        UsersCommand::ApiKey(args) => match args.command {
            ApiKeyCommand::Show { id } => {
                let key = session.api_key(&id).await?;
                print_key(key.as_deref(), global)
            }
            ApiKeyCommand::Issue { id, regenerate } => {
                let key = session.issue_api_key(&id, regenerate).await?;
                print_key(Some(&key), global)
            }
            ApiKeyCommand::Revoke { id } => {
                if !util::confirm(
                    &format!("Revoke the API key of user {id}?"),
                    "users api-key revoke",
                    global.yes,
                )? {
                    return Ok(());
                }
                session.revoke_api_key(&id).await?;
                output::print_output(&format!("Revoked API key of user {id}"), global.quiet);
                Ok(())
            }
        },
    }
}

fn print_user(user: &UserResponse, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, user, detail, |u| u.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_key(key: Option<&str>, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        &key,
        |k| k.unwrap_or("(none)").to_owned(),
        |k| k.unwrap_or_default().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
