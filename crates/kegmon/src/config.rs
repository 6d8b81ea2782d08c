//! Global flags layered over the profile from `kegmon-config`.

use std::path::PathBuf;

use kegmon_config::{Config, ConfigError, Profile};
use kegmon_core::SessionConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The session to open, and the profile it came from.
#[derive(Debug)]
pub struct Resolved {
    pub profile: String,
    pub session: SessionConfig,
}

/// Config file in use: `--config` if given, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(kegmon_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(kegmon_config::load_config_from(&config_file(global))?)
}

/// Resolve the session config from the config file and CLI overrides.
///
/// A missing profile is fine as long as `--server` names the server.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load(global)?;

    let (name, mut profile) = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        Err(ConfigError::UnknownProfile { name }) => {
            if global.server.is_none() {
                return Err(missing_profile(global, &cfg, name));
            }
            (name, Profile::default())
        }
        Err(e) => return Err(e.into()),
    };

    overlay(&mut profile, global);
    let session = kegmon_config::profile_to_session_config(&profile, &name, &cfg.defaults)?;
    Ok(Resolved {
        profile: name,
        session,
    })
}

/// Flags win over the profile.
fn overlay(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

fn missing_profile(global: &GlobalOpts, cfg: &Config, name: String) -> CliError {
    if global.profile.is_none() && cfg.profiles.is_empty() {
        return CliError::NoConfig {
            path: config_file(global).display().to_string(),
        };
    }
    let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    available.sort_unstable();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
