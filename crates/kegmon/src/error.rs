//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use kegmon_config::ConfigError;
use kegmon_core::{CalibrationError, CoreError, DataError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the server: {reason}")]
    #[diagnostic(
        code(kegmon::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(kegmon::auth_failed),
        help(
            "The server rejected the session.\n\
             Verify your email and password, then run: kegmon login --save"
        )
    )]
    AuthFailed,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(kegmon::no_credentials),
        help(
            "Set KEGMON_EMAIL and KEGMON_PASSWORD, or run: kegmon login --save"
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(code(kegmon::forbidden))]
    Forbidden { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(kegmon::not_found),
        help("Run: kegmon {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(kegmon::api_error))]
    ApiError { status: String, message: String },

    #[error("{message}")]
    #[diagnostic(
        code(kegmon::calibration),
        help("Run: kegmon devices get <id> to check the device state")
    )]
    Calibration { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kegmon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(kegmon::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Or pass the server directly with --server"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(kegmon::no_config),
        help(
            "Pass --server (or set KEGMON_SERVER), or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(kegmon::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(kegmon::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(kegmon::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(kegmon::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── DataError → CliError mapping ─────────────────────────────────────

impl From<DataError> for CliError {
    fn from(err: DataError) -> Self {
        match (err.kind(), err.status_code()) {
            (ErrorKind::Transport, _) => Self::ConnectionFailed {
                reason: err.message().to_owned(),
            },
            (_, Some(401)) => Self::AuthFailed,
            (_, Some(403)) => Self::Forbidden {
                message: err.message().to_owned(),
            },
            (_, status) => Self::ApiError {
                status: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message: err.message().to_owned(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Remote(e) => e.into(),

            CoreError::Build(e) => Self::Validation {
                field: "server".into(),
                reason: e.to_string(),
            },

            CoreError::DeviceNotFound { identifier } => Self::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: format!("{entity_type}s list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Config { message } => Self::Config { message },

            CoreError::Calibration(e) => Self::Calibration {
                message: e.to_string(),
            },
        }
    }
}

impl From<CalibrationError> for CliError {
    fn from(err: CalibrationError) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
