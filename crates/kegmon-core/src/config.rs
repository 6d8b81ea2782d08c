// ── Runtime session configuration ──
//
// Describes how to reach a kegmon server and who to log in as. Carries
// credential data but never touches disk: the CLI builds a
// `SessionConfig` (usually via kegmon-config) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use kegmon_api::{TlsMode, TransportConfig};

/// Email/password login for the session cookie.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed home servers).
    DangerAcceptInvalid,
}

/// Configuration for one server session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server root (e.g. `https://kegs.local`).
    pub url: Url,
    /// `None` for sessions that only use an already-authenticated cookie jar.
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_credentials(mut self, email: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials {
            email: email.into(),
            password,
        });
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}
