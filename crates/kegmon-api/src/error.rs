use thiserror::Error;

/// Uniform failure value for every remote call.
///
/// Produced exactly once per failed request by
/// [`ErrorFunnel::classify`](crate::ErrorFunnel::classify); there is no
/// other public way to build one. A pure network fault (no response
/// reached the client) carries only a message; any response, including
/// a 2xx whose body failed to decode, also carries status fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DataError {
    message: String,
    status_code: Option<u16>,
    status_text: Option<String>,
    reason: Option<String>,
}

/// Coarse failure taxonomy derived from a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response reached the client.
    Transport,
    /// 4xx response.
    Client,
    /// 5xx response.
    Server,
    /// A response outside 4xx/5xx that still failed (e.g. undecodable 2xx body).
    Unexpected,
}

impl DataError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            status_text: None,
            reason: None,
        }
    }

    pub(crate) fn response(
        message: impl Into<String>,
        status_code: u16,
        status_text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
            status_text: Some(status_text.into()),
            reason: Some(reason.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, absent for pure network failures.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// Transport-level description of the failed response.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status_code {
            None => ErrorKind::Transport,
            Some(400..=499) => ErrorKind::Client,
            Some(500..=599) => ErrorKind::Server,
            Some(_) => ErrorKind::Unexpected,
        }
    }

    /// Returns `true` if the server rejected the current session.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }
}

/// Failures while constructing an [`ApiClient`](crate::ApiClient).
///
/// These never come from a remote call, so they are kept apart from
/// [`DataError`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL cannot be used as an API base: {0}")]
    NotABase(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_status_class() {
        assert_eq!(DataError::transport("refused").kind(), ErrorKind::Transport);
        assert_eq!(
            DataError::response("nope", 404, "Not Found", "x").kind(),
            ErrorKind::Client
        );
        assert_eq!(
            DataError::response("boom", 503, "Service Unavailable", "x").kind(),
            ErrorKind::Server
        );
        assert_eq!(
            DataError::response("bad body", 200, "OK", "x").kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn transport_error_has_no_status_fields() {
        let err = DataError::transport("connection refused");
        assert_eq!(err.message(), "connection refused");
        assert!(err.status_code().is_none());
        assert!(err.status_text().is_none());
        assert!(err.reason().is_none());
        assert_eq!(err.to_string(), "connection refused");
    }
}
