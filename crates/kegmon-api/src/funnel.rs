// ── Session error funnel ──
//
// Every failed request passes through `ErrorFunnel::classify` exactly
// once. The funnel turns the raw failure into a `DataError` and runs the
// two session-level recoveries:
//
// - 401: publish on the unauthorized registry before returning.
// - 405 on a non-GET whose final URL is `{base}/login...`: an intermediary
//   answered with a redirect to the login page that the HTTP client cannot
//   follow as a navigation, so hand the URL to the `Navigator`.
//
// Both recoveries are additive. The caller still receives the error.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::DataError;
use crate::navigator::Navigator;
use crate::unauthorized::UnauthorizedRegistry;

/// Error body shape produced by the server (`{"message": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// A failure as observed by the transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// No response reached the client.
    Transport { message: String },
    /// The server answered but the call failed.
    Response {
        status: u16,
        status_text: String,
        /// `message` field of the server's error body, if any.
        server_message: Option<String>,
        /// Transport-level description of the failed response.
        transport_message: String,
    },
}

impl RawFailure {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Response {
                status: status.as_u16(),
                status_text: status_text(status),
                server_message: None,
                transport_message: err.to_string(),
            },
            None => Self::Transport {
                message: err.to_string(),
            },
        }
    }

    /// Build from a non-success response and its body text.
    pub fn from_response(status: StatusCode, url: &str, body: &str) -> Self {
        let server_message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());

        Self::Response {
            status: status.as_u16(),
            status_text: status_text(status),
            server_message,
            transport_message: format!("Http failure response for {url}: {status}"),
        }
    }

    /// Build from a successful response whose body could not be decoded.
    pub fn undecodable(status: StatusCode, url: &str, err: &serde_json::Error) -> Self {
        Self::Response {
            status: status.as_u16(),
            status_text: status_text(status),
            server_message: None,
            transport_message: format!("Http failure during parsing for {url}: {err}"),
        }
    }
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_owned()
}

/// Classifies failed calls and runs the session-level recoveries.
pub struct ErrorFunnel {
    base_url: String,
    unauthorized: Arc<UnauthorizedRegistry>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ErrorFunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorFunnel")
            .field("base_url", &self.base_url)
            .field("unauthorized", &self.unauthorized)
            .finish_non_exhaustive()
    }
}

impl ErrorFunnel {
    /// `base_url` is the server root the login page hangs off (no API path).
    pub fn new(
        base_url: &Url,
        unauthorized: Arc<UnauthorizedRegistry>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            unauthorized,
            navigator,
        }
    }

    pub fn unauthorized(&self) -> &Arc<UnauthorizedRegistry> {
        &self.unauthorized
    }

    /// Convert `failure` into the caller-facing [`DataError`].
    ///
    /// `request_url` is the final URL of the failed exchange (after any
    /// redirects the HTTP client followed).
    pub fn classify(&self, failure: RawFailure, request_url: &str, method: &Method) -> DataError {
        let (status, status_text, server_message, transport_message) = match failure {
            RawFailure::Transport { message } => {
                debug!(%method, url = request_url, %message, "request failed without a response");
                return DataError::transport(message);
            }
            RawFailure::Response {
                status,
                status_text,
                server_message,
                transport_message,
            } => (status, status_text, server_message, transport_message),
        };

        let message = server_message.unwrap_or_else(|| transport_message.clone());
        let err = DataError::response(message, status, status_text, transport_message);
        debug!(%method, url = request_url, status, "request failed");

        if status == 401 {
            let delivered = self.unauthorized.publish(&err);
            warn!(url = request_url, delivered, "session rejected by server");
        }

        if status == 405 && *method != Method::GET && self.is_login_url(request_url) {
            warn!(
                url = request_url,
                %method,
                "non-GET request landed on the login page, navigating"
            );
            self.navigator.navigate(request_url);
        }

        err
    }

    fn is_login_url(&self, url: &str) -> bool {
        !url.is_empty() && url.starts_with(&format!("{}/login", self.base_url))
    }
}
