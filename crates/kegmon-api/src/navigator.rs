// Full-page navigation seam for the login redirect workaround.
//
// The HTTP client cannot turn a redirect-to-login into a user-visible
// navigation, so the funnel hands the URL to whatever front-end owns the
// "page": a browser shell, a TUI, or the CLI's log line.

use tracing::warn;

/// Performs a full-page navigation on behalf of the error funnel.
///
/// Implementations are called synchronously from the failing request's
/// task and must not block.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// Default navigator for headless front-ends: logs the target URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, url: &str) {
        warn!(%url, "server redirected to the login page; open it to re-authenticate");
    }
}
