// Session authentication
//
// POST /api/v1/auth/login sets the session cookie on success; every
// later call rides on it through the client's cookie jar.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::DataError;
use crate::models::LoginRequest;

impl ApiClient {
    /// Log in with email and password.
    ///
    /// A 401 here also goes out on the unauthorized registry, like any other.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), DataError> {
        debug!(email, "logging in");
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let _: serde_json::Value = self.post(self.endpoint(&["auth", "login"]), &body).await?;
        info!(email, "session established");
        Ok(())
    }

    /// End the server-side session. `GET /logout` answers with a redirect
    /// to the login page, which is followed and discarded.
    pub async fn logout(&self) -> Result<(), DataError> {
        self.get_discard(self.page(&["logout"])).await?;
        debug!("session closed");
        Ok(())
    }
}
