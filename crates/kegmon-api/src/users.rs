// User endpoints
//
// Admin CRUD under /users, the current-user lookup, and API key
// issuance/revocation under /users/{id}/api_key.

use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::DataError;
use crate::models::{NewUser, UserResponse, UserUpdate};

impl ApiClient {
    /// `GET /users/` (admin only)
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, DataError> {
        self.get(self.endpoint(&["users", ""])).await
    }

    /// `GET /users/{id}`
    pub async fn get_user(&self, id: &str) -> Result<UserResponse, DataError> {
        self.get(self.endpoint(&["users", id])).await
    }

    /// `GET /users/me`
    pub async fn current_user(&self) -> Result<UserResponse, DataError> {
        self.get(self.endpoint(&["users", "me"])).await
    }

    /// `POST /users/` (admin only)
    pub async fn create_user(&self, user: &NewUser) -> Result<UserResponse, DataError> {
        debug!(email = %user.email, "creating user");
        self.post(self.endpoint(&["users", ""]), user).await
    }

    /// `PATCH /users/{id}` (admin only)
    pub async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<UserResponse, DataError> {
        self.patch(self.endpoint(&["users", id]), update).await
    }

    /// `DELETE /users/{id}`. The server refuses to delete the caller's own user.
    pub async fn delete_user(&self, id: &str) -> Result<(), DataError> {
        let _: Value = self.delete(self.endpoint(&["users", id])).await?;
        Ok(())
    }

    /// `GET /users/{id}/api_key`. `None` when no key has been issued.
    pub async fn get_api_key(&self, id: &str) -> Result<Option<String>, DataError> {
        self.get(self.endpoint(&["users", id, "api_key"])).await
    }

    /// Issue an API key for the user and return it.
    ///
    /// Without `regenerate` the server rejects the call (400) if a key
    /// already exists.
    ///
    /// `POST /users/{id}/api_key[?regen=true]`
    pub async fn issue_api_key(&self, id: &str, regenerate: bool) -> Result<String, DataError> {
        let url = self.endpoint(&["users", id, "api_key"]);
        debug!(user = id, regenerate, "issuing api key");
        if regenerate {
            self.post_with_params(url, &[("regen", "true")], &Value::Null)
                .await
        } else {
            self.post(url, &Value::Null).await
        }
    }

    /// `DELETE /users/{id}/api_key`
    pub async fn revoke_api_key(&self, id: &str) -> Result<(), DataError> {
        let _: Value = self.delete(self.endpoint(&["users", id, "api_key"])).await?;
        Ok(())
    }
}
