// Async HTTP client for the kegmon API.
//
// Base path: {server}/api/v1/
// Auth: session cookie set by POST /api/v1/auth/login

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ClientBuildError, DataError};
use crate::funnel::{ErrorFunnel, RawFailure};
use crate::navigator::Navigator;
use crate::transport::TransportConfig;
use crate::unauthorized::UnauthorizedRegistry;

const API_PREFIX: [&str; 2] = ["api", "v1"];

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the kegmon server.
///
/// Owns the session cookie jar and the unauthorized-event registry; the
/// registry is closed when the client is shut down or dropped.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_url: Url,
    funnel: ErrorFunnel,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("funnel", &self.funnel)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server root URL (e.g. `https://kegs.local:8443`).
    ///
    /// A cookie jar is attached if the transport config has none, since
    /// every authenticated call rides on the login session cookie.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientBuildError> {
        let http = if transport.cookie_jar.is_some() {
            transport.build_client()?
        } else {
            transport.clone().with_cookie_jar().build_client()?
        };
        Self::with_client(base_url, http, navigator)
    }

    /// Wrap an existing `reqwest::Client` (caller manages cookies).
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientBuildError> {
        let base_url = normalize_base_url(base_url)?;

        let mut api_url = base_url.clone();
        api_url
            .path_segments_mut()
            .map_err(|()| ClientBuildError::NotABase(base_url.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX);

        let funnel = ErrorFunnel::new(&base_url, Arc::new(UnauthorizedRegistry::new()), navigator);

        Ok(Self {
            http,
            base_url,
            api_url,
            funnel,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Server root the client was built with.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/v1`
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Unauthorized-event registry for this client's session.
    pub fn unauthorized(&self) -> &Arc<UnauthorizedRegistry> {
        self.funnel.unauthorized()
    }

    /// Tear down the unauthorized registry. Further 401s are not broadcast.
    pub fn shutdown(&self) {
        self.funnel.unauthorized().close();
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/v1/{segments...}`; each segment is percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // api_url is validated as a base at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// `{base}/{segments...}` for session pages outside the API prefix.
    pub(crate) fn page(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, DataError> {
        debug!("GET {url}");
        self.execute(Method::GET, url.clone(), self.http.get(url)).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<T, DataError> {
        debug!("GET {url} params={params:?}");
        let req = self.http.get(url.clone()).query(params);
        self.execute(Method::GET, url, req).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, DataError> {
        debug!("POST {url}");
        let req = self.http.post(url.clone()).json(body);
        self.execute(Method::POST, url, req).await
    }

    pub(crate) async fn post_with_params<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<T, DataError> {
        debug!("POST {url} params={params:?}");
        let req = self.http.post(url.clone()).query(params).json(body);
        self.execute(Method::POST, url, req).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, DataError> {
        debug!("PATCH {url}");
        let req = self.http.patch(url.clone()).json(body);
        self.execute(Method::PATCH, url, req).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, DataError> {
        debug!("DELETE {url}");
        self.execute(Method::DELETE, url.clone(), self.http.delete(url))
            .await
    }

    /// GET whose body is irrelevant (session pages that answer with HTML).
    pub(crate) async fn get_discard(&self, url: Url) -> Result<(), DataError> {
        debug!("GET {url}");
        let resp = match self.http.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.fail(RawFailure::from_reqwest(&e), &url, &Method::GET)),
        };
        let status = resp.status();
        let final_url = resp.url().clone();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(self.fail(
                RawFailure::from_response(status, final_url.as_str(), &body),
                &final_url,
                &Method::GET,
            ))
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        req: RequestBuilder,
    ) -> Result<T, DataError> {
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => return Err(self.fail(RawFailure::from_reqwest(&e), &url, &method)),
        };

        // The funnel judges the URL the exchange ended on, not the one
        // we asked for.
        let final_url = resp.url().clone();
        let status = resp.status();

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => return Err(self.fail(RawFailure::from_reqwest(&e), &final_url, &method)),
        };

        if !status.is_success() {
            let failure = RawFailure::from_response(status, final_url.as_str(), &body);
            return Err(self.fail(failure, &final_url, &method));
        }

        decode(status, &final_url, &body).map_err(|failure| self.fail(failure, &final_url, &method))
    }

    fn fail(&self, failure: RawFailure, url: &Url, method: &Method) -> DataError {
        self.funnel.classify(failure, url.as_str(), method)
    }
}

impl Drop for ApiClient {
    fn drop(&mut self) {
        self.funnel.unauthorized().close();
    }
}

fn decode<T: DeserializeOwned>(status: StatusCode, url: &Url, body: &str) -> Result<T, RawFailure> {
    // Some endpoints answer 2xx with an empty body; treat it as `null`.
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| RawFailure::undecodable(status, url.as_str(), &e))
}

/// Parse the server root, dropping any trailing `/api/v1` the caller
/// may have pasted in.
fn normalize_base_url(raw: &str) -> Result<Url, ClientBuildError> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(ClientBuildError::NotABase(raw.to_owned()));
    }

    let path = url.path().trim_end_matches('/').to_owned();
    let path = path.strip_suffix("/api/v1").unwrap_or(&path).to_owned();
    url.set_path(&format!("{path}/"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
