//! HTTP transport with the access-token refresh interceptor.
//!
//! Every request is stamped with the current bearer token. A 401 on a request
//! that has not been retried yet triggers a token refresh and exactly one
//! retry. Refreshes are single-flight: concurrent 401s join the refresh that is
//! already running and share its outcome, so at most one `POST /auth/refresh`
//! is outstanding per client.

use crate::api::schemas::auth::AuthResponse;
use crate::client::config::ClientConfig;
use crate::client::error::{ClientError, Result};
use crate::client::session::SessionStore;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";
const REFRESH_COOKIE: &str = "refresh_token";

/// Why a refresh did not produce a new access token.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RefreshFailure {
    #[error("server unreachable")]
    Unreachable,
    #[error("refresh rejected with status {0}")]
    Rejected(StatusCode),
    #[error("unexpected refresh failure: {0}")]
    Unexpected(String),
    /// A login or logout replaced the session while the refresh was running.
    #[error("session changed during refresh")]
    Superseded,
}

/// What a failed refresh does beyond clearing the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OnRefreshFailure {
    /// Clear locally and nothing else (silent startup refresh).
    Clear,
    /// Run the logout flow, unless the server is unreachable.
    Logout,
}

type RefreshOutcome = std::result::Result<String, RefreshFailure>;
type RefreshFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// The refresh currently running, if any.
struct InFlight {
    flight: RefreshFlight,
    /// Raised when any caller sharing the flight wants the logout flow on failure.
    logout_on_failure: Arc<AtomicBool>,
}

/// An outbound request that can be replayed once after a refresh.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl PendingRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, retried: false }
    }

    pub(crate) fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub(crate) fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Cheap to clone; clones share the session, the cookie jar and the refresh slot.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    cookie_url: Url,
    cookies: Arc<Jar>,
    session: SessionStore,
    refresh: Mutex<Option<InFlight>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient").field("base_url", &self.inner.base_url).finish_non_exhaustive()
    }
}

impl HttpClient {
    /// # Errors
    /// Returns `ClientError::Request` if the base URL is invalid or the transport cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let cookie_url = Url::parse(&base_url).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            inner: Arc::new(Inner { http, base_url, cookie_url, cookies, session, refresh: Mutex::new(None) }),
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// # Errors
    /// See [`ClientError`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(PendingRequest::new(Method::GET, path)).await
    }

    /// # Errors
    /// See [`ClientError`].
    pub async fn get_with_query<T: DeserializeOwned>(&self, path: &str, query: Vec<(String, String)>) -> Result<T> {
        self.request_json(PendingRequest::new(Method::GET, path).with_query(query)).await
    }

    /// # Errors
    /// See [`ClientError`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.request_json(PendingRequest::new(Method::POST, path).with_json(body)?).await
    }

    /// # Errors
    /// See [`ClientError`].
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.request_json(PendingRequest::new(Method::PUT, path).with_json(body)?).await
    }

    /// # Errors
    /// See [`ClientError`].
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.execute(PendingRequest::new(Method::DELETE, path)).await?;
        expect_success(response).await.map(drop)
    }

    pub(crate) async fn request_json<T: DeserializeOwned>(&self, pending: PendingRequest) -> Result<T> {
        let response = expect_success(self.execute(pending).await?).await?;
        response.json::<T>().await.map_err(ClientError::Decode)
    }

    /// Sends a request without the refresh interceptor. Used for the `/auth/*`
    /// endpoints, whose 401s mean bad credentials rather than an expired token.
    pub(crate) async fn request_json_direct<T: DeserializeOwned>(&self, pending: PendingRequest) -> Result<T> {
        let token = self.inner.session.access_token();
        let response = self.inner.dispatch(&pending, token.as_deref()).await?;
        let response = expect_success(response).await?;
        response.json::<T>().await.map_err(ClientError::Decode)
    }

    /// Sends `pending` through the refresh interceptor and returns the final response.
    /// Statuses other than 401 are returned untouched.
    pub(crate) async fn execute(&self, mut pending: PendingRequest) -> Result<reqwest::Response> {
        loop {
            let sent_with = self.inner.session.access_token();
            let response = self.inner.dispatch(&pending, sent_with.as_deref()).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            let original = ClientError::from_response(response).await;
            if pending.retried {
                tracing::debug!(method = %pending.method, path = %pending.path, "Rejected again after refresh");
                return Err(original);
            }
            pending.retried = true;

            // Another caller's refresh already replaced the token this request carried.
            let current = self.inner.session.access_token();
            if current.is_some() && current != sent_with {
                tracing::debug!(path = %pending.path, "Retrying with token refreshed by another request");
                continue;
            }
            // The session this request belonged to has already ended.
            if sent_with.is_some() && current.is_none() {
                tracing::debug!(path = %pending.path, "Session cleared since request was sent; giving up");
                return Err(original);
            }

            match self.refresh(OnRefreshFailure::Logout).await {
                Ok(_) => tracing::debug!(path = %pending.path, "Retrying after token refresh"),
                Err(failure) => {
                    tracing::debug!(path = %pending.path, reason = %failure, "Refresh failed; giving up");
                    return Err(original);
                }
            }
        }
    }

    /// Obtains a new access token, joining the refresh already in flight if there is one.
    ///
    /// Callers that join share the outcome and its side effects. The failure
    /// policy is the strictest one requested: a single `Logout` caller makes a
    /// failed flight run the logout flow.
    pub(crate) async fn refresh(&self, on_failure: OnRefreshFailure) -> RefreshOutcome {
        let wants_logout = on_failure == OnRefreshFailure::Logout;
        let flight = {
            let mut slot = self.inner.refresh.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(in_flight) = slot.as_ref() {
                tracing::debug!("Joining in-flight token refresh");
                if wants_logout {
                    in_flight.logout_on_failure.store(true, Ordering::SeqCst);
                }
                in_flight.flight.clone()
            } else {
                let logout_on_failure = Arc::new(AtomicBool::new(wants_logout));
                let flight =
                    Arc::clone(&self.inner).run_refresh(Arc::clone(&logout_on_failure)).boxed().shared();
                *slot = Some(InFlight { flight: flight.clone(), logout_on_failure });
                flight
            }
        };

        flight.await
    }

    /// Best-effort `POST /auth/logout`, then forget the refresh cookie and clear the session.
    pub(crate) async fn logout(&self) {
        self.inner.logout().await;
    }
}

impl Inner {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn dispatch(&self, pending: &PendingRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.http.request(pending.method.clone(), self.url(&pending.path));
        if !pending.query.is_empty() {
            request = request.query(&pending.query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &pending.body {
            request = request.json(body);
        }

        request.send().await.map_err(ClientError::from_transport)
    }

    /// Runs one refresh. Its result is applied only to the session it started
    /// from: if a login or logout happened meanwhile, that transition wins.
    async fn run_refresh(self: Arc<Self>, logout_on_failure: Arc<AtomicBool>) -> RefreshOutcome {
        tracing::debug!("Refreshing access token");
        let generation = self.session.generation();

        let outcome = match self.request_refresh().await {
            Ok(auth) => {
                if self.session.authenticate_if(generation, auth.access_token.clone(), auth.user) {
                    Ok(auth.access_token)
                } else {
                    self.superseded()
                }
            }
            Err(RefreshFailure::Unreachable) => {
                // Server presumed down: no logout call.
                if self.session.clear_if(generation) { Err(RefreshFailure::Unreachable) } else { self.superseded() }
            }
            Err(failure) => {
                if self.session.generation() != generation {
                    self.superseded()
                } else {
                    let logout = logout_on_failure.load(Ordering::SeqCst);
                    if logout {
                        self.revoke_remote().await;
                    }
                    if self.session.clear_if(generation) {
                        if logout {
                            self.forget_refresh_cookie();
                        }
                        Err(failure)
                    } else {
                        self.superseded()
                    }
                }
            }
        };

        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner) = None;
        outcome
    }

    /// Outcome for a flight whose session was replaced while it ran: defer to the new session.
    fn superseded(&self) -> RefreshOutcome {
        tracing::debug!("Session changed during refresh; leaving it untouched");
        self.session.access_token().ok_or(RefreshFailure::Superseded)
    }

    async fn request_refresh(&self) -> std::result::Result<AuthResponse, RefreshFailure> {
        let response = self.http.post(self.url(REFRESH_PATH)).send().await.map_err(|e| {
            if e.is_builder() { RefreshFailure::Unexpected(e.to_string()) } else { RefreshFailure::Unreachable }
        })?;

        let status = response.status();
        if status.is_client_error() {
            return Err(RefreshFailure::Rejected(status));
        }
        if !status.is_success() {
            return Err(RefreshFailure::Unexpected(format!("refresh returned {status}")));
        }

        response.json::<AuthResponse>().await.map_err(|e| RefreshFailure::Unexpected(e.to_string()))
    }

    async fn logout(&self) {
        self.revoke_remote().await;
        self.forget_refresh_cookie();
        self.session.clear();
    }

    /// Best-effort `POST /auth/logout`; the outcome only gets logged.
    async fn revoke_remote(&self) {
        match self.http.post(self.url(LOGOUT_PATH)).send().await {
            Ok(response) if response.status().is_success() => tracing::debug!("Server session revoked"),
            Ok(response) => tracing::debug!(status = %response.status(), "Logout rejected by server"),
            Err(e) => tracing::debug!(error = %e, "Logout request failed"),
        }
    }

    fn forget_refresh_cookie(&self) {
        self.cookies.add_cookie_str(&format!("{REFRESH_COOKIE}=; Max-Age=0; Path=/"), &self.cookie_url);
    }
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() { Ok(response) } else { Err(ClientError::from_response(response).await) }
}
