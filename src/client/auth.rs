use crate::api::schemas::auth::{AuthResponse, Credentials, UserSummary};
use crate::client::error::{ClientError, Result};
use crate::client::http::{HttpClient, OnRefreshFailure, PendingRequest, RefreshFailure};
use crate::client::session::Session;
use reqwest::Method;

/// Session transitions: startup refresh, login, register and logout.
#[derive(Clone, Debug)]
pub struct AuthClient {
    http: HttpClient,
}

impl AuthClient {
    pub(crate) const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.http.session().snapshot()
    }

    /// Restores the session from the refresh cookie, if there is one.
    ///
    /// Never fails: a missing or rejected cookie and an unreachable server are
    /// the normal logged-out startup; anything else is logged at error level.
    /// The session is out of the loading state when this returns.
    pub async fn init(&self) -> Session {
        match self.http.refresh(OnRefreshFailure::Clear).await {
            Ok(_) => tracing::debug!("Session restored from refresh cookie"),
            Err(
                failure @ (RefreshFailure::Unreachable | RefreshFailure::Rejected(_) | RefreshFailure::Superseded),
            ) => {
                tracing::debug!(reason = %failure, "No session to restore");
            }
            Err(failure @ RefreshFailure::Unexpected(_)) => {
                tracing::error!(reason = %failure, "Session restore failed");
            }
        }

        self.session()
    }

    /// # Errors
    /// Returns `ClientError::Unreachable` if the server cannot be reached, or
    /// `ClientError::Api` with 401 for bad credentials and 400 for invalid input.
    /// The 401's message is always "Invalid email or password".
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserSummary> {
        let pending = PendingRequest::new(Method::POST, "/auth/login").with_json(credentials)?;
        let auth: AuthResponse =
            self.http.request_json_direct(pending).await.map_err(ClientError::into_login_error)?;

        self.http.session().authenticate(auth.access_token, auth.user.clone());
        tracing::info!(user_id = auth.user.id, "Logged in");
        Ok(auth.user)
    }

    /// Creates the account. The session is left untouched; callers log in afterwards.
    ///
    /// # Errors
    /// Returns `ClientError::Api` with 409 if the email is taken or 400 for invalid input.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn register(&self, credentials: &Credentials) -> Result<UserSummary> {
        let pending = PendingRequest::new(Method::POST, "/auth/register").with_json(credentials)?;
        let auth: AuthResponse = self.http.request_json_direct(pending).await?;

        tracing::info!(user_id = auth.user.id, "Registered");
        Ok(auth.user)
    }

    /// Revokes the refresh token server-side when possible and always clears the local session.
    pub async fn logout(&self) {
        self.http.logout().await;
    }

    /// # Errors
    /// See [`crate::client::ClientError`].
    pub async fn me(&self) -> Result<UserSummary> {
        self.http.get("/users/me").await
    }
}
