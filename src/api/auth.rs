use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthResponse, Credentials, MessageResponse, UserSummary};
use crate::config::AuthConfig;
use crate::domain::auth_session::AuthSession;
use crate::error::{AppError, Result};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const REFRESH_COOKIE: &str = "refresh_token";

/// `POST /auth/register`. Creates the account; does not set the refresh cookie.
pub async fn register(State(state): State<AppState>, Json(payload): Json<Credentials>) -> Result<impl IntoResponse> {
    let session = state.auth_service.register(payload.email, payload.password).await?;
    Ok((StatusCode::CREATED, Json(map_session(session))))
}

/// `POST /auth/login`. Returns the access token and sets the HttpOnly refresh cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse> {
    let mut session = state.auth_service.login(payload.email, payload.password).await?;
    let refresh_token = session.refresh_token.take().ok_or(AppError::Internal)?;

    let jar = jar.add(refresh_cookie(&state.config.auth, refresh_token));
    Ok((jar, Json(map_session(session))))
}

/// `POST /auth/refresh`. Authenticated solely by the refresh cookie, which is rotated.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    let presented = jar.get(REFRESH_COOKIE).map(Cookie::value).filter(|v| !v.is_empty()).ok_or_else(|| {
        tracing::debug!("Refresh attempted without cookie");
        AppError::AuthError
    })?;

    let mut session = state.auth_service.refresh_session(presented).await?;
    let refresh_token = session.refresh_token.take().ok_or(AppError::Internal)?;

    let jar = jar.add(refresh_cookie(&state.config.auth, refresh_token));
    Ok((jar, Json(map_session(session))))
}

/// `POST /auth/logout`. Revokes the presented refresh token (if any) and clears the cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    let presented = jar.get(REFRESH_COOKIE).map(Cookie::value).filter(|v| !v.is_empty());
    state.auth_service.logout(presented).await?;

    let jar = jar.add(expired_refresh_cookie(&state.config.auth));
    Ok((jar, Json(MessageResponse { message: "Logged out".to_string() })))
}

/// `GET /users/me`.
pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.auth_service.current_user(auth_user.user_id).await?;
    Ok(Json(UserSummary::from(user)))
}

fn refresh_cookie(config: &AuthConfig, value: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::days(config.refresh_token_ttl_days))
        .build()
}

fn expired_refresh_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::ZERO)
        .build()
}

fn map_session(session: AuthSession) -> AuthResponse {
    AuthResponse { access_token: session.access_token, user: session.user.into() }
}
