use crate::config::AuthConfig;
use crate::domain::auth::{Claims, OpaqueToken, Password};
use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use crate::domain::validation::{normalize_email, validate_credentials};
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::refresh_token_repo::RefreshTokenRepository;
use crate::storage::user_repo::UserRepository;
use opentelemetry::{global, metrics::Counter};
use sqlx::PgConnection;

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
    users_registered_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("stockroom");
        Self {
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of successful token rotations")
                .build(),
            logout_total: meter
                .u64_counter("auth_logout_total")
                .with_description("Total number of logout requests")
                .build(),
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
    pool: DbPool,
    user_repo: UserRepository,
    refresh_repo: RefreshTokenRepository,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        pool: DbPool,
        user_repo: UserRepository,
        refresh_repo: RefreshTokenRepository,
    ) -> Self {
        Self { config, pool, user_repo, refresh_repo, metrics: Metrics::new() }
    }

    /// Creates an account and issues an access token. No refresh token is minted:
    /// registering never logs the caller in.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for malformed credentials and
    /// `AppError::Conflict` if the email is already registered.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, email: String, password: String) -> Result<AuthSession> {
        validate_credentials(&email, &password)?;
        let email = normalize_email(&email);

        let password_hash = self.hash_password(&password).await?;

        let mut conn = self.pool.acquire().await?;
        let user = self.user_repo.create(&mut conn, &email, &password_hash).await?;

        tracing::Span::current().record("user_id", user.id);
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        let access_token = self.issue_access_token(user.id)?;
        Ok(AuthSession { access_token, refresh_token: None, user })
    }

    /// # Errors
    /// Returns `AppError::AuthError` for an unknown email or wrong password.
    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: String, password: String) -> Result<AuthSession> {
        let email = normalize_email(&email);
        let mut conn = self.pool.acquire().await?;

        let Some(user) = self.user_repo.find_by_email(&mut conn, &email).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(AppError::AuthError);
        };

        tracing::Span::current().record("user_id", user.id);

        if !self.verify_password(&password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::AuthError);
        }

        let session = self.create_session(&mut conn, user).await?;

        tracing::info!("User logged in successfully");
        self.metrics.login_total.add(1, &[]);
        Ok(session)
    }

    /// Exchanges a refresh token for a new access token, rotating the refresh token.
    /// A presented token is consumed whether or not it was still valid.
    ///
    /// # Errors
    /// Returns `AppError::AuthError` if the token is unknown or expired.
    #[tracing::instrument(skip(self, refresh_token), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        let mut tx = self.pool.begin().await?;

        let Some(stored) = self.refresh_repo.take(&mut tx, &OpaqueToken::hash(refresh_token)).await? else {
            tracing::debug!("Refresh failed: unknown token");
            return Err(AppError::AuthError);
        };

        tracing::Span::current().record("user_id", stored.user_id);

        if stored.is_expired() {
            tx.commit().await?;
            tracing::debug!("Refresh failed: token expired");
            return Err(AppError::AuthError);
        }

        let user = self.user_repo.find_by_id(&mut tx, stored.user_id).await?.ok_or(AppError::AuthError)?;
        let session = self.create_session(&mut tx, user).await?;
        tx.commit().await?;

        tracing::info!("Tokens rotated successfully");
        self.metrics.refresh_total.add(1, &[]);
        Ok(session)
    }

    /// Revokes the presented refresh token, if any. Logging out twice is not an error.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the revocation fails.
    #[tracing::instrument(skip(self, refresh_token), err)]
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<()> {
        if let Some(token) = refresh_token {
            let mut conn = self.pool.acquire().await?;
            let revoked = self.refresh_repo.delete(&mut conn, &OpaqueToken::hash(token)).await?;
            tracing::info!(revoked, "User logged out");
        } else {
            tracing::debug!("Logout without refresh token");
        }

        self.metrics.logout_total.add(1, &[]);
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::AuthError` if the user no longer exists.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn current_user(&self, user_id: i64) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::AuthError)
    }

    /// Verifies a JWT access token and returns the user ID (subject).
    ///
    /// # Errors
    /// Returns `AppError::AuthError` for invalid or expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<i64> {
        Claims::decode(token, &self.config.jwt_secret)?.user_id()
    }

    async fn create_session(&self, conn: &mut PgConnection, user: User) -> Result<AuthSession> {
        let access_token = self.issue_access_token(user.id)?;

        let refresh_token = OpaqueToken::generate();
        self.refresh_repo
            .create(conn, user.id, &OpaqueToken::hash(&refresh_token), self.config.refresh_token_ttl_days)
            .await?;

        Ok(AuthSession { access_token, refresh_token: Some(refresh_token), user })
    }

    fn issue_access_token(&self, user_id: i64) -> Result<String> {
        Claims::new(user_id, self.config.access_token_ttl_secs).encode(&self.config.jwt_secret)
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || Password::verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }
}
