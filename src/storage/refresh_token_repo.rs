use crate::domain::auth::RefreshToken;
use crate::error::Result;
use crate::storage::records::RefreshTokenRecord;
use sqlx::PgConnection;
use time::OffsetDateTime;

#[derive(Clone, Debug, Default)]
pub struct RefreshTokenRepository {}

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Creates a new refresh token record.
    /// Note: We store the HASH, not the raw token.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        token_hash: &str,
        ttl_days: i64,
    ) -> Result<()> {
        let expires_at = OffsetDateTime::now_utc() + time::Duration::days(ttl_days);

        sqlx::query("INSERT INTO refresh_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Deletes a refresh token and returns it, so it can be presented at most once.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn take(&self, conn: &mut PgConnection, token_hash: &str) -> Result<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "DELETE FROM refresh_tokens WHERE token_hash = $1 RETURNING token_hash, user_id, expires_at",
        )
        .bind(token_hash)
        .fetch_optional(conn)
        .await?;

        Ok(record.map(Into::into))
    }

    /// Revokes a refresh token (Logout). Unknown tokens are ignored.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn delete(&self, conn: &mut PgConnection, token_hash: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1").bind(token_hash).execute(conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes all expired refresh tokens.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn delete_expired(&self, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()").execute(conn).await?;
        Ok(result.rows_affected())
    }
}
