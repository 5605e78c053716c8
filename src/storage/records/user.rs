use crate::domain::user::User;
use time::OffsetDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            password_hash: record.password_hash,
            created_at: record.created_at,
        }
    }
}
