use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub(crate) password_hash: String,
    #[allow(dead_code)]
    pub(crate) created_at: OffsetDateTime,
}
