pub mod auth;
pub mod product;
pub mod user;

pub(crate) use auth::RefreshTokenRecord;
pub(crate) use product::ProductRecord;
pub(crate) use user::UserRecord;
