use crate::domain::user::User;

/// Tokens issued to a user after a successful authentication.
///
/// `refresh_token` is only present when the caller is allowed to keep the
/// session alive (login and refresh); registration issues an access token only.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub(crate) access_token: String,
    pub(crate) refresh_token: Option<String>,
    pub(crate) user: User,
}
