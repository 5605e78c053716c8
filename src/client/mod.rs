//! Typed client for the stockroom API.
//!
//! [`Client`] owns one [`SessionStore`] and one HTTP transport shared by the
//! auth and product calls, so a token refreshed for one call is seen by all.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod products;
pub mod session;

pub use auth::AuthClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::{HttpClient, RefreshFailure};
pub use products::ProductsClient;
pub use session::{Session, SessionStore};

#[derive(Clone, Debug)]
pub struct Client {
    http: HttpClient,
    auth: AuthClient,
    products: ProductsClient,
}

impl Client {
    /// # Errors
    /// Returns an error if the base URL is invalid or the transport cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::new(config, SessionStore::new())?;
        Ok(Self { auth: AuthClient::new(http.clone()), products: ProductsClient::new(http.clone()), http })
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthClient {
        &self.auth
    }

    #[must_use]
    pub const fn products(&self) -> &ProductsClient {
        &self.products
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.http.session()
    }

    /// Raw transport, for endpoints without a typed wrapper.
    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }
}
