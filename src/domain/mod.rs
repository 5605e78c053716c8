pub mod auth;
pub mod auth_session;
pub mod pagination;
pub mod product;
pub mod user;
pub mod validation;
