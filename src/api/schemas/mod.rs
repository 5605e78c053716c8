//! Wire types shared by the HTTP handlers and the client library.

pub mod auth;
pub mod error;
pub mod health;
pub mod products;
