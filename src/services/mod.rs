pub mod auth_service;
pub mod health_service;
pub mod product_service;
