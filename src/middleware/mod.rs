// Middleware modules for the GymKit backend

pub mod auth;

pub use auth::{tenant_middleware, AuthenticatedTenant};
