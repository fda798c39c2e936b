/// Middleware modules for the API server
///
/// - `auth`: Bearer token validation for member routes
/// - `security`: Security response headers

pub mod auth;
pub mod security;
