/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `equipment`: Equipment catalogue
/// - `usage`: Session start/end and usage history
/// - `dashboard`: Member overview
/// - `wins`: The caller's auction wins
/// - `admin`: Member listing and win management

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod equipment;
pub mod health;
pub mod usage;
pub mod wins;
