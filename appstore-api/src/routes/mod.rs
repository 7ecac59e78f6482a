/// API route handlers
///
/// Handlers are grouped by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, token exchange and the caller's profile
/// - `apps`: App listings
/// - `orders`: The caller's purchases
/// - `admin`: Staff verification workflow

pub mod admin;
pub mod apps;
pub mod health;
pub mod orders;
pub mod users;
