/// Database models for AppStore
///
/// Each model owns its SQL and exposes async CRUD functions taking a `PgPool`.
///
/// # Models
///
/// - `user`: Accounts, email normalization and credential checks
/// - `auth_token`: Opaque bearer tokens issued at login
/// - `app`: Listings and their verification lifecycle
/// - `order`: Purchases of verified apps
///
/// # Example
///
/// ```no_run
/// use appstore_shared::models::app::{App, CreateApp};
/// use appstore_shared::models::user::User;
/// use rust_decimal::Decimal;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let owner = User::create_user(&pool, "dev@example.com", "PASSWORD", "Dev").await?;
///
/// let app = App::create(&pool, CreateApp {
///     title: "App 1".to_string(),
///     description: String::new(),
///     price: Decimal::new(1000, 2),
///     owner_id: owner.id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod app;
pub mod auth_token;
pub mod order;
pub mod user;

/// Checks whether `err` is a unique-constraint violation on `constraint`
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
