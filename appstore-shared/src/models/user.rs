/// User model and database operations
///
/// Users are identified by their email address. The domain part of the
/// address is lowercased before it is stored; the local part is kept exactly
/// as given, so `Test4@example.com` and `test4@example.com` are different
/// accounts while `test2@Example.com` and `test2@example.com` are not.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL DEFAULT '',
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use appstore_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create_user(&pool, "berkan@Example.com", "PASSWORD", "Berkan").await?;
/// assert_eq!(user.email, "berkan@example.com");
///
/// let found = User::find_by_email(&pool, "berkan@EXAMPLE.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::is_unique_violation;
use crate::auth::password::{self, PasswordError};

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, is_staff, is_superuser, \
                            created_at, updated_at, last_login_at";

/// Errors raised by user operations
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email was empty or had no `@`
    #[error("Users must have an email address")]
    InvalidEmail,

    /// Another account already uses this email
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err, "users_email_key") {
            UserError::DuplicateEmail
        } else {
            UserError::Database(err)
        }
    }
}

/// A marketplace account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address with a normalized (lowercase) domain
    pub email: String,

    /// Display name, may be empty
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Inactive users cannot authenticate
    pub is_active: bool,

    /// Staff users may run the app verification workflow
    pub is_staff: bool,

    /// Superusers are always staff
    pub is_superuser: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// When the user last obtained a token
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for inserting a user row
///
/// `email` must already be normalized and `password_hash` must be a hash;
/// prefer [`User::create_user`] which does both.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Input for updating a user; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    /// New email (normalized before storing)
    pub email: Option<String>,

    /// New plaintext password (hashed before storing)
    pub password: Option<String>,

    pub name: Option<String>,

    pub is_active: Option<bool>,
}

/// Lowercases the domain part of an email address
///
/// The local part is case-sensitive and left untouched. Addresses without an
/// `@` are returned unchanged (after trimming) so validation can reject them
/// with a proper message.
///
/// # Example
///
/// ```
/// use appstore_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("test3@EXAMPLE.com"), "test3@example.com");
/// assert_eq!(normalize_email("TEST5@example.com"), "TEST5@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn checked_email(email: &str) -> Result<String, UserError> {
    let normalized = normalize_email(email);
    match normalized.rsplit_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(normalized),
        _ => Err(UserError::InvalidEmail),
    }
}

impl User {
    /// Inserts a user row as given
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.is_staff)
        .bind(data.is_superuser)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Registers a regular user
    ///
    /// Normalizes the email and hashes the password.
    ///
    /// # Errors
    ///
    /// - `UserError::InvalidEmail` for an empty or malformed address
    /// - `UserError::DuplicateEmail` if the normalized email is taken
    pub async fn create_user(
        pool: &PgPool,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Self, UserError> {
        let email = checked_email(email)?;
        let password_hash = password::hash_password(password)?;

        let user = Self::create(
            pool,
            CreateUser {
                email,
                password_hash,
                name: name.to_string(),
                is_staff: false,
                is_superuser: false,
            },
        )
        .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Creates a superuser, which is always staff as well
    pub async fn create_superuser(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Self, UserError> {
        let email = checked_email(email)?;
        let password_hash = password::hash_password(password)?;

        let user = Self::create(
            pool,
            CreateUser {
                email,
                password_hash,
                name: String::new(),
                is_staff: true,
                is_superuser: true,
            },
        )
        .await?;

        info!(user_id = %user.id, "Superuser created");
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email
    ///
    /// The lookup normalizes the domain, so any casing of the domain matches;
    /// the local part must match exactly.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Checks a login attempt
    ///
    /// Returns the user only when the email exists, the password matches and
    /// the account is active.
    pub async fn authenticate(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Option<Self>, UserError> {
        let Some(user) = Self::find_by_email(pool, email).await? else {
            return Ok(None);
        };

        if !user.is_active || !password::verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        Ok(Some(user))
    }

    /// Updates the given fields and refreshes `updated_at`
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, UserError> {
        let email = data.email.as_deref().map(checked_email).transpose()?;
        let password_hash = data
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(data.name)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user; their apps, orders and tokens go with them
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        let samples = [
            ("test1@example.com", "test1@example.com"),
            ("test2@Example.com", "test2@example.com"),
            ("test3@EXAMPLE.com", "test3@example.com"),
            ("Test4@example.com", "Test4@example.com"),
            ("TEST5@example.com", "TEST5@example.com"),
        ];

        for (email, expected) in samples {
            assert_eq!(normalize_email(email), expected);
        }
    }

    #[test]
    fn test_normalize_email_uses_last_at_sign() {
        assert_eq!(normalize_email("\"a@b\"@EXAMPLE.org"), "\"a@b\"@example.org");
    }

    #[test]
    fn test_checked_email_rejects_empty() {
        assert!(matches!(checked_email(""), Err(UserError::InvalidEmail)));
        assert!(matches!(checked_email("   "), Err(UserError::InvalidEmail)));
        assert!(matches!(checked_email("no-at-sign"), Err(UserError::InvalidEmail)));
        assert!(matches!(checked_email("@example.com"), Err(UserError::InvalidEmail)));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "Test User".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "user@example.com");
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.password.is_none());
        assert!(update.name.is_none());
        assert!(update.is_active.is_none());
    }
}
