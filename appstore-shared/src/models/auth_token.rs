/// Auth token model and database operations
///
/// Tokens are opaque bearer credentials issued when a user exchanges their
/// email and password. Clients present them as `Authorization: Token <key>`.
///
/// # Security
///
/// - Only the SHA-256 hash of a token is stored
/// - The plaintext is returned once, when the token is issued
/// - Validation joins the owning user and rejects inactive accounts
/// - A user holds at most one token; issuing again replaces it
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     key_prefix VARCHAR(12) NOT NULL,
///     key_hash VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_used_at TIMESTAMPTZ,
///     CONSTRAINT auth_tokens_user_id_key UNIQUE (user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::{extract_prefix, generate_token, hash_token};

/// A stored token record (never contains the plaintext)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuthToken {
    pub id: Uuid,

    /// User the token authenticates as
    pub user_id: Uuid,

    /// Leading characters of the token, for display
    pub key_prefix: String,

    /// SHA-256 hex digest of the token
    #[serde(skip_serializing)]
    pub key_hash: String,

    pub created_at: DateTime<Utc>,

    pub last_used_at: Option<DateTime<Utc>>,
}

/// The identity behind a valid token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenOwner {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub is_staff: bool,
}

impl AuthToken {
    /// Issues a new token for a user, revoking any previous one
    ///
    /// Returns the stored record and the plaintext token. The plaintext is
    /// not recoverable afterwards.
    pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<(Self, String), sqlx::Error> {
        let plaintext = generate_token();

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, key_prefix, key_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT auth_tokens_user_id_key DO UPDATE
            SET key_prefix = EXCLUDED.key_prefix,
                key_hash = EXCLUDED.key_hash,
                created_at = NOW(),
                last_used_at = NULL
            RETURNING id, user_id, key_prefix, key_hash, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(extract_prefix(&plaintext))
        .bind(hash_token(&plaintext))
        .fetch_one(pool)
        .await?;

        Ok((token, plaintext))
    }

    /// Resolves a presented token to its active owner
    ///
    /// Marks the token as used. Returns `None` for unknown tokens and for
    /// tokens whose user has been deactivated.
    pub async fn validate(pool: &PgPool, plaintext: &str) -> Result<Option<TokenOwner>, sqlx::Error> {
        sqlx::query_as::<_, TokenOwner>(
            r#"
            UPDATE auth_tokens t
            SET last_used_at = NOW()
            FROM users u
            WHERE t.key_hash = $1
              AND u.id = t.user_id
              AND u.is_active = TRUE
            RETURNING t.id AS token_id, u.id AS user_id, u.is_staff
            "#,
        )
        .bind(hash_token(plaintext))
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's tokens (at most one)
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT id, user_id, key_prefix, key_hash, created_at, last_used_at
            FROM auth_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
