/// Token authentication for Axum
///
/// Clients authenticate with `Authorization: Token <key>` (the `Bearer`
/// scheme is accepted too). A valid token resolves to an [`AuthContext`]
/// which the API layer stores in request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use appstore_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::token::validate_token_format;
use crate::models::auth_token::{AuthToken, TokenOwner};

/// Who is making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Token the request was authenticated with
    pub token_id: Uuid,

    /// Whether the user may run the verification workflow
    pub is_staff: bool,
}

impl From<TokenOwner> for AuthContext {
    fn from(owner: TokenOwner) -> Self {
        Self {
            user_id: owner.user_id,
            token_id: owner.token_id,
            is_staff: owner.is_staff,
        }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    /// Header present but not `Token <key>` or `Bearer <key>`
    #[error("Invalid token header: {0}")]
    InvalidFormat(String),

    /// Unknown token, or the user behind it is inactive
    #[error("Invalid token.")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Extracts the token from an `Authorization` header value
///
/// ```
/// use appstore_shared::auth::middleware::parse_authorization_header;
///
/// assert_eq!(parse_authorization_header("Token abc").unwrap(), "abc");
/// assert_eq!(parse_authorization_header("Bearer abc").unwrap(), "abc");
/// assert!(parse_authorization_header("Basic abc").is_err());
/// ```
pub fn parse_authorization_header(value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("No credentials provided.".to_string()))?;

    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat(format!(
            "Unsupported authorization scheme '{}'",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::InvalidFormat(
            "Token string should not contain spaces.".to_string(),
        ));
    }

    Ok(token)
}

/// Authenticates a request from its headers
///
/// # Errors
///
/// - `AuthError::MissingCredentials` without an `Authorization` header
/// - `AuthError::InvalidFormat` for an unsupported scheme
/// - `AuthError::InvalidToken` for unknown tokens or inactive users
pub async fn authenticate(pool: &PgPool, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Header is not valid ASCII".to_string()))?;

    let token = parse_authorization_header(value)?;

    if !validate_token_format(token) {
        debug!("Rejected malformed token");
        return Err(AuthError::InvalidToken);
    }

    let owner = AuthToken::validate(pool, token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    Ok(owner.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_scheme() {
        assert_eq!(parse_authorization_header("Token tok_abc").unwrap(), "tok_abc");
        assert_eq!(parse_authorization_header("token tok_abc").unwrap(), "tok_abc");
        assert_eq!(parse_authorization_header("Bearer tok_abc").unwrap(), "tok_abc");
    }

    #[test]
    fn test_parse_rejects_bad_headers() {
        assert!(matches!(
            parse_authorization_header("Token"),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_authorization_header("Basic dXNlcjpwYXNz"),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_authorization_header("Token a b"),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_auth_context_from_owner() {
        let owner = TokenOwner {
            token_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            is_staff: true,
        };

        let context = AuthContext::from(owner.clone());
        assert_eq!(context.user_id, owner.user_id);
        assert_eq!(context.token_id, owner.token_id);
        assert!(context.is_staff);
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid token.");
        assert_eq!(
            AuthError::MissingCredentials.to_string(),
            "Authentication credentials were not provided."
        );
    }
}
