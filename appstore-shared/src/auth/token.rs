/// Opaque bearer token utilities
///
/// Tokens look like `tok_` followed by 40 random alphanumeric characters.
/// The database only ever sees the SHA-256 digest (see
/// `models::auth_token`), so a leaked table doesn't leak credentials.
///
/// # Example
///
/// ```
/// use appstore_shared::auth::token::{generate_token, hash_token, validate_token_format, TOKEN_LENGTH};
///
/// let token = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert!(validate_token_format(&token));
/// assert_eq!(hash_token(&token).len(), 64);
/// ```

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "tok_";

const TOKEN_RANDOM_LENGTH: usize = 40;

/// Total token length, prefix included
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Characters kept in clear for display
const DISPLAY_PREFIX_LENGTH: usize = 12;

/// Generates a new random token
pub fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LENGTH)
        .map(char::from)
        .collect();

    format!("{TOKEN_PREFIX}{random}")
}

/// SHA-256 hex digest of a token, as stored in `auth_tokens.key_hash`
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Leading characters used to identify a token without revealing it
pub fn extract_prefix(token: &str) -> String {
    token.chars().take(DISPLAY_PREFIX_LENGTH).collect()
}

/// Cheap syntactic check done before touching the database
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .strip_prefix(TOKEN_PREFIX)
            .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert!(token.starts_with("tok_"));
        assert_eq!(token.len(), 44);
        assert!(validate_token_format(&token));
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let hash = hash_token("tok_test123");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("tok_test123"));
        assert_ne!(hash, hash_token("tok_test124"));
    }

    #[test]
    fn test_extract_prefix() {
        assert_eq!(extract_prefix("tok_abcdefghijklmnop"), "tok_abcdefgh");
        assert_eq!(extract_prefix("tok_ab"), "tok_ab");
    }

    #[test]
    fn test_validate_token_format() {
        assert!(validate_token_format(&format!("tok_{}", "a".repeat(40))));
        assert!(!validate_token_format(&format!("key_{}", "a".repeat(40))));
        assert!(!validate_token_format("tok_short"));
        assert!(!validate_token_format(&format!("tok_{}!", "a".repeat(39))));
    }
}
