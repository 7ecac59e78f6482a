/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and length checks
/// - [`token`]: Opaque bearer token generation and hashing
/// - [`middleware`]: Request authentication and the `AuthContext` it produces
/// - [`authorization`]: Staff checks for the verification workflow
///
/// Ownership of apps and orders is not checked here: those queries filter by
/// owner, so a foreign resource simply isn't found.
///
/// # Example
///
/// ```no_run
/// use appstore_shared::auth::password::{hash_password, verify_password};
/// use appstore_shared::auth::token::{generate_token, hash_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("PASSWORD")?;
/// assert!(verify_password("PASSWORD", &hash)?);
///
/// let token = generate_token();
/// let stored = hash_token(&token);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
