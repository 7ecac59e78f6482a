/// Permission checks
///
/// Regular users act only on their own apps and orders; that is enforced by
/// owner-scoped queries in `models`. The only role check is staff access to
/// the verification workflow.

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller isn't staff
    #[error("You do not have permission to perform this action.")]
    StaffRequired(Uuid),
}

/// Requires the caller to be a staff user
///
/// ```
/// use appstore_shared::auth::authorization::require_staff;
/// use appstore_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), token_id: Uuid::new_v4(), is_staff: false };
/// assert!(require_staff(&auth).is_err());
/// ```
pub fn require_staff(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_staff {
        return Err(AuthzError::StaffRequired(auth.user_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(is_staff: bool) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            is_staff,
        }
    }

    #[test]
    fn test_require_staff() {
        assert!(require_staff(&context(true)).is_ok());

        let auth = context(false);
        match require_staff(&auth) {
            Err(AuthzError::StaffRequired(user_id)) => assert_eq!(user_id, auth.user_id),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
