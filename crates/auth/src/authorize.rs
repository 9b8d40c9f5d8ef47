use thiserror::Error;

use storefront_core::UserId;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Require back-office administrator rights.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn require_admin(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden("admin access required".to_string()))
    }
}

/// Require the principal to be the resource owner, or an administrator.
///
/// Used for owner-scoped reads: a customer may act on their own records, an
/// administrator on anyone's.
pub fn require_self_or_admin(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.user_id == owner || principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden("access denied".to_string()))
    }
}
