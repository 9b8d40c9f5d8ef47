use serde::{Deserialize, Serialize};

use storefront_core::UserId;

use crate::{JwtClaims, Role};

/// Identity of an authenticated principal, as trusted by business logic.
///
/// This is an authorization boundary object: it is built once per request
/// from verified claims and passed explicitly into every core operation (no
/// ambient/global request state).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Derive a principal from validated claims.
    ///
    /// Callers must run [`crate::validate_claims`] first; this is a pure
    /// mapping and performs no checks of its own.
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: if claims.admin { Role::Admin } else { Role::Customer },
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
