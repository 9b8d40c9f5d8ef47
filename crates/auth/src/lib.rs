//! `storefront-auth` — pure authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: token decoding
//! and signature verification happen in whatever transport layer is in use;
//! this crate only validates decoded claims and answers policy questions about
//! an already-authenticated [`Principal`].

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;

pub use authorize::{require_admin, require_self_or_admin, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use principal::Principal;
pub use roles::Role;
