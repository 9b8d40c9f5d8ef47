//! `storefront-app` — the application boundary for the order lifecycle.
//!
//! Composes the event-sourced infrastructure into an HTTP-agnostic service:
//! every operation takes an explicit [`storefront_auth::Principal`] and
//! returns either the persisted record or a structured error. Transport
//! layers (HTTP, CLI, jobs) sit on top of this crate.

pub mod dto;
pub mod errors;
pub mod service;

pub use dto::{EnrichedOrderLine, NewOrder, OrderView};
pub use errors::ServiceError;
pub use service::{authenticate, OrderService};
