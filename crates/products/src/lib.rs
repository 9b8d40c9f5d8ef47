//! `storefront-products` — product reference boundary.
//!
//! Orders hold weak references to products; this crate defines the resolver
//! used to turn those references into display summaries on the read side.
//! The catalog itself lives elsewhere — an in-memory implementation is
//! provided for tests/dev.

pub mod product;

pub use product::{InMemoryCatalog, ProductId, ProductResolver, ProductSummary};
