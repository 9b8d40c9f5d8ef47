use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use storefront_core::AggregateId;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Display-friendly product fields for read-side enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub image: Option<String>,
}

/// Read-side product lookup.
///
/// A missing product must not fail the read — callers omit the enrichment
/// and carry on.
pub trait ProductResolver: Send + Sync {
    fn resolve(&self, product_id: ProductId) -> Option<ProductSummary>;
}

impl<R> ProductResolver for Arc<R>
where
    R: ProductResolver + ?Sized,
{
    fn resolve(&self, product_id: ProductId) -> Option<ProductSummary> {
        (**self).resolve(product_id)
    }
}

/// In-memory product catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSummary>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, product_id: ProductId, summary: ProductSummary) {
        if let Ok(mut map) = self.products.write() {
            map.insert(product_id, summary);
        }
    }
}

impl ProductResolver for InMemoryCatalog {
    fn resolve(&self, product_id: ProductId) -> Option<ProductSummary> {
        let map = self.products.read().ok()?;
        map.get(&product_id).cloned()
    }
}
