//! Request/response shapes for the order service boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::UserId;
use storefront_infra::projections::OrderReadModel;
use storefront_orders::{OrderId, OrderLine, OrderStatus, ShippingAddress};
use storefront_products::{ProductId, ProductResolver, ProductSummary};

/// Client input for placing an order.
///
/// Deliberately has no owner field: the owner is always the authenticated
/// principal, bound server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub lines: Vec<OrderLine>,
    /// Total in smallest currency unit (e.g., cents).
    pub total_amount: u64,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
}

/// An order line with its product reference resolved to display fields.
///
/// `product` is `None` when the reference no longer resolves; reads never
/// fail over a missing product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<ProductSummary>,
}

/// Read-side view of an order with enriched lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub lines: Vec<EnrichedOrderLine>,
    pub total_amount: u64,
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    /// Build a view from a read model, resolving product references.
    pub fn from_read_model<R: ProductResolver + ?Sized>(rm: OrderReadModel, resolver: &R) -> Self {
        let lines = rm
            .lines
            .iter()
            .map(|l| EnrichedOrderLine {
                product_id: l.product_id,
                quantity: l.quantity,
                product: resolver.resolve(l.product_id),
            })
            .collect();

        Self {
            order_id: rm.order_id,
            customer_id: rm.customer_id,
            status: rm.status,
            lines,
            total_amount: rm.total_amount,
            payment_method: rm.payment_method,
            shipping_address: rm.shipping_address,
            placed_at: rm.placed_at,
            updated_at: rm.updated_at,
        }
    }
}
