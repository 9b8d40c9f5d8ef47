use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use storefront_core::{AggregateId, UserId};
use storefront_events::EventEnvelope;
use storefront_orders::{OrderEvent, OrderId, OrderStatus, ShippingAddress};
use storefront_products::ProductId;

use crate::read_model::ReadModelStore;

/// Aggregate type identifier for order streams.
pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineReadModel {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReadModel {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineReadModel>,
    pub total_amount: u64,
    pub payment_method: String,
    pub shipping_address: ShippingAddress,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum OrdersProjectionError {
    #[error("failed to deserialize order event: {0}")]
    Deserialize(String),
    #[error("event order_id does not match envelope aggregate_id")]
    StreamMismatch,
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Builds the queryable order read model from order events.
///
/// Duplicate and already-seen envelopes are skipped via a per-stream cursor,
/// so at-least-once delivery (and the service's synchronous apply on top of
/// bus delivery) is safe.
#[derive(Debug)]
pub struct OrdersProjection<S>
where
    S: ReadModelStore<OrderId, OrderReadModel>,
{
    store: S,
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> OrdersProjection<S>
where
    S: ReadModelStore<OrderId, OrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&aggregate_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(aggregate_id, seq);
        }
    }

    pub fn get(&self, order_id: &OrderId) -> Option<OrderReadModel> {
        self.store.get(order_id)
    }

    /// All orders of one customer, newest placed first.
    pub fn list_for_customer(&self, customer_id: UserId) -> Vec<OrderReadModel> {
        let mut orders: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .collect();
        sort_newest_first(&mut orders);
        orders
    }

    /// Every order on the platform, newest placed first.
    pub fn list_all(&self) -> Vec<OrderReadModel> {
        let mut orders = self.store.list();
        sort_newest_first(&mut orders);
        orders
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), OrdersProjectionError> {
        if envelope.aggregate_type() != ORDER_AGGREGATE_TYPE {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(aggregate_id);
        if seq == 0 {
            return Err(OrdersProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            // Already applied (at-least-once delivery); skip.
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(OrdersProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrdersProjectionError::Deserialize(e.to_string()))?;

        let order_id = match &ev {
            OrderEvent::OrderPlaced(e) => e.order_id,
            OrderEvent::OrderStatusSet(e) => e.order_id,
            OrderEvent::OrderCancelled(e) => e.order_id,
        };
        if order_id.0 != aggregate_id {
            return Err(OrdersProjectionError::StreamMismatch);
        }

        match ev {
            OrderEvent::OrderPlaced(e) => {
                self.store.upsert(
                    e.order_id,
                    OrderReadModel {
                        order_id: e.order_id,
                        customer_id: e.customer_id,
                        status: OrderStatus::Placed,
                        lines: e
                            .lines
                            .iter()
                            .map(|l| OrderLineReadModel {
                                product_id: l.product_id,
                                quantity: l.quantity,
                            })
                            .collect(),
                        total_amount: e.total_amount,
                        payment_method: e.payment_method,
                        shipping_address: e.shipping_address,
                        placed_at: e.occurred_at,
                        updated_at: e.occurred_at,
                    },
                );
            }
            OrderEvent::OrderStatusSet(e) => {
                if let Some(mut rm) = self.store.get(&e.order_id) {
                    rm.status = e.status;
                    rm.updated_at = e.occurred_at;
                    self.store.upsert(e.order_id, rm);
                } else {
                    tracing::warn!(order_id = %e.order_id, "status event for unknown order record");
                }
            }
            OrderEvent::OrderCancelled(e) => {
                if let Some(mut rm) = self.store.get(&e.order_id) {
                    rm.status = OrderStatus::Cancelled;
                    rm.updated_at = e.occurred_at;
                    self.store.upsert(e.order_id, rm);
                } else {
                    tracing::warn!(order_id = %e.order_id, "cancel event for unknown order record");
                }
            }
        }

        self.update_cursor(aggregate_id, seq);
        Ok(())
    }

    /// Drop the read model and rebuild it from a full set of envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), OrdersProjectionError> {
        self.store.clear();
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}

fn sort_newest_first(orders: &mut [OrderReadModel]) {
    // UUIDv7 order ids are time-ordered, so the id is a stable tiebreak for
    // orders placed in the same instant.
    orders.sort_by(|a, b| {
        b.placed_at
            .cmp(&a.placed_at)
            .then_with(|| b.order_id.0.as_uuid().cmp(a.order_id.0.as_uuid()))
    });
}
