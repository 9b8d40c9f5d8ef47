//! The order service: the boundary contract of the order lifecycle.
//!
//! Every operation takes an explicit [`Principal`] and performs its own
//! authorization before touching the domain. Mutations run through the
//! command dispatcher (optimistic concurrency included) and are applied to
//! the service's projection synchronously, so a caller always reads its own
//! writes. Committed events are also published on the bus for any other
//! consumer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use storefront_auth::{require_admin, require_self_or_admin, validate_claims, JwtClaims, Principal};
use storefront_core::{AggregateId, UserId};
use storefront_events::{EventEnvelope, InMemoryEventBus};
use storefront_infra::command_dispatcher::CommandDispatcher;
use storefront_infra::event_store::{InMemoryEventStore, StoredEvent};
use storefront_infra::projections::{OrderReadModel, OrdersProjection, ORDER_AGGREGATE_TYPE};
use storefront_infra::read_model::InMemoryReadModelStore;
use storefront_orders::{
    CancelOrder, Order, OrderCommand, OrderId, OrderStatus, PlaceOrder, SetStatus,
};
use storefront_products::ProductResolver;

use crate::dto::{NewOrder, OrderView};
use crate::errors::ServiceError;

type Bus = InMemoryEventBus<EventEnvelope<JsonValue>>;
type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Arc<Bus>>;
type Projection = OrdersProjection<Arc<InMemoryReadModelStore<OrderId, OrderReadModel>>>;

/// Authenticate a decoded token into a [`Principal`].
///
/// Claims that fail deterministic validation (expired, not yet valid,
/// inverted window) are reported as `Unauthenticated`; everything after this
/// point trusts the principal as-is.
pub fn authenticate(claims: &JwtClaims, now: DateTime<Utc>) -> Result<Principal, ServiceError> {
    validate_claims(claims, now).map_err(|e| {
        tracing::warn!(error = %e, "rejected credential");
        ServiceError::Unauthenticated
    })?;
    Ok(Principal::from_claims(claims))
}

/// Order lifecycle service over in-memory infrastructure (tests/dev).
///
/// Persistent backends slot in behind the same store/bus traits without
/// changing this surface.
pub struct OrderService {
    dispatcher: Dispatcher,
    event_store: Arc<InMemoryEventStore>,
    event_bus: Arc<Bus>,
    projection: Arc<Projection>,
    resolver: Arc<dyn ProductResolver>,
}

impl OrderService {
    /// Wire the in-memory store, bus, and projection into a service.
    pub fn in_memory(resolver: Arc<dyn ProductResolver>) -> Self {
        let event_store = Arc::new(InMemoryEventStore::new());
        let event_bus: Arc<Bus> = Arc::new(InMemoryEventBus::new());
        let dispatcher = CommandDispatcher::new(event_store.clone(), event_bus.clone());

        let read_model_store: Arc<InMemoryReadModelStore<OrderId, OrderReadModel>> =
            Arc::new(InMemoryReadModelStore::new());
        let projection = Arc::new(OrdersProjection::new(read_model_store));

        Self {
            dispatcher,
            event_store,
            event_bus,
            projection,
            resolver,
        }
    }

    /// The bus carrying committed order events (for additional consumers).
    pub fn event_bus(&self) -> &Arc<Bus> {
        &self.event_bus
    }

    /// The underlying event store (rebuilds, audits).
    pub fn event_store(&self) -> &Arc<InMemoryEventStore> {
        &self.event_store
    }

    /// Place a new order for the authenticated principal.
    ///
    /// The owner is bound from the principal — a client-supplied owner field
    /// does not exist on the request shape and would not be trusted if it
    /// did.
    pub fn place_order(
        &self,
        principal: &Principal,
        new_order: NewOrder,
    ) -> Result<OrderReadModel, ServiceError> {
        let order_id = OrderId::new(AggregateId::new());

        let cmd = OrderCommand::PlaceOrder(PlaceOrder {
            order_id,
            customer_id: principal.user_id,
            lines: new_order.lines,
            total_amount: new_order.total_amount,
            shipping_address: new_order.shipping_address,
            payment_method: new_order.payment_method,
            occurred_at: Utc::now(),
        });

        self.dispatch(order_id, cmd)?;
        tracing::info!(order_id = %order_id, customer_id = %principal.user_id, "order placed");

        self.record(order_id)
    }

    /// Customer self-cancellation.
    ///
    /// Only the owner may cancel, and only while the order has not begun
    /// processing; the aggregate enforces both.
    pub fn cancel_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<OrderReadModel, ServiceError> {
        let cmd = OrderCommand::CancelOrder(CancelOrder {
            order_id,
            requested_by: principal.user_id,
            occurred_at: Utc::now(),
        });

        self.dispatch(order_id, cmd)?;
        tracing::info!(order_id = %order_id, customer_id = %principal.user_id, "order cancelled by owner");

        self.record(order_id)
    }

    /// Back-office status transition (admin only).
    pub fn set_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<OrderReadModel, ServiceError> {
        require_admin(principal)?;

        let cmd = OrderCommand::SetStatus(SetStatus {
            order_id,
            new_status,
            occurred_at: Utc::now(),
        });

        self.dispatch(order_id, cmd)?;
        tracing::info!(order_id = %order_id, status = %new_status, "order status updated");

        self.record(order_id)
    }

    /// A single order, visible to its owner and to admins.
    pub fn get_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<OrderView, ServiceError> {
        let rm = self.projection.get(&order_id).ok_or(ServiceError::NotFound)?;
        require_self_or_admin(principal, rm.customer_id)?;
        Ok(OrderView::from_read_model(rm, self.resolver.as_ref()))
    }

    /// All orders of `user_id`, newest placed first.
    ///
    /// Callers may list their own orders; admins may list anyone's.
    pub fn list_for_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<Vec<OrderView>, ServiceError> {
        require_self_or_admin(principal, user_id)?;

        Ok(self
            .projection
            .list_for_customer(user_id)
            .into_iter()
            .map(|rm| OrderView::from_read_model(rm, self.resolver.as_ref()))
            .collect())
    }

    /// Every order on the platform, newest placed first (admin only).
    pub fn list_all(&self, principal: &Principal) -> Result<Vec<OrderView>, ServiceError> {
        require_admin(principal)?;

        Ok(self
            .projection
            .list_all()
            .into_iter()
            .map(|rm| OrderView::from_read_model(rm, self.resolver.as_ref()))
            .collect())
    }

    fn dispatch(&self, order_id: OrderId, cmd: OrderCommand) -> Result<Vec<StoredEvent>, ServiceError> {
        let committed = self
            .dispatcher
            .dispatch::<Order>(order_id.0, ORDER_AGGREGATE_TYPE, cmd, |id| {
                Order::empty(OrderId::new(id))
            })?;

        // Apply synchronously so this service reads its own writes; the
        // projection's cursor makes the additional bus delivery a no-op.
        for stored in &committed {
            if let Err(e) = self.projection.apply_envelope(&stored.to_envelope()) {
                tracing::warn!(order_id = %order_id, error = %e, "projection apply failed");
            }
        }

        Ok(committed)
    }

    fn record(&self, order_id: OrderId) -> Result<OrderReadModel, ServiceError> {
        self.projection
            .get(&order_id)
            .ok_or_else(|| ServiceError::Internal("committed order missing from read model".to_string()))
    }
}
