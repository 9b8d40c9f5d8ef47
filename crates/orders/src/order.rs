use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId, ValueObject};
use storefront_events::Event;
use storefront_products::ProductId;

use crate::status::OrderStatus;

/// Payment method recorded when the customer does not choose one.
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Delivery";

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line: product reference + quantity.
///
/// The product reference is lookup-only; the order does not own or cache
/// product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl ValueObject for OrderLine {}

/// Opaque delivery address, fixed at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

impl ValueObject for ShippingAddress {}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer_id: Option<UserId>,
    lines: Vec<OrderLine>,
    total_amount: u64,
    shipping_address: Option<ShippingAddress>,
    payment_method: String,
    status: OrderStatus,
    placed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            customer_id: None,
            lines: Vec::new(),
            total_amount: 0,
            shipping_address: None,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            status: OrderStatus::Placed,
            placed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> Option<UserId> {
        self.customer_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// `customer_id` is bound server-side from the authenticated principal —
/// never from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: u64,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetStatus (back-office fulfillment move).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStatus {
    pub order_id: OrderId,
    pub new_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder (customer self-service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub requested_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    SetStatus(SetStatus),
    CancelOrder(CancelOrder),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: u64,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusSet (back-office move, including the cancel override).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusSet {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled (customer self-cancellation; records the actor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub cancelled_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    OrderStatusSet(OrderStatusSet),
    OrderCancelled(OrderCancelled),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::OrderStatusSet(_) => "orders.order.status_set",
            OrderEvent::OrderCancelled(_) => "orders.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::OrderStatusSet(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.customer_id = Some(e.customer_id);
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
                self.shipping_address = Some(e.shipping_address.clone());
                self.payment_method = e.payment_method.clone();
                self.status = OrderStatus::Placed;
                self.placed_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::OrderStatusSet(e) => {
                self.status = e.status;
            }
            OrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::SetStatus(cmd) => self.handle_set_status(cmd),
            OrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        if cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "order must contain at least one line",
            ));
        }

        if let Some(line) = cmd.lines.iter().find(|l| l.quantity < 1) {
            return Err(DomainError::validation(format!(
                "line quantity must be at least 1 (product {})",
                line.product_id
            )));
        }

        let payment_method = cmd
            .payment_method
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            lines: cmd.lines.clone(),
            total_amount: cmd.total_amount,
            shipping_address: cmd.shipping_address.clone(),
            payment_method,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_status(&self, cmd: &SetStatus) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "status can no longer change: order is already {}",
                self.status
            )));
        }

        // Cancellation is always available to the back office while the
        // order is live, regardless of its position in the sequence.
        if cmd.new_status != OrderStatus::Cancelled {
            let current_index = self
                .status
                .sequence_index()
                .ok_or_else(|| DomainError::invalid_state("order has left the fulfillment sequence"))?;
            let new_index = cmd.new_status.sequence_index().ok_or_else(|| {
                DomainError::invalid_transition(format!(
                    "{} is not a fulfillment stage",
                    cmd.new_status
                ))
            })?;

            if new_index < current_index {
                return Err(DomainError::invalid_transition(format!(
                    "cannot move from {} back to {}",
                    self.status, cmd.new_status
                )));
            }
        }

        Ok(vec![OrderEvent::OrderStatusSet(OrderStatusSet {
            order_id: cmd.order_id,
            status: cmd.new_status,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_order_id(cmd.order_id)?;

        // Ownership before state: a stranger learns nothing about the
        // order's stage.
        if self.customer_id != Some(cmd.requested_by) {
            return Err(DomainError::Forbidden);
        }

        if !self.status.is_owner_cancellable() {
            return Err(DomainError::invalid_state(format!(
                "cancellation locked: order is already in the {} stage",
                self.status
            )));
        }

        Ok(vec![OrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            cancelled_by: cmd.requested_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::FULFILLMENT_SEQUENCE;

    fn test_customer_id() -> UserId {
        UserId::new()
    }

    fn test_order_id() -> OrderId {
        OrderId::new(AggregateId::new())
    }

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_address() -> ShippingAddress {
        ShippingAddress {
            line1: "12 Harbor Road".to_string(),
            city: "Chattogram".to_string(),
            postal_code: "4000".to_string(),
            phone: "+880171000000".to_string(),
        }
    }

    fn test_lines() -> Vec<OrderLine> {
        vec![OrderLine {
            product_id: test_product_id(),
            quantity: 2,
        }]
    }

    fn place_cmd(order_id: OrderId, customer_id: UserId) -> PlaceOrder {
        PlaceOrder {
            order_id,
            customer_id,
            lines: test_lines(),
            total_amount: 2500,
            shipping_address: test_address(),
            payment_method: None,
            occurred_at: test_time(),
        }
    }

    /// An order rehydrated to `Placed`, plus its owner.
    fn placed_order() -> (Order, UserId) {
        let order_id = test_order_id();
        let customer_id = test_customer_id();
        let mut order = Order::empty(order_id);
        let events = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order_id, customer_id)))
            .unwrap();
        order.apply(&events[0]);
        (order, customer_id)
    }

    /// An order advanced (without validation) into an arbitrary status.
    fn order_in_status(status: OrderStatus) -> (Order, UserId) {
        let (mut order, customer_id) = placed_order();
        if status != OrderStatus::Placed {
            order.apply(&OrderEvent::OrderStatusSet(OrderStatusSet {
                order_id: order.id_typed(),
                status,
                occurred_at: test_time(),
            }));
        }
        (order, customer_id)
    }

    #[test]
    fn place_order_emits_order_placed_event() {
        let order_id = test_order_id();
        let customer_id = test_customer_id();
        let order = Order::empty(order_id);

        let events = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order_id, customer_id)))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            OrderEvent::OrderPlaced(e) => {
                assert_eq!(e.order_id, order_id);
                assert_eq!(e.customer_id, customer_id);
                assert_eq!(e.total_amount, 2500);
            }
            _ => panic!("Expected OrderPlaced event"),
        }
    }

    #[test]
    fn placed_order_starts_in_placed_status() {
        let (order, customer_id) = placed_order();
        assert_eq!(order.status(), OrderStatus::Placed);
        assert_eq!(order.customer_id(), Some(customer_id));
        assert!(order.placed_at().is_some());
    }

    #[test]
    fn place_order_defaults_payment_method() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let mut cmd = place_cmd(order_id, test_customer_id());
        cmd.payment_method = None;

        let events = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap();
        match &events[0] {
            OrderEvent::OrderPlaced(e) => assert_eq!(e.payment_method, DEFAULT_PAYMENT_METHOD),
            _ => panic!("Expected OrderPlaced event"),
        }
    }

    #[test]
    fn place_order_keeps_explicit_payment_method() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let mut cmd = place_cmd(order_id, test_customer_id());
        cmd.payment_method = Some("bKash".to_string());

        let events = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap();
        match &events[0] {
            OrderEvent::OrderPlaced(e) => assert_eq!(e.payment_method, "bKash"),
            _ => panic!("Expected OrderPlaced event"),
        }
    }

    #[test]
    fn place_order_rejects_empty_lines() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let mut cmd = place_cmd(order_id, test_customer_id());
        cmd.lines.clear();

        let err = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn place_order_rejects_zero_quantity() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let mut cmd = place_cmd(order_id, test_customer_id());
        cmd.lines[0].quantity = 0;

        let err = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cannot_place_an_existing_order_again() {
        let (order, customer_id) = placed_order();
        let err = order
            .handle(&OrderCommand::PlaceOrder(place_cmd(order.id_typed(), customer_id)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn set_status_moves_forward() {
        let (mut order, _) = placed_order();

        for target in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
            let events = order
                .handle(&OrderCommand::SetStatus(SetStatus {
                    order_id: order.id_typed(),
                    new_status: target,
                    occurred_at: test_time(),
                }))
                .unwrap();
            order.apply(&events[0]);
            assert_eq!(order.status(), target);
        }
    }

    #[test]
    fn set_status_allows_skipping_stages() {
        let (order, _) = placed_order();
        let events = order
            .handle(&OrderCommand::SetStatus(SetStatus {
                order_id: order.id_typed(),
                new_status: OrderStatus::Shipped,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn set_status_allows_reasserting_current_stage() {
        let (order, _) = order_in_status(OrderStatus::Processing);
        let events = order
            .handle(&OrderCommand::SetStatus(SetStatus {
                order_id: order.id_typed(),
                new_status: OrderStatus::Processing,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn set_status_rejects_backward_move() {
        let (order, _) = order_in_status(OrderStatus::Shipped);
        let err = order
            .handle(&OrderCommand::SetStatus(SetStatus {
                order_id: order.id_typed(),
                new_status: OrderStatus::Processing,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn set_status_rejects_terminal_order() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            let (order, _) = order_in_status(terminal);
            for target in [
                OrderStatus::Placed,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ] {
                let err = order
                    .handle(&OrderCommand::SetStatus(SetStatus {
                        order_id: order.id_typed(),
                        new_status: target,
                        occurred_at: test_time(),
                    }))
                    .unwrap_err();
                assert!(
                    matches!(err, DomainError::InvalidState(_)),
                    "expected InvalidState from {terminal} to {target}, got {err:?}"
                );
            }
        }
    }

    #[test]
    fn back_office_can_cancel_any_live_order() {
        for current in [OrderStatus::Placed, OrderStatus::Processing, OrderStatus::Shipped] {
            let (mut order, _) = order_in_status(current);
            let events = order
                .handle(&OrderCommand::SetStatus(SetStatus {
                    order_id: order.id_typed(),
                    new_status: OrderStatus::Cancelled,
                    occurred_at: test_time(),
                }))
                .unwrap();
            order.apply(&events[0]);
            assert_eq!(order.status(), OrderStatus::Cancelled);
        }
    }

    #[test]
    fn set_status_on_missing_order_is_not_found() {
        let order_id = test_order_id();
        let order = Order::empty(order_id);
        let err = order
            .handle(&OrderCommand::SetStatus(SetStatus {
                order_id,
                new_status: OrderStatus::Processing,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn owner_can_cancel_placed_order() {
        let (mut order, customer_id) = placed_order();
        let events = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id: order.id_typed(),
                requested_by: customer_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn stranger_cannot_cancel_even_a_cancellable_order() {
        let (order, _) = placed_order();
        let err = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id: order.id_typed(),
                requested_by: test_customer_id(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::Forbidden);
    }

    #[test]
    fn owner_cannot_cancel_once_processing_began() {
        for current in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
            let (order, customer_id) = order_in_status(current);
            let err = order
                .handle(&OrderCommand::CancelOrder(CancelOrder {
                    order_id: order.id_typed(),
                    requested_by: customer_id,
                    occurred_at: test_time(),
                }))
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }
    }

    #[test]
    fn cancelled_order_cannot_be_cancelled_again() {
        let (mut order, customer_id) = placed_order();
        let events = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id: order.id_typed(),
                requested_by: customer_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);

        let err = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id: order.id_typed(),
                requested_by: customer_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn full_lifecycle_walkthrough() {
        // Place → Processing → (no going back) → Shipped → (owner cannot
        // cancel) → Delivered → (back office cannot cancel).
        let (mut order, customer_id) = placed_order();
        let order_id = order.id_typed();

        let set = |order: &Order, target| {
            order.handle(&OrderCommand::SetStatus(SetStatus {
                order_id,
                new_status: target,
                occurred_at: test_time(),
            }))
        };

        let events = set(&order, OrderStatus::Processing).unwrap();
        order.apply(&events[0]);

        let err = set(&order, OrderStatus::Placed).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        let events = set(&order, OrderStatus::Shipped).unwrap();
        order.apply(&events[0]);

        let err = order
            .handle(&OrderCommand::CancelOrder(CancelOrder {
                order_id,
                requested_by: customer_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let events = set(&order, OrderStatus::Delivered).unwrap();
        order.apply(&events[0]);

        let err = set(&order, OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn version_increments_on_apply() {
        let (mut order, _) = placed_order();
        assert_eq!(order.version(), 1);

        order.apply(&OrderEvent::OrderStatusSet(OrderStatusSet {
            order_id: order.id_typed(),
            status: OrderStatus::Processing,
            occurred_at: test_time(),
        }));
        assert_eq!(order.version(), 2);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let (order, _) = placed_order();
        let before = order.clone();

        let cmd = OrderCommand::SetStatus(SetStatus {
            order_id: order.id_typed(),
            new_status: OrderStatus::Processing,
            occurred_at: test_time(),
        });

        let events1 = order.handle(&cmd).unwrap();
        let events2 = order.handle(&cmd).unwrap();

        assert_eq!(order, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn apply_is_deterministic() {
        let order_id = test_order_id();
        let customer_id = test_customer_id();

        let placed = OrderEvent::OrderPlaced(OrderPlaced {
            order_id,
            customer_id,
            lines: test_lines(),
            total_amount: 900,
            shipping_address: test_address(),
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            occurred_at: test_time(),
        });
        let advanced = OrderEvent::OrderStatusSet(OrderStatusSet {
            order_id,
            status: OrderStatus::Shipped,
            occurred_at: test_time(),
        });

        let mut order1 = Order::empty(order_id);
        order1.apply(&placed);
        order1.apply(&advanced);

        let mut order2 = Order::empty(order_id);
        order2.apply(&placed);
        order2.apply(&advanced);

        assert_eq!(order1, order2);
        assert_eq!(order1.status(), OrderStatus::Shipped);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = OrderStatus> {
            prop_oneof![
                Just(OrderStatus::Placed),
                Just(OrderStatus::Processing),
                Just(OrderStatus::Shipped),
                Just(OrderStatus::Delivered),
                Just(OrderStatus::Cancelled),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: a fulfillment move succeeds exactly when the order
            /// is live and the target does not precede the current stage
            /// (cancellation always passes on a live order).
            #[test]
            fn set_status_obeys_forward_rule(
                current in any_status(),
                target in any_status(),
            ) {
                let (order, _) = order_in_status(current);
                let result = order.handle(&OrderCommand::SetStatus(SetStatus {
                    order_id: order.id_typed(),
                    new_status: target,
                    occurred_at: test_time(),
                }));

                let expect_ok = !current.is_terminal()
                    && (target == OrderStatus::Cancelled
                        || target.sequence_index() >= current.sequence_index());

                prop_assert_eq!(result.is_ok(), expect_ok);
            }

            /// Property: terminal states absorb every status-changing command.
            #[test]
            fn terminal_states_absorb(
                current in prop_oneof![
                    Just(OrderStatus::Delivered),
                    Just(OrderStatus::Cancelled),
                ],
                target in any_status(),
            ) {
                let (order, customer_id) = order_in_status(current);

                let set = order.handle(&OrderCommand::SetStatus(SetStatus {
                    order_id: order.id_typed(),
                    new_status: target,
                    occurred_at: test_time(),
                }));
                prop_assert!(matches!(set, Err(DomainError::InvalidState(_))));

                let cancel = order.handle(&OrderCommand::CancelOrder(CancelOrder {
                    order_id: order.id_typed(),
                    requested_by: customer_id,
                    occurred_at: test_time(),
                }));
                prop_assert!(matches!(cancel, Err(DomainError::InvalidState(_))));
            }

            /// Property: self-cancellation succeeds exactly for the owner of
            /// an order that has not begun processing, and ownership is
            /// checked before state.
            #[test]
            fn cancel_requires_owner_and_initial_stage(
                current in any_status(),
                by_owner in proptest::bool::ANY,
            ) {
                let (order, customer_id) = order_in_status(current);
                let requester = if by_owner { customer_id } else { test_customer_id() };

                let result = order.handle(&OrderCommand::CancelOrder(CancelOrder {
                    order_id: order.id_typed(),
                    requested_by: requester,
                    occurred_at: test_time(),
                }));

                match (by_owner, current.is_owner_cancellable()) {
                    (true, true) => prop_assert!(result.is_ok()),
                    (true, false) => {
                        prop_assert!(matches!(result, Err(DomainError::InvalidState(_))))
                    }
                    (false, _) => prop_assert!(matches!(result, Err(DomainError::Forbidden))),
                }
            }
        }
    }

    #[test]
    fn forward_rule_matrix_over_fulfillment_sequence() {
        for (i, current) in FULFILLMENT_SEQUENCE.iter().enumerate() {
            for (j, target) in FULFILLMENT_SEQUENCE.iter().enumerate() {
                let (order, _) = order_in_status(*current);
                let result = order.handle(&OrderCommand::SetStatus(SetStatus {
                    order_id: order.id_typed(),
                    new_status: *target,
                    occurred_at: test_time(),
                }));

                if current.is_terminal() {
                    assert!(matches!(result, Err(DomainError::InvalidState(_))));
                } else if j >= i {
                    assert!(result.is_ok(), "expected {current} -> {target} to pass");
                } else {
                    assert!(
                        matches!(result, Err(DomainError::InvalidTransition(_))),
                        "expected {current} -> {target} to be rejected"
                    );
                }
            }
        }
    }
}
