//! Orders domain module (event-sourced).
//!
//! This crate contains the business rules for customer orders — the status
//! lifecycle and its transition rules — implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod order;
pub mod status;

pub use order::{
    CancelOrder, Order, OrderCancelled, OrderCommand, OrderEvent, OrderId, OrderLine,
    OrderPlaced, OrderStatusSet, PlaceOrder, SetStatus, ShippingAddress,
    DEFAULT_PAYMENT_METHOD,
};
pub use status::{OrderStatus, FULFILLMENT_SEQUENCE};
