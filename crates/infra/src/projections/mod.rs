//! Projection implementations (read model builders).
//!
//! Projections consume domain events and build query-optimized read models.
//! They are **rebuildable** from the event stream and **idempotent** (safe
//! for at-least-once delivery).

pub mod orders;

pub use orders::{
    OrderLineReadModel, OrderReadModel, OrdersProjection, OrdersProjectionError,
    ORDER_AGGREGATE_TYPE,
};
