//! Demo entrypoint: wires the in-memory services and walks an order through
//! its lifecycle, logging every committed event from the bus.

use std::sync::Arc;

use chrono::{Duration, Utc};

use storefront_app::{authenticate, NewOrder, OrderService};
use storefront_auth::JwtClaims;
use storefront_core::{AggregateId, UserId};
use storefront_events::EventBus;
use storefront_orders::{OrderLine, OrderStatus, ShippingAddress};
use storefront_products::{InMemoryCatalog, ProductId, ProductSummary};

fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    // Seed a small catalog (stand-in for the external product service).
    let catalog = Arc::new(InMemoryCatalog::new());
    let teapot = ProductId::new(AggregateId::new());
    catalog.upsert(
        teapot,
        ProductSummary {
            name: "Clay Teapot".to_string(),
            price: 1500,
            image: Some("clay-teapot.webp".to_string()),
        },
    );

    let service = OrderService::in_memory(catalog);

    // Tail the bus: every committed order event, as any consumer would see it.
    let sub = service.event_bus().subscribe();
    std::thread::spawn(move || {
        while let Ok(env) = sub.recv() {
            tracing::info!(
                aggregate_id = %env.aggregate_id(),
                sequence = env.sequence_number(),
                "event committed"
            );
        }
    });

    // Principals, as the identity provider would hand them over.
    let now = Utc::now();
    let buyer = authenticate(
        &JwtClaims {
            sub: UserId::new(),
            admin: false,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::hours(1),
        },
        now,
    )?;
    let staff = authenticate(
        &JwtClaims {
            sub: UserId::new(),
            admin: true,
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::hours(1),
        },
        now,
    )?;

    let record = service.place_order(
        &buyer,
        NewOrder {
            lines: vec![OrderLine {
                product_id: teapot,
                quantity: 2,
            }],
            total_amount: 3000,
            shipping_address: ShippingAddress {
                line1: "12 Harbor Road".to_string(),
                city: "Chattogram".to_string(),
                postal_code: "4000".to_string(),
                phone: "+880171000000".to_string(),
            },
            payment_method: None,
        },
    )?;
    let order_id = record.order_id;
    tracing::info!(order_id = %order_id, status = %record.status, "placed");

    // Fulfillment happy path, with the moves the rules reject along the way.
    service.set_status(&staff, order_id, OrderStatus::Processing)?;

    if let Err(e) = service.set_status(&staff, order_id, OrderStatus::Placed) {
        tracing::info!(error = %e, "backward move rejected");
    }
    if let Err(e) = service.cancel_order(&buyer, order_id) {
        tracing::info!(error = %e, "late self-cancellation rejected");
    }

    service.set_status(&staff, order_id, OrderStatus::Shipped)?;
    let record = service.set_status(&staff, order_id, OrderStatus::Delivered)?;
    tracing::info!(order_id = %order_id, status = %record.status, "delivered");

    if let Err(e) = service.set_status(&staff, order_id, OrderStatus::Cancelled) {
        tracing::info!(error = %e, "terminal order locked");
    }

    // A second order the buyer cancels while it is still fresh.
    let record = service.place_order(
        &buyer,
        NewOrder {
            lines: vec![OrderLine {
                product_id: teapot,
                quantity: 1,
            }],
            total_amount: 1500,
            shipping_address: ShippingAddress {
                line1: "12 Harbor Road".to_string(),
                city: "Chattogram".to_string(),
                postal_code: "4000".to_string(),
                phone: "+880171000000".to_string(),
            },
            payment_method: Some("bKash".to_string()),
        },
    )?;
    let cancelled = service.cancel_order(&buyer, record.order_id)?;
    tracing::info!(order_id = %cancelled.order_id, status = %cancelled.status, "self-cancelled");

    for view in service.list_all(&staff)? {
        tracing::info!(
            order_id = %view.order_id,
            status = %view.status,
            lines = view.lines.len(),
            "order on file"
        );
    }

    Ok(())
}
