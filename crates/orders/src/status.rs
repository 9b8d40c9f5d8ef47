use core::str::FromStr;
use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Order status lifecycle.
///
/// Fulfillment progresses forward through [`FULFILLMENT_SEQUENCE`];
/// `Cancelled` is an absorbing state reachable from any non-terminal
/// position. `Delivered` and `Cancelled` are terminal.
///
/// `"pending"` is accepted as a deprecated spelling of `Placed` — older
/// records used both names for the same not-yet-processed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "pending")]
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Fulfillment stages in progression order. `Cancelled` is deliberately
/// absent: it is an escape, not a stage.
pub const FULFILLMENT_SEQUENCE: [OrderStatus; 4] = [
    OrderStatus::Placed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

impl OrderStatus {
    /// Position of this status in the fulfillment sequence, if it is a stage.
    pub fn sequence_index(self) -> Option<usize> {
        FULFILLMENT_SEQUENCE.iter().position(|s| *s == self)
    }

    /// Terminal states never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// A customer may self-cancel only while the order has not begun
    /// processing.
    pub fn is_owner_cancellable(self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "placed" | "pending" => Ok(OrderStatus::Placed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}
