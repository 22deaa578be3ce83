//! Status enums for orders and catalog items.
//!
//! [`OrderStatus`] carries the order lifecycle transition table. The backend
//! stores whatever status string it is sent, so this table is the only place
//! the forward-only rules are enforced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order lifecycle status.
///
/// ```text
/// PENDING ──▶ READY ──▶ OUT_FOR_DELIVERY ──▶ DELIVERED
///    │          └───────────────────────────▲
///    └──▶ CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move an order from {from} to {to}")]
pub struct TransitionError {
    /// Status the order is currently in.
    pub from: OrderStatus,
    /// Status that was requested.
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Ready,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Statuses reachable from this one in a single step.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::OutForDelivery, Self::Delivered],
            Self::OutForDelivery => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is a legal single-step transition from this status.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if `next` is not in [`Self::allowed_next`].
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// An order still being worked on.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Wire representation (`OUT_FOR_DELIVERY`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Ready => "READY",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "PENDING" => Ok(Self::Pending),
            "READY" => Ok(Self::Ready),
            "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Catalog item availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodStatus {
    #[default]
    Available,
    Unavailable,
}

impl FoodStatus {
    /// The other status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Available => Self::Unavailable,
            Self::Unavailable => Self::Available,
        }
    }
}

impl std::fmt::Display for FoodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for FoodStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(format!("invalid food status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use OrderStatus::{Cancelled, Delivered, OutForDelivery, Pending, Ready};

        let legal = [
            (Pending, Ready),
            (Pending, Cancelled),
            (Ready, OutForDelivery),
            (Ready, Delivered),
            (OutForDelivery, Delivered),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "legal" } else { "illegal" }
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in OrderStatus::ALL {
            assert_eq!(status.is_terminal(), status.allowed_next().is_empty());
        }
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::OutForDelivery.is_active());
    }

    #[test]
    fn test_transition_to_reports_both_ends() {
        let err = OrderStatus::Ready
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.from, OrderStatus::Ready);
        assert_eq!(err.to, OrderStatus::Pending);
        assert_eq!(err.to_string(), "cannot move an order from READY to PENDING");
    }

    #[test]
    fn test_order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"OUT_FOR_DELIVERY\"");
        let parsed: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_status_from_str_is_lenient() {
        assert_eq!("out-for-delivery".parse::<OrderStatus>(), Ok(OrderStatus::OutForDelivery));
        assert_eq!("ready".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert!("confirmed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_food_status() {
        assert_eq!(FoodStatus::Available.toggled(), FoodStatus::Unavailable);
        assert_eq!(
            serde_json::to_string(&FoodStatus::Unavailable).unwrap(),
            "\"unavailable\""
        );
    }
}
