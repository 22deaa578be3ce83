//! Orders as stored by the backend.

use chrono::{DateTime, Utc};
use forkline_core::{FoodId, OrderId, OrderItemId, OrderStatus, Price, UserId};
use serde::{Deserialize, Serialize};

use super::Food;
use crate::api::wire::UpdateOrderRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub cost: Price,
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// One line of an order. Items reference the catalog by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderItemId>,
    pub food_id: FoodId,
    pub quantity: u32,
}

/// An order line joined against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedLine {
    pub food_id: FoodId,
    /// `None` when the item is no longer in the catalog.
    pub name: Option<String>,
    pub unit_price: Option<Price>,
    pub quantity: u32,
}

impl EnrichedLine {
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.unit_price.map(|p| p.times(self.quantity))
    }
}

impl Order {
    /// The whole record with `status` replaced, as `PUT /order/{id}` expects.
    #[must_use]
    pub fn to_update_request(&self, status: OrderStatus) -> UpdateOrderRequest {
        UpdateOrderRequest {
            id: self.id,
            customer_id: self.customer_id,
            note: self.note.clone().unwrap_or_default(),
            status,
            cost: self.cost,
            order_items: self.order_items.clone(),
        }
    }

    /// Whether any line refers to one of `food_ids`.
    #[must_use]
    pub fn contains_any(&self, food_ids: &[FoodId]) -> bool {
        self.order_items
            .iter()
            .any(|item| food_ids.contains(&item.food_id))
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.order_items.iter().map(|item| item.quantity).sum()
    }

    /// Lines joined against `catalog` for display.
    #[must_use]
    pub fn lines(&self, catalog: &[Food]) -> Vec<EnrichedLine> {
        self.order_items
            .iter()
            .map(|item| {
                let food = catalog.iter().find(|f| f.id == item.food_id);
                EnrichedLine {
                    food_id: item.food_id,
                    name: food.map(|f| f.name.clone()),
                    unit_price: food.map(|f| f.price),
                    quantity: item.quantity,
                }
            })
            .collect()
    }
}

/// Order list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    /// Anything not yet delivered or cancelled.
    Active,
    Status(OrderStatus),
}

impl OrderFilter {
    #[must_use]
    pub fn matches(self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::Active => order.status.is_active(),
            Self::Status(status) => order.status == status,
        }
    }
}

impl std::str::FromStr for OrderFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            other => other.parse().map(Self::Status),
        }
    }
}

/// Sum of `cost` over delivered orders.
#[must_use]
pub fn delivered_revenue<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Price {
    orders
        .into_iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .map(|o| o.cost)
        .sum()
}
