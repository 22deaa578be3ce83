//! In-memory cart and checkout.
//!
//! Entries are keyed by item id and kept in the order they were first added.
//! A quantity never drops to zero: the entry is removed instead.

use forkline_core::{FoodId, Price};
use tracing::{info, instrument};

use crate::api::{CreateOrderRequest, FoodApi};
use crate::error::{ClientError, Result};
use crate::models::{Food, Order, OrderItem};

/// A selected item and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    /// The catalog record as it was when first added.
    pub item: Food,
    pub quantity: u32,
}

impl CartEntry {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.item.price.times(self.quantity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn quantity_of(&self, id: FoodId) -> u32 {
        self.entry(id).map_or(0, |e| e.quantity)
    }

    fn entry(&self, id: FoodId) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.item.id == id)
    }

    fn position(&self, id: FoodId) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.item.id == id)
            .ok_or(ClientError::UnknownItem(id))
    }

    /// Add one of `item`. Returns the new quantity.
    pub fn add_item(&mut self, item: &Food) -> u32 {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item.id == item.id) {
            entry.quantity += 1;
            return entry.quantity;
        }
        self.entries.push(CartEntry {
            item: item.clone(),
            quantity: 1,
        });
        1
    }

    /// Take one of `id` out. Returns the remaining quantity; at zero the
    /// entry is gone.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem` if `id` is not in the cart.
    pub fn remove_one(&mut self, id: FoodId) -> Result<u32> {
        let index = self.position(id)?;
        let remaining = match self.entries.get_mut(index) {
            Some(entry) if entry.quantity > 1 => {
                entry.quantity -= 1;
                entry.quantity
            }
            _ => {
                self.entries.remove(index);
                0
            }
        };
        Ok(remaining)
    }

    /// Set the quantity of an item already in the cart; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem` if `id` is not in the cart.
    pub fn set_quantity(&mut self, id: FoodId, quantity: u32) -> Result<()> {
        let index = self.position(id)?;
        if quantity == 0 {
            self.entries.remove(index);
        } else if let Some(entry) = self.entries.get_mut(index) {
            entry.quantity = quantity;
        }
        Ok(())
    }

    /// Drop an item entirely.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem` if `id` is not in the cart.
    pub fn remove_item(&mut self, id: FoodId) -> Result<()> {
        self.set_quantity(id, 0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.entries.iter().map(CartEntry::subtotal).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// The order-creation body for the current contents.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyCart` when there is nothing to order.
    pub fn to_order_request(&self, note: &str) -> Result<CreateOrderRequest> {
        if self.is_empty() {
            return Err(ClientError::EmptyCart);
        }
        Ok(CreateOrderRequest {
            note: note.trim().to_string(),
            cost: self.total(),
            order_items: self
                .entries
                .iter()
                .map(|e| OrderItem {
                    id: None,
                    food_id: e.item.id,
                    quantity: e.quantity,
                })
                .collect(),
        })
    }

    /// Place the order. The cart is emptied only once the backend accepts it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyCart` without a request for an empty cart,
    /// otherwise any gateway error, with the cart untouched.
    #[instrument(skip(self, api), fields(items = self.item_count(), total = %self.total()))]
    pub async fn checkout<A: FoodApi>(&mut self, api: &A, note: &str) -> Result<Order> {
        let request = self.to_order_request(note)?;
        let order = api.create_order(&request).await?;
        info!(order_id = %order.id, cost = %order.cost, "Order placed");
        self.clear();
        Ok(order)
    }
}
