//! Local order list and the status lifecycle's side effects.
//!
//! The transition table itself lives on [`OrderStatus`]; this module checks
//! it before any request, sends the whole record back to the backend, and
//! only then updates the local list and notifies.

use forkline_core::{FoodId, OrderId, OrderStatus, Price, UserId};
use tracing::{error, info, instrument};

use crate::api::FoodApi;
use crate::error::{ClientError, Result};
use crate::models::{Order, OrderFilter, delivered_revenue};
use crate::notify::{Audience, Notification, Notifier};

/// Which orders a book holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this customer.
    Customer(UserId),
    /// Orders containing at least one of these items.
    Restaurant(Vec<FoodId>),
    /// Everything the backend returns.
    All,
}

impl OrderScope {
    #[must_use]
    pub fn includes(&self, order: &Order) -> bool {
        match self {
            Self::Customer(id) => order.customer_id == *id,
            Self::Restaurant(food_ids) => order.contains_any(food_ids),
            Self::All => true,
        }
    }
}

/// Orders visible to one user, rehydrated from the backend.
#[derive(Debug, Clone)]
pub struct OrderBook {
    scope: OrderScope,
    orders: Vec<Order>,
}

impl OrderBook {
    #[must_use]
    pub const fn new(scope: OrderScope) -> Self {
        Self {
            scope,
            orders: Vec::new(),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> &OrderScope {
        &self.scope
    }

    /// Change the scope and drop orders that fall outside it.
    pub fn set_scope(&mut self, scope: OrderScope) {
        self.orders.retain(|o| scope.includes(o));
        self.scope = scope;
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn filtered(&self, filter: OrderFilter) -> Vec<&Order> {
        self.orders.iter().filter(|o| filter.matches(o)).collect()
    }

    /// Total cost of delivered orders.
    #[must_use]
    pub fn revenue(&self) -> Price {
        delivered_revenue(&self.orders)
    }

    /// Add or replace an order the caller already has from the backend.
    pub fn upsert(&mut self, order: Order) {
        if !self.scope.includes(&order) {
            return;
        }
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
    }

    /// Reload from the backend, keeping only orders in scope.
    ///
    /// # Errors
    ///
    /// Returns any gateway error; the current list is kept.
    #[instrument(skip(self, api))]
    pub async fn refresh<A: FoodApi>(&mut self, api: &A) -> Result<&[Order]> {
        let mut orders = api.list_orders().await?;
        orders.retain(|o| self.scope.includes(o));
        info!(count = orders.len(), "Orders loaded");
        self.orders = orders;
        Ok(&self.orders)
    }

    /// Move order `id` to `next`.
    ///
    /// The transition is checked before anything is sent. On success the
    /// server's record replaces the local one (last write wins) and a
    /// notification for `audience` is raised; on failure an error
    /// notification is raised and the list is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder` or `ClientError::IllegalTransition`
    /// without a request, or any gateway error.
    #[instrument(skip(self, api, notifier))]
    pub async fn advance<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        audience: Audience,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order> {
        let current = self.get(id).ok_or(ClientError::UnknownOrder(id))?;
        if let Err(e) = current.status.transition_to(next) {
            notifier.notify(Notification::error(e.to_string()));
            return Err(e.into());
        }
        let request = current.to_update_request(next);

        match api.update_order(id, &request).await {
            Ok(updated) => {
                info!(order_id = %id, status = %updated.status, "Order status updated");
                match self.orders.iter_mut().find(|o| o.id == id) {
                    Some(existing) => *existing = updated.clone(),
                    None => self.orders.push(updated.clone()),
                }
                notifier.notify(Notification::for_order_status(audience, id, next));
                Ok(updated)
            }
            Err(e) => {
                error!(order_id = %id, error = %e, "Failed to update order status");
                notifier.notify(Notification::error(e.user_message()));
                Err(e)
            }
        }
    }
}
