//! What each role can see and do once signed in.
//!
//! [`RoleView::for_user`] picks the view for the signed-in role. Each view
//! only exposes the operations that role is allowed to perform, so a
//! customer view has no way to edit a menu and an admin view cannot change
//! anything at all.

use std::sync::Arc;

use forkline_core::{FoodId, OrderId, OrderStatus, Price, Role, UserId};
use tracing::{error, info, instrument};

use crate::api::FoodApi;
use crate::cart::Cart;
use crate::error::{ClientError, Result};
use crate::menu::{Confirm, MenuManager};
use crate::models::{EnrichedLine, Food, FoodDraft, FoodUpdate, MenuFilter, Order, OrderFilter, User};
use crate::notify::{Audience, Notification, Notifier};
use crate::orders::{OrderBook, OrderScope};

/// The signed-in user's view, one variant per role.
pub enum RoleView<A> {
    Customer(CustomerView<A>),
    Restaurant(RestaurantView<A>),
    Admin(AdminView<A>),
}

impl<A: FoodApi> RoleView<A> {
    #[must_use]
    pub fn for_user(api: A, notifier: Arc<dyn Notifier>, user: User) -> Self {
        match user.role {
            Role::Customer => Self::Customer(CustomerView::build(api, notifier, user)),
            Role::Restaurant => Self::Restaurant(RestaurantView::build(api, notifier, user)),
            Role::Admin => Self::Admin(AdminView::build(api, user)),
        }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Customer(view) => &view.user,
            Self::Restaurant(view) => &view.user,
            Self::Admin(view) => &view.user,
        }
    }

    /// Load everything the view shows.
    ///
    /// # Errors
    ///
    /// Returns the first gateway error.
    pub async fn refresh(&mut self) -> Result<()> {
        match self {
            Self::Customer(view) => view.refresh().await,
            Self::Restaurant(view) => view.refresh().await,
            Self::Admin(view) => view.refresh().await,
        }
    }
}

fn require(user: &User, role: Role) -> Result<()> {
    if user.role == role {
        Ok(())
    } else {
        Err(ClientError::WrongRole { required: role })
    }
}

fn lines_for(orders: &OrderBook, catalog: &[Food], id: OrderId) -> Result<Vec<EnrichedLine>> {
    orders
        .get(id)
        .map(|order| order.lines(catalog))
        .ok_or(ClientError::UnknownOrder(id))
}

/// Browse restaurants, fill a cart, place and track orders.
pub struct CustomerView<A> {
    api: A,
    notifier: Arc<dyn Notifier>,
    user: User,
    restaurants: Vec<User>,
    catalog: Vec<Food>,
    cart: Cart,
    orders: OrderBook,
}

impl<A: FoodApi> CustomerView<A> {
    /// # Errors
    ///
    /// Returns `ClientError::WrongRole` unless `user` is a customer.
    pub fn new(api: A, notifier: Arc<dyn Notifier>, user: User) -> Result<Self> {
        require(&user, Role::Customer)?;
        Ok(Self::build(api, notifier, user))
    }

    fn build(api: A, notifier: Arc<dyn Notifier>, user: User) -> Self {
        let orders = OrderBook::new(OrderScope::Customer(user.id));
        Self {
            api,
            notifier,
            user,
            restaurants: Vec::new(),
            catalog: Vec::new(),
            cart: Cart::new(),
            orders,
        }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// # Errors
    ///
    /// Returns the first gateway error.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn refresh(&mut self) -> Result<()> {
        self.restaurants = self.api.list_restaurants().await?;
        self.catalog = self.api.list_foods().await?;
        self.orders.refresh(&self.api).await?;
        Ok(())
    }

    #[must_use]
    pub fn restaurants(&self) -> &[User] {
        &self.restaurants
    }

    #[must_use]
    pub fn restaurant(&self, id: UserId) -> Option<&User> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    /// Items a restaurant currently offers.
    #[must_use]
    pub fn menu(&self, restaurant: UserId) -> Vec<&Food> {
        self.catalog
            .iter()
            .filter(|f| f.restaurant_id == restaurant && f.is_available())
            .collect()
    }

    /// Available popular items across every restaurant.
    #[must_use]
    pub fn popular(&self) -> Vec<&Food> {
        self.catalog
            .iter()
            .filter(|f| f.popular && f.is_available())
            .collect()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Put one of `id` in the cart. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem` for an item not in the catalog and
    /// `ClientError::Validation` for one that is unavailable.
    pub fn add_to_cart(&mut self, id: FoodId) -> Result<u32> {
        let item = self
            .catalog
            .iter()
            .find(|f| f.id == id)
            .ok_or(ClientError::UnknownItem(id))?;
        if !item.is_available() {
            let message = format!("{} is currently unavailable.", item.name);
            self.notifier.notify(Notification::warning(message.clone()));
            return Err(ClientError::Validation(message));
        }
        let quantity = self.cart.add_item(item);
        self.notifier.notify(
            Notification::success(format!("{} has been added to your cart.", item.name))
                .titled("Added to cart"),
        );
        Ok(quantity)
    }

    /// Place the cart as an order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmptyCart` without a request, or any gateway
    /// error with the cart kept.
    pub async fn checkout(&mut self, note: &str) -> Result<Order> {
        let (count, total) = (self.cart.item_count(), self.cart.total());
        match self.cart.checkout(&self.api, note).await {
            Ok(order) => {
                self.notifier.notify(
                    Notification::success(format!(
                        "Your order of {count} items for {total} has been placed."
                    ))
                    .titled("Order placed successfully!"),
                );
                self.orders.upsert(order.clone());
                Ok(order)
            }
            Err(ClientError::EmptyCart) => {
                self.notifier.notify(
                    Notification::error("Please add items to your cart before placing an order.")
                        .titled("Cart is empty"),
                );
                Err(ClientError::EmptyCart)
            }
            Err(e) => {
                error!(error = %e, "Checkout failed");
                self.notifier.notify(Notification::error(e.user_message()));
                Err(e)
            }
        }
    }

    /// This customer's orders, newest last.
    #[must_use]
    pub fn orders(&self, filter: OrderFilter) -> Vec<&Order> {
        self.orders.filtered(filter)
    }

    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder` for an order this customer does
    /// not own.
    pub fn order_lines(&self, id: OrderId) -> Result<Vec<EnrichedLine>> {
        lines_for(&self.orders, &self.catalog, id)
    }

    /// Cancel one of this customer's orders. Only pending orders can be
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder`, `ClientError::IllegalTransition`
    /// for an order past pending, or any gateway error.
    pub async fn cancel_order(&mut self, id: OrderId) -> Result<Order> {
        self.orders
            .advance(
                &self.api,
                self.notifier.as_ref(),
                Audience::Customer,
                id,
                OrderStatus::Cancelled,
            )
            .await
    }
}

/// Manage a menu and work incoming orders.
pub struct RestaurantView<A> {
    api: A,
    notifier: Arc<dyn Notifier>,
    user: User,
    menu: MenuManager,
    orders: OrderBook,
}

impl<A: FoodApi> RestaurantView<A> {
    /// # Errors
    ///
    /// Returns `ClientError::WrongRole` unless `user` is a restaurant.
    pub fn new(api: A, notifier: Arc<dyn Notifier>, user: User) -> Result<Self> {
        require(&user, Role::Restaurant)?;
        Ok(Self::build(api, notifier, user))
    }

    fn build(api: A, notifier: Arc<dyn Notifier>, user: User) -> Self {
        let menu = MenuManager::owned_by(user.id);
        Self {
            api,
            notifier,
            user,
            menu,
            orders: OrderBook::new(OrderScope::Restaurant(Vec::new())),
        }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Reload the menu, then the orders that contain any of its items.
    ///
    /// # Errors
    ///
    /// Returns the first gateway error.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn refresh(&mut self) -> Result<()> {
        self.menu.refresh(&self.api).await?;
        self.rescope();
        self.orders.refresh(&self.api).await?;
        Ok(())
    }

    fn rescope(&mut self) {
        self.orders
            .set_scope(OrderScope::Restaurant(self.menu.food_ids()));
    }

    #[must_use]
    pub fn menu(&self, filter: &MenuFilter) -> Vec<&Food> {
        self.menu.filtered(filter)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.menu.categories()
    }

    /// # Errors
    ///
    /// As [`MenuManager::create`].
    pub async fn create_food(&mut self, draft: FoodDraft) -> Result<Food> {
        let created = self
            .menu
            .create(&self.api, self.notifier.as_ref(), draft)
            .await?;
        self.rescope();
        Ok(created)
    }

    /// # Errors
    ///
    /// As [`MenuManager::update`].
    pub async fn update_food(&mut self, id: FoodId, update: &FoodUpdate) -> Result<Food> {
        self.menu
            .update(&self.api, self.notifier.as_ref(), id, update)
            .await
    }

    /// # Errors
    ///
    /// As [`MenuManager::toggle_status`].
    pub async fn toggle_status(&mut self, id: FoodId) -> Result<Food> {
        self.menu
            .toggle_status(&self.api, self.notifier.as_ref(), id)
            .await
    }

    /// # Errors
    ///
    /// As [`MenuManager::toggle_popular`].
    pub async fn toggle_popular(&mut self, id: FoodId) -> Result<Food> {
        self.menu
            .toggle_popular(&self.api, self.notifier.as_ref(), id)
            .await
    }

    /// Delete an item. Orders that only referenced it stay visible until the
    /// next refresh.
    ///
    /// # Errors
    ///
    /// As [`MenuManager::delete`].
    pub async fn delete_food(&mut self, confirm: &dyn Confirm, id: FoodId) -> Result<()> {
        self.menu
            .delete(&self.api, self.notifier.as_ref(), confirm, id)
            .await
    }

    #[must_use]
    pub fn orders(&self, filter: OrderFilter) -> Vec<&Order> {
        self.orders.filtered(filter)
    }

    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder` for an order outside this
    /// restaurant's scope.
    pub fn order_lines(&self, id: OrderId) -> Result<Vec<EnrichedLine>> {
        lines_for(&self.orders, self.menu.items(), id)
    }

    /// Statuses order `id` can move to next.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder`.
    pub fn next_statuses(&self, id: OrderId) -> Result<&'static [OrderStatus]> {
        self.orders
            .get(id)
            .map(|o| o.status.allowed_next())
            .ok_or(ClientError::UnknownOrder(id))
    }

    /// # Errors
    ///
    /// As [`OrderBook::advance`].
    pub async fn advance(&mut self, id: OrderId, next: OrderStatus) -> Result<Order> {
        self.orders
            .advance(&self.api, self.notifier.as_ref(), Audience::Restaurant, id, next)
            .await
    }

    #[must_use]
    pub fn revenue(&self) -> Price {
        self.orders.revenue()
    }
}

/// Read-only overview of the whole platform.
pub struct AdminView<A> {
    api: A,
    user: User,
    restaurants: Vec<User>,
    foods: Vec<Food>,
    orders: OrderBook,
}

impl<A: FoodApi> AdminView<A> {
    /// # Errors
    ///
    /// Returns `ClientError::WrongRole` unless `user` is an admin.
    pub fn new(api: A, user: User) -> Result<Self> {
        require(&user, Role::Admin)?;
        Ok(Self::build(api, user))
    }

    const fn build(api: A, user: User) -> Self {
        Self {
            api,
            user,
            restaurants: Vec::new(),
            foods: Vec::new(),
            orders: OrderBook::new(OrderScope::All),
        }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// # Errors
    ///
    /// Returns the first gateway error.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn refresh(&mut self) -> Result<()> {
        self.restaurants = self.api.list_restaurants().await?;
        self.foods = self.api.list_foods().await?;
        self.orders.refresh(&self.api).await?;
        info!(
            restaurants = self.restaurants.len(),
            foods = self.foods.len(),
            orders = self.orders.orders().len(),
            "Platform overview loaded"
        );
        Ok(())
    }

    #[must_use]
    pub fn restaurants(&self) -> &[User] {
        &self.restaurants
    }

    #[must_use]
    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    #[must_use]
    pub fn orders(&self, filter: OrderFilter) -> Vec<&Order> {
        self.orders.filtered(filter)
    }

    /// # Errors
    ///
    /// Returns `ClientError::UnknownOrder`.
    pub fn order_lines(&self, id: OrderId) -> Result<Vec<EnrichedLine>> {
        lines_for(&self.orders, &self.foods, id)
    }

    #[must_use]
    pub fn revenue(&self) -> Price {
        self.orders.revenue()
    }
}
