//! Fixtures and an in-memory [`FoodApi`] for unit tests.
//!
//! Any password is accepted for an identifier registered with
//! [`StubApi::accept_login`].

use std::sync::{Arc, Mutex};

use forkline_core::{FoodId, FoodStatus, OrderId, OrderItemId, OrderStatus, Price, Role, UserId};
use secrecy::SecretString;
use tokio::sync::broadcast;

use crate::api::{
    AuthFailure, AuthResponse, CreateOrderRequest, FoodApi, FoodPayload, LoginRequest,
    RegisterRequest, UpdateOrderRequest,
};
use crate::error::{ClientError, Result};
use crate::models::{Food, Order, OrderItem, User, UserProfile};

pub fn customer(id: i64) -> User {
    User {
        id: UserId::new(id),
        username: format!("customer{id}"),
        email: format!("customer{id}@example.com"),
        first_name: "Casey".to_string(),
        last_name: format!("Diner{id}"),
        phone_number: None,
        role: Role::Customer,
        is_active: true,
        created_at: None,
        updated_at: None,
        address: Some("1 Main St".to_string()),
        restaurant_name: None,
        image_url: None,
    }
}

pub fn restaurant(id: i64) -> User {
    User {
        username: format!("kitchen{id}"),
        email: format!("kitchen{id}@example.com"),
        role: Role::Restaurant,
        restaurant_name: Some(format!("Kitchen {id}")),
        ..customer(id)
    }
}

pub fn food(id: i64, restaurant_id: i64, name: &str, cents: i64) -> Food {
    Food {
        id: FoodId::new(id),
        restaurant_id: UserId::new(restaurant_id),
        name: name.to_string(),
        description: format!("House {}", name.to_lowercase()),
        price: Price::from_cents(cents),
        quantity: 20,
        category: "Mains".to_string(),
        image_url: None,
        status: FoodStatus::Available,
        popular: false,
    }
}

/// An order whose lines are priced at $10.00 per unit.
pub fn order(id: i64, customer_id: i64, status: OrderStatus, lines: &[(i64, u32)]) -> Order {
    let order_items: Vec<OrderItem> = lines
        .iter()
        .zip(1..)
        .map(|(&(food_id, quantity), line_id)| OrderItem {
            id: Some(OrderItemId::new(id * 100 + line_id)),
            food_id: FoodId::new(food_id),
            quantity,
        })
        .collect();
    Order {
        id: OrderId::new(id),
        customer_id: UserId::new(customer_id),
        note: None,
        status,
        cost: order_items
            .iter()
            .map(|i| Price::from_cents(1000).times(i.quantity))
            .sum(),
        created_at: None,
        updated_at: None,
        order_items,
    }
}

#[derive(Default)]
struct StubState {
    calls: usize,
    logins: Vec<(String, User, String)>,
    signed_in: Option<UserId>,
    users: Vec<User>,
    foods: Vec<Food>,
    orders: Vec<Order>,
    fail_next: Option<(u16, String)>,
    food_payloads: Vec<FoodPayload>,
    created_orders: Vec<CreateOrderRequest>,
    order_updates: Vec<UpdateOrderRequest>,
}

/// Backend double. Clones share state, so a test can keep a handle while the
/// code under test owns another.
#[derive(Clone)]
pub struct StubApi {
    state: Arc<Mutex<StubState>>,
    auth_failures: broadcast::Sender<AuthFailure>,
}

impl StubApi {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            auth_failures: broadcast::channel(16).0,
        }
    }

    pub fn with_foods(self, foods: Vec<Food>) -> Self {
        self.state.lock().unwrap().foods = foods;
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.state.lock().unwrap().orders = orders;
        self
    }

    pub fn accept_login(&self, identifier: &str, user: User, token: &str) {
        let mut state = self.state.lock().unwrap();
        state.users.push(user.clone());
        state
            .logins
            .push((identifier.to_string(), user, token.to_string()));
    }

    pub fn put_user(&self, user: User) {
        let mut state = self.state.lock().unwrap();
        state.users.retain(|u| u.id != user.id);
        state.users.push(user);
    }

    /// The next call fails with `status`. 401/403 also publish an auth failure.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.state.lock().unwrap().fail_next = Some((status, message.to_string()));
    }

    pub fn publish_auth_failure(&self, status: u16, path: &str) {
        let _ = self.auth_failures.send(AuthFailure {
            status,
            path: path.to_string(),
        });
    }

    /// Number of gateway calls made so far.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn foods(&self) -> Vec<Food> {
        self.state.lock().unwrap().foods.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn food_payloads(&self) -> Vec<FoodPayload> {
        self.state.lock().unwrap().food_payloads.clone()
    }

    pub fn created_orders(&self) -> Vec<CreateOrderRequest> {
        self.state.lock().unwrap().created_orders.clone()
    }

    pub fn order_updates(&self) -> Vec<UpdateOrderRequest> {
        self.state.lock().unwrap().order_updates.clone()
    }

    /// Count the call and apply any queued failure.
    fn enter(&self, path: &str) -> Result<std::sync::MutexGuard<'_, StubState>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        match state.fail_next.take() {
            Some((status @ (401 | 403), _)) => {
                self.publish_auth_failure(status, path);
                Err(ClientError::Authorization { status })
            }
            Some((status, message)) => Err(ClientError::Api { status, message }),
            None => Ok(state),
        }
    }
}

fn food_from_payload(id: FoodId, payload: &FoodPayload) -> Food {
    Food {
        id,
        restaurant_id: payload.restaurant_id,
        name: payload.name.clone(),
        description: payload.description.clone(),
        price: payload.price,
        quantity: payload.quantity,
        category: payload.category.clone(),
        image_url: Some(payload.image_url.clone()).filter(|u| !u.is_empty()),
        status: payload.status,
        popular: payload.popular,
    }
}

impl FoodApi for StubApi {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let mut state = self.enter("auth/login")?;
        let found = state
            .logins
            .iter()
            .find(|(identifier, _, _)| identifier == &request.username_or_email)
            .cloned();
        let (_, user, token) = found.ok_or_else(|| {
            ClientError::Authentication("Invalid username or password".to_string())
        })?;
        state.signed_in = Some(user.id);
        Ok(AuthResponse {
            access_token: SecretString::from(token),
            token_type: "Bearer".to_string(),
            user,
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let mut state = self.enter("auth/register")?;
        if state.users.iter().any(|u| u.username == request.username) {
            return Err(ClientError::Authentication(
                "Username is already taken!".to_string(),
            ));
        }
        let id = 100 + i64::try_from(state.users.len()).unwrap();
        let user = User {
            id: UserId::new(id),
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            phone_number: Some(request.phone_number.clone()),
            role: request.role,
            is_active: true,
            created_at: None,
            updated_at: None,
            address: Some(request.address.clone()),
            restaurant_name: request.restaurant_name.clone(),
            image_url: None,
        };
        state.users.push(user.clone());
        state.signed_in = Some(user.id);
        Ok(AuthResponse {
            access_token: SecretString::from(format!("token-{id}")),
            token_type: "Bearer".to_string(),
            user,
        })
    }

    async fn list_foods(&self) -> Result<Vec<Food>> {
        Ok(self.enter("foods")?.foods.clone())
    }

    async fn create_food(&self, payload: &FoodPayload) -> Result<Food> {
        let mut state = self.enter("foods")?;
        state.food_payloads.push(payload.clone());
        let next = state.foods.iter().map(|f| f.id.as_i64()).max().unwrap_or(0) + 1;
        let created = food_from_payload(FoodId::new(next), payload);
        state.foods.push(created.clone());
        Ok(created)
    }

    async fn update_food(&self, id: FoodId, payload: &FoodPayload) -> Result<Food> {
        let mut state = self.enter(&format!("foods/{id}"))?;
        state.food_payloads.push(payload.clone());
        let slot = state
            .foods
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Food not found with id {id}")))?;
        *slot = food_from_payload(id, payload);
        Ok(slot.clone())
    }

    async fn delete_food(&self, id: FoodId) -> Result<()> {
        let mut state = self.enter(&format!("foods/{id}"))?;
        let before = state.foods.len();
        state.foods.retain(|f| f.id != id);
        if state.foods.len() == before {
            return Err(ClientError::NotFound(format!("Food not found with id {id}")));
        }
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.enter("order")?.orders.clone())
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        let mut state = self.enter("order")?;
        state.created_orders.push(request.clone());
        let next = state.orders.iter().map(|o| o.id.as_i64()).max().unwrap_or(0) + 1;
        let created = Order {
            id: OrderId::new(next),
            customer_id: state.signed_in.unwrap_or(UserId::new(0)),
            note: Some(request.note.clone()),
            status: OrderStatus::Pending,
            cost: request.cost,
            created_at: None,
            updated_at: None,
            order_items: request.order_items.clone(),
        };
        state.orders.push(created.clone());
        Ok(created)
    }

    async fn update_order(&self, id: OrderId, request: &UpdateOrderRequest) -> Result<Order> {
        let mut state = self.enter(&format!("order/{id}"))?;
        state.order_updates.push(request.clone());
        let slot = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("Order {id} not found")))?;
        slot.customer_id = request.customer_id;
        slot.note = Some(request.note.clone());
        slot.status = request.status;
        slot.cost = request.cost;
        slot.order_items.clone_from(&request.order_items);
        Ok(slot.clone())
    }

    async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        self.enter(&format!("users/{id}"))?
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("User not found with id {id}")))
    }

    async fn list_restaurants(&self) -> Result<Vec<UserProfile>> {
        Ok(self
            .enter("users/role/RESTAURANT")?
            .users
            .iter()
            .filter(|u| u.role == Role::Restaurant)
            .cloned()
            .collect())
    }

    fn auth_failures(&self) -> broadcast::Receiver<AuthFailure> {
        self.auth_failures.subscribe()
    }
}
