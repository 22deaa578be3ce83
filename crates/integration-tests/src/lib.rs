//! Integration tests for Forkline.
//!
//! [`FakeBackend`] serves the REST contract the client talks to from an
//! in-process `axum` router on an ephemeral port, so the real `reqwest`
//! gateway, token store and lifecycles can be driven end to end without any
//! external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p forkline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session` - login, registration, persisted sessions and forced logout
//! - `ordering` - cart checkout and the order status lifecycle
//! - `menu` - restaurant catalog management

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use forkline_client::ClientConfig;
use forkline_client::models::{Food, Order, User};
use forkline_core::UserId;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

pub use axum::http::StatusCode;

/// A request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    /// Path below `/api/`, e.g. `foods/3`.
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<(User, String)>,
    tokens: HashMap<String, UserId>,
    issued: u32,
    foods: Vec<Food>,
    orders: Vec<Order>,
    requests: Vec<Recorded>,
    bodies: Vec<(String, Value)>,
    fail_next: Option<(StatusCode, String)>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Copy)]
struct Caller(UserId);

/// In-process backend. Stops when dropped.
pub struct FakeBackend {
    base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl FakeBackend {
    /// Bind `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Shared::default();
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/foods", get(list_foods).post(create_food))
            .route("/foods/{id}", put(update_food).delete(delete_food))
            .route("/order", get(list_orders).post(create_order))
            .route("/order/{id}", put(update_order))
            .route("/users/{id}", get(get_user))
            .route("/users/role/{role}", get(users_by_role))
            .layer(middleware::from_fn_with_state(state.clone(), gate));
        let app = Router::new().nest("/api", api).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api/"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the base URL is always absolute.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_base_url(&self.base_url).expect("Fake backend URL is absolute")
    }

    pub fn add_account(&self, user: User, password: &str) {
        lock(&self.state).accounts.push((user, password.to_string()));
    }

    pub fn add_food(&self, food: Food) {
        lock(&self.state).foods.push(food);
    }

    pub fn add_order(&self, order: Order) {
        lock(&self.state).orders.push(order);
    }

    /// Forget every issued token, so the next authenticated call gets 401.
    pub fn revoke_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    /// Answer the next request with `status` and a plain-text `body`.
    pub fn fail_next(&self, status: StatusCode, body: &str) {
        lock(&self.state).fail_next = Some((status, body.to_string()));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests to `path`, any method.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// The most recent JSON body sent to `path`.
    #[must_use]
    pub fn last_body(&self, path: &str) -> Option<Value> {
        lock(&self.state)
            .bodies
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
    }

    #[must_use]
    pub fn foods(&self) -> Vec<Food> {
        lock(&self.state).foods.clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.state).orders.clone()
    }
}

/// Records the request, applies a queued failure, and checks the bearer
/// token on everything outside `auth/`.
async fn gate(State(state): State<Shared>, mut request: Request, next: Next) -> Response {
    let path = request
        .uri()
        .path()
        .trim_start_matches("/api")
        .trim_start_matches('/')
        .to_string();
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let caller = {
        let mut state = lock(&state);
        state.requests.push(Recorded {
            method: request.method().to_string(),
            path: path.clone(),
            authorization: authorization.clone(),
        });
        if let Some((status, body)) = state.fail_next.take() {
            return (status, body).into_response();
        }
        authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| state.tokens.get(token).copied())
    };

    if !path.starts_with("auth/") {
        let Some(caller) = caller else {
            return message(StatusCode::UNAUTHORIZED, "Full authentication is required");
        };
        request.extensions_mut().insert(Caller(caller));
    }
    next.run(request).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn issue_token(state: &mut BackendState, user: &User) -> Value {
    state.issued += 1;
    let token = format!("token-{}-{}", user.id, state.issued);
    state.tokens.insert(token.clone(), user.id);
    json!({ "accessToken": token, "tokenType": "Bearer", "user": user })
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.bodies.push(("auth/login".to_string(), body.clone()));
    let identifier = body["usernameOrEmail"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let user = state
        .accounts
        .iter()
        .find(|(u, p)| (u.username == identifier || u.email == identifier) && p == password)
        .map(|(u, _)| u.clone());
    match user {
        Some(user) => Json(issue_token(&mut state, &user)).into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.bodies.push(("auth/register".to_string(), body.clone()));
    let username = body["username"].as_str().unwrap_or_default();
    if state.accounts.iter().any(|(u, _)| u.username == username) {
        return message(StatusCode::BAD_REQUEST, "Username is already taken!");
    }

    let id = 1000 + i64::try_from(state.accounts.len()).unwrap_or_default();
    let mut record = body.clone();
    record["id"] = json!(id);
    let user: User = match serde_json::from_value(record) {
        Ok(user) => user,
        Err(e) => return message(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    let password = body["password"].as_str().unwrap_or_default().to_string();
    state.accounts.push((user.clone(), password));
    Json(issue_token(&mut state, &user)).into_response()
}

async fn list_foods(State(state): State<Shared>) -> Response {
    Json(lock(&state).foods.clone()).into_response()
}

async fn create_food(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.bodies.push(("foods".to_string(), body.clone()));
    let id = state.foods.iter().map(|f| f.id.as_i64()).max().unwrap_or(0) + 1;
    let mut record = body;
    record["id"] = json!(id);
    match serde_json::from_value::<Food>(record) {
        Ok(food) => {
            state.foods.push(food.clone());
            (StatusCode::CREATED, Json(food)).into_response()
        }
        Err(e) => message(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn update_food(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    state.bodies.push((format!("foods/{id}"), body.clone()));
    let mut record = body;
    record["id"] = json!(id);
    let food: Food = match serde_json::from_value(record) {
        Ok(food) => food,
        Err(e) => return message(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    match state.foods.iter_mut().find(|f| f.id.as_i64() == id) {
        Some(slot) => {
            *slot = food.clone();
            Json(food).into_response()
        }
        None => message(StatusCode::NOT_FOUND, &format!("Food not found with id {id}")),
    }
}

async fn delete_food(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = lock(&state);
    let before = state.foods.len();
    state.foods.retain(|f| f.id.as_i64() != id);
    if state.foods.len() == before {
        return message(StatusCode::NOT_FOUND, &format!("Food not found with id {id}"));
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_orders(State(state): State<Shared>) -> Response {
    Json(lock(&state).orders.clone()).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    Extension(Caller(caller)): Extension<Caller>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    state.bodies.push(("order".to_string(), body.clone()));

    let requested: Vec<i64> = body["orderItems"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["foodId"].as_i64()).collect())
        .unwrap_or_default();
    let unknown: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !state.foods.iter().any(|f| f.id.as_i64() == *id))
        .collect();
    if !unknown.is_empty() {
        // Plain-text body, as the order service sends it.
        return (StatusCode::BAD_REQUEST, format!("Invalid food IDs: {unknown:?}")).into_response();
    }

    let id = state.orders.iter().map(|o| o.id.as_i64()).max().unwrap_or(0) + 1;
    let mut record = body;
    record["id"] = json!(id);
    record["customerId"] = json!(caller);
    record["status"] = json!("PENDING");
    if let Some(items) = record["orderItems"].as_array_mut() {
        for (line, item) in (1..).zip(items.iter_mut()) {
            item["id"] = json!(id * 100 + line);
        }
    }
    match serde_json::from_value::<Order>(record) {
        Ok(order) => {
            state.orders.push(order.clone());
            (StatusCode::CREATED, Json(order)).into_response()
        }
        Err(e) => message(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn update_order(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    state.bodies.push((format!("order/{id}"), body.clone()));
    let mut record = body;
    record["id"] = json!(id);
    let order: Order = match serde_json::from_value(record) {
        Ok(order) => order,
        Err(e) => return message(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    match state.orders.iter_mut().find(|o| o.id.as_i64() == id) {
        Some(slot) => {
            *slot = order.clone();
            Json(order).into_response()
        }
        None => message(StatusCode::NOT_FOUND, &format!("Order {id} not found")),
    }
}

async fn get_user(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    lock(&state)
        .accounts
        .iter()
        .find(|(u, _)| u.id.as_i64() == id)
        .map_or_else(
            || message(StatusCode::NOT_FOUND, &format!("User not found with id {id}")),
            |(u, _)| Json(u.clone()).into_response(),
        )
}

async fn users_by_role(State(state): State<Shared>, Path(role): Path<String>) -> Response {
    let users: Vec<User> = lock(&state)
        .accounts
        .iter()
        .filter(|(u, _)| u.role.to_string() == role)
        .map(|(u, _)| u.clone())
        .collect();
    Json(users).into_response()
}

/// Records to seed a [`FakeBackend`] with.
pub mod fixtures {
    use forkline_core::{FoodId, FoodStatus, OrderId, OrderItemId, OrderStatus, Price, Role, UserId};

    use forkline_client::models::{Food, Order, OrderItem, User};

    #[must_use]
    pub fn customer(id: i64, username: &str) -> User {
        User {
            id: UserId::new(id),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Jordan".to_string(),
            last_name: "Lee".to_string(),
            phone_number: Some("5550100".to_string()),
            role: Role::Customer,
            is_active: true,
            created_at: None,
            updated_at: None,
            address: Some("12 Harbor St".to_string()),
            restaurant_name: None,
            image_url: None,
        }
    }

    #[must_use]
    pub fn restaurant(id: i64, username: &str, name: &str) -> User {
        User {
            role: Role::Restaurant,
            restaurant_name: Some(name.to_string()),
            ..customer(id, username)
        }
    }

    #[must_use]
    pub fn food(id: i64, restaurant_id: i64, name: &str, cents: i64) -> Food {
        Food {
            id: FoodId::new(id),
            restaurant_id: UserId::new(restaurant_id),
            name: name.to_string(),
            description: format!("{name}, made to order"),
            price: Price::from_cents(cents),
            quantity: 20,
            category: "Mains".to_string(),
            image_url: None,
            status: FoodStatus::Available,
            popular: false,
        }
    }

    /// An order of `lines` (`food_id`, quantity) costing `cents` in total.
    #[must_use]
    pub fn order(id: i64, customer_id: i64, status: OrderStatus, cents: i64, lines: &[(i64, u32)]) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: UserId::new(customer_id),
            note: None,
            status,
            cost: Price::from_cents(cents),
            created_at: None,
            updated_at: None,
            order_items: (1..)
                .zip(lines)
                .map(|(line, &(food_id, quantity))| OrderItem {
                    id: Some(OrderItemId::new(id * 100 + line)),
                    food_id: FoodId::new(food_id),
                    quantity,
                })
                .collect(),
        }
    }
}
