//! REST gateway.
//!
//! [`FoodApi`] is the seam between local state and the backend. [`ApiClient`]
//! implements it over `reqwest`; tests substitute an in-memory double.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Returns |
//! |---|---|---|---|
//! | POST | `auth/login` | [`LoginRequest`] | [`AuthResponse`] |
//! | POST | `auth/register` | [`RegisterRequest`] | [`AuthResponse`] |
//! | GET | `foods` | | `Vec<Food>` |
//! | POST | `foods` | [`FoodPayload`] | `Food` |
//! | PUT | `foods/{id}` | [`FoodPayload`] | `Food` |
//! | DELETE | `foods/{id}` | | |
//! | GET | `order` | | `Vec<Order>` |
//! | POST | `order` | [`CreateOrderRequest`] | `Order` |
//! | PUT | `order/{id}` | [`UpdateOrderRequest`] | `Order` |
//! | GET | `users/{id}` | | `UserProfile` |
//! | GET | `users/role/RESTAURANT` | | `Vec<UserProfile>` |

mod client;
pub mod wire;

use std::future::Future;

use forkline_core::{FoodId, OrderId, UserId};
use tokio::sync::broadcast;

pub use client::ApiClient;
pub use wire::{
    AuthResponse, CreateOrderRequest, FoodPayload, LoginRequest, RegisterRequest,
    UpdateOrderRequest,
};

use crate::error::Result;
use crate::models::{Food, Order, UserProfile};

/// An authenticated call was rejected with 401 or 403.
///
/// Published by the gateway; the session controller reacts by logging out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub status: u16,
    pub path: String,
}

/// Typed access to the backend.
pub trait FoodApi: Send + Sync {
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<AuthResponse>> + Send;

    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse>> + Send;

    fn list_foods(&self) -> impl Future<Output = Result<Vec<Food>>> + Send;

    fn create_food(&self, payload: &FoodPayload) -> impl Future<Output = Result<Food>> + Send;

    fn update_food(
        &self,
        id: FoodId,
        payload: &FoodPayload,
    ) -> impl Future<Output = Result<Food>> + Send;

    fn delete_food(&self, id: FoodId) -> impl Future<Output = Result<()>> + Send;

    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;

    fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<Order>> + Send;

    fn update_order(
        &self,
        id: OrderId,
        request: &UpdateOrderRequest,
    ) -> impl Future<Output = Result<Order>> + Send;

    fn get_user(&self, id: UserId) -> impl Future<Output = Result<UserProfile>> + Send;

    fn list_restaurants(&self) -> impl Future<Output = Result<Vec<UserProfile>>> + Send;

    /// Subscribe to authorization failures on authenticated calls.
    fn auth_failures(&self) -> broadcast::Receiver<AuthFailure>;
}
