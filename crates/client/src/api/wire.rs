//! Request and response bodies that exist only on the wire.

use forkline_core::{FoodStatus, OrderId, OrderStatus, Price, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{OrderItem, User};

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// `POST /auth/login`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// `POST /auth/register`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    pub address: String,
}

/// Body returned by both auth endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(deserialize_with = "secret")]
    pub access_token: SecretString,
    #[serde(default = "bearer")]
    pub token_type: String,
    pub user: User,
}

fn bearer() -> String {
    "Bearer".to_string()
}

/// Full catalog record as sent by `POST /foods` and `PUT /foods/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPayload {
    pub restaurant_id: UserId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub category: String,
    pub image_url: String,
    pub status: FoodStatus,
    pub popular: bool,
}

/// `POST /order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub note: String,
    pub cost: Price,
    pub order_items: Vec<OrderItem>,
}

/// `PUT /order/{id}`. The backend replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub id: OrderId,
    pub customer_id: UserId,
    pub note: String,
    pub status: OrderStatus,
    pub cost: Price,
    pub order_items: Vec<OrderItem>,
}

/// Pull a human-readable message out of an error body: the `message` or
/// `error` field of a JSON object, else the raw text, else `HTTP <status>`.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
        });

    from_json
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("HTTP {status}"))
}
