//! Forkline client library.
//!
//! Everything a front end needs to talk to the Forkline REST backend:
//!
//! - [`api`] - the [`FoodApi`] gateway trait and its `reqwest` implementation
//! - [`session`] - durable token store and the authentication session
//! - [`cart`] - the in-memory cart and checkout
//! - [`orders`] - order book and the status lifecycle side effects
//! - [`menu`] - a restaurant's catalog lifecycle
//! - [`views`] - role-specific entry points ([`RoleView`])
//! - [`notify`] - user-visible notifications
//! - [`display`] - presentation fallbacks (labels, placeholder images)
//!
//! Callers establish identity through [`SessionController`], then do all
//! reads and writes through the gateway while the cart, order book and menu
//! hold local state rehydrated from it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod display;
pub mod error;
pub mod menu;
pub mod models;
pub mod notify;
pub mod orders;
pub mod session;
pub mod views;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

pub use api::{ApiClient, AuthFailure, FoodApi};
pub use cart::{Cart, CartEntry};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, Result};
pub use menu::{Confirm, MenuManager};
pub use notify::{Audience, Notification, NotificationKind, NotificationLog, Notifier, TracingNotifier};
pub use orders::{OrderBook, OrderScope};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionController, TokenStore};
pub use views::{AdminView, CustomerView, RestaurantView, RoleView};
