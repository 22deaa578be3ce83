//! Forkline Core - Shared types library.
//!
//! This crate provides common types used across all Forkline components:
//! - `client` - REST gateway, session, cart, order and menu lifecycles
//! - `cli` - Terminal front end over the client library
//!
//! # Architecture
//!
//! The core crate contains only types and the rules attached to them - no I/O,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
