//! User-visible notifications.
//!
//! Every remote failure is reported once, at the action that triggered it, as
//! a [`Notification`] handed to a [`Notifier`]. Front ends decide how to show
//! them; [`TracingNotifier`] logs them and [`NotificationLog`] keeps them for
//! later display (and for tests).

use std::sync::{Arc, Mutex, PoisonError};

use forkline_core::{OrderId, OrderStatus};
use tracing::{error, info, warn};

use crate::display::status_label;

/// What a notification is about. Each kind carries a default title and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
    OrderReceived,
    OrderPreparing,
    OrderReady,
    OrderDelivered,
}

impl NotificationKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Information",
            Self::OrderReceived => "New Order Received!",
            Self::OrderPreparing => "Order in Kitchen",
            Self::OrderReady => "Order Ready!",
            Self::OrderDelivered => "Order Delivered!",
        }
    }

    #[must_use]
    pub const fn default_description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::Error => "Something went wrong",
            Self::Warning => "Please check your input",
            Self::Info => "Here's some useful information",
            Self::OrderReceived => "A new order has been placed",
            Self::OrderPreparing => "Your order is being prepared",
            Self::OrderReady => "Your order is ready for pickup/delivery",
            Self::OrderDelivered => "Your order has been delivered successfully",
        }
    }

    /// Shown with destructive styling.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Who is looking at an order status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Customer,
    Restaurant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    /// A notification of `kind`, using the kind's defaults where `message`
    /// is `None`.
    #[must_use]
    pub fn new(kind: NotificationKind, message: Option<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            description: message.unwrap_or_else(|| kind.default_description().to_string()),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, Some(message.into()))
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, Some(message.into()))
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, Some(message.into()))
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, Some(message.into()))
    }

    /// Replace the kind's default title.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The notification for an order that has just moved to `status`.
    #[must_use]
    pub fn for_order_status(audience: Audience, id: OrderId, status: OrderStatus) -> Self {
        let subject = match audience {
            Audience::Restaurant => format!("Order #{id}"),
            Audience::Customer => format!("Your order #{id}"),
        };
        match status {
            OrderStatus::Ready => Self::new(
                NotificationKind::OrderReady,
                Some(format!("{subject} is ready for pickup/delivery")),
            ),
            OrderStatus::OutForDelivery => Self::info(format!("{subject} is out for delivery")),
            OrderStatus::Delivered => Self::new(
                NotificationKind::OrderDelivered,
                Some(format!("{subject} has been delivered successfully")),
            ),
            OrderStatus::Cancelled => Self::warning(format!("{subject} has been cancelled")),
            OrderStatus::Pending => Self::success(format!(
                "{subject} status updated to {}",
                status_label(status)
            )),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes each notification to the log at a level matching its kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            kind,
            title,
            description,
        } = notification;
        match kind {
            NotificationKind::Error => error!(%title, %description, "Notification"),
            NotificationKind::Warning => warn!(%title, %description, "Notification"),
            _ => info!(?kind, %title, %description, "Notification"),
        }
    }
}

/// Keeps every notification in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Take every entry, leaving the log empty.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
