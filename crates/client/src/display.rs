//! Presentation fallbacks.
//!
//! The model keeps missing data missing; these helpers decide what to show
//! instead.

use forkline_core::{OrderStatus, UserId};

use crate::models::{EnrichedLine, User};

/// Shown when an item has no image or its image fails to load.
pub const IMAGE_PLACEHOLDER: &str = "/placeholder.svg";

#[must_use]
pub fn customer_label(id: UserId) -> String {
    format!("Customer #{id}")
}

/// Restaurant name, falling back to the owner's name.
#[must_use]
pub fn restaurant_label(restaurant: &User) -> String {
    restaurant
        .restaurant_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| restaurant.full_name(), str::to_string)
}

/// `OUT_FOR_DELIVERY` becomes `Out For Delivery`.
#[must_use]
pub fn status_label(status: OrderStatus) -> String {
    status
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn image_or_placeholder(url: Option<&str>) -> &str {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(IMAGE_PLACEHOLDER)
}

#[must_use]
pub fn line_name(line: &EnrichedLine) -> String {
    line.name
        .clone()
        .unwrap_or_else(|| format!("Item #{}", line.food_id))
}

/// `2 x Gyoza @ $6.50 = $13.00`, or `1 x Item #99` when the item is gone.
#[must_use]
pub fn line_summary(line: &EnrichedLine) -> String {
    let head = format!("{} x {}", line.quantity, line_name(line));
    match (line.unit_price, line.subtotal()) {
        (Some(unit), Some(subtotal)) => format!("{head} @ {unit} = {subtotal}"),
        _ => head,
    }
}
