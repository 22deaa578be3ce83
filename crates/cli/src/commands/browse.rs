//! Catalog browsing.
//!
//! Customers see only what a restaurant currently offers. A restaurant sees
//! its whole menu, and an admin sees every item.

use std::io::Write;

use forkline_client::display::restaurant_label;
use forkline_client::models::{Food, MenuFilter};
use forkline_client::{ClientError, FoodApi, RoleView};
use forkline_core::UserId;

use super::{CmdResult, Context};

pub async fn restaurants(ctx: &mut Context, out: &mut impl Write) -> CmdResult {
    ctx.session.require_user()?;
    let restaurants = ctx.session.api().list_restaurants().await?;
    if restaurants.is_empty() {
        writeln!(out, "No restaurants yet")?;
    }
    for restaurant in &restaurants {
        write!(out, "#{} {}", restaurant.id, restaurant_label(restaurant))?;
        if let Some(address) = &restaurant.address {
            write!(out, " - {address}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub async fn menu(
    ctx: &mut Context,
    restaurant: Option<UserId>,
    filter: &MenuFilter,
    out: &mut impl Write,
) -> CmdResult {
    match ctx.view().await? {
        RoleView::Customer(view) => {
            let id = restaurant.ok_or_else(|| {
                ClientError::Validation("Pick a restaurant with --restaurant".to_string())
            })?;
            if let Some(owner) = view.restaurant(id) {
                writeln!(out, "{}", restaurant_label(owner))?;
            }
            let items: Vec<&Food> = view
                .menu(id)
                .into_iter()
                .filter(|f| filter.matches(f))
                .collect();
            print_items(&items, out)?;
        }
        RoleView::Restaurant(view) => {
            writeln!(out, "Categories: {}", view.categories().join(", "))?;
            print_items(&view.menu(filter), out)?;
        }
        RoleView::Admin(view) => {
            let items: Vec<&Food> = view
                .foods()
                .iter()
                .filter(|f| restaurant.is_none_or(|id| f.restaurant_id == id))
                .filter(|f| filter.matches(f))
                .collect();
            print_items(&items, out)?;
        }
    }
    Ok(())
}

fn print_items(items: &[&Food], out: &mut impl Write) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No items found");
    }
    for food in items {
        writeln!(
            out,
            "#{} {} - {} [{}] {}{}",
            food.id,
            food.name,
            food.price,
            food.category,
            food.status,
            if food.popular { " *popular*" } else { "" }
        )?;
    }
    Ok(())
}
