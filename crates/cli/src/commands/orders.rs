//! Placing, listing and advancing orders.

use std::io::Write;

use forkline_client::display::{customer_label, line_summary, status_label};
use forkline_client::models::{EnrichedLine, Order, OrderFilter};
use forkline_client::{ClientError, RoleView};
use forkline_core::{FoodId, OrderId, OrderStatus, Role};

use super::{CmdResult, Context};

/// `12` or `12:3`.
pub fn parse_line(s: &str) -> Result<(FoodId, u32), String> {
    let (id, quantity) = s.split_once(':').unwrap_or((s, "1"));
    let id = id
        .parse::<FoodId>()
        .map_err(|e| format!("invalid item id {id:?}: {e}"))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| format!("invalid quantity {quantity:?}"))?;
    Ok((id, quantity))
}

/// Fill a cart with `items` and check it out.
pub async fn place(
    ctx: &mut Context,
    items: &[(FoodId, u32)],
    note: &str,
    out: &mut impl Write,
) -> CmdResult {
    let mut view = ctx.customer().await?;
    for &(id, quantity) in items {
        for _ in 0..quantity {
            view.add_to_cart(id)?;
        }
    }
    for entry in view.cart().entries() {
        writeln!(
            out,
            "{} x {} = {}",
            entry.quantity,
            entry.item.name,
            entry.subtotal()
        )?;
    }
    let order = view.checkout(note).await?;
    writeln!(
        out,
        "Order #{} placed: {} ({})",
        order.id,
        order.cost,
        status_label(order.status)
    )?;
    Ok(())
}

pub async fn list(ctx: &mut Context, filter: OrderFilter, out: &mut impl Write) -> CmdResult {
    match ctx.view().await? {
        RoleView::Customer(view) => {
            let orders = view.orders(filter);
            for order in &orders {
                print_order(order, &view.order_lines(order.id)?, false, &[], out)?;
            }
            summary(orders.len(), None, out)?;
        }
        RoleView::Restaurant(view) => {
            let orders = view.orders(filter);
            for order in &orders {
                let next = view.next_statuses(order.id)?;
                print_order(order, &view.order_lines(order.id)?, true, next, out)?;
            }
            summary(orders.len(), Some(view.revenue()), out)?;
        }
        RoleView::Admin(view) => {
            let orders = view.orders(filter);
            for order in &orders {
                print_order(order, &view.order_lines(order.id)?, true, &[], out)?;
            }
            summary(orders.len(), Some(view.revenue()), out)?;
        }
    }
    Ok(())
}

/// Restaurants may make any legal move; customers may only cancel.
pub async fn advance(
    ctx: &mut Context,
    id: OrderId,
    next: OrderStatus,
    out: &mut impl Write,
) -> CmdResult {
    let order = match ctx.view().await? {
        RoleView::Restaurant(mut view) => view.advance(id, next).await?,
        RoleView::Customer(mut view) if next == OrderStatus::Cancelled => {
            view.cancel_order(id).await?
        }
        RoleView::Customer(_) | RoleView::Admin(_) => {
            return Err(ClientError::WrongRole {
                required: Role::Restaurant,
            }
            .into());
        }
    };
    writeln!(out, "Order #{} is now {}", order.id, status_label(order.status))?;
    Ok(())
}

fn print_order(
    order: &Order,
    lines: &[EnrichedLine],
    show_customer: bool,
    next: &[OrderStatus],
    out: &mut impl Write,
) -> std::io::Result<()> {
    write!(out, "Order #{} - {} - {}", order.id, status_label(order.status), order.cost)?;
    if show_customer {
        write!(out, " - {}", customer_label(order.customer_id))?;
    }
    if let Some(created_at) = order.created_at {
        write!(out, " - {}", created_at.format("%Y-%m-%d %H:%M"))?;
    }
    writeln!(out)?;
    for line in lines {
        writeln!(out, "    {}", line_summary(line))?;
    }
    if let Some(note) = order.note.as_deref().filter(|n| !n.trim().is_empty()) {
        writeln!(out, "    Note: {note}")?;
    }
    if !next.is_empty() {
        let choices: Vec<String> = next.iter().map(|s| s.as_str().to_lowercase()).collect();
        writeln!(out, "    Next: {}", choices.join(" | "))?;
    }
    Ok(())
}

fn summary(
    count: usize,
    revenue: Option<forkline_core::Price>,
    out: &mut impl Write,
) -> std::io::Result<()> {
    write!(out, "{count} order(s)")?;
    if let Some(revenue) = revenue {
        write!(out, ", delivered revenue {revenue}")?;
    }
    writeln!(out)
}
