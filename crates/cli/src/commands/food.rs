//! Menu management for restaurant accounts.
//!
//! # Usage
//!
//! ```bash
//! forkline food add -n "Focaccia" -d "Rosemary and sea salt" -p 6.00 -c Bread
//! forkline food edit 12 --price 6.50 --quantity 40
//! forkline food toggle-status 12
//! forkline food toggle-popular 12
//! forkline food delete 12
//! ```

use std::io::Write;

use clap::Args;
use forkline_client::models::{Food, FoodDraft, FoodUpdate};
use forkline_core::{FoodId, FoodStatus, Price};

use super::{CmdResult, Context, ask};

#[derive(Args)]
pub struct AddArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short, long)]
    description: String,

    #[arg(short, long, value_parser = crate::parse_price)]
    price: Price,

    #[arg(short, long)]
    category: String,

    /// Stock on hand (default 20)
    #[arg(short, long)]
    quantity: Option<i32>,

    #[arg(long)]
    image_url: Option<String>,

    /// List the item as unavailable
    #[arg(long)]
    unavailable: bool,

    #[arg(long)]
    popular: bool,
}

impl From<AddArgs> for FoodDraft {
    fn from(args: AddArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            price: Some(args.price),
            category: args.category,
            quantity: args.quantity,
            image_url: args.image_url,
            status: args.unavailable.then_some(FoodStatus::Unavailable),
            popular: args.popular,
        }
    }
}

#[derive(Args)]
pub struct EditArgs {
    id: FoodId,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long, value_parser = crate::parse_price)]
    price: Option<Price>,

    #[arg(short, long)]
    category: Option<String>,

    #[arg(short, long)]
    quantity: Option<i32>,

    /// Pass an empty string to remove the image
    #[arg(long)]
    image_url: Option<String>,
}

impl EditArgs {
    fn update(self) -> (FoodId, FoodUpdate) {
        let update = FoodUpdate {
            name: self.name,
            description: self.description,
            price: self.price,
            quantity: self.quantity,
            category: self.category,
            image_url: self.image_url,
            status: None,
            popular: None,
        };
        (self.id, update)
    }
}

pub async fn add(ctx: &mut Context, args: AddArgs, out: &mut impl Write) -> CmdResult {
    let mut view = ctx.restaurant().await?;
    let food = view.create_food(args.into()).await?;
    show(&food, out)?;
    Ok(())
}

pub async fn edit(ctx: &mut Context, args: EditArgs, out: &mut impl Write) -> CmdResult {
    let (id, update) = args.update();
    let mut view = ctx.restaurant().await?;
    let food = view.update_food(id, &update).await?;
    show(&food, out)?;
    Ok(())
}

pub async fn toggle_status(ctx: &mut Context, id: FoodId, out: &mut impl Write) -> CmdResult {
    let mut view = ctx.restaurant().await?;
    let food = view.toggle_status(id).await?;
    show(&food, out)?;
    Ok(())
}

pub async fn toggle_popular(ctx: &mut Context, id: FoodId, out: &mut impl Write) -> CmdResult {
    let mut view = ctx.restaurant().await?;
    let food = view.toggle_popular(id).await?;
    show(&food, out)?;
    Ok(())
}

pub async fn delete(ctx: &mut Context, id: FoodId, yes: bool, out: &mut impl Write) -> CmdResult {
    let mut view = ctx.restaurant().await?;
    let confirm = |prompt: &str| yes || ask(prompt);
    view.delete_food(&confirm, id).await?;
    writeln!(out, "Deleted item #{id}")?;
    Ok(())
}

fn show(food: &Food, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "#{} {} - {} [{}] {}, {} in stock{}",
        food.id,
        food.name,
        food.price,
        food.category,
        food.status,
        food.quantity,
        if food.popular { ", popular" } else { "" }
    )
}
