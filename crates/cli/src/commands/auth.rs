//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! FORKLINE_PASSWORD=secret forkline login -u casey
//! FORKLINE_PASSWORD=secret forkline register -u pasta_place -e chef@example.com \
//!     --first-name Sam --last-name Rossi --phone 5550100 --address "2 Dock Rd" \
//!     --role restaurant --restaurant-name "Pasta Place"
//! forkline whoami --refresh
//! forkline logout
//! ```

use std::io::Write;

use clap::Args;
use forkline_client::display::restaurant_label;
use forkline_client::models::RegistrationForm;
use forkline_core::Role;
use secrecy::SecretString;

use super::{CmdResult, Context};

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    email: String,

    #[arg(long, env = "FORKLINE_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long)]
    address: String,

    /// `customer` or `restaurant`
    #[arg(short, long, default_value = "customer", value_parser = crate::parse_role)]
    role: Role,

    /// Required for restaurant accounts
    #[arg(long)]
    restaurant_name: Option<String>,
}

impl From<RegisterArgs> for RegistrationForm {
    fn from(args: RegisterArgs) -> Self {
        Self {
            username: args.username,
            email: args.email,
            password: SecretString::from(args.password),
            first_name: args.first_name,
            last_name: args.last_name,
            phone_number: args.phone,
            role: args.role,
            restaurant_name: args.restaurant_name,
            address: args.address,
        }
    }
}

pub async fn login(
    ctx: &mut Context,
    identifier: &str,
    password: SecretString,
    out: &mut impl Write,
) -> CmdResult {
    let user = ctx.session.login(identifier, password).await?;
    writeln!(out, "Signed in as {} ({})", user.username, user.role)?;
    Ok(())
}

pub async fn register(ctx: &mut Context, args: RegisterArgs, out: &mut impl Write) -> CmdResult {
    let user = ctx.session.register(args.into()).await?;
    writeln!(
        out,
        "Welcome, {}! Your {} account is ready.",
        user.full_name(),
        user.role.to_string().to_lowercase()
    )?;
    Ok(())
}

pub fn logout(ctx: &mut Context, out: &mut impl Write) -> CmdResult {
    let was_signed_in = ctx.session.session().is_authenticated();
    ctx.session.logout();
    if was_signed_in {
        writeln!(out, "Signed out")?;
    } else {
        writeln!(out, "Not signed in")?;
    }
    Ok(())
}

pub async fn whoami(ctx: &mut Context, refresh: bool, out: &mut impl Write) -> CmdResult {
    if refresh && ctx.session.session().is_authenticated() {
        ctx.session.refresh_profile().await?;
    }
    let Some(user) = ctx.session.session().user() else {
        writeln!(out, "Not signed in")?;
        return Ok(());
    };

    writeln!(out, "{} <{}>", user.username, user.email)?;
    writeln!(out, "  id:   {}", user.id)?;
    writeln!(out, "  name: {}", user.full_name())?;
    writeln!(out, "  role: {}", user.role)?;
    if user.is_restaurant() {
        writeln!(out, "  restaurant: {}", restaurant_label(user))?;
    }
    if let Some(address) = &user.address {
        writeln!(out, "  address: {address}")?;
    }
    Ok(())
}
