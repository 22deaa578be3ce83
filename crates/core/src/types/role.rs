//! Account roles.

use serde::{Deserialize, Serialize};

/// Role attached to a user account at registration.
///
/// The role never changes after the account is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Browses restaurants and places orders.
    Customer,
    /// Owns a menu and fulfils orders for its items.
    Restaurant,
    /// Platform operator. Cannot be self-registered.
    Admin,
}

impl Role {
    /// Whether an account with this role may be created through registration.
    #[must_use]
    pub const fn is_self_registrable(self) -> bool {
        matches!(self, Self::Customer | Self::Restaurant)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "CUSTOMER"),
            Self::Restaurant => write!(f, "RESTAURANT"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "RESTAURANT" => Ok(Self::Restaurant),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
