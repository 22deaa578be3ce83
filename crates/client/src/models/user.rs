//! Accounts and registration.

use chrono::{DateTime, Utc};
use forkline_core::{Email, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::api::wire::RegisterRequest;
use crate::error::ClientError;

/// A signed-in account, or a restaurant listed in the directory.
///
/// The role is fixed at registration and never changes client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Directory and profile lookups return the same shape as the session user.
pub type UserProfile = User;

const fn default_active() -> bool {
    true
}

impl User {
    /// "First Last", or the username when both are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    #[must_use]
    pub fn is_restaurant(&self) -> bool {
        self.role == Role::Restaurant
    }
}

/// Sign-up form as collected from the user.
#[derive(Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub role: Role,
    pub restaurant_name: Option<String>,
    pub address: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .field("restaurant_name", &self.restaurant_name)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
    const MIN_PASSWORD_LEN: usize = 6;

    /// Check the form against the auth service's rules and build the request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` naming the first rule that fails.
    pub fn validate(self) -> Result<RegisterRequest, ClientError> {
        let invalid = |msg: &str| Err(ClientError::Validation(msg.to_string()));

        if !self.role.is_self_registrable() {
            return invalid("Only customer and restaurant accounts can sign up");
        }
        let username = self.username.trim();
        if username.is_empty() {
            return invalid("Username is required");
        }
        if !Self::USERNAME_LEN.contains(&username.chars().count()) {
            return invalid("Username must be between 3 and 50 characters");
        }
        let email = Email::parse(&self.email)
            .map_err(|e| ClientError::Validation(format!("Invalid email format: {e}")))?;
        if self.password.expose_secret().is_empty() {
            return invalid("Password is required");
        }
        if self.password.expose_secret().chars().count() < Self::MIN_PASSWORD_LEN {
            return invalid("Password must be at least 6 characters");
        }
        if self.first_name.trim().is_empty() {
            return invalid("First name is required");
        }
        if self.last_name.trim().is_empty() {
            return invalid("Last name is required");
        }
        if self.address.trim().is_empty() {
            return invalid("Address is required");
        }

        let restaurant_name = self
            .restaurant_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        match (self.role, &restaurant_name) {
            (Role::Restaurant, None) => {
                return invalid("Restaurant name is required for restaurant role");
            }
            (Role::Customer, Some(_)) => {
                return invalid("Restaurant name should not be provided for customer role");
            }
            _ => {}
        }

        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.as_str().to_string(),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            role: self.role,
            restaurant_name,
            address: self.address.trim().to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(role: Role, restaurant_name: Option<&str>) -> RegistrationForm {
        RegistrationForm {
            username: "marco".to_string(),
            email: "marco@example.com".to_string(),
            password: SecretString::from("hunter22"),
            first_name: "Marco".to_string(),
            last_name: "Polo".to_string(),
            phone_number: "555-0100".to_string(),
            role,
            restaurant_name: restaurant_name.map(String::from),
            address: "1 Canal St".to_string(),
        }
    }

    fn message(result: Result<RegisterRequest, ClientError>) -> String {
        match result {
            Err(ClientError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_user_deserializes_backend_shape() {
        let json = r#"{
            "id": 3,
            "username": "pizzapalace",
            "email": "owner@pizza.example",
            "firstName": "Gina",
            "lastName": "Rossi",
            "phoneNumber": null,
            "role": "RESTAURANT",
            "isActive": true,
            "createdAt": "2025-01-05T09:15:00.123456",
            "updatedAt": "2025-01-05T09:15:00Z",
            "address": "12 Oven Rd",
            "restaurantName": "Pizza Palace",
            "imageUrl": null
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new(3));
        assert!(user.is_restaurant());
        assert!(user.created_at.is_some());
        assert_eq!(user.restaurant_name.as_deref(), Some("Pizza Palace"));
        assert_eq!(user.full_name(), "Gina Rossi");
    }

    #[test]
    fn test_restaurant_requires_name() {
        assert_eq!(
            message(form(Role::Restaurant, None).validate()),
            "Restaurant name is required for restaurant role"
        );
        assert_eq!(
            message(form(Role::Restaurant, Some("  ")).validate()),
            "Restaurant name is required for restaurant role"
        );
        let request = form(Role::Restaurant, Some(" Sushi Go ")).validate().unwrap();
        assert_eq!(request.restaurant_name.as_deref(), Some("Sushi Go"));
    }

    #[test]
    fn test_customer_must_not_name_a_restaurant() {
        assert_eq!(
            message(form(Role::Customer, Some("Sneaky Diner")).validate()),
            "Restaurant name should not be provided for customer role"
        );
        assert!(form(Role::Customer, None).validate().is_ok());
    }

    #[test]
    fn test_address_and_credentials_required() {
        let mut no_address = form(Role::Customer, None);
        no_address.address = " ".to_string();
        assert_eq!(message(no_address.validate()), "Address is required");

        let mut short_password = form(Role::Customer, None);
        short_password.password = SecretString::from("abc");
        assert_eq!(
            message(short_password.validate()),
            "Password must be at least 6 characters"
        );

        let mut bad_email = form(Role::Customer, None);
        bad_email.email = "marco".to_string();
        assert!(message(bad_email.validate()).starts_with("Invalid email format"));
    }

    #[test]
    fn test_admin_cannot_self_register() {
        assert_eq!(
            message(form(Role::Admin, None).validate()),
            "Only customer and restaurant accounts can sign up"
        );
    }
}
