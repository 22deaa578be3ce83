//! Catalog items and the forms that create and edit them.

use forkline_core::{FoodId, FoodStatus, Price, UserId};
use serde::{Deserialize, Serialize};

use crate::api::wire::FoodPayload;
use crate::error::ClientError;

/// Stock level given to new items when the form leaves it blank.
pub const DEFAULT_QUANTITY: i32 = 20;

/// Label of the catch-all category filter.
pub const ALL_CATEGORIES: &str = "All";

const REQUIRED_FIELDS: &str = "Please fill in all required fields.";

/// A catalog entry. `status` and `popular` are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: FoodId,
    pub restaurant_id: UserId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: FoodStatus,
    #[serde(default)]
    pub popular: bool,
}

impl Food {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == FoodStatus::Available
    }

    /// The full record in request form, as `PUT /foods/{id}` expects it.
    #[must_use]
    pub fn to_payload(&self) -> FoodPayload {
        FoodPayload {
            restaurant_id: self.restaurant_id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: self.quantity,
            category: self.category.clone(),
            image_url: self.image_url.clone().unwrap_or_default(),
            status: self.status,
            popular: self.popular,
        }
    }
}

fn check_required(name: &str, description: &str, category: &str) -> Result<(), ClientError> {
    if [name, description, category].iter().any(|f| f.trim().is_empty()) {
        return Err(ClientError::Validation(REQUIRED_FIELDS.to_string()));
    }
    Ok(())
}

/// New-item form.
#[derive(Debug, Clone, Default)]
pub struct FoodDraft {
    pub name: String,
    pub description: String,
    pub price: Option<Price>,
    pub category: String,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
    pub status: Option<FoodStatus>,
    pub popular: bool,
}

impl FoodDraft {
    /// Validate the draft and build the create request for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if name, description, price or
    /// category is missing.
    pub fn into_payload(self, owner: UserId) -> Result<FoodPayload, ClientError> {
        check_required(&self.name, &self.description, &self.category)?;
        let price = self
            .price
            .ok_or_else(|| ClientError::Validation(REQUIRED_FIELDS.to_string()))?;

        Ok(FoodPayload {
            restaurant_id: owner,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            quantity: self.quantity.unwrap_or(DEFAULT_QUANTITY),
            category: self.category.trim().to_string(),
            image_url: self.image_url.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            popular: self.popular,
        })
    }
}

/// Partial edit. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub quantity: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<FoodStatus>,
    pub popular: Option<bool>,
}

impl FoodUpdate {
    #[must_use]
    pub fn status(status: FoodStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn popular(popular: bool) -> Self {
        Self {
            popular: Some(popular),
            ..Self::default()
        }
    }

    /// `current` with every set field replaced.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the merge blanks a required field.
    pub fn merged_into(&self, current: &Food) -> Result<Food, ClientError> {
        let mut food = current.clone();
        if let Some(name) = &self.name {
            food.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            food.description = description.trim().to_string();
        }
        if let Some(price) = self.price {
            food.price = price;
        }
        if let Some(quantity) = self.quantity {
            food.quantity = quantity;
        }
        if let Some(category) = &self.category {
            food.category = category.trim().to_string();
        }
        if let Some(image_url) = &self.image_url {
            food.image_url = Some(image_url.clone()).filter(|u| !u.is_empty());
        }
        if let Some(status) = self.status {
            food.status = status;
        }
        if let Some(popular) = self.popular {
            food.popular = popular;
        }
        check_required(&food.name, &food.description, &food.category)?;
        Ok(food)
    }
}

/// Search, category and status filter over a restaurant's menu.
#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    /// Case-insensitive match against name or description.
    pub search: String,
    /// `None` (or `"All"`) matches every category.
    pub category: Option<String>,
    pub status: Option<FoodStatus>,
}

impl MenuFilter {
    #[must_use]
    pub fn matches(&self, food: &Food) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || food.name.to_lowercase().contains(&needle)
            || food.description.to_lowercase().contains(&needle);
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|c| c == ALL_CATEGORIES || c == food.category);
        let matches_status = self.status.is_none_or(|s| s == food.status);

        matches_search && matches_category && matches_status
    }

    #[must_use]
    pub fn apply<'a>(&self, items: &'a [Food]) -> Vec<&'a Food> {
        items.iter().filter(|f| self.matches(f)).collect()
    }
}

/// `"All"` followed by each distinct category in first-seen order.
#[must_use]
pub fn categories(items: &[Food]) -> Vec<String> {
    let mut out = vec![ALL_CATEGORIES.to_string()];
    for food in items {
        if !out.iter().skip(1).any(|c| c == &food.category) {
            out.push(food.category.clone());
        }
    }
    out
}
