//! A restaurant's catalog lifecycle.
//!
//! Every mutation is sent first and applied locally only when the backend
//! accepts it, so a failed call leaves [`MenuManager::items`] exactly as it
//! was. Outcomes, good or bad, are reported through a [`Notifier`].

use forkline_core::{FoodId, Role, UserId};
use tracing::{error, info, instrument};

use crate::api::FoodApi;
use crate::error::{ClientError, Result};
use crate::models::{Food, FoodDraft, FoodUpdate, MenuFilter, User, categories};
use crate::notify::{Notification, Notifier};

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// The prompt shown before deleting an item.
#[must_use]
pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete \"{name}\"?")
}

/// Items owned by one restaurant account.
#[derive(Debug, Clone)]
pub struct MenuManager {
    owner: UserId,
    items: Vec<Food>,
}

impl MenuManager {
    /// A manager for `user`'s menu.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::WrongRole` unless `user` is a restaurant.
    pub fn for_restaurant(user: &User) -> Result<Self> {
        if user.role != Role::Restaurant {
            return Err(ClientError::WrongRole {
                required: Role::Restaurant,
            });
        }
        Ok(Self::owned_by(user.id))
    }

    /// An empty manager for `owner`'s items.
    #[must_use]
    pub const fn owned_by(owner: UserId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    #[must_use]
    pub fn items(&self) -> &[Food] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: FoodId) -> Option<&Food> {
        self.items.iter().find(|f| f.id == id)
    }

    #[must_use]
    pub fn food_ids(&self) -> Vec<FoodId> {
        self.items.iter().map(|f| f.id).collect()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        categories(&self.items)
    }

    #[must_use]
    pub fn filtered(&self, filter: &MenuFilter) -> Vec<&Food> {
        filter.apply(&self.items)
    }

    fn owned(&self, id: FoodId) -> Result<&Food> {
        self.get(id).ok_or(ClientError::UnknownItem(id))
    }

    /// Reload this restaurant's items.
    ///
    /// # Errors
    ///
    /// Returns any gateway error; the current items are kept.
    #[instrument(skip(self, api), fields(owner = %self.owner))]
    pub async fn refresh<A: FoodApi>(&mut self, api: &A) -> Result<&[Food]> {
        let mut items = api.list_foods().await?;
        items.retain(|f| f.restaurant_id == self.owner);
        info!(count = items.len(), "Menu loaded");
        self.items = items;
        Ok(&self.items)
    }

    /// Add a new item.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` without a request when a required
    /// field is missing, or any gateway error.
    #[instrument(skip(self, api, notifier, draft), fields(owner = %self.owner, name = %draft.name))]
    pub async fn create<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        draft: FoodDraft,
    ) -> Result<Food> {
        let payload = match draft.into_payload(self.owner) {
            Ok(payload) => payload,
            Err(e) => return Err(report(notifier, e)),
        };
        let created = api
            .create_food(&payload)
            .await
            .map_err(|e| report(notifier, e))?;

        info!(food_id = %created.id, "Menu item created");
        notifier.notify(
            Notification::success(format!("{} has been added to your menu.", created.name))
                .titled("Menu item added"),
        );
        self.items.push(created.clone());
        Ok(created)
    }

    /// Edit an item, sending the full merged record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem` for an item this restaurant does
    /// not own, `ClientError::Validation` if the edit blanks a required
    /// field, or any gateway error.
    pub async fn update<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        id: FoodId,
        update: &FoodUpdate,
    ) -> Result<Food> {
        self.apply(api, notifier, id, update, |food| {
            Notification::success(format!("{} has been updated.", food.name)).titled("Menu updated")
        })
        .await
    }

    /// Flip between available and unavailable.
    ///
    /// # Errors
    ///
    /// As [`Self::update`].
    pub async fn toggle_status<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        id: FoodId,
    ) -> Result<Food> {
        let next = self.owned(id)?.status.toggled();
        self.apply(api, notifier, id, &FoodUpdate::status(next), |food| {
            Notification::success(format!("Item status changed to {}.", food.status))
                .titled("Status updated")
        })
        .await
    }

    /// Flip the popular flag.
    ///
    /// # Errors
    ///
    /// As [`Self::update`].
    pub async fn toggle_popular<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        id: FoodId,
    ) -> Result<Food> {
        let next = !self.owned(id)?.popular;
        self.apply(api, notifier, id, &FoodUpdate::popular(next), |food| {
            let verb = if food.popular { "marked as" } else { "removed from" };
            Notification::success(format!("Item {verb} popular.")).titled("Popular status updated")
        })
        .await
    }

    #[instrument(skip(self, api, notifier, update, success), fields(owner = %self.owner))]
    async fn apply<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        id: FoodId,
        update: &FoodUpdate,
        success: impl FnOnce(&Food) -> Notification,
    ) -> Result<Food> {
        let merged = self
            .owned(id)
            .and_then(|current| update.merged_into(current))
            .map_err(|e| report(notifier, e))?;
        let saved = api
            .update_food(id, &merged.to_payload())
            .await
            .map_err(|e| report(notifier, e))?;

        info!(food_id = %id, "Menu item updated");
        if let Some(slot) = self.items.iter_mut().find(|f| f.id == id) {
            *slot = saved.clone();
        }
        notifier.notify(success(&saved));
        Ok(saved)
    }

    /// Delete an item after the user confirms.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UnknownItem`, `ClientError::DeleteDeclined` if
    /// the prompt is refused (nothing is sent), or any gateway error.
    #[instrument(skip(self, api, notifier, confirm), fields(owner = %self.owner))]
    pub async fn delete<A: FoodApi>(
        &mut self,
        api: &A,
        notifier: &dyn Notifier,
        confirm: &dyn Confirm,
        id: FoodId,
    ) -> Result<()> {
        let name = self.owned(id)?.name.clone();
        if !confirm.confirm(&delete_prompt(&name)) {
            return Err(ClientError::DeleteDeclined);
        }
        api.delete_food(id)
            .await
            .map_err(|e| report(notifier, e))?;

        info!(food_id = %id, "Menu item deleted");
        self.items.retain(|f| f.id != id);
        notifier.notify(
            Notification::success(format!("{name} has been removed from your menu."))
                .titled("Item deleted"),
        );
        Ok(())
    }
}

/// Surface a failure to the user once and hand it back.
fn report(notifier: &dyn Notifier, err: ClientError) -> ClientError {
    if !matches!(err, ClientError::Validation(_)) {
        error!(error = %err, "Menu operation failed");
    }
    notifier.notify(Notification::error(err.user_message()));
    err
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use forkline_core::{FoodStatus, Price};

    use super::*;
    use crate::notify::NotificationLog;
    use crate::testing::{StubApi, customer, food, restaurant};

    async fn manager(api: &StubApi) -> MenuManager {
        let mut menu = MenuManager::for_restaurant(&restaurant(3)).unwrap();
        menu.refresh(api).await.unwrap();
        menu
    }

    fn seeded() -> StubApi {
        StubApi::new().with_foods(vec![
            food(1, 3, "Margherita", 1000),
            food(2, 3, "Calzone", 1200),
            food(3, 4, "Someone Else's Soup", 600),
        ])
    }

    #[test]
    fn test_customers_have_no_menu() {
        assert!(matches!(
            MenuManager::for_restaurant(&customer(1)),
            Err(ClientError::WrongRole { required: Role::Restaurant })
        ));
    }

    #[tokio::test]
    async fn test_refresh_keeps_only_owned_items() {
        let api = seeded();
        let menu = manager(&api).await;
        assert_eq!(menu.items().len(), 2);
        assert_eq!(menu.food_ids(), [FoodId::new(1), FoodId::new(2)]);
    }

    #[tokio::test]
    async fn test_create_validation_sends_nothing() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;
        let calls = api.calls();

        let err = menu
            .create(&api, &log, FoodDraft { name: "Soup".to_string(), ..FoodDraft::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(api.calls(), calls);
        assert_eq!(log.last().unwrap().description, "Please fill in all required fields.");
    }

    #[tokio::test]
    async fn test_create_appends_server_item() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;
        let created = menu
            .create(
                &api,
                &log,
                FoodDraft {
                    name: "Focaccia".to_string(),
                    description: "Rosemary".to_string(),
                    price: Some(Price::from_cents(600)),
                    category: "Bread".to_string(),
                    ..FoodDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, FoodId::new(4));
        assert_eq!(created.restaurant_id, UserId::new(3));
        assert_eq!(created.quantity, 20);
        assert_eq!(menu.items().last(), Some(&created));
        assert_eq!(log.last().unwrap().title, "Menu item added");
    }

    #[tokio::test]
    async fn test_toggles_flip_one_field_and_send_full_record() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;

        let toggled = menu.toggle_status(&api, &log, FoodId::new(1)).await.unwrap();
        assert_eq!(toggled.status, FoodStatus::Unavailable);
        assert!(!toggled.popular);
        assert_eq!(log.last().unwrap().description, "Item status changed to unavailable.");

        let popular = menu.toggle_popular(&api, &log, FoodId::new(1)).await.unwrap();
        assert!(popular.popular);
        assert_eq!(popular.status, FoodStatus::Unavailable);

        let sent = api.food_payloads();
        let last = sent.last().unwrap();
        assert_eq!(last.name, "Margherita");
        assert_eq!(last.price, Price::from_cents(1000));
        assert_eq!(last.restaurant_id, UserId::new(3));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_items_identical() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;
        let before = menu.items().to_vec();

        api.fail_next(500, "Food service unavailable");
        let update = FoodUpdate {
            price: Some(Price::from_cents(1)),
            ..FoodUpdate::default()
        };
        assert!(menu.update(&api, &log, FoodId::new(2), &update).await.is_err());
        assert_eq!(menu.items(), before.as_slice());
        let note = log.last().unwrap();
        assert!(note.kind.is_error());
        assert_eq!(note.description, "Food service unavailable");
    }

    #[tokio::test]
    async fn test_items_of_other_restaurants_are_unknown() {
        let api = seeded();
        let mut menu = manager(&api).await;
        let err = menu
            .toggle_popular(&api, &NotificationLog::new(), FoodId::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownItem(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;
        let calls = api.calls();

        let refuse = |prompt: &str| {
            assert_eq!(prompt, "Are you sure you want to delete \"Calzone\"?");
            false
        };
        let err = menu.delete(&api, &log, &refuse, FoodId::new(2)).await.unwrap_err();
        assert!(matches!(err, ClientError::DeleteDeclined));
        assert_eq!(api.calls(), calls);
        assert_eq!(menu.items().len(), 2);

        let accept = |_: &str| true;
        menu.delete(&api, &log, &accept, FoodId::new(2)).await.unwrap();
        assert!(menu.get(FoodId::new(2)).is_none());
        assert_eq!(log.last().unwrap().title, "Item deleted");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_item() {
        let api = seeded();
        let log = NotificationLog::new();
        let mut menu = manager(&api).await;
        api.fail_next(409, "Food is referenced by an order");

        let accept = |_: &str| true;
        assert!(menu.delete(&api, &log, &accept, FoodId::new(1)).await.is_err());
        assert!(menu.get(FoodId::new(1)).is_some());
        assert_eq!(log.last().unwrap().description, "Food is referenced by an order");
    }
}
